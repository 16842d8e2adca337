use std::collections::BTreeMap;
use std::fs;

use flagset_core::{FlagSet, Scalar, ValueSource, ValueStore, validate_fields};
use flagset_manifest::{FieldSpec, Manifest, ManifestError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SERVER_YAML: &str = r#"
version: "1"
name: server
fields:
  - name: Verbose
    type: bool
    short: v
    long: verbose
  - name: Serve
    description: Start the server
    fields:
      - name: Port
        type: int
        long: port
        env: SERVER_PORT
        default: "8080"
      - name: Hosts
        type: "[]string"
        long: host
        delimiter: ","
        required: true
"#;

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

#[test]
fn test_load_yaml_and_json_agree() {
    let dir = tempfile::tempdir().unwrap();
    let yaml_path = dir.path().join("server.yaml");
    fs::write(&yaml_path, SERVER_YAML).unwrap();

    let from_yaml = Manifest::load(&yaml_path).unwrap();
    let json_path = dir.path().join("server.json");
    from_yaml.save(&json_path).unwrap();
    let from_json = Manifest::load(&json_path).unwrap();

    assert_eq!(from_yaml, from_json);
    assert_eq!(from_json.descriptors(), from_yaml.descriptors());
}

#[test]
fn test_save_yaml_omits_unset_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.yml");
    let manifest = Manifest {
        version: "1".into(),
        name: String::new(),
        fields: vec![FieldSpec {
            name: "Port".into(),
            type_name: Some("int".into()),
            long: Some("port".into()),
            ..FieldSpec::default()
        }],
    };
    manifest.save(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("type: int"));
    assert!(!written.contains("required"));
    assert!(!written.contains("short"));
    assert_eq!(Manifest::load(&path).unwrap(), manifest);
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = Manifest::load(dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(missing, ManifestError::Io(_)));

    let toml = dir.path().join("flags.toml");
    fs::write(&toml, "").unwrap();
    assert!(matches!(
        Manifest::load(&toml).unwrap_err(),
        ManifestError::UnsupportedFormat(_)
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        Manifest::load(&broken).unwrap_err(),
        ManifestError::Json(_)
    ));
}

// ---------------------------------------------------------------------------
// Resolution through a manifest
// ---------------------------------------------------------------------------

#[test]
fn test_manifest_drives_resolution() {
    let manifest = Manifest::from_yaml_str(SERVER_YAML).unwrap();
    let fields = manifest.descriptors();
    assert!(validate_fields(&fields).is_empty());

    let env = BTreeMap::from([("SERVER_PORT".to_string(), "9000".to_string())]);
    let mut store = ValueStore::with_fields(&fields);
    let mut flags = FlagSet::new(&fields, ["serve", "--host=a,b"]).unwrap();
    flags.resolve(&mut store, &env);

    assert!(flags.errors().is_empty());
    let port = flags.flag_by_name("Serve.Port").unwrap();
    assert_eq!(port.source(), Some(ValueSource::Env));
    assert_eq!(store.get_i64(&port.path), Some(9000));

    let hosts = flags.flag_by_name("Serve.Hosts").unwrap();
    assert_eq!(
        store.get_list(&hosts.path),
        Some(&[Scalar::Str("a".into()), Scalar::Str("b".into())][..])
    );
}

#[test]
fn test_manifest_with_bad_type_fails_core_validation() {
    let yaml = r#"
version: "1"
fields:
  - name: Ratio
    type: complex64
    long: ratio
"#;
    let manifest = Manifest::from_yaml_str(yaml).unwrap();
    let errors = validate_fields(&manifest.descriptors());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("invalid type complex64."));
}
