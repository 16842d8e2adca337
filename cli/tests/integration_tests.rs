use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const MANIFEST: &str = r#"
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
        env: FLAGSET_TEST_PORT
        default: "8080"
      - name: Hosts
        type: "[]string"
        long: host
        delimiter: ","
"#;

fn write_manifest(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("failed to write manifest");
    path
}

fn flagset(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flagset"))
        .args(args)
        .env_remove("FLAGSET_TEST_PORT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run flagset")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn find_flag<'a>(report: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    report["flags"]
        .as_array()
        .expect("flags array")
        .iter()
        .find(|f| f["name"] == name)
        .unwrap_or_else(|| panic!("flag {name} missing from report"))
}

#[test]
fn resolve_prints_report_with_sources() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "server.yaml", MANIFEST);

    let out = flagset(&[
        "resolve",
        "--manifest",
        manifest.to_str().unwrap(),
        "--no-process-env",
        "--",
        "-v",
        "serve",
        "--host=a,b",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(find_flag(&report, "Verbose")["value"], true);
    assert_eq!(find_flag(&report, "Serve.Port")["value"], 8080);
    assert_eq!(find_flag(&report, "Serve.Port")["source"], "default");
    assert_eq!(find_flag(&report, "Serve.Hosts")["value"], serde_json::json!(["a", "b"]));
    assert_eq!(report["errors"], serde_json::json!([]));
}

#[test]
fn resolve_uses_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "server.yaml", MANIFEST);

    let out = flagset(&[
        "resolve",
        "--manifest",
        manifest.to_str().unwrap(),
        "--no-process-env",
        "--env",
        "FLAGSET_TEST_PORT=9000",
        "--",
        "serve",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(find_flag(&report, "Serve.Port")["value"], 9000);
    assert_eq!(find_flag(&report, "Serve.Port")["source"], "env");
}

#[test]
fn resolve_strict_fails_on_errors() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "server.yaml", MANIFEST);
    let path = manifest.to_str().unwrap();

    let lenient = flagset(&["resolve", "--manifest", path, "--", "serve", "--port=abc"]);
    assert!(lenient.status.success());
    assert!(stdout(&lenient).contains("failed to parse 'abc' as int"));

    let strict = flagset(&["resolve", "--manifest", path, "--strict", "--", "serve", "--port=abc"]);
    assert!(!strict.status.success());
    assert!(stderr(&strict).contains("error: 1 resolution error(s)"));
}

#[test]
fn resolve_yaml_format() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "server.yml", MANIFEST);

    let out = flagset(&[
        "resolve",
        "--manifest",
        manifest.to_str().unwrap(),
        "--format",
        "yaml",
        "--",
        "--verbose=false",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("name: Verbose"));
}

#[test]
fn validate_reports_each_problem() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_manifest(dir.path(), "good.yaml", MANIFEST);
    let bad = write_manifest(
        dir.path(),
        "bad.yaml",
        r#"
version: "1"
fields:
  - name: A
    type: int
    short: aa
  - name: B
    type: complex64
    long: b
"#,
    );

    let ok = flagset(&["validate", good.to_str().unwrap()]);
    assert!(ok.status.success(), "stderr: {}", stderr(&ok));
    assert!(stdout(&ok).contains("Validated 1 manifest(s)."));

    let out = flagset(&["validate", good.to_str().unwrap(), bad.to_str().unwrap()]);
    assert!(!out.status.success());
    let text = stdout(&out);
    assert!(text.contains("good.yaml: ok"));
    assert!(text.contains("short argument aa in A field must be one character long"));
    assert!(text.contains("invalid type complex64."));
    assert!(stderr(&out).contains("1 of 2 manifest(s) failed validation"));
}

#[test]
fn args_prints_flag_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "serve.json", &serve_manifest_json());
    let path = manifest.to_str().unwrap();

    let out = flagset(&["args", "--manifest", path, "--name", "Serve", "--", "serve", "--port", "80", "extra"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "serve\n--port=80\nextra\n");

    let missing = flagset(&["args", "--manifest", path, "--name", "Nope", "--"]);
    assert!(!missing.status.success());
    assert!(stderr(&missing).contains("no flag named 'Nope'"));
}

#[test]
fn flags_lists_declared_flags() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "server.yaml", MANIFEST);
    let path = manifest.to_str().unwrap();

    let table = flagset(&["flags", "--manifest", path]);
    assert!(table.status.success(), "stderr: {}", stderr(&table));
    let text = stdout(&table);
    assert!(text.contains("Serve.Port"));
    assert!(text.contains("$FLAGSET_TEST_PORT =8080"));

    let json = flagset(&["flags", "--manifest", path, "--format", "json"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout(&json)).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 4);
    assert_eq!(rows[1]["kind"], "command");
    assert_eq!(rows[1]["names"], "serve");
    assert_eq!(rows[3]["type"], "[]string");
}

#[test]
fn unsupported_manifest_extension_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "server.toml", MANIFEST);

    let out = flagset(&["flags", "--manifest", manifest.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(stderr(&out).starts_with("error: Failed to load"));
}

fn serve_manifest_json() -> String {
    serde_json::json!({
        "version": "1",
        "fields": [
            { "name": "Serve", "fields": [
                { "name": "Port", "type": "int", "long": "port" }
            ]}
        ]
    })
    .to_string()
}
