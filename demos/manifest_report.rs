//! Manifest-declared flags with a YAML resolution report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p flagset-demos --example manifest_report -- --token=secret deploy -t prod --label=a,b
//! cargo run -p flagset-demos --example manifest_report -- deploy
//! ```

use flagset_core::{FlagSet, ValueStore};
use flagset_manifest::Manifest;

const MANIFEST: &str = include_str!("deploy.yaml");

fn main() {
    let manifest = match Manifest::from_yaml_str(MANIFEST) {
        Ok(manifest) => manifest,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let fields = manifest.descriptors();
    let mut store = ValueStore::with_fields(&fields);

    let flags = match FlagSet::from_process(&fields, &mut store) {
        Ok(flags) => flags,
        Err(err) => {
            eprintln!("invalid declaration: {err}");
            std::process::exit(2);
        }
    };

    let report = flags.report();
    match serde_yaml::to_string(&report) {
        Ok(yaml) => print!("{yaml}"),
        Err(err) => eprintln!("failed to render report: {err}"),
    }

    if flagset_demos::report_errors(&flags) {
        std::process::exit(1);
    }
}
