//! Shared declarations for the runnable demos.
//!
//! ```bash
//! cargo run -p flagset-demos --example git_like -- -v remote add --tag=a,b origin
//! cargo run -p flagset-demos --example typed_destination -- serve --port 9000
//! cargo run -p flagset-demos --example manifest_report -- deploy --target prod
//! ```

use flagset_core::{FieldDescriptor, FieldsBuilder, FlagSet};

/// A small git-like command tree.
pub fn git_fields() -> Vec<FieldDescriptor> {
    FieldsBuilder::new()
        .value("Verbose", "bool", &[("short", "v"), ("long", "verbose"), ("description", "Print more")])
        .value("Dir", "string", &[("short", "C"), ("env", "GIT_DIR"), ("default", ".")])
        .group("Remote", &[("description", "Manage remotes")], |remote| {
            remote
                .value("Verbose", "bool", &[("short", "v")])
                .group("Add", &[("description", "Add a remote")], |add| {
                    add.value("Fetch", "bool", &[("short", "f")])
                        .value("Tags", "[]string", &[("long", "tag"), ("delimiter", ",")])
                })
        })
        .group("Commit", &[], |commit| {
            commit
                .value("Message", "string", &[("short", "m"), ("required", "true")])
                .value("Amend", "bool", &[("long", "amend")])
        })
        .build()
}

/// Prints collected resolution errors to stderr; returns whether any were found.
pub fn report_errors(flags: &FlagSet) -> bool {
    let errors = flags.errors();
    for err in &errors {
        eprintln!("error: {err}");
    }
    !errors.is_empty()
}
