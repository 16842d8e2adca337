//! Git-like command tree resolved from the process arguments.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p flagset-demos --example git_like -- -v remote add -f --tag=a,b origin
//! cargo run -p flagset-demos --example git_like -- commit --amend
//! GIT_DIR=/tmp/repo cargo run -p flagset-demos --example git_like -- commit -m "fix"
//! ```

use flagset_core::{FlagKind, FlagSet, ValueStore};
use flagset_demos::{git_fields, report_errors};

fn main() {
    let fields = git_fields();
    let mut store = ValueStore::with_fields(&fields);

    let flags = match FlagSet::from_process(&fields, &mut store) {
        Ok(flags) => flags,
        Err(err) => {
            eprintln!("invalid declaration: {err}");
            std::process::exit(2);
        }
    };

    println!("=== Commands ===");
    for flag in flags.flags().iter().filter(|f| f.kind == FlagKind::Command) {
        let name = flags.qualified_name(flag);
        match flags.flag_args(&name) {
            Some(args) => println!("  {name}: {}", args.join(" ")),
            None => println!("  {name}: not given"),
        }
    }

    println!("\n=== Values ===");
    for flag in flags.flags().iter().filter(|f| f.kind == FlagKind::Arg) {
        if let Some(value) = store.get(&flag.path) {
            let source = flag.source().map(|s| s.to_string()).unwrap_or_default();
            println!("  {:<18} = {value} ({source})", flags.qualified_name(flag));
        }
    }

    let unnamed = flags.unnamed();
    if !unnamed.is_empty() {
        println!("\n=== Unnamed ===");
        println!("  {}", unnamed.join(" "));
    }

    if report_errors(&flags) {
        std::process::exit(1);
    }
}
