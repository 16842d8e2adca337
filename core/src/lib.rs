//! Declarative command-line argument binding.
//!
//! A program declares the options it accepts as a tree of fields, each
//! carrying tags (`short`, `long`, `command`, `env`, `default`, `required`,
//! `delimiter`, `description`). This crate turns those declarations into
//! flags and resolves a token list against them:
//!
//! - [`FieldDescriptor`] / [`FieldsBuilder`]: the declared field tree.
//! - [`Flag`] and [`validate_fields`]: flags built from descriptors, with
//!   type checks and per-scope name uniqueness.
//! - [`segment_commands`] / [`segment_args`]: locate commands and classify
//!   every token.
//! - [`match_args`], [`resolve_values`], [`check_required`]: bind tokens to
//!   flags, apply argument > environment > default precedence and write
//!   values through a [`Destination`].
//! - [`FlagSet`]: the facade that runs the pipeline and answers queries.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use flagset_core::*;
//!
//! let fields = FieldsBuilder::new()
//!     .value("Verbose", "bool", &[("short", "v"), ("long", "verbose")])
//!     .group("Add", &[("description", "Add files")], |g| {
//!         g.value("Files", "[]string", &[("short", "f"), ("delimiter", ",")])
//!             .value("Retries", "uint", &[("long", "retries"), ("env", "RETRIES")])
//!     })
//!     .build();
//!
//! let mut store = ValueStore::with_fields(&fields);
//! let env = HashMap::from([("RETRIES".to_string(), "3".to_string())]);
//!
//! let mut flags = FlagSet::new(&fields, ["-v", "add", "-f=a.txt,b.txt"]).unwrap();
//! flags.resolve(&mut store, &env);
//! assert!(!flags.has_errors());
//!
//! let files = flags.flag_by_name("Add.Files").unwrap();
//! assert_eq!(
//!     store.get_list(&files.path),
//!     Some(&[Scalar::Str("a.txt".into()), Scalar::Str("b.txt".into())][..])
//! );
//! let retries = flags.flag_by_name("Add.Retries").unwrap();
//! assert_eq!(retries.source(), Some(ValueSource::Env));
//! assert_eq!(store.get_u64(&retries.path), Some(3));
//! ```

mod descriptor;
mod destination;
mod error;
mod flag;
mod flagset;
mod report;
mod resolve;
mod segment;
mod types;
mod validate;

pub use descriptor::{DeclaredType, FieldDescriptor, FieldPath, FieldsBuilder};
pub use destination::{Destination, ValueStore};
pub use error::{ResolveError, SetError, ValidationError};
pub use flag::{Flag, build_flags};
pub use flagset::FlagSet;
pub use report::{FlagReport, ResolutionReport};
pub use resolve::{
    Environment, Occurrences, ProcessEnv, check_required, fold_occurrences, match_args,
    resolve_values,
};
pub use segment::{Arg, Command, segment_args, segment_commands};
pub use types::*;
pub use validate::{validate_fields, validate_flags};
