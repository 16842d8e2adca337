//! Structural validation of declared flags.
//!
//! Catches problems that make a declaration unusable before any argument is
//! looked at: unsupported value types, short names longer than one character,
//! and short/long/command names reused within the same scope. Names only
//! need to be unique among flags sharing a parent, so sub-commands may reuse
//! the names of their parent's flags.
//!
//! # Examples
//!
//! ```
//! use flagset_core::{FieldsBuilder, ValidationError, validate_fields};
//!
//! let fields = FieldsBuilder::new()
//!     .value("Verbose", "bool", &[("short", "v")])
//!     .group("Serve", &[], |g| g.value("Verbose", "bool", &[("short", "v")]))
//!     .build();
//! assert!(validate_fields(&fields).is_empty());
//!
//! let fields = FieldsBuilder::new()
//!     .value("Verbose", "bool", &[("short", "v")])
//!     .value("Version", "bool", &[("short", "v")])
//!     .build();
//! let errors = validate_fields(&fields);
//! assert!(matches!(errors[0], ValidationError::DuplicateShort { .. }));
//! ```

use std::collections::HashMap;

use crate::descriptor::{FieldDescriptor, FieldPath};
use crate::error::ValidationError;
use crate::flag::{Flag, check_descriptors, descriptor_to_flag};

/// Validates descriptors and the flags they declare, returning every problem found.
///
/// Descriptor integrity problems (duplicate paths, missing or non-group
/// parents) are reported alone since flags cannot be built reliably after them.
pub fn validate_fields(fields: &[FieldDescriptor]) -> Vec<ValidationError> {
    if let Err(err) = check_descriptors(fields) {
        return vec![err];
    }

    let mut errors = Vec::new();
    let mut flags = Vec::new();
    for field in fields {
        match descriptor_to_flag(field) {
            Ok(Some(flag)) => flags.push(flag),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    errors.extend(validate_flags(&flags));
    errors
}

/// Checks name lengths and per-scope uniqueness of short, long and command names.
pub fn validate_flags(flags: &[Flag]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut shorts: HashMap<(Option<&FieldPath>, &str), &str> = HashMap::new();
    let mut longs: HashMap<(Option<&FieldPath>, &str), &str> = HashMap::new();
    let mut commands: HashMap<(Option<&FieldPath>, &str), &str> = HashMap::new();

    for flag in flags {
        let scope = flag.parent_path.as_ref();

        if !flag.short.is_empty() {
            if let Some(existing) = shorts.get(&(scope, flag.short.as_str())) {
                errors.push(ValidationError::DuplicateShort {
                    short: flag.short.clone(),
                    field: flag.name.clone(),
                    existing: (*existing).to_string(),
                });
            } else if flag.short.chars().count() > 1 {
                errors.push(ValidationError::ShortTooLong {
                    short: flag.short.clone(),
                    field: flag.name.clone(),
                });
            } else {
                shorts.insert((scope, flag.short.as_str()), flag.name.as_str());
            }
        }

        if !flag.long.is_empty() {
            if let Some(existing) = longs.get(&(scope, flag.long.as_str())) {
                errors.push(ValidationError::DuplicateLong {
                    long: flag.long.clone(),
                    field: flag.name.clone(),
                    existing: (*existing).to_string(),
                });
            } else {
                longs.insert((scope, flag.long.as_str()), flag.name.as_str());
            }
        }

        if !flag.command.is_empty() {
            if let Some(existing) = commands.get(&(scope, flag.command.as_str())) {
                errors.push(ValidationError::DuplicateCommand {
                    command: flag.command.clone(),
                    field: flag.name.clone(),
                    existing: (*existing).to_string(),
                });
            } else {
                commands.insert((scope, flag.command.as_str()), flag.name.as_str());
            }
        }
    }

    errors
}
