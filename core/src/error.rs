//! Error types for flag construction and resolution.
//!
//! Construction problems ([`ValidationError`]) are fatal and stop a
//! [`FlagSet`](crate::FlagSet) from being built. Resolution problems
//! ([`ResolveError`]) are attached to the offending flag or argument and
//! collected; they never abort the rest of the resolution.

use thiserror::Error;

use crate::types::{ScalarType, ValueType};

/// Structural errors found while building flags from field descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two descriptors share the same structural path.
    #[error("field {name} has a duplicate path {path}")]
    DuplicatePath { name: String, path: String },
    /// A descriptor names a parent path that no descriptor has.
    #[error("field {name} refers to an unknown parent {parent}")]
    UnknownParent { name: String, parent: String },
    /// A descriptor is nested under a field that is not a group.
    #[error("field {name} is nested under {parent} field which is not a group")]
    ParentNotGroup { name: String, parent: String },
    /// A short name is longer than one character.
    #[error("short argument {short} in {field} field must be one character long")]
    ShortTooLong { short: String, field: String },
    /// A short name is reused within the same scope.
    #[error("short argument {short} in {field} field is already defined in {existing} field")]
    DuplicateShort {
        short: String,
        field: String,
        existing: String,
    },
    /// A long name is reused within the same scope.
    #[error("long argument {long} in {field} field is already defined in {existing} field")]
    DuplicateLong {
        long: String,
        field: String,
        existing: String,
    },
    /// A command name is reused within the same scope.
    #[error("command {command} in {field} field is already defined in {existing} field")]
    DuplicateCommand {
        command: String,
        field: String,
        existing: String,
    },
    /// The declared type is not one of the supported value types.
    #[error("invalid type {type_name}. Supported types: {}", ValueType::supported_names().join(", "))]
    UnsupportedType { type_name: String },
}

/// Errors attached to a single argument or flag during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A flag occurrence carries no usable value (`--port`, `--verbose=`).
    #[error("argument {dash}{name} needs a value")]
    MissingValue { dash: String, name: String },
    /// A literal could not be coerced into the declared type.
    #[error("failed to parse '{literal}' as {scalar}")]
    InvalidValue { literal: String, scalar: ScalarType },
    /// A required command was not invoked.
    #[error("command {command} is required")]
    CommandRequired { command: String },
    /// A required argument received no value.
    #[error(
        "argument {flag} is required{}",
        .command.as_ref().map(|c| format!(" for {c} command")).unwrap_or_default()
    )]
    ArgumentRequired {
        flag: String,
        command: Option<String>,
    },
    /// The destination refused the value.
    #[error("flag {name} can't be set: {source}")]
    CannotSet {
        name: String,
        #[source]
        source: SetError,
    },
}

/// Errors returned by a [`Destination`](crate::Destination).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// No field exists at the path.
    #[error("no field at path {0}")]
    UnknownPath(String),
    /// The field exists but cannot hold the value.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    /// Destination-specific failure.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_message_with_and_without_command() {
        let top = ResolveError::ArgumentRequired {
            flag: "--port".into(),
            command: None,
        };
        assert_eq!(top.to_string(), "argument --port is required");

        let nested = ResolveError::ArgumentRequired {
            flag: "-p".into(),
            command: Some("serve".into()),
        };
        assert_eq!(nested.to_string(), "argument -p is required for serve command");
    }

    #[test]
    fn test_unsupported_type_lists_supported_names() {
        let err = ValidationError::UnsupportedType {
            type_name: "int32".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("invalid type int32. Supported types: bool, float64"));
        assert!(msg.ends_with("[]string"));
    }

    #[test]
    fn test_cannot_set_includes_reason() {
        let err = ResolveError::CannotSet {
            name: "Port".into(),
            source: SetError::UnknownPath("0.1".into()),
        };
        assert_eq!(err.to_string(), "flag Port can't be set: no field at path 0.1");
    }
}
