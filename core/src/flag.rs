//! Flag model: declared destinations built from field descriptors.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::descriptor::{DeclaredType, FieldDescriptor, FieldPath};
use crate::error::{ResolveError, ValidationError};
use crate::types::{FlagKind, Value, ValueSource, ValueType};

static NAME_CLEANUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_.]+").expect("static regex must compile"));

/// A declared flag: either a bindable argument or a nested command.
#[derive(Debug, Clone)]
pub struct Flag {
    /// Position in the flag list (declaration order).
    pub id: usize,
    /// Field name.
    pub name: String,
    pub short: String,
    pub long: String,
    /// Command literal, set for command flags.
    pub command: String,
    pub description: String,
    pub required: bool,
    /// Environment variable consulted when no argument matched.
    pub env: String,
    /// Separator splitting one list occurrence into several entries.
    pub delimiter: String,
    /// Default literal, coerced when neither arguments nor environment supply a value.
    pub default: String,
    pub value_type: ValueType,
    pub kind: FlagKind,
    pub path: FieldPath,
    pub parent_path: Option<FieldPath>,
    /// Id of the parent command flag.
    pub parent_id: Option<usize>,
    /// Id of the command occurrence this flag was matched in.
    pub command_id: Option<usize>,

    pub(crate) source: Option<ValueSource>,
    pub(crate) value: Option<Value>,
    pub(crate) args: Vec<usize>,
    pub(crate) error: Option<ResolveError>,
}

impl Flag {
    /// Which source supplied the value, if any.
    pub fn source(&self) -> Option<ValueSource> {
        self.source
    }

    /// The resolved value. `None` when nothing supplied one or the argument
    /// that did carried an error.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Indices of the tokens matched to this flag, in input order.
    pub fn arg_indices(&self) -> &[usize] {
        &self.args
    }

    /// Whether any token matched this flag (for commands: whether it was invoked).
    pub fn is_matched(&self) -> bool {
        !self.args.is_empty()
    }

    pub fn error(&self) -> Option<&ResolveError> {
        self.error.as_ref()
    }

    pub fn is_command(&self) -> bool {
        self.kind == FlagKind::Command
    }

    /// Whether a token name refers to this flag.
    pub fn matches_name(&self, name: &str) -> bool {
        !name.is_empty() && (self.short == name || self.long == name)
    }

    /// Display form used in messages: `-s` when a short name exists, else `--long`.
    pub fn display_name(&self) -> String {
        if !self.short.is_empty() {
            format!("-{}", self.short)
        } else if !self.long.is_empty() {
            format!("--{}", self.long)
        } else {
            String::new()
        }
    }
}

fn clean_name(raw: &str) -> String {
    NAME_CLEANUP.replace_all(raw.trim(), "").into_owned()
}

/// Builds a flag from one descriptor, or `None` when the field is not a flag.
pub(crate) fn descriptor_to_flag(field: &FieldDescriptor) -> Result<Option<Flag>, ValidationError> {
    let (value_type, kind) = match &field.declared_type {
        DeclaredType::Group => (ValueType::Group, FlagKind::Command),
        DeclaredType::Named(name) => (name.parse::<ValueType>()?, FlagKind::Arg),
    };

    let short = clean_name(field.tag_value("short"));
    let long = clean_name(field.tag_value("long"));
    let mut command = clean_name(field.tag_value("command"));
    if kind == FlagKind::Command && command.is_empty() {
        command = field.name.to_lowercase();
    }

    if kind == FlagKind::Arg && short.is_empty() && long.is_empty() {
        return Ok(None);
    }

    Ok(Some(Flag {
        id: 0,
        name: field.name.clone(),
        short,
        long,
        command,
        description: field.tag_value("description").trim().to_string(),
        required: field.tag_value("required") == "true",
        env: field.tag_value("env").trim().to_string(),
        delimiter: field.tag_value("delimiter").to_string(),
        default: field.tag_value("default").trim().to_string(),
        value_type,
        kind,
        path: field.path.clone(),
        parent_path: field.parent.clone(),
        parent_id: None,
        command_id: None,
        source: None,
        value: None,
        args: Vec::new(),
        error: None,
    }))
}

/// Checks that paths are unique and every parent exists and is a group.
pub(crate) fn check_descriptors(fields: &[FieldDescriptor]) -> Result<(), ValidationError> {
    let mut seen: HashMap<&FieldPath, &FieldDescriptor> = HashMap::new();
    for field in fields {
        if let Some(parent) = &field.parent {
            let Some(parent_field) = seen.get(parent) else {
                return Err(ValidationError::UnknownParent {
                    name: field.name.clone(),
                    parent: parent.to_string(),
                });
            };
            if !parent_field.declared_type.is_group() {
                return Err(ValidationError::ParentNotGroup {
                    name: field.name.clone(),
                    parent: parent_field.name.clone(),
                });
            }
        }
        if seen.insert(&field.path, field).is_some() {
            return Err(ValidationError::DuplicatePath {
                name: field.name.clone(),
                path: field.path.to_string(),
            });
        }
    }
    Ok(())
}

/// Converts descriptors into flags, assigning ids in declaration order and
/// linking each flag to its parent command.
///
/// Descriptors must list a group before its children.
pub fn build_flags(fields: &[FieldDescriptor]) -> Result<Vec<Flag>, ValidationError> {
    check_descriptors(fields)?;

    let mut flags = Vec::new();
    for field in fields {
        if let Some(mut flag) = descriptor_to_flag(field)? {
            flag.id = flags.len();
            flags.push(flag);
        }
    }

    let ids: HashMap<FieldPath, usize> = flags.iter().map(|f| (f.path.clone(), f.id)).collect();
    for flag in &mut flags {
        flag.parent_id = flag.parent_path.as_ref().and_then(|p| ids.get(p).copied());
    }

    Ok(flags)
}
