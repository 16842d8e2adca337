//! Field descriptors: the structural input of a [`FlagSet`](crate::FlagSet).
//!
//! A descriptor names one field of the destination, where it lives
//! ([`FieldPath`]), which group it is nested in, its declared type and the raw
//! tag strings attached to it. Descriptors are produced ahead of the core by
//! whatever mechanism knows the destination's shape: a manifest file, a derive
//! macro, or the [`FieldsBuilder`] registration API below.
//!
//! # Examples
//!
//! ```
//! use flagset_core::FieldsBuilder;
//!
//! let fields = FieldsBuilder::new()
//!     .value("Verbose", "bool", &[("short", "v"), ("long", "verbose")])
//!     .group("Serve", &[], |g| {
//!         g.value("Port", "int", &[("long", "port"), ("default", "8080")])
//!     })
//!     .build();
//!
//! assert_eq!(fields.len(), 3);
//! assert_eq!(fields[2].path.to_string(), "1.0");
//! assert_eq!(fields[2].parent.as_ref().unwrap().to_string(), "1");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural path of a field: the position of each enclosing field, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPath(pub Vec<usize>);

impl FieldPath {
    /// Creates a top-level path.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Returns the path of the `index`-th child of this path.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Returns the enclosing path, or `None` for a top-level path.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl From<Vec<usize>> for FieldPath {
    fn from(value: Vec<usize>) -> Self {
        Self(value)
    }
}

/// Type declared for a field, before it is checked against the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclaredType {
    /// A nested group of fields. Groups become sub-commands.
    Group,
    /// A value type name such as `int` or `[]string`.
    Named(String),
}

impl DeclaredType {
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("struct"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// One field of the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Where the field lives.
    pub path: FieldPath,
    /// Path of the enclosing group, `None` for top-level fields.
    pub parent: Option<FieldPath>,
    /// Field name, used for dotted lookups (`Serve.Port`).
    pub name: String,
    /// Declared type.
    pub declared_type: DeclaredType,
    /// Raw tag strings (`short`, `long`, `command`, `env`, ...).
    pub tags: BTreeMap<String, String>,
}

impl FieldDescriptor {
    /// Creates a top-level value field.
    pub fn value(index: usize, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            path: FieldPath::root(index),
            parent: None,
            name: name.into(),
            declared_type: DeclaredType::Named(type_name.into()),
            tags: BTreeMap::new(),
        }
    }

    /// Creates a top-level group field.
    pub fn group(index: usize, name: impl Into<String>) -> Self {
        Self {
            path: FieldPath::root(index),
            parent: None,
            name: name.into(),
            declared_type: DeclaredType::Group,
            tags: BTreeMap::new(),
        }
    }

    /// Re-roots this descriptor under `parent`, keeping its own index.
    pub fn child_of(mut self, parent: &FieldPath) -> Self {
        let index = self.path.0.last().copied().unwrap_or_default();
        self.path = parent.child(index);
        self.parent = Some(parent.clone());
        self
    }

    /// Adds a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Returns a tag value, or an empty string when the tag is absent.
    pub fn tag_value(&self, key: &str) -> &str {
        self.tags.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Registration builder that assigns field paths automatically.
///
/// Fields are emitted depth-first, so a group always precedes its children.
#[derive(Debug, Default)]
pub struct FieldsBuilder {
    parent: Option<FieldPath>,
    next_index: usize,
    fields: Vec<FieldDescriptor>,
}

impl FieldsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_path(&mut self) -> FieldPath {
        let index = self.next_index;
        self.next_index += 1;
        match &self.parent {
            Some(parent) => parent.child(index),
            None => FieldPath::root(index),
        }
    }

    /// Registers a value field with the given tags.
    pub fn value(mut self, name: &str, type_name: &str, tags: &[(&str, &str)]) -> Self {
        let path = self.next_path();
        self.fields.push(FieldDescriptor {
            path,
            parent: self.parent.clone(),
            name: name.to_string(),
            declared_type: DeclaredType::Named(type_name.to_string()),
            tags: to_tags(tags),
        });
        self
    }

    /// Registers a group field and its children.
    pub fn group(
        mut self,
        name: &str,
        tags: &[(&str, &str)],
        children: impl FnOnce(FieldsBuilder) -> FieldsBuilder,
    ) -> Self {
        let path = self.next_path();
        self.fields.push(FieldDescriptor {
            path: path.clone(),
            parent: self.parent.clone(),
            name: name.to_string(),
            declared_type: DeclaredType::Group,
            tags: to_tags(tags),
        });

        let nested = children(FieldsBuilder {
            parent: Some(path),
            next_index: 0,
            fields: Vec::new(),
        });
        self.fields.extend(nested.fields);
        self
    }

    pub fn build(self) -> Vec<FieldDescriptor> {
        self.fields
    }
}

fn to_tags(tags: &[(&str, &str)]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_parent_and_display() {
        let path = FieldPath::from(vec![1, 0, 2]);
        assert_eq!(path.to_string(), "1.0.2");
        assert_eq!(path.parent(), Some(FieldPath::from(vec![1, 0])));
        assert_eq!(FieldPath::root(3).parent(), None);
    }

    #[test]
    fn test_builder_emits_depth_first() {
        let fields = FieldsBuilder::new()
            .value("A", "bool", &[("short", "a")])
            .group("Cmd", &[("command", "cmd")], |g| {
                g.value("B", "int", &[("long", "bee")])
                    .group("Sub", &[], |s| s.value("C", "string", &[("long", "c")]))
            })
            .value("D", "string", &[("long", "dee")])
            .build();

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Cmd", "B", "Sub", "C", "D"]);
        assert_eq!(fields[4].path, FieldPath::from(vec![1, 1, 0]));
        assert_eq!(fields[4].parent, Some(FieldPath::from(vec![1, 1])));
        assert_eq!(fields[5].path, FieldPath::root(2));
        assert!(fields[1].declared_type.is_group());
    }

    #[test]
    fn test_descriptor_child_of() {
        let parent = FieldPath::root(0);
        let field = FieldDescriptor::value(4, "Port", "int")
            .tag("long", "port")
            .child_of(&parent);
        assert_eq!(field.path, FieldPath::from(vec![0, 4]));
        assert_eq!(field.tag_value("long"), "port");
        assert_eq!(field.tag_value("short"), "");
    }
}
