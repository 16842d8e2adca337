//! Manifest files declaring a field tree.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1"
//! name: git
//! fields:
//!   - name: Verbose
//!     type: bool
//!     short: v
//!     long: verbose
//!   - name: Remote
//!     description: Manage remotes
//!     fields:
//!       - name: Add
//!         fields:
//!           - name: Tags
//!             type: "[]string"
//!             long: tag
//!             delimiter: ","
//! ```
//!
//! A field without a `type` (or with `type: struct`) is a group and becomes a
//! command; every other field is a value field whose `type` must be one of
//! the supported value types.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use flagset_core::{FieldDescriptor, FieldPath};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ManifestError, Result};

/// On-disk encoding of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ManifestError::UnsupportedFormat) for any
    /// extension other than `.json`, `.yaml` or `.yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ManifestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// One declared field and, for groups, its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Value type (`int`, `[]string`, ...). Absent for groups.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSpec>,
}

impl FieldSpec {
    pub fn is_group(&self) -> bool {
        matches!(self.type_name.as_deref(), None | Some("struct"))
    }

    fn descriptor(&self, index: usize, parent: Option<&FieldPath>) -> FieldDescriptor {
        let mut field = if self.is_group() {
            FieldDescriptor::group(index, &self.name)
        } else {
            FieldDescriptor::value(index, &self.name, self.type_name.as_deref().unwrap_or_default())
        };
        if let Some(parent) = parent {
            field = field.child_of(parent);
        }

        let tags = [
            ("short", &self.short),
            ("long", &self.long),
            ("command", &self.command),
            ("description", &self.description),
            ("env", &self.env),
            ("delimiter", &self.delimiter),
            ("default", &self.default),
        ];
        for (key, value) in tags {
            if let Some(value) = value {
                field = field.tag(key, value.as_str());
            }
        }
        if self.required {
            field = field.tag("required", "true");
        }
        field
    }
}

/// A named, versioned field tree.
///
/// # Examples
///
/// ```
/// use flagset_manifest::Manifest;
///
/// let manifest = Manifest::from_json_str(
///     r#"{"version": "1", "fields": [{"name": "Port", "type": "int", "long": "port"}]}"#,
/// ).unwrap();
/// assert_eq!(manifest.descriptors()[0].tag_value("long"), "port");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl Manifest {
    /// Loads and checks a manifest, choosing JSON or YAML by extension.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ManifestError::UnsupportedFormat) for an
    /// unknown extension, [`Io`](ManifestError::Io) if the file cannot be
    /// read, [`Json`](ManifestError::Json) or [`Yaml`](ManifestError::Yaml) if
    /// parsing fails, and [`InvalidManifest`](ManifestError::InvalidManifest)
    /// for structural problems.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let reader = BufReader::new(std::fs::File::open(path)?);
        let manifest: Self = match format {
            Format::Json => serde_json::from_reader(reader)?,
            Format::Yaml => serde_yaml::from_reader(reader)?,
        };
        manifest.validate()?;
        debug!(path = %path.display(), fields = manifest.fields.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Saves the manifest, choosing JSON or YAML by extension.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ManifestError::UnsupportedFormat) for an
    /// unknown extension, [`Io`](ManifestError::Io) if the file cannot be
    /// written, or a serialization error.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let writer = BufWriter::new(std::fs::File::create(path)?);
        match format {
            Format::Json => serde_json::to_writer_pretty(writer, self)?,
            Format::Yaml => serde_yaml::to_writer(writer, self)?,
        }
        Ok(())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(s)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(s)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks manifest structure.
    ///
    /// Flag-level problems (unsupported types, duplicate names) are left to
    /// [`flagset_core::validate_fields`] on [`descriptors`](Manifest::descriptors).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidManifest`](ManifestError::InvalidManifest) for an empty
    /// version, a field without a name, or a value field with nested fields.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(ManifestError::InvalidManifest("version is empty".into()));
        }
        check_fields(&self.fields, "")
    }

    /// Flattens the field tree into descriptors, depth-first.
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        let mut out = Vec::new();
        flatten(&self.fields, None, &mut out);
        out
    }
}

fn check_fields(fields: &[FieldSpec], scope: &str) -> Result<()> {
    for (index, field) in fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            return Err(ManifestError::InvalidManifest(format!(
                "field {index} in {} has no name",
                if scope.is_empty() { "manifest" } else { scope }
            )));
        }

        let qualified = if scope.is_empty() {
            field.name.clone()
        } else {
            format!("{scope}.{}", field.name)
        };
        if !field.is_group() && !field.fields.is_empty() {
            return Err(ManifestError::InvalidManifest(format!(
                "field {qualified} has type {} and nested fields",
                field.type_name.as_deref().unwrap_or_default()
            )));
        }
        check_fields(&field.fields, &qualified)?;
    }
    Ok(())
}

fn flatten(fields: &[FieldSpec], parent: Option<&FieldPath>, out: &mut Vec<FieldDescriptor>) {
    for (index, field) in fields.iter().enumerate() {
        let descriptor = field.descriptor(index, parent);
        let path = descriptor.path.clone();
        out.push(descriptor);
        flatten(&field.fields, Some(&path), out);
    }
}
