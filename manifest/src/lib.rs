//! Field declarations stored as YAML or JSON.
//!
//! A [`Manifest`] describes the same field tree a program would register with
//! [`flagset_core::FieldsBuilder`], so flag sets can be declared, checked and
//! resolved without writing Rust.
//!
//! # Quick start
//!
//! ```
//! use flagset_manifest::Manifest;
//!
//! let manifest = Manifest::from_yaml_str(r#"
//! version: "1"
//! name: app
//! fields:
//!   - name: Verbose
//!     type: bool
//!     short: v
//!   - name: Serve
//!     fields:
//!       - name: Port
//!         type: int
//!         long: port
//!         default: "8080"
//! "#).unwrap();
//!
//! let fields = manifest.descriptors();
//! assert_eq!(fields.len(), 3);
//! assert!(flagset_core::validate_fields(&fields).is_empty());
//! ```

mod error;
mod manifest;

pub use error::{ManifestError, Result};
pub use manifest::{FieldSpec, Format, Manifest};
