//! Write-back of resolved values.
//!
//! The resolution engine never inspects the destination's own type system:
//! it writes a [`Value`] at a [`FieldPath`] through the [`Destination`]
//! trait. [`ValueStore`] is the provided map-backed implementation.

use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{FieldDescriptor, FieldPath};
use crate::error::SetError;
use crate::types::{Scalar, Value};

/// A place resolved values are written to.
pub trait Destination {
    /// Stores `value` in the field at `path`, replacing what was there.
    fn set(&mut self, path: &FieldPath, value: &Value) -> Result<(), SetError>;

    /// Resets the field at `path` to its unset state.
    fn clear(&mut self, path: &FieldPath) -> Result<(), SetError>;
}

/// Map-backed destination keyed by field path.
///
/// # Examples
///
/// ```
/// use flagset_core::{Destination, FieldPath, Scalar, Value, ValueStore};
///
/// let mut store = ValueStore::new();
/// let path = FieldPath::root(0);
/// store.set(&path, &Value::Scalar(Scalar::Int(8080))).unwrap();
/// assert_eq!(store.get_i64(&path), Some(8080));
///
/// store.clear(&path).unwrap();
/// assert!(store.get(&path).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: BTreeMap<FieldPath, Value>,
    known: Option<BTreeSet<FieldPath>>,
}

impl ValueStore {
    /// Creates a store that accepts any path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that only accepts the paths of the given value fields.
    pub fn with_fields(fields: &[FieldDescriptor]) -> Self {
        let known = fields
            .iter()
            .filter(|f| !f.declared_type.is_group())
            .map(|f| f.path.clone())
            .collect();
        Self {
            values: BTreeMap::new(),
            known: Some(known),
        }
    }

    fn check(&self, path: &FieldPath) -> Result<(), SetError> {
        match &self.known {
            Some(known) if !known.contains(path) => Err(SetError::UnknownPath(path.to_string())),
            _ => Ok(()),
        }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn get_bool(&self, path: &FieldPath) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    pub fn get_i64(&self, path: &FieldPath) -> Option<i64> {
        self.get(path)?.as_i64()
    }

    pub fn get_u64(&self, path: &FieldPath) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    pub fn get_f64(&self, path: &FieldPath) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    pub fn get_str(&self, path: &FieldPath) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn get_list(&self, path: &FieldPath) -> Option<&[Scalar]> {
        self.get(path)?.as_list()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &Value)> {
        self.values.iter()
    }
}

impl Destination for ValueStore {
    fn set(&mut self, path: &FieldPath, value: &Value) -> Result<(), SetError> {
        self.check(path)?;
        self.values.insert(path.clone(), value.clone());
        Ok(())
    }

    fn clear(&mut self, path: &FieldPath) -> Result<(), SetError> {
        self.check(path)?;
        self.values.remove(path);
        Ok(())
    }
}
