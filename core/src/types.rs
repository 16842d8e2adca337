//! Value types, coerced values and classification tags.
//!
//! Flags declare one of a fixed set of value types: seven scalars and their
//! list forms. Raw strings from arguments, the environment or defaults are
//! turned into [`Value`]s by [`coerce`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ValidationError};

/// Scalar value types.
///
/// # Examples
///
/// ```
/// use flagset_core::ScalarType;
///
/// assert_eq!("uint64".parse::<ScalarType>(), Ok(ScalarType::Uint64));
/// assert_eq!(ScalarType::Float64.to_string(), "float64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Float64,
    Int,
    Int64,
    Uint,
    Uint64,
    String,
}

impl ScalarType {
    pub const ALL: [ScalarType; 7] = [
        Self::Bool,
        Self::Float64,
        Self::Int,
        Self::Int64,
        Self::Uint,
        Self::Uint64,
        Self::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Float64 => "float64",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint64 => "uint64",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ValidationError::UnsupportedType {
                type_name: s.to_string(),
            })
    }
}

/// Declared type of a flag.
///
/// # Examples
///
/// ```
/// use flagset_core::{ScalarType, ValueType};
///
/// let vt: ValueType = "[]int64".parse().unwrap();
/// assert_eq!(vt, ValueType::List(ScalarType::Int64));
/// assert!(vt.is_list());
/// assert!("map[string]int".parse::<ValueType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// A single value.
    Scalar(ScalarType),
    /// A sequence of values, one or more per occurrence.
    List(ScalarType),
    /// A nested group; the type of every command flag.
    Group,
}

impl ValueType {
    /// Names of all bindable value types, scalars first.
    pub fn supported_names() -> Vec<String> {
        ScalarType::ALL
            .iter()
            .map(|t| t.name().to_string())
            .chain(ScalarType::ALL.iter().map(|t| format!("[]{}", t.name())))
            .collect()
    }

    /// Element type of a scalar or list, `None` for groups.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            Self::Scalar(t) | Self::List(t) => Some(t),
            Self::Group => None,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_bool(self) -> bool {
        self.scalar() == Some(ScalarType::Bool)
    }

    pub fn is_string(self) -> bool {
        self.scalar() == Some(ScalarType::String)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(t) => write!(f, "{t}"),
            Self::List(t) => write!(f, "[]{t}"),
            Self::Group => f.write_str("struct"),
        }
    }
}

impl FromStr for ValueType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || ValidationError::UnsupportedType {
            type_name: s.to_string(),
        };
        match s.strip_prefix("[]") {
            Some(elem) => elem
                .parse::<ScalarType>()
                .map(Self::List)
                .map_err(|_| unsupported()),
            None => s.parse::<ScalarType>().map(Self::Scalar),
        }
    }
}

/// A coerced scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// A resolved flag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Self::List(items) => Some(items),
            Self::Scalar(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()? {
            Scalar::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()? {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.as_scalar()? {
            Scalar::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_scalar()? {
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.as_scalar()? {
            Scalar::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
        }
    }
}

/// Coerces a raw literal into `scalar`.
///
/// Returns `Ok(None)` when a numeric type receives an empty literal: there is
/// nothing to write, and no error either. `bool` accepts only `true` and
/// `false`.
///
/// # Examples
///
/// ```
/// use flagset_core::{coerce, Scalar, ScalarType};
///
/// assert_eq!(coerce(ScalarType::Int, "-42").unwrap(), Some(Scalar::Int(-42)));
/// assert_eq!(coerce(ScalarType::Uint, "").unwrap(), None);
/// assert!(coerce(ScalarType::Bool, "yes").is_err());
/// ```
pub fn coerce(scalar: ScalarType, literal: &str) -> Result<Option<Scalar>, ResolveError> {
    let invalid = || ResolveError::InvalidValue {
        literal: literal.to_string(),
        scalar,
    };

    let value = match scalar {
        ScalarType::Bool => match literal {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            _ => return Err(invalid()),
        },
        ScalarType::String => Scalar::Str(literal.to_string()),
        _ if literal.is_empty() => return Ok(None),
        ScalarType::Float64 => Scalar::Float(literal.parse::<f64>().map_err(|_| invalid())?),
        ScalarType::Int | ScalarType::Int64 => {
            Scalar::Int(literal.parse::<i64>().map_err(|_| invalid())?)
        }
        ScalarType::Uint | ScalarType::Uint64 => {
            Scalar::Uint(literal.parse::<u64>().map_err(|_| invalid())?)
        }
    };

    Ok(Some(value))
}

/// Which source supplied a flag's final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// At least one matching argument occurrence exists.
    Arg,
    /// The declared environment variable was set.
    Env,
    /// The declared default was used.
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Arg => "arg",
            Self::Env => "env",
            Self::Default => "default",
        })
    }
}

/// Kind of a declared flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// A bindable leaf.
    Arg,
    /// A nested command scope.
    Command,
}

/// Classification of a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// The occurrence of a declared command.
    Command,
    /// A flag-like or unnamed token.
    Arg,
    /// A token consumed as the value of the preceding flag token.
    ArgVal,
}
