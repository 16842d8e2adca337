//! Serializable summary of a resolved [`FlagSet`](crate::FlagSet).

use serde::Serialize;

use crate::types::{FlagKind, Value, ValueSource};

/// Per-flag resolution outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagReport {
    /// Dotted field name (`Serve.Port`).
    pub name: String,
    pub kind: FlagKind,
    pub value_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ValueSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a caller needs to print or assert about one resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub flags: Vec<FlagReport>,
    /// Top-level tokens that named no flag.
    pub unnamed: Vec<String>,
    pub errors: Vec<String>,
}

impl ResolutionReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Flags that received a value, in declaration order.
    pub fn resolved(&self) -> impl Iterator<Item = &FlagReport> {
        self.flags.iter().filter(|f| f.value.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scalar;

    #[test]
    fn test_report_serializes_without_empty_fields() {
        let report = ResolutionReport {
            flags: vec![FlagReport {
                name: "Port".into(),
                kind: FlagKind::Arg,
                value_type: "int".into(),
                source: Some(ValueSource::Default),
                value: Some(Value::Scalar(Scalar::Int(80))),
                args: Vec::new(),
                error: None,
            }],
            unnamed: Vec::new(),
            errors: Vec::new(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["flags"][0]["value"], 80);
        assert!(json["flags"][0].get("args").is_none());
        assert!(json["flags"][0].get("error").is_none());
        assert!(report.is_ok());
        assert_eq!(report.resolved().count(), 1);
    }
}
