//! Diff engine for flatmap-state SDK providers.
//!
//! - [`hashset`]: set element hash codes.
//! - [`reader`]: field readers over flatmap state and over a diff layered on
//!   top of it.
//! - [`instance`]: computing an [`InstanceDiff`](crate::types::InstanceDiff)
//!   from state and configuration, and applying it.
//! - [`changes`]: structural patching of typed wire values.
//!
//! Values read out of flatmap state are plain [`serde_json::Value`]s: sets
//! come back as arrays in hash-code order, and a computed leaf inside a
//! collection reads as the [`UNKNOWN_VARIABLE_VALUE`](crate::types::UNKNOWN_VARIABLE_VALUE)
//! sentinel string.

pub mod changes;
pub mod hashset;
pub mod instance;
pub mod reader;

pub use changes::apply_changes;
pub use hashset::{hash_string, hash_value, HashedSet};
pub use instance::{apply_diff, diff_instance};
pub use reader::{DiffFieldReader, FieldReadResult, FieldReader, MapFieldReader};

use crate::error::{BridgeError, Result};
use crate::shim::{Schema, SchemaLike, ValueType};
use serde_json::{Map, Value};

/// Render a primitive JSON value the way flatmap state stores it.
///
/// Returns `None` for null, arrays and objects.
pub(crate) fn flat_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(format_number(n)),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or_default();
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// The value a field reads as when it is absent.
pub(crate) fn zero_value(schema: &Schema) -> Value {
    match schema.value_type() {
        ValueType::Bool => Value::Bool(false),
        ValueType::Int => Value::from(0),
        ValueType::Float => Value::from(0.0),
        ValueType::String => Value::String(String::new()),
        ValueType::List | ValueType::Set => Value::Array(Vec::new()),
        ValueType::Map => Value::Object(Map::new()),
        ValueType::Dynamic | ValueType::Invalid => Value::Null,
    }
}

/// Parse a flatmap string into the primitive `value_type` describes.
///
/// An empty string reads as the zero value.
pub(crate) fn string_to_primitive(value: &str, value_type: ValueType) -> Result<Value> {
    let invalid = |what: &str| BridgeError::Diff(format!("cannot parse {:?} as {}", value, what));
    match value_type {
        ValueType::Bool => match value {
            "" => Ok(Value::Bool(false)),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
            _ => Err(invalid("bool")),
        },
        ValueType::Int => {
            if value.is_empty() {
                return Ok(Value::from(0));
            }
            value
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid("int"))
        },
        ValueType::Float => {
            if value.is_empty() {
                return Ok(Value::from(0.0));
            }
            let parsed = value.parse::<f64>().map_err(|_| invalid("float"))?;
            serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| BridgeError::conversion(format!("{:?} is not a finite float", value)))
        },
        ValueType::String | ValueType::Dynamic => Ok(Value::String(value.to_string())),
        other => panic!("{} is not a primitive type", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_string() {
        assert_eq!(flat_string(&json!(true)).as_deref(), Some("true"));
        assert_eq!(flat_string(&json!(80)).as_deref(), Some("80"));
        assert_eq!(flat_string(&json!(2.0)).as_deref(), Some("2"));
        assert_eq!(flat_string(&json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(flat_string(&json!(null)), None);
        assert_eq!(flat_string(&json!([1])), None);
    }

    #[test]
    fn test_string_to_primitive() {
        assert_eq!(string_to_primitive("", ValueType::Int).unwrap(), json!(0));
        assert_eq!(string_to_primitive("42", ValueType::Int).unwrap(), json!(42));
        assert_eq!(string_to_primitive("true", ValueType::Bool).unwrap(), json!(true));
        assert_eq!(string_to_primitive("1.5", ValueType::Float).unwrap(), json!(1.5));
        assert!(string_to_primitive("nope", ValueType::Int).is_err());
        assert!(string_to_primitive("maybe", ValueType::Bool).is_err());
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        for raw in ["NaN", "inf", "-inf"] {
            let err = string_to_primitive(raw, ValueType::Float).unwrap_err();
            assert!(matches!(err, BridgeError::Conversion { .. }), "{}: {:?}", raw, err);
        }
    }
}
