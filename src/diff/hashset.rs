//! Set element hashing in the SDK's canonical form.
//!
//! Set elements are stored in flatmap state under `<set>.<code>`, where the
//! code is a crc32 of the element serialized as `k:v;` pairs. Only
//! user-settable (required or optional) fields of an object element
//! contribute to its code.

use super::flat_string;
use crate::shim::{Elem, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use serde_json::Value;
use std::collections::BTreeMap;

/// The hash code of a string, as used for set keys.
pub fn hash_string(s: &str) -> u32 {
    crc32fast::hash(s.as_bytes())
}

/// Hash a set element declared by `elem`.
pub fn hash_value(value: &Value, elem: &Elem) -> u32 {
    let mut buf = String::new();
    match elem {
        Elem::Resource(r) => serialize_resource_for_hash(&mut buf, value, &r.schema()),
        Elem::Schema(s) => serialize_value_for_hash(&mut buf, value, s),
        Elem::None => buf.push_str(&flat_string(value).unwrap_or_default()),
    }
    hash_string(&buf)
}

/// Append the canonical serialization of `value` under `schema` to `buf`.
pub fn serialize_value_for_hash(buf: &mut String, value: &Value, schema: &Schema) {
    if value.is_null() {
        buf.push(';');
        return;
    }
    match schema.value_type() {
        ValueType::Bool => {
            let truthy = match value {
                Value::Bool(b) => *b,
                Value::String(s) => s == "true" || s == "1",
                _ => false,
            };
            buf.push(if truthy { '1' } else { '0' });
        },
        ValueType::Int => {
            let int = match value {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                _ => None,
            };
            buf.push_str(&int.unwrap_or_default().to_string());
        },
        ValueType::Float | ValueType::String | ValueType::Dynamic | ValueType::Invalid => {
            buf.push_str(&flat_string(value).unwrap_or_default());
        },
        ValueType::List => {
            buf.push('(');
            for item in value.as_array().into_iter().flatten() {
                serialize_member_for_hash(buf, item, &schema.elem());
            }
            buf.push(')');
        },
        ValueType::Map if schema.is_object() => {
            if let Some(fields) = schema.object_fields() {
                buf.push('<');
                serialize_resource_for_hash(buf, value, &fields);
                buf.push('>');
            }
        },
        ValueType::Map => {
            buf.push('[');
            if let Some(entries) = value.as_object() {
                let sorted: BTreeMap<_, _> = entries.iter().collect();
                for (k, v) in sorted {
                    if v.is_null() {
                        continue;
                    }
                    buf.push_str(k);
                    buf.push(':');
                    buf.push_str(&flat_string(v).unwrap_or_default());
                    buf.push(';');
                }
            }
            buf.push(']');
        },
        ValueType::Set => {
            buf.push('{');
            let mut members: Vec<(String, &Value)> = value
                .as_array()
                .into_iter()
                .flatten()
                .map(|item| (schema.set_hash(item).to_string(), item))
                .collect();
            members.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, item) in members {
                serialize_member_for_hash(buf, item, &schema.elem());
            }
            buf.push('}');
        },
    }
    buf.push(';');
}

fn serialize_member_for_hash(buf: &mut String, value: &Value, elem: &Elem) {
    match elem {
        Elem::Schema(s) => serialize_value_for_hash(buf, value, s),
        Elem::Resource(r) => {
            buf.push('<');
            serialize_resource_for_hash(buf, value, &r.schema());
            buf.push_str(">;");
        },
        Elem::None => serialize_value_for_hash(buf, value, &Schema::primitive(ValueType::String)),
    }
}

/// Append the canonical serialization of an object element to `buf`.
///
/// Absent fields serialize as their zero value, matching what a field reader
/// produces for them.
pub fn serialize_resource_for_hash(buf: &mut String, value: &Value, fields: &SchemaMap) {
    if value.is_null() {
        return;
    }
    for (k, schema) in fields.iter() {
        if !(schema.required() || schema.optional()) {
            continue;
        }
        buf.push_str(k);
        buf.push(':');
        match value.get(k) {
            Some(v) if !v.is_null() => serialize_value_for_hash(buf, v, schema),
            _ => serialize_value_for_hash(buf, &super::zero_value(schema), schema),
        }
    }
}

/// A set of values keyed by their hash code.
///
/// Iteration follows the string order of the codes, like the SDK's set
/// listing.
#[derive(Debug, Clone, Default)]
pub struct HashedSet {
    items: BTreeMap<String, Value>,
}

impl HashedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element of `set_schema`, returning its code.
    pub fn add(&mut self, set_schema: &Schema, value: Value) -> u32 {
        let code = set_schema.set_hash(&value);
        self.items.insert(code.to_string(), value);
        code
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element codes in listing order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// The elements as a JSON array in listing order.
    pub fn into_value(self) -> Value {
        Value::Array(self.items.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkResource, SdkSchema};
    use crate::shim::sdkv2::V2Schema;
    use serde_json::json;

    fn rule_set() -> Schema {
        Schema::V2(V2Schema::new(
            SdkSchema::set_block(
                SdkResource::new()
                    .with_field("port", SdkSchema::int().required())
                    .with_field("cidr", SdkSchema::string().optional())
                    .with_field("arn", SdkSchema::string().computed()),
            )
            .optional(),
        ))
    }

    #[test]
    fn test_hash_string() {
        assert_eq!(hash_string(""), 0);
        assert_eq!(hash_string("hello"), 0x3610a686);
    }

    #[test]
    fn test_resource_serialization_skips_computed() {
        let mut buf = String::new();
        let fields = rule_set().object_fields().unwrap();
        serialize_resource_for_hash(
            &mut buf,
            &json!({"port": 80, "cidr": "10.0.0.0/8", "arn": "x"}),
            &fields,
        );
        assert_eq!(buf, "cidr:10.0.0.0/8;port:80;");
    }

    #[test]
    fn test_absent_fields_hash_as_zero() {
        let set = rule_set();
        let explicit = set.set_hash(&json!({"port": 0, "cidr": ""}));
        let implicit = set.set_hash(&json!({}));
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_numeric_strings_hash_like_numbers() {
        let set = rule_set();
        assert_eq!(
            set.set_hash(&json!({"port": "443"})),
            set.set_hash(&json!({"port": 443}))
        );
    }

    #[test]
    fn test_primitive_set_hash() {
        let set = Schema::V2(V2Schema::new(SdkSchema::set_of(SdkSchema::string()).optional()));
        assert_eq!(set.set_hash(&json!("a")), hash_string("a;"));
    }

    #[test]
    fn test_custom_hash_wins() {
        fn constant(_: &Value) -> u32 {
            7
        }
        let set = Schema::V2(V2Schema::new(
            SdkSchema::set_of(SdkSchema::string())
                .optional()
                .with_set_hash(constant),
        ));
        assert_eq!(set.set_hash(&json!("anything")), 7);
    }

    #[test]
    fn test_hashed_set_dedups() {
        let set = Schema::V2(V2Schema::new(SdkSchema::set_of(SdkSchema::string()).optional()));
        let mut items = HashedSet::new();
        items.add(&set, json!("a"));
        items.add(&set, json!("b"));
        items.add(&set, json!("a"));
        assert_eq!(items.len(), 2);
        let codes: Vec<String> = items.codes().map(String::from).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }
}
