//! Translation between property maps and legacy flatmap state.
//!
//! Legacy SDK providers take configuration as Terraform-shaped JSON and keep
//! state as a flat `BTreeMap<String, String>`:
//!
//! ```text
//! name            = "web"
//! tags.%          = "1"
//! tags.env        = "prod"
//! rule.#          = "1"
//! rule.1893.port  = "80"
//! ```
//!
//! Lists and sets record their length under `.#` and maps under `.%`; set
//! elements are keyed by their hash code. An unknown collection stores the
//! unknown sentinel as its count.

use crate::diff::reader::{FieldReader, MapFieldReader};
use crate::diff::{flat_string, format_number, string_to_primitive};
use crate::error::{BridgeError, Result};
use crate::info::{self, SchemaInfo, SchemaInfos};
use crate::shim::{Elem, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::types::UNKNOWN_VARIABLE_VALUE;
use crate::value::{self, PropertyMap, PropertyValue};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use tracing::debug;

// =========================================================================
// Flatten / expand
// =========================================================================

/// Write Terraform-shaped `values` out as flatmap attributes.
pub fn flatten(values: &Map<String, Value>, schema: &SchemaMap) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for (key, value) in values {
        let field = schema
            .get(key)
            .ok_or_else(|| BridgeError::conversion(format!("unknown attribute {:?}", key)))?;
        flatten_value(&mut out, key, value, field).map_err(|e| e.with_context(key))?;
    }
    Ok(out)
}

fn element_of(schema: &Schema) -> Schema {
    match schema.elem() {
        Elem::Resource(r) => Schema::object(r.schema()),
        Elem::Schema(s) => *s,
        Elem::None => Schema::primitive(ValueType::String),
    }
}

fn is_sentinel(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == UNKNOWN_VARIABLE_VALUE)
}

fn flatten_value(out: &mut BTreeMap<String, String>, prefix: &str, value: &Value, schema: &Schema) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }

    if is_sentinel(value) {
        match schema.value_type() {
            ValueType::List | ValueType::Set => {
                out.insert(format!("{}.#", prefix), UNKNOWN_VARIABLE_VALUE.to_string());
            },
            ValueType::Map if schema.is_object() => {},
            ValueType::Map => {
                out.insert(format!("{}.%", prefix), UNKNOWN_VARIABLE_VALUE.to_string());
            },
            _ => {
                out.insert(prefix.to_string(), UNKNOWN_VARIABLE_VALUE.to_string());
            },
        }
        return Ok(());
    }

    match schema.value_type() {
        ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::String => {
            let flat = flat_string(value).ok_or_else(|| {
                BridgeError::conversion(format!("expected a {} value, got {}", schema.value_type(), value))
            })?;
            out.insert(prefix.to_string(), flat);
        },
        ValueType::Dynamic => {
            let flat = match flat_string(value) {
                Some(flat) => flat,
                None => serde_json::to_string(value)?,
            };
            out.insert(prefix.to_string(), flat);
        },
        ValueType::List => {
            let items = expect_array(value)?;
            let elem = element_of(schema);
            out.insert(format!("{}.#", prefix), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten_value(out, &format!("{}.{}", prefix, i), item, &elem)
                    .map_err(|e| e.with_context(&format!("[{}]", i)))?;
            }
        },
        ValueType::Set => {
            let items = expect_array(value)?;
            let elem = element_of(schema);
            let mut by_code = BTreeMap::new();
            for item in items {
                by_code.insert(schema.set_hash(item).to_string(), item);
            }
            out.insert(format!("{}.#", prefix), by_code.len().to_string());
            for (code, item) in by_code {
                flatten_value(out, &format!("{}.{}", prefix, code), item, &elem)?;
            }
        },
        ValueType::Map if schema.is_object() => {
            let entries = expect_object(value)?;
            let fields = schema.object_fields().unwrap_or_default();
            for (key, field) in fields.iter() {
                if let Some(v) = entries.get(key) {
                    flatten_value(out, &format!("{}.{}", prefix, key), v, field)
                        .map_err(|e| e.with_context(key))?;
                }
            }
        },
        ValueType::Map => {
            let entries = expect_object(value)?;
            let elem = element_of(schema);
            let present: Vec<_> = entries.iter().filter(|(_, v)| !v.is_null()).collect();
            out.insert(format!("{}.%", prefix), present.len().to_string());
            for (key, v) in present {
                flatten_value(out, &format!("{}.{}", prefix, key), v, &elem)
                    .map_err(|e| e.with_context(key))?;
            }
        },
        ValueType::Invalid => panic!("attribute {:?} has an invalid schema type", prefix),
    }
    Ok(())
}

fn expect_array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| BridgeError::conversion(format!("expected a list, got {}", value)))
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| BridgeError::conversion(format!("expected an object, got {}", value)))
}

/// Read every top-level attribute present in `reader`.
///
/// Computed attributes read as the unknown sentinel.
pub(crate) fn read_values<R: FieldReader>(reader: &R, schema: &SchemaMap) -> Result<Map<String, Value>> {
    let mut values = Map::new();
    for key in schema.keys() {
        let raw = reader.read_field(&[key.to_string()])?;
        if raw.computed {
            values.insert(key.to_string(), Value::String(UNKNOWN_VARIABLE_VALUE.to_string()));
        } else if raw.exists {
            values.insert(key.to_string(), raw.value);
        }
    }
    Ok(values)
}

/// Read flatmap `attrs` back into Terraform-shaped values.
pub fn expand(attrs: &BTreeMap<String, String>, schema: &SchemaMap) -> Result<Map<String, Value>> {
    read_values(&MapFieldReader::new(attrs, schema), schema)
}

// =========================================================================
// Inputs
// =========================================================================

/// Translate orchestrator properties into Terraform-shaped configuration.
///
/// Properties are renamed to attribute names and coerced to the scalar kind
/// each attribute declares. Single-item collections are wrapped back into
/// lists. A property that is absent but has an overlay default takes its
/// value from `olds` when present there, and from the default otherwise.
/// Properties without a matching attribute are dropped.
pub fn make_terraform_inputs(
    olds: Option<&PropertyMap>,
    news: &PropertyMap,
    schema_map: &SchemaMap,
    infos: &SchemaInfos,
) -> Result<Map<String, Value>> {
    let mut result = make_object(news, schema_map, infos)?;

    for (tf_name, field_info) in infos {
        let Some(default) = &field_info.default else {
            continue;
        };
        if result.contains_key(tf_name) || !schema_map.contains_key(tf_name) {
            continue;
        }
        let key = info::terraform_to_property_name(tf_name, infos);
        let prior = olds.and_then(|o| o.get(&key)).filter(|v| !v.is_null());
        let value = match (prior, schema_map.get(tf_name)) {
            (Some(prior), Some(schema)) => make_input(prior, schema, Some(field_info))?,
            _ => default.clone(),
        };
        debug!(attribute = %tf_name, "applying default");
        result.insert(tf_name.clone(), value);
    }
    Ok(result)
}

fn make_object(props: &PropertyMap, fields: &SchemaMap, infos: &SchemaInfos) -> Result<Map<String, Value>> {
    let mut result = Map::new();
    for (key, prop) in props {
        let tf_name = info::property_to_terraform_name(key, fields, infos);
        let Some(schema) = fields.get(&tf_name) else {
            debug!(property = %key, "ignoring property without an attribute");
            continue;
        };
        let value = make_input(prop, schema, infos.get(&tf_name)).map_err(|e| e.with_context(key))?;
        if !value.is_null() {
            result.insert(tf_name, value);
        }
    }
    Ok(result)
}

fn unknown_input(schema: &Schema) -> Value {
    let sentinel = Value::String(UNKNOWN_VARIABLE_VALUE.to_string());
    if schema.value_type().is_list_or_set() && !schema.supports_unknown_collections() {
        Value::Array(vec![sentinel])
    } else {
        sentinel
    }
}

fn make_input(prop: &PropertyValue, schema: &Schema, info: Option<&SchemaInfo>) -> Result<Value> {
    let prop = prop.unwrap_markers();
    if prop.is_computed() {
        return Ok(unknown_input(schema));
    }

    if info::is_max_items_one(schema, info) {
        return match prop {
            PropertyValue::Null => Ok(Value::Array(Vec::new())),
            PropertyValue::Array(_) => make_collection_input(prop, schema, info),
            single => {
                let elem = element_input(single, schema, info)?;
                Ok(Value::Array(vec![elem]))
            },
        };
    }

    match schema.value_type() {
        ValueType::List | ValueType::Set => make_collection_input(prop, schema, info),
        ValueType::Map if schema.is_object() => match prop {
            PropertyValue::Object(entries) => {
                let fields = schema.object_fields().unwrap_or_default();
                let empty = SchemaInfos::new();
                let nested = info.map_or(&empty, |i| &i.fields);
                Ok(Value::Object(make_object(entries, &fields, nested)?))
            },
            PropertyValue::Null => Ok(Value::Null),
            other => Err(BridgeError::conversion(format!(
                "expected an object, got {}",
                other.type_name()
            ))),
        },
        ValueType::Map => match prop {
            PropertyValue::Object(entries) => {
                let elem = element_of(schema);
                let elem_info = info.and_then(|i| i.elem.as_deref());
                let mut result = Map::new();
                for (key, v) in entries {
                    let converted = make_input(v, &elem, elem_info).map_err(|e| e.with_context(key))?;
                    if !converted.is_null() {
                        result.insert(key.clone(), converted);
                    }
                }
                Ok(Value::Object(result))
            },
            PropertyValue::Null => Ok(Value::Null),
            other => Err(BridgeError::conversion(format!(
                "expected a map, got {}",
                other.type_name()
            ))),
        },
        ValueType::Dynamic => Ok(value::to_json(prop)),
        value_type => make_scalar_input(prop, value_type),
    }
}

fn element_input(prop: &PropertyValue, schema: &Schema, info: Option<&SchemaInfo>) -> Result<Value> {
    match schema.elem() {
        Elem::Resource(r) => {
            let empty = SchemaInfos::new();
            let nested = info.map_or(&empty, |i| &i.fields);
            let prop = prop.unwrap_markers();
            if prop.is_computed() {
                return Ok(Value::String(UNKNOWN_VARIABLE_VALUE.to_string()));
            }
            match prop {
                PropertyValue::Object(entries) => Ok(Value::Object(make_object(entries, &r.schema(), nested)?)),
                PropertyValue::Null => Ok(Value::Null),
                other => Err(BridgeError::conversion(format!(
                    "expected an object, got {}",
                    other.type_name()
                ))),
            }
        },
        Elem::Schema(s) => make_input(prop, &s, info.and_then(|i| i.elem.as_deref())),
        Elem::None => make_input(prop, &Schema::primitive(ValueType::String), None),
    }
}

fn make_collection_input(prop: &PropertyValue, schema: &Schema, info: Option<&SchemaInfo>) -> Result<Value> {
    match prop {
        PropertyValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| element_input(item, schema, info).map_err(|e| e.with_context(&format!("[{}]", i))))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        PropertyValue::Null => Ok(Value::Null),
        other => Err(BridgeError::conversion(format!(
            "expected an array, got {}",
            other.type_name()
        ))),
    }
}

fn make_scalar_input(prop: &PropertyValue, value_type: ValueType) -> Result<Value> {
    let value = match (prop, value_type) {
        (PropertyValue::Null, _) => Value::Null,
        (PropertyValue::Bool(b), ValueType::String) => Value::String(b.to_string()),
        (PropertyValue::Bool(b), _) => Value::Bool(*b),
        (PropertyValue::Number(n), ValueType::Int) if n.fract() == 0.0 => Value::from(*n as i64),
        (PropertyValue::Number(n), ValueType::String) => Value::String(format_float(*n)),
        (PropertyValue::Number(n), _) => Number::from_f64(*n)
            .map(Value::Number)
            .ok_or_else(|| BridgeError::conversion(format!("{} is not a finite number", n)))?,
        (PropertyValue::String(s), ValueType::Int | ValueType::Float | ValueType::Bool) => {
            match string_to_primitive(s, value_type) {
                Ok(parsed) if !s.is_empty() => parsed,
                _ => Value::String(s.clone()),
            }
        },
        (PropertyValue::String(s), _) => Value::String(s.clone()),
        (PropertyValue::Asset(asset), _) => asset
            .path
            .clone()
            .or_else(|| asset.text.clone())
            .or_else(|| asset.uri.clone())
            .map(Value::String)
            .unwrap_or(Value::Null),
        (PropertyValue::Archive(archive), _) => archive
            .path
            .clone()
            .or_else(|| archive.uri.clone())
            .map(Value::String)
            .ok_or_else(|| BridgeError::conversion("in-memory archives cannot be passed to a provider"))?,
        (other, _) => {
            return Err(BridgeError::conversion(format!(
                "expected a {} value, got {}",
                value_type,
                other.type_name()
            )))
        },
    };
    Ok(value)
}

pub(crate) fn format_float(n: f64) -> String {
    match Number::from_f64(n) {
        Some(num) => format_number(&num),
        None => n.to_string(),
    }
}

// =========================================================================
// Outputs
// =========================================================================

/// Translate Terraform-shaped values (as produced by [`expand`]) into
/// orchestrator properties.
///
/// Attribute names become property names, strings are parsed into the scalar
/// kind each attribute declares, single-item collections are unwrapped, the
/// unknown sentinel becomes a computed value and sensitive attributes become
/// secrets.
pub fn make_terraform_outputs(
    attrs: &Map<String, Value>,
    schema_map: &SchemaMap,
    infos: &SchemaInfos,
) -> Result<PropertyMap> {
    let mut result = PropertyMap::new();
    for (tf_name, value) in attrs {
        let Some(schema) = schema_map.get(tf_name) else {
            debug!(attribute = %tf_name, "ignoring attribute missing from the schema");
            continue;
        };
        let key = info::terraform_to_property_name(tf_name, infos);
        let prop = make_output(value, schema, infos.get(tf_name)).map_err(|e| e.with_context(&key))?;
        result.insert(key, prop);
    }
    Ok(result)
}

fn zero_output(schema: &Schema, info: Option<&SchemaInfo>) -> PropertyValue {
    if info::is_max_items_one(schema, info) {
        return match schema.elem() {
            Elem::Resource(_) => PropertyValue::Object(PropertyMap::new()),
            Elem::Schema(s) => zero_output(&s, info.and_then(|i| i.elem.as_deref())),
            Elem::None => PropertyValue::string(""),
        };
    }
    match schema.value_type() {
        ValueType::Bool => PropertyValue::Bool(false),
        ValueType::Int | ValueType::Float => PropertyValue::Number(0.0),
        ValueType::List | ValueType::Set => PropertyValue::Array(Vec::new()),
        ValueType::Map => PropertyValue::Object(PropertyMap::new()),
        _ => PropertyValue::string(""),
    }
}

fn make_output(value: &Value, schema: &Schema, info: Option<&SchemaInfo>) -> Result<PropertyValue> {
    let prop = make_output_inner(value, schema, info)?;
    if !prop.is_null() && info::is_secret(schema, info) {
        return Ok(PropertyValue::make_secret(prop));
    }
    Ok(prop)
}

fn make_output_inner(value: &Value, schema: &Schema, info: Option<&SchemaInfo>) -> Result<PropertyValue> {
    if value.is_null() {
        return Ok(PropertyValue::Null);
    }
    if is_sentinel(value) {
        return Ok(PropertyValue::make_computed(zero_output(schema, info)));
    }

    match schema.value_type() {
        ValueType::List | ValueType::Set => {
            let items = expect_array(value)?;
            let outputs = items
                .iter()
                .enumerate()
                .map(|(i, item)| element_output(item, schema, info).map_err(|e| e.with_context(&format!("[{}]", i))))
                .collect::<Result<Vec<_>>>()?;
            if info::is_max_items_one(schema, info) {
                return Ok(outputs.into_iter().next().unwrap_or(PropertyValue::Null));
            }
            Ok(PropertyValue::Array(outputs))
        },
        ValueType::Map if schema.is_object() => {
            let fields = schema.object_fields().unwrap_or_default();
            let empty = SchemaInfos::new();
            object_output(expect_object(value)?, &fields, info.map_or(&empty, |i| &i.fields))
        },
        ValueType::Map => {
            let elem = element_of(schema);
            let elem_info = info.and_then(|i| i.elem.as_deref());
            let mut result = PropertyMap::new();
            for (key, v) in expect_object(value)? {
                result.insert(key.clone(), make_output(v, &elem, elem_info).map_err(|e| e.with_context(key))?);
            }
            Ok(PropertyValue::Object(result))
        },
        ValueType::Dynamic => Ok(value::from_json(value)),
        value_type => scalar_output(value, value_type),
    }
}

fn object_output(entries: &Map<String, Value>, fields: &SchemaMap, infos: &SchemaInfos) -> Result<PropertyValue> {
    let mut result = PropertyMap::new();
    for (tf_name, v) in entries {
        let Some(field) = fields.get(tf_name) else {
            continue;
        };
        let key = info::terraform_to_property_name(tf_name, infos);
        let prop = make_output(v, field, infos.get(tf_name)).map_err(|e| e.with_context(&key))?;
        if !prop.is_null() {
            result.insert(key, prop);
        }
    }
    Ok(PropertyValue::Object(result))
}

fn element_output(value: &Value, schema: &Schema, info: Option<&SchemaInfo>) -> Result<PropertyValue> {
    match schema.elem() {
        Elem::Resource(r) => {
            if is_sentinel(value) {
                return Ok(PropertyValue::make_computed(PropertyValue::Object(PropertyMap::new())));
            }
            if value.is_null() {
                return Ok(PropertyValue::Null);
            }
            let empty = SchemaInfos::new();
            object_output(expect_object(value)?, &r.schema(), info.map_or(&empty, |i| &i.fields))
        },
        Elem::Schema(s) => make_output(value, &s, info.and_then(|i| i.elem.as_deref())),
        Elem::None => make_output(value, &Schema::primitive(ValueType::String), None),
    }
}

fn scalar_output(value: &Value, value_type: ValueType) -> Result<PropertyValue> {
    let parsed = match (value, value_type) {
        (Value::String(s), ValueType::Bool | ValueType::Int | ValueType::Float) => {
            string_to_primitive(s, value_type).map_err(|e| BridgeError::conversion(e.message().to_string()))?
        },
        (other, _) => other.clone(),
    };
    Ok(match parsed {
        Value::Bool(b) if value_type == ValueType::String => PropertyValue::String(b.to_string()),
        Value::Number(n) if value_type == ValueType::String => PropertyValue::String(format_number(&n)),
        Value::Bool(b) => PropertyValue::Bool(b),
        Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or_default()),
        Value::String(s) => PropertyValue::String(s),
        other => {
            return Err(BridgeError::conversion(format!(
                "expected a {} value, got {}",
                value_type, other
            )))
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkResource, SdkSchema};
    use crate::shim::sdkv1::v1_schema_map;
    use crate::shim::sdkv2::v2_schema_map;
    use serde_json::json;

    fn resource() -> SdkResource {
        let rule = SdkResource::new()
            .with_field("port", SdkSchema::int().required())
            .with_field("cidr", SdkSchema::string().optional());
        let network = SdkResource::new()
            .with_field("assign_public_ip", SdkSchema::bool().optional())
            .with_field("subnets", SdkSchema::list_of(SdkSchema::string()).optional());
        SdkResource::new()
            .with_field("name", SdkSchema::string().required())
            .with_field("count", SdkSchema::int().optional())
            .with_field("enabled", SdkSchema::string().optional())
            .with_field("password", SdkSchema::string().optional().sensitive())
            .with_field("arn", SdkSchema::string().computed())
            .with_field("rule", SdkSchema::set_block(rule).optional())
            .with_field("tags", SdkSchema::map_of(SdkSchema::string()).optional())
            .with_field("zones", SdkSchema::list_of(SdkSchema::string()).optional())
            .with_field(
                "network_configuration",
                SdkSchema::list_block(network).optional().with_max_items(1),
            )
    }

    #[test]
    fn test_flatten_collections() {
        let map = v2_schema_map(&resource().schema);
        let values = json!({
            "name": "web",
            "count": 2,
            "tags": {"env": "prod"},
            "zones": ["a", "b"],
            "rule": [{"port": 80, "cidr": "10.0.0.0/8"}],
        });
        let flat = flatten(values.as_object().unwrap(), &map).unwrap();

        assert_eq!(flat["name"], "web");
        assert_eq!(flat["count"], "2");
        assert_eq!(flat["tags.%"], "1");
        assert_eq!(flat["tags.env"], "prod");
        assert_eq!(flat["zones.#"], "2");
        assert_eq!(flat["zones.1"], "b");
        assert_eq!(flat["rule.#"], "1");
        let code = map.get("rule").unwrap().set_hash(&json!({"port": 80, "cidr": "10.0.0.0/8"}));
        assert_eq!(flat[&format!("rule.{}.port", code)], "80");
    }

    #[test]
    fn test_flatten_unknown_collections() {
        let map = v2_schema_map(&resource().schema);
        let values = json!({"zones": UNKNOWN_VARIABLE_VALUE, "tags": UNKNOWN_VARIABLE_VALUE});
        let flat = flatten(values.as_object().unwrap(), &map).unwrap();
        assert_eq!(flat["zones.#"], UNKNOWN_VARIABLE_VALUE);
        assert_eq!(flat["tags.%"], UNKNOWN_VARIABLE_VALUE);
    }

    #[test]
    fn test_flatten_rejects_unknown_attribute() {
        let map = v2_schema_map(&resource().schema);
        assert!(flatten(json!({"nope": 1}).as_object().unwrap(), &map).is_err());
    }

    #[test]
    fn test_expand_inverts_flatten() {
        let map = v2_schema_map(&resource().schema);
        let values = json!({
            "name": "web",
            "count": 2,
            "tags": {"env": "prod"},
            "zones": ["a", "b"],
        });
        let flat = flatten(values.as_object().unwrap(), &map).unwrap();
        let expanded = expand(&flat, &map).unwrap();
        assert_eq!(Value::Object(expanded), values);
    }

    #[test]
    fn test_inputs_rename_and_coerce() {
        let map = v2_schema_map(&resource().schema);
        let news = value::map_from_json(&json!({
            "name": "web",
            "count": "3",
            "enabled": true,
            "networkConfiguration": {"assignPublicIp": false, "subnets": ["s1"]},
            "stray": 1,
        }));
        let inputs = make_terraform_inputs(None, &news, &map, &SchemaInfos::new()).unwrap();
        assert_eq!(
            Value::Object(inputs),
            json!({
                "name": "web",
                "count": 3,
                "enabled": "true",
                "network_configuration": [{"assign_public_ip": false, "subnets": ["s1"]}],
            })
        );
    }

    #[test]
    fn test_inputs_null_max_items_one_is_empty_list() {
        let map = v2_schema_map(&resource().schema);
        let news = PropertyMap::from([("networkConfiguration".to_string(), PropertyValue::Null)]);
        let inputs = make_terraform_inputs(None, &news, &map, &SchemaInfos::new()).unwrap();
        assert_eq!(inputs["network_configuration"], json!([]));
    }

    #[test]
    fn test_inputs_unknowns() {
        let news = PropertyMap::from([
            ("name".to_string(), PropertyValue::unknown()),
            ("zones".to_string(), PropertyValue::unknown()),
        ]);
        let v2 = v2_schema_map(&resource().schema);
        let inputs = make_terraform_inputs(None, &news, &v2, &SchemaInfos::new()).unwrap();
        assert_eq!(inputs["name"], json!(UNKNOWN_VARIABLE_VALUE));
        assert_eq!(inputs["zones"], json!(UNKNOWN_VARIABLE_VALUE));

        let v1 = v1_schema_map(&resource().schema);
        let inputs = make_terraform_inputs(None, &news, &v1, &SchemaInfos::new()).unwrap();
        assert_eq!(inputs["zones"], json!([UNKNOWN_VARIABLE_VALUE]));
    }

    #[test]
    fn test_inputs_defaults_prefer_olds() {
        let map = v2_schema_map(&resource().schema);
        let infos = SchemaInfos::from([(
            "name".to_string(),
            SchemaInfo::new().with_default(json!("generated")),
        )]);
        let news = PropertyMap::new();
        let inputs = make_terraform_inputs(None, &news, &map, &infos).unwrap();
        assert_eq!(inputs["name"], json!("generated"));

        let olds = PropertyMap::from([("name".to_string(), PropertyValue::string("kept"))]);
        let inputs = make_terraform_inputs(Some(&olds), &news, &map, &infos).unwrap();
        assert_eq!(inputs["name"], json!("kept"));
    }

    #[test]
    fn test_outputs() {
        let map = v2_schema_map(&resource().schema);
        let attrs = BTreeMap::from([
            ("name".to_string(), "web".to_string()),
            ("count".to_string(), "2".to_string()),
            ("password".to_string(), "hunter2".to_string()),
            ("arn".to_string(), UNKNOWN_VARIABLE_VALUE.to_string()),
            ("network_configuration.#".to_string(), "1".to_string()),
            ("network_configuration.0.assign_public_ip".to_string(), "true".to_string()),
            ("network_configuration.0.subnets.#".to_string(), "0".to_string()),
        ]);
        let expanded = expand(&attrs, &map).unwrap();
        let outputs = make_terraform_outputs(&expanded, &map, &SchemaInfos::new()).unwrap();

        assert_eq!(outputs["name"], PropertyValue::string("web"));
        assert_eq!(outputs["count"], PropertyValue::Number(2.0));
        assert!(outputs["password"].is_secret());
        assert!(outputs["arn"].is_computed());
        let network = outputs["networkConfiguration"].as_object().unwrap();
        assert_eq!(network["assignPublicIp"], PropertyValue::Bool(true));
        assert_eq!(network["subnets"], PropertyValue::Array(Vec::new()));
    }
}
