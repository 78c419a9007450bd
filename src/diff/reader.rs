//! Field readers over flatmap state.
//!
//! A reader resolves an address such as `["rule", "0", "port"]` against the
//! resource schema and returns the typed value stored there. The
//! [`DiffFieldReader`] layers an [`InstanceDiff`] over a source reader so
//! callers see the state as it will be after the diff is applied.

use super::hashset::HashedSet;
use super::{string_to_primitive, zero_value};
use crate::error::{BridgeError, Result};
use crate::shim::{Elem, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::types::{InstanceDiff, UNKNOWN_VARIABLE_VALUE};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// The outcome of reading one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReadResult {
    /// The value read. `Null` when the field does not exist.
    pub value: Value,
    /// The field is present.
    pub exists: bool,
    /// The field is not known until apply.
    pub computed: bool,
}

impl FieldReadResult {
    fn missing() -> Self {
        Self {
            value: Value::Null,
            exists: false,
            computed: false,
        }
    }

    fn computed(value: Value) -> Self {
        Self {
            value,
            exists: true,
            computed: true,
        }
    }

    fn present(value: Value) -> Self {
        Self {
            value,
            exists: true,
            computed: false,
        }
    }

    /// The value, or the schema's zero value if there is none.
    pub fn value_or_zero(&self, schema: &Schema) -> Value {
        if self.value.is_null() {
            zero_value(schema)
        } else {
            self.value.clone()
        }
    }
}

/// Reads typed fields by address.
pub trait FieldReader {
    /// Read the field at `address`. An empty address reads the whole resource.
    fn read_field(&self, address: &[String]) -> Result<FieldReadResult>;
}

/// Readers that also report whether any nested value is computed.
trait TrackedReader {
    fn read_tracked(&self, address: &[String]) -> Result<(FieldReadResult, bool)>;
}

/// Resolve `address` to the chain of schemas it passes through.
///
/// Returns an empty chain when the address does not name a field. An empty
/// address yields the resource itself as an object schema.
pub(crate) fn addr_to_schema(address: &[String], fields: &SchemaMap) -> Vec<Schema> {
    let mut current = Schema::object(fields.clone());
    if address.is_empty() {
        return vec![current];
    }

    let mut result = Vec::with_capacity(address.len());
    let mut i = 0;
    while i < address.len() {
        let key = &address[i];
        let is_last = i + 1 == address.len();

        if current.is_object() {
            let Some(next) = current.object_fields().and_then(|f| f.get(key).cloned()) else {
                return Vec::new();
            };
            current = next;
        } else {
            match current.value_type() {
                ValueType::List | ValueType::Set => {
                    if key == "#" {
                        current = Schema::primitive(ValueType::Int);
                    } else {
                        current = match current.elem() {
                            Elem::Resource(r) => Schema::object(r.schema()),
                            Elem::Schema(s) => *s,
                            // Indexing a collection without a declared element.
                            Elem::None if is_last && key.parse::<i64>().is_ok() => {
                                Schema::primitive(ValueType::String)
                            },
                            Elem::None => return Vec::new(),
                        };
                    }
                },
                ValueType::Map => {
                    current = current
                        .elem_schema()
                        .unwrap_or_else(|| Schema::primitive(ValueType::String));
                },
                _ => return Vec::new(),
            }
        }
        result.push(current.clone());
        i += 1;
    }
    result
}

fn push(address: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut next = Vec::with_capacity(address.len() + 1);
    next.extend_from_slice(address);
    next.push(segment.into());
    next
}

fn read_list_field<R: TrackedReader + ?Sized>(
    reader: &R,
    address: &[String],
) -> Result<(FieldReadResult, bool)> {
    let mut padded = push(address, "#");
    let (count, _) = reader.read_tracked(&padded)?;
    let len = if count.exists {
        count.value.as_i64().unwrap_or_default().max(0) as usize
    } else {
        0
    };

    if count.computed || len == 0 {
        let result = FieldReadResult {
            value: Value::Array(Vec::new()),
            exists: count.exists,
            computed: count.computed,
        };
        return Ok((result, count.computed));
    }

    let mut items = Vec::with_capacity(len);
    let mut contains_computed = false;
    for i in 0..len {
        if let Some(last) = padded.last_mut() {
            *last = i.to_string();
        }
        let (raw, element_computed) = reader.read_tracked(&padded)?;
        items.push(if raw.computed {
            Value::String(UNKNOWN_VARIABLE_VALUE.to_string())
        } else {
            raw.value
        });
        contains_computed |= element_computed;
    }
    Ok((FieldReadResult::present(Value::Array(items)), contains_computed))
}

fn read_object_field<R: TrackedReader + ?Sized>(
    reader: &R,
    address: &[String],
    fields: &SchemaMap,
) -> Result<(FieldReadResult, bool)> {
    let mut result = Map::new();
    let mut exists = false;
    let mut contains_computed = false;
    for (field, schema) in fields.iter() {
        let (raw, field_computed) = reader.read_tracked(&push(address, field))?;
        exists |= raw.exists;
        let value = if raw.computed {
            Value::String(UNKNOWN_VARIABLE_VALUE.to_string())
        } else {
            raw.value_or_zero(schema)
        };
        result.insert(field.to_string(), value);
        contains_computed |= field_computed;
    }
    let result = FieldReadResult {
        value: Value::Object(result),
        exists,
        computed: false,
    };
    Ok((result, contains_computed))
}

fn map_values_to_primitive(values: &mut Map<String, Value>, schema: &Schema) -> Result<()> {
    let elem_type = schema
        .elem_schema()
        .map(|s| s.value_type())
        .unwrap_or(ValueType::String);
    if !matches!(elem_type, ValueType::Int | ValueType::Float | ValueType::Bool) {
        return Ok(());
    }
    for value in values.values_mut() {
        let parsed = match value {
            Value::String(s) if s != UNKNOWN_VARIABLE_VALUE => string_to_primitive(s, elem_type)?,
            _ => continue,
        };
        *value = parsed;
    }
    Ok(())
}

/// Reads fields from flatmap attributes.
#[derive(Debug, Clone, Copy)]
pub struct MapFieldReader<'a> {
    attributes: &'a BTreeMap<String, String>,
    schema: &'a SchemaMap,
}

impl<'a> MapFieldReader<'a> {
    /// Read `attributes` laid out according to `schema`.
    pub fn new(attributes: &'a BTreeMap<String, String>, schema: &'a SchemaMap) -> Self {
        Self { attributes, schema }
    }

    fn with_prefix<'s>(&'s self, prefix: &'s str) -> impl Iterator<Item = (&'a String, &'a String)> + 's {
        self.attributes
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    fn read_primitive(&self, address: &[String], value_type: ValueType) -> Result<FieldReadResult> {
        match self.attributes.get(&address.join(".")) {
            None => Ok(FieldReadResult::missing()),
            Some(v) if v == UNKNOWN_VARIABLE_VALUE => Ok(FieldReadResult::computed(Value::Null)),
            Some(v) => Ok(FieldReadResult::present(string_to_primitive(v, value_type)?)),
        }
    }

    fn read_map(&self, address: &[String], schema: &Schema) -> Result<FieldReadResult> {
        let key = address.join(".");
        let prefix = format!("{}.", key);
        let mut result = Map::new();
        let mut result_set = self.attributes.get(&key).is_some_and(|v| v.is_empty());

        if self
            .attributes
            .get(&format!("{}%", prefix))
            .is_some_and(|v| v == UNKNOWN_VARIABLE_VALUE)
        {
            return Ok(FieldReadResult::computed(Value::Object(result)));
        }

        for (k, v) in self.with_prefix(&prefix) {
            result_set = true;
            let sub = &k[prefix.len()..];
            if sub != "%" && sub != "#" {
                result.insert(sub.to_string(), Value::String(v.clone()));
            }
        }
        map_values_to_primitive(&mut result, schema)?;

        Ok(FieldReadResult {
            value: if result_set { Value::Object(result) } else { Value::Null },
            exists: result_set,
            computed: false,
        })
    }

    fn read_set(&self, address: &[String], schema: &Schema) -> Result<FieldReadResult> {
        let count = self.read_primitive(&push(address, "#"), ValueType::Int)?;
        if !count.exists {
            return Ok(FieldReadResult {
                value: Value::Array(Vec::new()),
                exists: false,
                computed: false,
            });
        }
        if count.computed {
            return Ok(FieldReadResult::computed(Value::Array(Vec::new())));
        }
        if count.value.as_i64().unwrap_or_default() == 0 {
            return Ok(FieldReadResult::present(Value::Array(Vec::new())));
        }

        let prefix = format!("{}.", address.join("."));
        let codes: BTreeSet<&str> = self
            .with_prefix(&prefix)
            .map(|(k, _)| &k[prefix.len()..])
            .filter(|rest| !rest.starts_with('#'))
            .map(|rest| rest.split('.').next().unwrap_or(rest))
            .collect();

        let mut set = HashedSet::new();
        for code in codes {
            let raw = self.read_field(&push(address, code))?;
            if !raw.exists {
                return Err(BridgeError::Diff(format!("missing field in set: {}{}", prefix, code)));
            }
            set.add(schema, raw.value);
        }
        Ok(FieldReadResult::present(set.into_value()))
    }
}

impl TrackedReader for MapFieldReader<'_> {
    fn read_tracked(&self, address: &[String]) -> Result<(FieldReadResult, bool)> {
        let chain = addr_to_schema(address, self.schema);
        let Some(schema) = chain.last() else {
            return Ok((FieldReadResult::missing(), false));
        };
        let result = match schema.value_type() {
            ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::String => {
                self.read_primitive(address, schema.value_type())?
            },
            ValueType::Dynamic => self.read_primitive(address, ValueType::String)?,
            ValueType::List => return read_list_field(self, address),
            ValueType::Map if schema.is_object() => {
                let fields = schema.object_fields().unwrap_or_default();
                return read_object_field(self, address, &fields);
            },
            ValueType::Map => self.read_map(address, schema)?,
            ValueType::Set => self.read_set(address, schema)?,
            ValueType::Invalid => panic!("field {:?} has an invalid schema type", address.join(".")),
        };
        let computed = result.computed;
        Ok((result, computed))
    }
}

impl FieldReader for MapFieldReader<'_> {
    fn read_field(&self, address: &[String]) -> Result<FieldReadResult> {
        self.read_tracked(address).map(|(result, _)| result)
    }
}

/// Reads fields as they will be once `diff` is applied to `source`.
///
/// `source` must be the state the diff was computed from.
#[derive(Debug, Clone)]
pub struct DiffFieldReader<'a, R> {
    diff: &'a InstanceDiff,
    source: R,
    schema: &'a SchemaMap,
}

impl<'a, R: FieldReader> DiffFieldReader<'a, R> {
    /// Layer `diff` over `source`.
    pub fn new(diff: &'a InstanceDiff, source: R, schema: &'a SchemaMap) -> Self {
        Self { diff, source, schema }
    }

    fn diff_with_prefix<'s>(
        &'s self,
        prefix: &'s str,
    ) -> impl Iterator<Item = (&'a String, &'a crate::types::ResourceAttrDiff)> + 's {
        self.diff
            .attributes
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    fn read_primitive(&self, address: &[String], value_type: ValueType) -> Result<(FieldReadResult, bool)> {
        let mut result = self.source.read_field(address)?;
        let Some(attr) = self.diff.attributes.get(&address.join(".")) else {
            let computed = result.computed;
            return Ok((result, computed));
        };
        if attr.new_removed {
            return Ok((FieldReadResult::missing(), false));
        }

        let mut value = String::new();
        if !attr.new_computed {
            value = attr
                .new_extra
                .as_ref()
                .and_then(super::flat_string)
                .unwrap_or_else(|| attr.new.clone());
        }
        result.computed = attr.new_computed;
        result.exists = true;
        result.value = if attr.new_computed {
            Value::Null
        } else {
            string_to_primitive(&value, value_type)?
        };
        Ok((result, attr.new_computed))
    }

    fn read_map(&self, address: &[String], schema: &Schema) -> Result<(FieldReadResult, bool)> {
        let mut result = Map::new();
        let mut result_set = false;
        let mut contains_computed = false;

        let source = self.source.read_field(address)?;
        if source.exists {
            if let Value::Object(existing) = source.value {
                result = existing;
            }
            result_set = true;
        }

        let prefix = format!("{}.", address.join("."));
        for (k, attr) in self.diff_with_prefix(&prefix) {
            let sub = &k[prefix.len()..];
            if sub.starts_with('%') {
                if attr.new_computed {
                    return Ok((FieldReadResult::computed(Value::Object(result)), true));
                }
                continue;
            }

            result_set = true;
            if attr.new_removed {
                result.remove(sub);
            } else if attr.new_computed {
                result.insert(
                    sub.to_string(),
                    Value::String(UNKNOWN_VARIABLE_VALUE.to_string()),
                );
                contains_computed = true;
            } else {
                result.insert(sub.to_string(), Value::String(attr.new.clone()));
            }
        }
        map_values_to_primitive(&mut result, schema)?;

        let result = FieldReadResult {
            value: if result_set { Value::Object(result) } else { Value::Null },
            exists: result_set,
            computed: false,
        };
        Ok((result, contains_computed))
    }

    fn read_set(&self, address: &[String], schema: &Schema) -> Result<(FieldReadResult, bool)> {
        let prefix = format!("{}.", address.join("."));
        let mut set = HashedSet::new();

        for (k, attr) in self.diff_with_prefix(&prefix) {
            if attr.new_removed || k.ends_with('#') {
                continue;
            }
            let rest = &k[prefix.len()..];
            let code = rest.split('.').next().unwrap_or(rest);

            if !code.starts_with('~') {
                let (raw, element_computed) = self.read_tracked(&push(address, code))?;
                if !raw.exists {
                    return Err(BridgeError::Diff(format!("missing field in set: {}.{}", k, code)));
                }
                if !element_computed {
                    set.add(schema, raw.value);
                    continue;
                }
            }

            // Membership is hash-identity-based, so one unknown element makes
            // the whole set unknown.
            tracing::debug!(set = %address.join("."), key = %k, "set element is computed; marking whole set unknown");
            return Ok((FieldReadResult::computed(set.into_value()), true));
        }

        let mut exists = !set.is_empty();
        if !exists {
            if let Some(count) = self.diff.attributes.get(&format!("{}#", prefix)) {
                if count.new_computed {
                    return Ok((FieldReadResult::computed(set.into_value()), true));
                }
                exists = true;
            }
        }

        if !exists {
            let result = self.source.read_field(address)?;
            if result.exists {
                let computed = result.computed;
                return Ok((result, computed));
            }
        }

        let result = FieldReadResult {
            value: set.into_value(),
            exists,
            computed: false,
        };
        Ok((result, false))
    }
}

impl<R: FieldReader> TrackedReader for DiffFieldReader<'_, R> {
    fn read_tracked(&self, address: &[String]) -> Result<(FieldReadResult, bool)> {
        let chain = addr_to_schema(address, self.schema);
        let Some(schema) = chain.last() else {
            return Ok((FieldReadResult::missing(), false));
        };
        match schema.value_type() {
            ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::String => {
                self.read_primitive(address, schema.value_type())
            },
            ValueType::Dynamic => self.read_primitive(address, ValueType::String),
            ValueType::List => read_list_field(self, address),
            ValueType::Map if schema.is_object() => {
                let fields = schema.object_fields().unwrap_or_default();
                read_object_field(self, address, &fields)
            },
            ValueType::Map => self.read_map(address, schema),
            ValueType::Set => self.read_set(address, schema),
            ValueType::Invalid => panic!("field {:?} has an invalid schema type", address.join(".")),
        }
    }
}

impl<R: FieldReader> FieldReader for DiffFieldReader<'_, R> {
    fn read_field(&self, address: &[String]) -> Result<FieldReadResult> {
        self.read_tracked(address).map(|(result, _)| result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkResource, SdkSchema};
    use crate::shim::sdkv2::v2_schema_map;
    use crate::types::ResourceAttrDiff;
    use serde_json::json;

    fn schema() -> SchemaMap {
        let resource = SdkResource::new()
            .with_field("name", SdkSchema::string().optional())
            .with_field("count", SdkSchema::int().optional())
            .with_field("tags", SdkSchema::map_of(SdkSchema::string()).optional())
            .with_field("ports", SdkSchema::list_of(SdkSchema::int()).optional())
            .with_field(
                "rule",
                SdkSchema::set_block(
                    SdkResource::new()
                        .with_field("port", SdkSchema::int().required())
                        .with_field("cidr", SdkSchema::string().optional()),
                )
                .optional(),
            );
        v2_schema_map(&resource.schema)
    }

    fn addr(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_addr_to_schema() {
        let schema = schema();
        let chain = addr_to_schema(&addr(&["rule", "123", "port"]), &schema);
        let types: Vec<ValueType> = chain.iter().map(|s| s.value_type()).collect();
        assert_eq!(types, vec![ValueType::Set, ValueType::Map, ValueType::Int]);

        let chain = addr_to_schema(&addr(&["ports", "#"]), &schema);
        assert_eq!(chain.last().unwrap().value_type(), ValueType::Int);

        assert!(addr_to_schema(&addr(&["name", "x"]), &schema).is_empty());
        assert!(addr_to_schema(&addr(&["missing"]), &schema).is_empty());
    }

    #[test]
    fn test_addr_to_schema_block_element_is_object() {
        let schema = schema();
        let chain = addr_to_schema(&addr(&["rule", "7"]), &schema);
        let element = chain.last().unwrap();
        assert!(element.is_object());
        let fields = element.object_fields().unwrap();
        assert!(fields.get("port").is_some());
        assert!(fields.get("cidr").is_some());
        assert!(addr_to_schema(&addr(&["rule", "7", "missing"]), &schema).is_empty());
    }

    #[test]
    fn test_map_reader_primitives_and_lists() {
        let schema = schema();
        let state = attrs(&[
            ("name", "web"),
            ("count", "3"),
            ("ports.#", "2"),
            ("ports.0", "80"),
            ("ports.1", "443"),
        ]);
        let reader = MapFieldReader::new(&state, &schema);

        assert_eq!(reader.read_field(&addr(&["name"])).unwrap().value, json!("web"));
        assert_eq!(reader.read_field(&addr(&["count"])).unwrap().value, json!(3));
        assert_eq!(
            reader.read_field(&addr(&["ports"])).unwrap().value,
            json!([80, 443])
        );

        let missing = reader.read_field(&addr(&["tags"])).unwrap();
        assert!(!missing.exists);
    }

    #[test]
    fn test_map_reader_set() {
        let schema = schema();
        let rule = schema.get("rule").unwrap();
        let code = rule.set_hash(&json!({"port": 80, "cidr": "10.0.0.0/8"}));
        let state = attrs(&[
            ("rule.#", "1"),
            (&format!("rule.{}.port", code), "80"),
            (&format!("rule.{}.cidr", code), "10.0.0.0/8"),
        ]);
        let reader = MapFieldReader::new(&state, &schema);
        let result = reader.read_field(&addr(&["rule"])).unwrap();
        assert_eq!(result.value, json!([{"port": 80, "cidr": "10.0.0.0/8"}]));
    }

    #[test]
    fn test_map_reader_whole_resource() {
        let schema = schema();
        let state = attrs(&[("name", "web")]);
        let reader = MapFieldReader::new(&state, &schema);
        let result = reader.read_field(&[]).unwrap();
        assert!(result.exists);
        assert_eq!(result.value["name"], json!("web"));
        assert_eq!(result.value["count"], json!(0));
        assert_eq!(result.value["tags"], json!({}));
    }

    #[test]
    fn test_diff_reader_overrides_primitive() {
        let schema = schema();
        let state = attrs(&[("name", "old"), ("count", "1")]);
        let diff = InstanceDiff::new()
            .with_attribute("name", ResourceAttrDiff::changed("old", "new"))
            .with_attribute("count", ResourceAttrDiff::computed("1"));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);

        assert_eq!(reader.read_field(&addr(&["name"])).unwrap().value, json!("new"));
        assert!(reader.read_field(&addr(&["count"])).unwrap().computed);
    }

    #[test]
    fn test_diff_reader_removed_primitive() {
        let schema = schema();
        let state = attrs(&[("name", "old")]);
        let diff = InstanceDiff::new().with_attribute("name", ResourceAttrDiff::removed("old"));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        assert!(!reader.read_field(&addr(&["name"])).unwrap().exists);
    }

    #[test]
    fn test_diff_reader_map_overlay() {
        let schema = schema();
        let state = attrs(&[("tags.%", "2"), ("tags.a", "1"), ("tags.b", "2")]);
        let diff = InstanceDiff::new()
            .with_attribute("tags.a", ResourceAttrDiff::removed("1"))
            .with_attribute("tags.c", ResourceAttrDiff::changed("", "3"))
            .with_attribute("tags.d", ResourceAttrDiff::computed(""));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        let result = reader.read_field(&addr(&["tags"])).unwrap();
        assert_eq!(
            result.value,
            json!({"b": "2", "c": "3", "d": UNKNOWN_VARIABLE_VALUE})
        );
        assert!(!result.computed);
    }

    #[test]
    fn test_diff_reader_computed_map_count() {
        let schema = schema();
        let state = BTreeMap::new();
        let diff = InstanceDiff::new().with_attribute("tags.%", ResourceAttrDiff::computed(""));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        assert!(reader.read_field(&addr(&["tags"])).unwrap().computed);
    }

    #[test]
    fn test_diff_reader_computed_set_element_makes_set_computed() {
        let schema = schema();
        let state = BTreeMap::new();
        let diff = InstanceDiff::new()
            .with_attribute("rule.#", ResourceAttrDiff::changed("0", "2"))
            .with_attribute("rule.1111.port", ResourceAttrDiff::changed("", "80"))
            .with_attribute("rule.1111.cidr", ResourceAttrDiff::changed("", "10.0.0.0/8"))
            .with_attribute("rule.2222.port", ResourceAttrDiff::changed("", "443"))
            .with_attribute("rule.2222.cidr", ResourceAttrDiff::computed(""));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        let result = reader.read_field(&addr(&["rule"])).unwrap();
        assert!(result.computed);
        assert!(result.exists);
    }

    #[test]
    fn test_diff_reader_tilde_index_makes_set_computed() {
        let schema = schema();
        let state = BTreeMap::new();
        let diff = InstanceDiff::new()
            .with_attribute("rule.~42.port", ResourceAttrDiff::changed("", "80"));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        assert!(reader.read_field(&addr(&["rule"])).unwrap().computed);
    }

    #[test]
    fn test_diff_reader_list_count_computed() {
        let schema = schema();
        let state = attrs(&[("ports.#", "1"), ("ports.0", "80")]);
        let diff = InstanceDiff::new().with_attribute("ports.#", ResourceAttrDiff::computed("1"));
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        let result = reader.read_field(&addr(&["ports"])).unwrap();
        assert!(result.computed);
        assert_eq!(result.value, json!([]));
    }

    #[test]
    fn test_diff_reader_set_falls_back_to_source() {
        let schema = schema();
        let rule = schema.get("rule").unwrap();
        let code = rule.set_hash(&json!({"port": 22}));
        let state = attrs(&[
            ("rule.#", "1"),
            (&format!("rule.{}.port", code), "22"),
            (&format!("rule.{}.cidr", code), ""),
        ]);
        let diff = InstanceDiff::new();
        let reader = DiffFieldReader::new(&diff, MapFieldReader::new(&state, &schema), &schema);
        let result = reader.read_field(&addr(&["rule"])).unwrap();
        assert_eq!(result.value, json!([{"port": 22, "cidr": ""}]));
    }
}
