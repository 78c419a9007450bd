//! Computing and applying instance diffs.
//!
//! [`diff_instance`] compares flatmap state with Terraform-shaped
//! configuration the way the helper SDK does: per-field string comparison,
//! `.#`/`.%` count entries for collections, hash-keyed set elements (prefixed
//! with `~` when they contain unknowns), and a second pass that re-plans every
//! attribute when a change forces replacement.
//!
//! [`apply_diff`] reads the resource through a [`DiffFieldReader`] and writes
//! it back out as flatmap; computed values are recorded as the unknown
//! sentinel.

use super::reader::{DiffFieldReader, FieldReader, MapFieldReader};
use super::{flat_string, zero_value};
use crate::error::{BridgeError, Result};
use crate::shim::{Elem, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::types::{
    DiffAttrType, InstanceDiff, InstanceState, ResourceAttrDiff, ResourceConfig, UNKNOWN_VARIABLE_VALUE,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Compute the diff that takes `state` to `config`.
///
/// A missing state (or one with an empty id) plans a create: computed
/// attributes without configuration become unknown.
pub fn diff_instance(
    schema: &SchemaMap,
    state: Option<&InstanceState>,
    config: &ResourceConfig,
) -> Result<InstanceDiff> {
    let empty = BTreeMap::new();
    let attributes = state.map_or(&empty, |s| &s.attributes);
    let has_id = state.is_some_and(|s| !s.id.is_empty());

    let planner = Planner {
        old: MapFieldReader::new(attributes, schema),
        attributes,
        has_id,
    };
    let mut diff = InstanceDiff::new();
    for (key, field) in schema.iter() {
        planner.diff(&mut diff, &[key.to_string()], field, config.get(key), false)?;
    }

    if has_id && diff.requires_new() {
        debug!("diff requires replacement; planning all attributes as a create");
        let fresh_planner = Planner {
            old: MapFieldReader::new(&empty, schema),
            attributes: &empty,
            has_id: false,
        };
        let mut fresh = InstanceDiff::new();
        for (key, field) in schema.iter() {
            fresh_planner.diff(&mut fresh, &[key.to_string()], field, config.get(key), true)?;
        }
        for (key, mut attr) in fresh.attributes {
            attr.requires_new = diff.attributes.get(&key).is_some_and(|d| d.requires_new);
            if let Some(old) = attributes.get(&key) {
                attr.old = old.clone();
            }
            diff.attributes.insert(key, attr);
        }
    }

    Ok(diff)
}

/// Apply `diff` to `state`, producing the planned new state.
pub fn apply_diff(
    schema: &SchemaMap,
    state: Option<&InstanceState>,
    diff: &InstanceDiff,
) -> Result<InstanceState> {
    if diff.destroy {
        return Ok(InstanceState::default());
    }

    let empty = BTreeMap::new();
    let attributes = state.map_or(&empty, |s| &s.attributes);
    let reader = DiffFieldReader::new(diff, MapFieldReader::new(attributes, schema), schema);

    let values = crate::flatmap::read_values(&reader, schema)?;
    let flat = crate::flatmap::flatten(&values, schema)?;
    let id = state
        .map(|s| s.id.clone())
        .filter(|id| !id.is_empty())
        .or_else(|| flat.get("id").cloned())
        .unwrap_or_default();
    let mut next = InstanceState::new(id, flat);
    if let Some(state) = state {
        next.meta = state.meta.clone();
    }
    Ok(next)
}

struct Planner<'a> {
    old: MapFieldReader<'a>,
    attributes: &'a BTreeMap<String, String>,
    has_id: bool,
}

fn is_unknown(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s == UNKNOWN_VARIABLE_VALUE)
}

fn contains_unknown(value: &Value) -> bool {
    match value {
        Value::String(s) => s == UNKNOWN_VARIABLE_VALUE,
        Value::Array(items) => items.iter().any(contains_unknown),
        Value::Object(entries) => entries.values().any(contains_unknown),
        _ => false,
    }
}

fn with(address: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut next = address.to_vec();
    next.push(segment.into());
    next
}

fn attr_type(schema: &Schema) -> DiffAttrType {
    if schema.optional() || schema.required() {
        DiffAttrType::Input
    } else {
        DiffAttrType::Output
    }
}

/// Settle the flags of a raw attribute diff, or drop it.
fn finalize_diff(schema: &Schema, mut d: ResourceAttrDiff) -> Option<ResourceAttrDiff> {
    if schema.force_new() {
        d.requires_new = d.old != d.new || d.new_computed;
    }
    if d.new_removed {
        return Some(d);
    }
    if schema.computed() {
        if !d.new_computed && !d.old.is_empty() && d.new.is_empty() {
            // Already computed; keep the prior value.
            return None;
        }
        if d.new.is_empty() && !d.new_computed {
            d.new_computed = true;
        }
    }
    if schema.sensitive() {
        d.sensitive = true;
    }
    d.attr_type = attr_type(schema);
    Some(d)
}

/// A schema for the `.#`/`.%` count of a collection.
fn count_schema(parent: &Schema, computed: bool) -> Schema {
    let mut decl = crate::sdk::SdkSchema::int();
    decl.optional = parent.optional();
    decl.required = parent.required();
    decl.computed = computed;
    decl.force_new = parent.force_new();
    Schema::Synthetic(crate::shim::synthetic::SyntheticSchema::new(decl))
}

/// An element schema carrying the parent collection's ForceNew.
fn element_schema(parent: &Schema, elem: Schema) -> Schema {
    if !parent.force_new() || elem.force_new() {
        return elem;
    }
    let mut decl = crate::sdk::SdkSchema::new(elem.value_type());
    decl.optional = elem.optional();
    decl.required = elem.required();
    decl.computed = elem.computed();
    decl.sensitive = elem.sensitive();
    decl.force_new = true;
    Schema::Synthetic(crate::shim::synthetic::SyntheticSchema::new(decl))
}

impl Planner<'_> {
    fn old_value(&self, address: &[String]) -> Result<Option<Value>> {
        let raw = self.old.read_field(address)?;
        Ok(if raw.computed {
            Some(Value::String(UNKNOWN_VARIABLE_VALUE.to_string()))
        } else if raw.exists {
            Some(raw.value)
        } else {
            None
        })
    }

    fn diff(
        &self,
        diff: &mut InstanceDiff,
        address: &[String],
        schema: &Schema,
        new: Option<&Value>,
        all: bool,
    ) -> Result<()> {
        let new = new.filter(|v| !v.is_null());
        match schema.value_type() {
            ValueType::Bool | ValueType::Int | ValueType::Float | ValueType::String | ValueType::Dynamic => {
                self.diff_string(diff, address, schema, new, all)
            },
            ValueType::List => self.diff_list(diff, address, schema, new, all),
            ValueType::Map if schema.is_object() => {
                let fields = schema.object_fields().unwrap_or_default();
                for (field, field_schema) in fields.iter() {
                    let value = new.and_then(|v| v.get(field));
                    self.diff(diff, &with(address, field), field_schema, value, all)?;
                }
                Ok(())
            },
            ValueType::Map => self.diff_map(diff, address, schema, new, all),
            ValueType::Set => self.diff_set(diff, address, schema, new, all),
            ValueType::Invalid => Err(BridgeError::Diff(format!(
                "{}: invalid schema type",
                address.join(".")
            ))),
        }
    }

    fn diff_string(
        &self,
        diff: &mut InstanceDiff,
        address: &[String],
        schema: &Schema,
        new: Option<&Value>,
        all: bool,
    ) -> Result<()> {
        let key = address.join(".");
        let old = self.old_value(address)?;
        let computed = is_unknown(new);

        let new = if computed {
            None
        } else {
            new.cloned().or_else(|| schema.default_value())
        };
        let new_raw = match (&new, &old) {
            (None, Some(_)) => Some(zero_value(schema)),
            _ => new.clone(),
        };

        let render = |v: &Value| flat_string(v).map_or_else(|| v.to_string(), |s| s);
        let old_str = old.as_ref().map(render).unwrap_or_default();
        let new_str = new_raw.as_ref().map(render).unwrap_or_default();

        if old_str == new_str && !all && !computed {
            if !old_str.is_empty() || self.has_id {
                return Ok(());
            }
            if !schema.computed() {
                return Ok(());
            }
        }

        let removed = old.is_some() && new.is_none() && !computed;
        if removed && schema.computed() {
            return Ok(());
        }

        let attr = ResourceAttrDiff {
            old: old_str,
            new: new_str,
            new_computed: computed,
            new_removed: removed,
            ..Default::default()
        };
        if let Some(attr) = finalize_diff(schema, attr) {
            diff.attributes.insert(key, attr);
        }
        Ok(())
    }

    fn diff_list(
        &self,
        diff: &mut InstanceDiff,
        address: &[String],
        schema: &Schema,
        new: Option<&Value>,
        all: bool,
    ) -> Result<()> {
        let key = address.join(".");
        let old = self.old_value(address)?;
        let computed_list = is_unknown(new);
        let new = if computed_list { None } else { new };

        if old.is_some() && new.is_none() && !computed_list && schema.computed() {
            return Ok(());
        }

        let old_len = old.as_ref().and_then(Value::as_array).map_or(0, Vec::len);
        let items: Vec<Value> = match new {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(BridgeError::Diff(format!(
                    "{}: expected a list, got {}",
                    key, other
                )))
            },
            None => Vec::new(),
        };
        let new_len = items.len();
        let mut old_str = old_len.to_string();

        if computed_list {
            diff.attributes.insert(
                format!("{}.#", key),
                ResourceAttrDiff {
                    old: old_str,
                    new_computed: true,
                    requires_new: schema.force_new(),
                    attr_type: attr_type(schema),
                    ..Default::default()
                },
            );
            return Ok(());
        }

        let changed = old_len != new_len;
        let computed = old_len == 0 && new_len == 0 && schema.computed();
        if changed || computed || all {
            let new_str = if computed {
                old_str = String::new();
                String::new()
            } else {
                new_len.to_string()
            };
            let count = count_schema(schema, schema.computed());
            if let Some(attr) = finalize_diff(&count, ResourceAttrDiff::changed(old_str, new_str)) {
                diff.attributes.insert(format!("{}.#", key), attr);
            }
        }

        let max_len = old_len.max(new_len);
        match schema.elem() {
            Elem::Resource(r) => {
                let fields = r.schema();
                for i in 0..max_len {
                    for (field, field_schema) in fields.iter() {
                        let value = items.get(i).and_then(|item| item.get(field));
                        let address = with(&with(address, i.to_string()), field);
                        self.diff(diff, &address, field_schema, value, all)?;
                    }
                }
            },
            Elem::Schema(elem) => {
                let elem = element_schema(schema, *elem);
                for i in 0..max_len {
                    self.diff(diff, &with(address, i.to_string()), &elem, items.get(i), all)?;
                }
            },
            Elem::None => panic!("{}: list has no element type", key),
        }
        Ok(())
    }

    fn diff_map(
        &self,
        diff: &mut InstanceDiff,
        address: &[String],
        schema: &Schema,
        new: Option<&Value>,
        all: bool,
    ) -> Result<()> {
        let key = address.join(".");
        let prefix = format!("{}.", key);

        let old = self.old_value(address)?;
        let state_exists = old.is_some();
        let mut state_map: BTreeMap<String, String> = BTreeMap::new();
        if let Some(Value::Object(entries)) = &old {
            for (k, v) in entries {
                state_map.insert(k.clone(), flat_string(v).unwrap_or_default());
            }
        }

        let mut n_computed = is_unknown(new);
        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        match new {
            Some(Value::Object(entries)) => {
                for (k, v) in entries {
                    if v.is_null() {
                        continue;
                    }
                    n_computed |= contains_unknown(v);
                    let s = flat_string(v).ok_or_else(|| {
                        BridgeError::Diff(format!("{}{}: expected a primitive map value", prefix, k))
                    })?;
                    config_map.insert(k.clone(), s);
                }
            },
            None => {},
            Some(Value::String(s)) if s == UNKNOWN_VARIABLE_VALUE => {},
            Some(other) => {
                return Err(BridgeError::Diff(format!("{}: expected a map, got {}", key, other)))
            },
        }
        let new = if is_unknown(new) { None } else { new };

        let old_len = state_map.len();
        let new_len = config_map.len();
        let mut changed = old_len != new_len;
        if old_len != 0 && new_len == 0 && schema.computed() {
            changed = false;
        }
        let computed = old_len == 0 && new_len == 0 && schema.computed() && !state_exists;

        if changed || computed || n_computed {
            let count = count_schema(schema, schema.computed() || n_computed);
            let (old_str, new_str) = if computed || n_computed {
                (String::new(), String::new())
            } else {
                (old_len.to_string(), new_len.to_string())
            };
            if let Some(attr) = finalize_diff(&count, ResourceAttrDiff::changed(old_str, new_str)) {
                diff.attributes.insert(format!("{}%", prefix), attr);
            }
        }

        if new.is_none() && schema.computed() {
            return Ok(());
        }

        for (k, v) in config_map {
            let old = state_map.remove(&k);
            if old.as_deref() == Some(v.as_str()) && !all {
                continue;
            }
            let attr = if v == UNKNOWN_VARIABLE_VALUE {
                ResourceAttrDiff::computed(old.unwrap_or_default())
            } else {
                ResourceAttrDiff::changed(old.unwrap_or_default(), v)
            };
            if let Some(attr) = finalize_diff(schema, attr) {
                diff.attributes.insert(format!("{}{}", prefix, k), attr);
            }
        }
        for (k, v) in state_map {
            if let Some(attr) = finalize_diff(schema, ResourceAttrDiff::removed(v)) {
                diff.attributes.insert(format!("{}{}", prefix, k), attr);
            }
        }
        Ok(())
    }

    fn diff_set(
        &self,
        diff: &mut InstanceDiff,
        address: &[String],
        schema: &Schema,
        new: Option<&Value>,
        all: bool,
    ) -> Result<()> {
        let key = address.join(".");
        let prefix = format!("{}.", key);
        let computed_set = is_unknown(new);
        let new = if computed_set { None } else { new };
        let new_set = new.is_some();

        let old_codes: BTreeSet<String> = self
            .attributes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| &k[prefix.len()..])
            .filter(|rest| !rest.starts_with('#'))
            .map(|rest| rest.split('.').next().unwrap_or(rest).to_string())
            .collect();
        let old_exists = self.attributes.contains_key(&format!("{}#", prefix));

        if computed_set || (schema.computed() && !new_set) {
            if old_exists && !computed_set {
                return Ok(());
            }
            let old_count = self.attributes.get(&format!("{}#", prefix)).cloned();
            if old_count.as_deref() == Some("0") && !computed_set {
                return Ok(());
            }
            let count = count_schema(schema, true);
            if let Some(attr) = finalize_diff(&count, ResourceAttrDiff::computed(old_count.unwrap_or_default())) {
                diff.attributes.insert(format!("{}#", prefix), attr);
            }
            return Ok(());
        }

        let mut new_codes: BTreeMap<String, Value> = BTreeMap::new();
        for item in new.and_then(Value::as_array).into_iter().flatten() {
            let code = schema.set_hash(item);
            if contains_unknown(item) {
                new_codes.insert(format!("~{}", code), item.clone());
            } else {
                new_codes.insert(code.to_string(), item.clone());
            }
        }

        let new_code_set: BTreeSet<String> = new_codes.keys().cloned().collect();
        if !all && new_set && old_codes == new_code_set {
            return Ok(());
        }

        let old_len = old_codes.len();
        let new_len = new_codes.len();
        if old_len != new_len || all {
            let count = count_schema(schema, schema.computed());
            let old_str = if old_exists { old_len.to_string() } else { String::new() };
            if let Some(attr) = finalize_diff(&count, ResourceAttrDiff::changed(old_str, new_len.to_string())) {
                diff.attributes.insert(format!("{}#", prefix), attr);
            }
        }

        let removed: Vec<&String> = old_codes.difference(&new_code_set).collect();
        let elem = schema.elem();
        for code in removed {
            self.diff_set_element(diff, address, schema, &elem, code, None)?;
        }
        for (code, item) in &new_codes {
            self.diff_set_element(diff, address, schema, &elem, code, Some(item))?;
        }
        Ok(())
    }

    fn diff_set_element(
        &self,
        diff: &mut InstanceDiff,
        address: &[String],
        schema: &Schema,
        elem: &Elem,
        code: &str,
        item: Option<&Value>,
    ) -> Result<()> {
        let element_address = with(address, code);
        match elem {
            Elem::Resource(r) => {
                for (field, field_schema) in r.schema().iter() {
                    let value = item.and_then(|v| v.get(field));
                    self.diff(diff, &with(&element_address, field), field_schema, value, true)?;
                }
                Ok(())
            },
            Elem::Schema(e) => {
                let e = element_schema(schema, (**e).clone());
                self.diff(diff, &element_address, &e, item, true)
            },
            Elem::None => panic!("{}: set has no element type", address.join(".")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkResource, SdkSchema};
    use crate::shim::sdkv2::v2_schema_map;
    use serde_json::json;

    fn schema() -> SchemaMap {
        let resource = SdkResource::new()
            .with_field("name", SdkSchema::string().required().force_new())
            .with_field("size", SdkSchema::int().optional())
            .with_field("enabled", SdkSchema::bool().optional())
            .with_field("arn", SdkSchema::string().computed())
            .with_field("tags", SdkSchema::map_of(SdkSchema::string()).optional())
            .with_field("zones", SdkSchema::list_of(SdkSchema::string()).optional())
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

    fn config(value: Value) -> ResourceConfig {
        value.as_object().cloned().unwrap_or_default()
    }

    fn create(config_value: Value) -> InstanceState {
        let schema = schema();
        let diff = diff_instance(&schema, None, &config(config_value)).unwrap();
        let mut state = apply_diff(&schema, None, &diff).unwrap();
        state.id = "i-1".to_string();
        state.attributes.insert("id".to_string(), "i-1".to_string());
        state
            .attributes
            .insert("arn".to_string(), "arn:aws:thing".to_string());
        state
    }

    #[test]
    fn test_create_diff() {
        let diff = diff_instance(
            &schema(),
            None,
            &config(json!({"name": "web", "size": 2, "tags": {"env": "prod"}, "zones": ["a", "b"]})),
        )
        .unwrap();

        assert_eq!(diff.attribute("name").unwrap().new, "web");
        assert_eq!(diff.attribute("size").unwrap().new, "2");
        assert!(diff.attribute("arn").unwrap().new_computed);
        assert_eq!(diff.attribute("tags.%").unwrap().new, "1");
        assert_eq!(diff.attribute("tags.env").unwrap().new, "prod");
        assert_eq!(diff.attribute("zones.#").unwrap().new, "2");
        assert_eq!(diff.attribute("zones.1").unwrap().new, "b");
        assert!(diff.attribute("enabled").is_none());
        assert_eq!(diff.attribute("name").unwrap().attr_type, DiffAttrType::Input);
        assert_eq!(diff.attribute("arn").unwrap().attr_type, DiffAttrType::Output);
    }

    #[test]
    fn test_create_and_apply() {
        let state = create(json!({
            "name": "web",
            "enabled": true,
            "zones": ["a"],
            "rule": [{"port": 80, "cidr": "10.0.0.0/8"}],
        }));
        assert_eq!(state.attribute("name"), Some("web"));
        assert_eq!(state.attribute("enabled"), Some("true"));
        assert_eq!(state.attribute("zones.#"), Some("1"));
        assert_eq!(state.attribute("zones.0"), Some("a"));
        assert_eq!(state.attribute("rule.#"), Some("1"));

        let code = schema()
            .get("rule")
            .unwrap()
            .set_hash(&json!({"port": 80, "cidr": "10.0.0.0/8"}));
        assert_eq!(state.attribute(&format!("rule.{}.port", code)), Some("80"));
    }

    #[test]
    fn test_no_changes_against_applied_state() {
        let value = json!({
            "name": "web",
            "size": 3,
            "tags": {"env": "prod"},
            "rule": [{"port": 80}],
        });
        let state = create(value.clone());
        let diff = diff_instance(&schema(), Some(&state), &config(value)).unwrap();
        assert!(diff.has_no_changes(), "unexpected diff: {:?}", diff);
    }

    #[test]
    fn test_update_and_removal() {
        let state = create(json!({"name": "web", "size": 3, "tags": {"env": "prod", "team": "a"}}));
        let diff = diff_instance(
            &schema(),
            Some(&state),
            &config(json!({"name": "web", "tags": {"env": "dev"}})),
        )
        .unwrap();

        let size = diff.attribute("size").unwrap();
        assert!(size.new_removed);
        assert_eq!(size.old, "3");

        let env = diff.attribute("tags.env").unwrap();
        assert_eq!((env.old.as_str(), env.new.as_str()), ("prod", "dev"));
        assert!(diff.attribute("tags.team").unwrap().new_removed);
        assert_eq!(diff.attribute("tags.%").unwrap().new, "1");
        assert!(diff.attribute("arn").is_none());
        assert!(!diff.requires_new());

        let next = apply_diff(&schema(), Some(&state), &diff).unwrap();
        assert_eq!(next.attribute("size"), None);
        assert_eq!(next.attribute("tags.env"), Some("dev"));
        assert_eq!(next.attribute("tags.team"), None);
        assert_eq!(next.attribute("tags.%"), Some("1"));
        assert_eq!(next.attribute("arn"), Some("arn:aws:thing"));
        assert_eq!(next.id, "i-1");
    }

    #[test]
    fn test_force_new_replans_computed() {
        let state = create(json!({"name": "web"}));
        let diff = diff_instance(&schema(), Some(&state), &config(json!({"name": "api"}))).unwrap();
        assert!(diff.requires_new());
        let name = diff.attribute("name").unwrap();
        assert!(name.requires_new);
        assert_eq!(name.old, "web");

        let arn = diff.attribute("arn").unwrap();
        assert!(arn.new_computed);
        assert_eq!(arn.old, "arn:aws:thing");
    }

    #[test]
    fn test_unknown_values() {
        let diff = diff_instance(
            &schema(),
            None,
            &config(json!({
                "name": UNKNOWN_VARIABLE_VALUE,
                "zones": UNKNOWN_VARIABLE_VALUE,
                "rule": [{"port": 80, "cidr": UNKNOWN_VARIABLE_VALUE}],
            })),
        )
        .unwrap();
        assert!(diff.attribute("name").unwrap().new_computed);
        assert!(diff.attribute("zones.#").unwrap().new_computed);
        assert!(diff
            .attributes
            .keys()
            .any(|k| k.starts_with("rule.~") && k.ends_with(".cidr")));

        let state = apply_diff(&schema(), None, &diff).unwrap();
        assert_eq!(state.attribute("name"), Some(UNKNOWN_VARIABLE_VALUE));
        assert_eq!(state.attribute("zones.#"), Some(UNKNOWN_VARIABLE_VALUE));
        assert_eq!(state.attribute("rule.#"), Some(UNKNOWN_VARIABLE_VALUE));
    }

    #[test]
    fn test_set_element_replacement() {
        let state = create(json!({"name": "web", "rule": [{"port": 80}]}));
        let diff = diff_instance(
            &schema(),
            Some(&state),
            &config(json!({"name": "web", "rule": [{"port": 443}]})),
        )
        .unwrap();
        let rule = schema().get("rule").cloned().unwrap();
        let old_code = rule.set_hash(&json!({"port": 80}));
        let new_code = rule.set_hash(&json!({"port": 443}));
        assert!(diff
            .attribute(&format!("rule.{}.port", old_code))
            .unwrap()
            .new_removed);
        assert_eq!(
            diff.attribute(&format!("rule.{}.port", new_code)).unwrap().new,
            "443"
        );

        let next = apply_diff(&schema(), Some(&state), &diff).unwrap();
        assert_eq!(next.attribute("rule.#"), Some("1"));
        assert_eq!(next.attribute(&format!("rule.{}.port", new_code)), Some("443"));
        assert_eq!(next.attribute(&format!("rule.{}.port", old_code)), None);
    }

    #[test]
    fn test_destroy() {
        let state = create(json!({"name": "web"}));
        let next = apply_diff(&schema(), Some(&state), &InstanceDiff::destroy()).unwrap();
        assert!(next.attributes.is_empty());
    }

    #[test]
    fn test_list_type_mismatch_errors() {
        let err = diff_instance(&schema(), None, &config(json!({"name": "web", "zones": {"a": 1}})))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Diff(_)));
    }

    #[test]
    fn test_map_type_mismatch_errors() {
        let err = diff_instance(&schema(), None, &config(json!({"name": "web", "tags": "team=web"})))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Diff(_)));
        assert!(err.message().contains("expected a map"));
    }
}
