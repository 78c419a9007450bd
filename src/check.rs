//! Normalization of checked inputs.
//!
//! Provider schemas cannot tell an empty collection from an absent one, so
//! an input of `[]` or `{}` comes back from a round trip through the provider
//! as missing. Returning the dropped form makes the next diff report a
//! change from `[]` to nothing that the user never made.

use crate::info::{self, is_max_items_one, SchemaInfo, SchemaInfos};
use crate::shim::{Elem, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::value::{PropertyMap, PropertyValue};
use tracing::debug;

/// Restore the empty collections of `news` that the round trip into
/// `inputs` dropped.
///
/// A property is restored when the user sent an empty array for a list or
/// set attribute, or an empty object for a map attribute, and `inputs` holds
/// nothing or `Null` under the same key. Nested blocks are walked so empty
/// collections inside them are restored too. Properties without a schema are
/// left alone.
pub fn normalize_empty_collections(
    news: &PropertyMap,
    inputs: PropertyMap,
    schema_map: &SchemaMap,
    infos: &SchemaInfos,
) -> PropertyMap {
    let mut inputs = inputs;
    for (key, sent) in news {
        let tf_name = info::property_to_terraform_name(key, schema_map, infos);
        let Some(schema) = schema_map.get(&tf_name) else {
            continue;
        };
        let info = infos.get(&tf_name);
        let dropped = inputs.get(key).map_or(true, PropertyValue::is_null);
        if dropped {
            if is_empty_collection(sent, schema, info) {
                debug!(property = %key, "Restoring empty collection dropped by the provider");
                inputs.insert(key.clone(), sent.clone());
            }
            continue;
        }
        if let Some(kept) = inputs.get_mut(key) {
            normalize_nested(sent, kept, schema, info);
        }
    }
    inputs
}

fn is_empty_collection(sent: &PropertyValue, schema: &Schema, info: Option<&SchemaInfo>) -> bool {
    match (sent.unwrap_markers(), schema.value_type()) {
        (PropertyValue::Array(items), ValueType::List | ValueType::Set) => {
            items.is_empty() && !is_max_items_one(schema, info)
        },
        (PropertyValue::Object(map), ValueType::Map) => map.is_empty() && !schema.is_object(),
        _ => false,
    }
}

fn normalize_nested(sent: &PropertyValue, kept: &mut PropertyValue, schema: &Schema, info: Option<&SchemaInfo>) {
    let Some(fields) = block_fields(schema) else {
        return;
    };
    let empty = SchemaInfos::new();
    let fields_info = info.map_or(&empty, |i| &i.fields);
    match (sent.unwrap_markers(), kept) {
        (PropertyValue::Object(sent), PropertyValue::Object(kept)) => {
            let normalized = normalize_empty_collections(sent, std::mem::take(kept), &fields, fields_info);
            *kept = normalized;
        },
        (PropertyValue::Array(sent), PropertyValue::Array(kept)) if sent.len() == kept.len() => {
            for (sent, kept) in sent.iter().zip(kept.iter_mut()) {
                if let (PropertyValue::Object(sent), PropertyValue::Object(kept)) = (sent.unwrap_markers(), kept) {
                    let normalized = normalize_empty_collections(sent, std::mem::take(kept), &fields, fields_info);
                    *kept = normalized;
                }
            }
        },
        _ => {},
    }
}

/// The attributes of a nested block, whether it is an object attribute or a
/// list or set of blocks.
fn block_fields(schema: &Schema) -> Option<SchemaMap> {
    if schema.is_object() {
        return schema.object_fields();
    }
    match schema.elem() {
        Elem::Resource(resource) => Some(resource.schema()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkResource, SdkSchema};
    use crate::shim::sdkv2::v2_schema_map;
    use crate::value::map_from_json;
    use serde_json::json;

    fn schema_map() -> SchemaMap {
        let rule = SdkResource::new()
            .with_field("port", SdkSchema::int().required())
            .with_field("cidr_blocks", SdkSchema::list_of(SdkSchema::string()).optional());
        let resource = SdkResource::new()
            .with_field("array_property_values", SdkSchema::list_of(SdkSchema::string()).optional())
            .with_field("labels", SdkSchema::map_of(SdkSchema::string()).optional())
            .with_field("name", SdkSchema::string().optional())
            .with_field("rule", SdkSchema::list_block(rule).optional())
            .with_field(
                "single",
                SdkSchema::list_of(SdkSchema::string()).optional().with_max_items(1),
            );
        v2_schema_map(&resource.schema)
    }

    #[test]
    fn test_restores_dropped_empty_array() {
        let news = map_from_json(&json!({"arrayPropertyValues": []}));
        let inputs = map_from_json(&json!({"__defaults": []}));

        let normalized = normalize_empty_collections(&news, inputs, &schema_map(), &SchemaInfos::new());
        assert_eq!(
            normalized,
            map_from_json(&json!({"__defaults": [], "arrayPropertyValues": []}))
        );
    }

    #[test]
    fn test_restores_null_maps_and_secrets() {
        let news = PropertyMap::from([
            ("labels".to_string(), PropertyValue::object(Vec::<(String, PropertyValue)>::new())),
            (
                "arrayPropertyValues".to_string(),
                PropertyValue::make_secret(PropertyValue::Array(vec![])),
            ),
        ]);
        let inputs = PropertyMap::from([("labels".to_string(), PropertyValue::Null)]);

        let normalized = normalize_empty_collections(&news, inputs, &schema_map(), &SchemaInfos::new());
        assert_eq!(normalized, news);
    }

    #[test]
    fn test_leaves_other_values_alone() {
        let news = map_from_json(&json!({
            "name": "",
            "single": [],
            "unknownProp": [],
            "arrayPropertyValues": ["a"]
        }));
        let inputs = map_from_json(&json!({"arrayPropertyValues": ["a"]}));

        let normalized = normalize_empty_collections(&news, inputs.clone(), &schema_map(), &SchemaInfos::new());
        assert_eq!(normalized, inputs);
    }

    #[test]
    fn test_restores_inside_blocks() {
        let news = map_from_json(&json!({"rule": [{"port": 80, "cidrBlocks": []}]}));
        let inputs = map_from_json(&json!({"rule": [{"port": 80}]}));

        let normalized = normalize_empty_collections(&news, inputs, &schema_map(), &SchemaInfos::new());
        assert_eq!(normalized, news);
    }
}
