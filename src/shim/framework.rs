//! Adapter for Plugin Framework schemas.
//!
//! Framework declarations are schema-only here: attributes, nested attributes
//! and nested blocks are mapped onto the shared [`ValueType`]/[`Elem`] model so
//! paths and conversion can walk them, but diff, apply and refresh are not
//! available.

use super::object::{ObjectResource, ObjectSchema};
use super::{Elem, Resource, ResourceLike, ResourceMap, Schema, SchemaLike, SchemaMap, ValueType};
use crate::error::{BridgeError, Result};
use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, NestedAttributes, NestedBlock, ProviderSchema,
};
use crate::types::{InstanceDiff, InstanceState, ResourceConfig};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A framework attribute, nested block, or bare element type.
#[derive(Debug, Clone)]
pub enum FrameworkSchema {
    /// A declared attribute.
    Attribute(Box<Attribute>),
    /// A nested block.
    Block(Box<NestedBlock>),
    /// The element or field type of a collection or object attribute.
    Type(AttributeType),
}

impl FrameworkSchema {
    fn attribute_type(&self) -> Option<&AttributeType> {
        match self {
            Self::Attribute(a) if a.nested.is_none() => Some(&a.attr_type),
            Self::Type(t) => Some(t),
            _ => None,
        }
    }
}

fn type_value_type(t: &AttributeType) -> ValueType {
    match t {
        AttributeType::String => ValueType::String,
        AttributeType::Int64 => ValueType::Int,
        AttributeType::Float64 => ValueType::Float,
        AttributeType::Bool => ValueType::Bool,
        AttributeType::List(_) => ValueType::List,
        AttributeType::Set(_) => ValueType::Set,
        AttributeType::Map(_) | AttributeType::Object(_) => ValueType::Map,
        AttributeType::Dynamic => ValueType::Dynamic,
    }
}

fn type_elem(t: &AttributeType) -> Elem {
    match t {
        AttributeType::List(e) | AttributeType::Set(e) | AttributeType::Map(e) => {
            Elem::Schema(Box::new(Schema::Framework(FrameworkSchema::Type((**e).clone()))))
        },
        AttributeType::Object(fields) => {
            let fields: SchemaMap = fields
                .iter()
                .map(|(k, t)| (k.clone(), Schema::Framework(FrameworkSchema::Type(t.clone()))))
                .collect();
            Elem::Resource(Resource::Object(ObjectResource::new(fields)))
        },
        _ => Elem::None,
    }
}

fn nesting_value_type(mode: BlockNestingMode) -> ValueType {
    match mode {
        BlockNestingMode::Single | BlockNestingMode::Map => ValueType::Map,
        BlockNestingMode::List => ValueType::List,
        BlockNestingMode::Set => ValueType::Set,
    }
}

fn nested_elem(mode: BlockNestingMode, fields: FrameworkResource) -> Elem {
    match mode {
        // A map of objects is a map whose element is itself an object.
        BlockNestingMode::Map => Elem::Schema(Box::new(Schema::Object(ObjectSchema::new(fields.schema())))),
        _ => Elem::Resource(Resource::Framework(fields)),
    }
}

fn nested_attributes_resource(nested: &NestedAttributes) -> FrameworkResource {
    let mut block = Block::new();
    block.attributes = nested.attributes.clone();
    FrameworkResource::from_block(block, 0)
}

impl SchemaLike for FrameworkSchema {
    fn value_type(&self) -> ValueType {
        match self {
            Self::Attribute(a) => match &a.nested {
                Some(nested) => nesting_value_type(nested.nesting_mode),
                None => type_value_type(&a.attr_type),
            },
            Self::Block(b) => nesting_value_type(b.nesting_mode),
            Self::Type(t) => type_value_type(t),
        }
    }

    fn optional(&self) -> bool {
        match self {
            Self::Attribute(a) => a.flags.optional,
            Self::Block(b) => b.min_items == 0,
            Self::Type(_) => false,
        }
    }

    fn required(&self) -> bool {
        match self {
            Self::Attribute(a) => a.flags.required,
            Self::Block(b) => b.min_items > 0,
            Self::Type(_) => false,
        }
    }

    fn computed(&self) -> bool {
        match self {
            Self::Attribute(a) => a.flags.computed,
            _ => false,
        }
    }

    fn force_new(&self) -> bool {
        match self {
            Self::Attribute(a) => a.force_new,
            _ => false,
        }
    }

    fn sensitive(&self) -> bool {
        match self {
            Self::Attribute(a) => a.flags.sensitive,
            _ => false,
        }
    }

    fn elem(&self) -> Elem {
        if let Some(t) = self.attribute_type() {
            return type_elem(t);
        }
        match self {
            Self::Attribute(a) => match &a.nested {
                Some(nested) => nested_elem(nested.nesting_mode, nested_attributes_resource(nested)),
                None => Elem::None,
            },
            Self::Block(b) => nested_elem(b.nesting_mode, FrameworkResource::from_block(b.block.clone(), 0)),
            Self::Type(_) => Elem::None,
        }
    }

    fn max_items(&self) -> usize {
        match self {
            Self::Block(b) if b.nesting_mode != BlockNestingMode::Single => b.max_items as usize,
            _ => 0,
        }
    }

    fn min_items(&self) -> usize {
        match self {
            Self::Block(b) if b.nesting_mode != BlockNestingMode::Single => b.min_items as usize,
            _ => 0,
        }
    }

    fn default_value(&self) -> Option<Value> {
        match self {
            Self::Attribute(a) => a.default.clone(),
            _ => None,
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::Attribute(a) => a.description.as_deref().unwrap_or(""),
            Self::Block(b) => b.block.description.as_deref().unwrap_or(""),
            Self::Type(_) => "",
        }
    }

    fn deprecated(&self) -> &str {
        match self {
            Self::Attribute(a) => a.deprecation_message.as_deref().unwrap_or(""),
            _ => "",
        }
    }

    fn supports_unknown_collections(&self) -> bool {
        true
    }
}

/// A framework resource, data source, or the body of a nested block.
#[derive(Debug, Clone)]
pub struct FrameworkResource {
    block: Arc<Block>,
    version: u64,
}

impl FrameworkResource {
    /// Wrap a resource schema.
    pub fn new(schema: crate::schema::Schema) -> Self {
        Self::from_block(schema.block, schema.version)
    }

    fn from_block(block: Block, version: u64) -> Self {
        Self {
            block: Arc::new(block),
            version,
        }
    }
}

impl ResourceLike for FrameworkResource {
    fn schema(&self) -> SchemaMap {
        let attributes = self.block.attributes.iter().map(|(k, a)| {
            (
                k.clone(),
                Schema::Framework(FrameworkSchema::Attribute(Box::new(a.clone()))),
            )
        });
        let blocks = self.block.blocks.iter().map(|(k, b)| {
            (
                k.clone(),
                Schema::Framework(FrameworkSchema::Block(Box::new(b.clone()))),
            )
        });
        attributes.chain(blocks).collect()
    }

    fn schema_version(&self) -> u64 {
        self.version
    }

    fn diff(&self, _state: Option<&InstanceState>, _config: &ResourceConfig) -> Result<InstanceDiff> {
        Err(BridgeError::Unsupported {
            op: "diff",
            adapter: "framework",
        })
    }

    fn apply(&self, _state: Option<&InstanceState>, _diff: &InstanceDiff) -> Result<InstanceState> {
        Err(BridgeError::Unsupported {
            op: "apply",
            adapter: "framework",
        })
    }

    fn refresh(&self, _state: &InstanceState) -> Result<InstanceState> {
        Err(BridgeError::Unsupported {
            op: "refresh",
            adapter: "framework",
        })
    }
}

/// A framework provider's schemas.
#[derive(Debug, Clone)]
pub struct FrameworkProvider {
    schema: Arc<ProviderSchema>,
}

impl FrameworkProvider {
    /// Wrap a provider schema.
    pub fn new(schema: ProviderSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    /// Provider configuration schema.
    pub fn schema(&self) -> SchemaMap {
        FrameworkResource::new(self.schema.provider.clone()).schema()
    }

    /// Managed resources.
    pub fn resources_map(&self) -> ResourceMap {
        framework_resource_map(&self.schema.resources)
    }

    /// Data sources.
    pub fn data_sources_map(&self) -> ResourceMap {
        framework_resource_map(&self.schema.data_sources)
    }
}

fn framework_resource_map(schemas: &BTreeMap<String, crate::schema::Schema>) -> ResourceMap {
    schemas
        .iter()
        .map(|(k, s)| (k.clone(), Resource::Framework(FrameworkResource::new(s.clone()))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeFlags;

    fn resource() -> FrameworkResource {
        FrameworkResource::new(
            crate::schema::Schema::v0()
                .with_attribute("name", Attribute::required_string())
                .with_attribute(
                    "tags",
                    Attribute::new(AttributeType::map(AttributeType::String), AttributeFlags::optional()),
                )
                .with_attribute(
                    "endpoint",
                    Attribute::nested(
                        BlockNestingMode::Single,
                        [("url", Attribute::optional_string())],
                        AttributeFlags::optional(),
                    ),
                )
                .with_block(
                    "rule",
                    NestedBlock::list(Block::new().with_attribute("port", Attribute::optional_int64()))
                        .with_max_items(1),
                )
                .with_block(
                    "policy",
                    NestedBlock::single(Block::new().with_attribute("id", Attribute::optional_string()))
                        .with_min_items(1),
                ),
        )
    }

    #[test]
    fn test_attribute_mapping() {
        let fields = resource().schema();
        let name = fields.get("name").unwrap();
        assert_eq!(name.value_type(), ValueType::String);
        assert!(name.required());

        let tags = fields.get("tags").unwrap();
        assert_eq!(tags.value_type(), ValueType::Map);
        assert_eq!(tags.elem_schema().unwrap().value_type(), ValueType::String);

        let endpoint = fields.get("endpoint").unwrap();
        assert!(endpoint.is_object());
        assert!(endpoint.object_fields().unwrap().contains_key("url"));
    }

    #[test]
    fn test_block_mapping() {
        let fields = resource().schema();
        let rule = fields.get("rule").unwrap();
        assert_eq!(rule.value_type(), ValueType::List);
        assert_eq!(rule.max_items(), 1);
        assert!(rule.optional());

        let policy = fields.get("policy").unwrap();
        assert!(policy.is_object());
        assert!(policy.required());
        assert_eq!(policy.max_items(), 0);
    }

    #[test]
    fn test_map_nesting_has_object_elements() {
        let s = FrameworkSchema::Attribute(Box::new(Attribute::nested(
            BlockNestingMode::Map,
            [("x", Attribute::optional_bool())],
            AttributeFlags::optional(),
        )));
        assert_eq!(s.value_type(), ValueType::Map);
        match s.elem() {
            Elem::Schema(e) => assert!(e.is_object()),
            other => panic!("unexpected elem {:?}", other),
        }
    }

    #[test]
    fn test_object_type_is_object() {
        let s = Schema::Framework(FrameworkSchema::Type(AttributeType::object([(
            "a",
            AttributeType::Int64,
        )])));
        assert!(s.is_object());
        let fields = s.object_fields().unwrap();
        assert_eq!(fields.get("a").unwrap().value_type(), ValueType::Int);
    }

    #[test]
    fn test_runtime_ops_are_unsupported() {
        let err = resource().refresh(&InstanceState::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Unsupported {
                op: "refresh",
                adapter: "framework"
            }
        ));
    }
}
