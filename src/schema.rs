//! Plugin Framework schema declarations.
//!
//! Framework providers describe a resource as a root [`Block`] of attributes
//! and nested blocks, and an attribute may itself carry nested attributes.
//! These declarations back the framework adapter in
//! [`shim::framework`](crate::shim::framework) and imply the [`WireType`] of
//! every resource value.

use crate::wire::WireType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The declared type of a framework attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// `types.String`.
    String,
    /// `types.Int64`.
    Int64,
    /// `types.Float64`.
    Float64,
    /// `types.Bool`.
    Bool,
    /// Ordered elements of one type.
    List(Box<AttributeType>),
    /// Unordered unique elements of one type.
    Set(Box<AttributeType>),
    /// String keys to elements of one type.
    Map(Box<AttributeType>),
    /// Fixed attribute names, each with its own type.
    Object(BTreeMap<String, AttributeType>),
    /// Any type, decided per value.
    Dynamic,
}

impl AttributeType {
    /// `List(element_type)`.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }

    /// `Set(element_type)`.
    pub fn set(element_type: AttributeType) -> Self {
        Self::Set(Box::new(element_type))
    }

    /// `Map(element_type)`.
    pub fn map(element_type: AttributeType) -> Self {
        Self::Map(Box::new(element_type))
    }

    /// `Object(attributes)`.
    pub fn object<K: Into<String>>(attributes: impl IntoIterator<Item = (K, AttributeType)>) -> Self {
        Self::Object(attributes.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// The wire type values of this attribute type travel as.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::String => WireType::String,
            Self::Int64 | Self::Float64 => WireType::Number,
            Self::Bool => WireType::Bool,
            Self::List(e) => WireType::list(e.wire_type()),
            Self::Set(e) => WireType::set(e.wire_type()),
            Self::Map(e) => WireType::map(e.wire_type()),
            Self::Object(attrs) => WireType::Object(
                attrs
                    .iter()
                    .map(|(k, t)| (k.clone(), t.wire_type()))
                    .collect(),
            ),
            Self::Dynamic => WireType::Dynamic,
        }
    }
}

/// Configurability of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// Must be set in configuration.
    pub required: bool,
    /// May be set in configuration.
    pub optional: bool,
    /// Filled in by the provider when not configured.
    pub computed: bool,
    /// Values are secrets.
    pub sensitive: bool,
}

impl AttributeFlags {
    /// Required only.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Optional only.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Computed only.
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Optional and computed.
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }

    /// Add the sensitive flag.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Attributes nested inside an attribute, with their nesting mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedAttributes {
    /// The nested attributes.
    pub attributes: BTreeMap<String, Attribute>,
    /// How the nested object is repeated.
    #[serde(default)]
    pub nesting_mode: BlockNestingMode,
}

impl NestedAttributes {
    /// The object type of a single nested element.
    pub fn object_type(&self) -> WireType {
        WireType::Object(
            self.attributes
                .iter()
                .map(|(k, a)| (k.clone(), a.wire_type()))
                .collect(),
        )
    }
}

/// Describes a single attribute in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute. Ignored when `nested` is set.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Required, optional, computed and sensitive flags.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Documentation text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Changes require replacement.
    #[serde(default)]
    pub force_new: bool,
    /// Static default, as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Nested attributes, for object-shaped attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedAttributes>,
    /// Deprecation message, if the attribute is deprecated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

impl Attribute {
    /// An attribute of `attr_type` with `flags`.
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            description: None,
            force_new: false,
            default: None,
            nested: None,
            deprecation_message: None,
        }
    }

    /// Create an attribute holding nested attributes.
    pub fn nested<K: Into<String>>(
        nesting_mode: BlockNestingMode,
        attributes: impl IntoIterator<Item = (K, Attribute)>,
        flags: AttributeFlags,
    ) -> Self {
        let mut attr = Self::new(AttributeType::Dynamic, flags);
        attr.nested = Some(NestedAttributes {
            attributes: attributes.into_iter().map(|(k, a)| (k.into(), a)).collect(),
            nesting_mode,
        });
        attr
    }

    /// Required `String`.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    /// Optional `String`.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    /// Computed `String`.
    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::computed())
    }

    /// Optional `Int64`.
    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::optional())
    }

    /// Optional `Float64`.
    pub fn optional_float64() -> Self {
        Self::new(AttributeType::Float64, AttributeFlags::optional())
    }

    /// Optional `Bool`.
    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::optional())
    }

    /// Attach documentation text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Require replacement when the value changes.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Attach a static default.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Treat values as secrets.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// The wire type this attribute's values travel as.
    pub fn wire_type(&self) -> WireType {
        match &self.nested {
            None => self.attr_type.wire_type(),
            Some(nested) => nested.nesting_mode.wrap(nested.object_type()),
        }
    }
}

/// The nesting mode for a block or nested attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockNestingMode {
    /// A single nested object (at most one).
    #[default]
    Single,
    /// A list of nested objects (zero or more, ordered).
    List,
    /// A set of nested objects (zero or more, unordered, unique).
    Set,
    /// A map of nested objects keyed by string.
    Map,
}

impl BlockNestingMode {
    fn wrap(self, element: WireType) -> WireType {
        match self {
            Self::Single => element,
            Self::List => WireType::list(element),
            Self::Set => WireType::set(element),
            Self::Map => WireType::map(element),
        }
    }
}

/// A block of attributes and nested blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The attributes within this block.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
    /// Nested blocks within this block.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, NestedBlock>,
    /// Human-readable description of the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    /// Create a new empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to this block.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block to this block.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Set the description for this block.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The object type a value of this block has.
    pub fn implied_type(&self) -> WireType {
        WireType::Object(self.implied_attributes())
    }

    /// The attribute types of [`implied_type`](Self::implied_type), nested
    /// blocks included.
    pub fn implied_attributes(&self) -> BTreeMap<String, WireType> {
        let mut attrs: BTreeMap<String, WireType> = self
            .attributes
            .iter()
            .map(|(k, a)| (k.clone(), a.wire_type()))
            .collect();
        for (name, nested) in &self.blocks {
            attrs.insert(name.clone(), nested.wire_type());
        }
        attrs
    }
}

/// A block nested under a parent block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    /// The attributes and blocks of each nested object.
    #[serde(flatten)]
    pub block: Block,
    /// How nested objects are repeated.
    #[serde(default)]
    pub nesting_mode: BlockNestingMode,
    /// Fewest objects the configuration must hold.
    #[serde(default)]
    pub min_items: u32,
    /// Most objects allowed, 0 for no limit.
    #[serde(default)]
    pub max_items: u32,
}

impl NestedBlock {
    fn with_mode(block: Block, nesting_mode: BlockNestingMode) -> Self {
        let max_items = u32::from(nesting_mode == BlockNestingMode::Single);
        Self {
            block,
            nesting_mode,
            min_items: 0,
            max_items,
        }
    }

    /// `SingleNestedBlock`: at most one object.
    pub fn single(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Single)
    }

    /// `ListNestedBlock`.
    pub fn list(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::List)
    }

    /// `SetNestedBlock`.
    pub fn set(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Set)
    }

    /// A map of nested objects keyed by string.
    pub fn map(block: Block) -> Self {
        Self::with_mode(block, BlockNestingMode::Map)
    }

    /// Require at least `min` objects.
    pub fn with_min_items(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    /// Allow at most `max` objects.
    pub fn with_max_items(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }

    /// The wire type of this block's value in the parent object.
    pub fn wire_type(&self) -> WireType {
        self.nesting_mode.wrap(self.block.implied_type())
    }
}

/// The schema of a framework resource, data source or provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// State schema version.
    #[serde(default)]
    pub version: u64,
    /// Root block.
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    /// An empty schema at `version`.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    /// An empty schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add a root attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    /// Add a root nested block.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }

    /// The object type of a resource value.
    pub fn implied_type(&self) -> WireType {
        self.block.implied_type()
    }
}

/// Schemas for a whole framework provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schema for provider configuration.
    #[serde(default)]
    pub provider: Schema,
    /// Schemas for each resource type.
    #[serde(default)]
    pub resources: BTreeMap<String, Schema>,
    /// Schemas for each data source type.
    #[serde(default)]
    pub data_sources: BTreeMap<String, Schema>,
}

impl ProviderSchema {
    /// No configuration, resources or data sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration schema.
    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource by type name.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source by type name.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// The value is rejected.
    Error,
    /// The value is accepted with a note.
    Warning,
}

/// A diagnostic message about a value or schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: DiagnosticSeverity,
    /// One-line summary.
    pub summary: String,
    /// Longer explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Path of the offending attribute, like `rule[0].port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// An error with `summary`.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Attach a longer explanation.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the attribute path.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_flags() {
        let optional_computed = AttributeFlags::optional_computed();
        assert!(!optional_computed.required);
        assert!(optional_computed.optional);
        assert!(optional_computed.computed);

        let sensitive = AttributeFlags::required().sensitive();
        assert!(sensitive.sensitive);
    }

    #[test]
    fn test_implied_type() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("count", Attribute::optional_int64())
            .with_attribute(
                "tags",
                Attribute::new(
                    AttributeType::map(AttributeType::String),
                    AttributeFlags::optional(),
                ),
            )
            .with_block(
                "rule",
                NestedBlock::list(Block::new().with_attribute("port", Attribute::optional_int64())),
            )
            .with_block(
                "config",
                NestedBlock::single(Block::new().with_attribute("enabled", Attribute::optional_bool())),
            );

        let expected = WireType::object([
            ("config", WireType::object([("enabled", WireType::Bool)])),
            ("count", WireType::Number),
            ("name", WireType::String),
            (
                "rule",
                WireType::list(WireType::object([("port", WireType::Number)])),
            ),
            ("tags", WireType::map(WireType::String)),
        ]);
        assert_eq!(schema.implied_type(), expected);
    }

    #[test]
    fn test_nested_attribute_wire_type() {
        let attr = Attribute::nested(
            BlockNestingMode::Set,
            [("cidr", Attribute::required_string())],
            AttributeFlags::optional(),
        );
        assert_eq!(
            attr.wire_type(),
            WireType::set(WireType::object([("cidr", WireType::String)]))
        );
    }

    #[test]
    fn test_schema_serde() {
        let schema = Schema::v0().with_attribute(
            "password",
            Attribute::required_string()
                .sensitive()
                .with_force_new()
                .with_description("Bucket access secret"),
        );
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["attributes"]["password"]["type"], "string");
        assert_eq!(json["attributes"]["password"]["sensitive"], true);
        let back: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_provider_schema() {
        let schema = ProviderSchema::new()
            .with_provider_config(Schema::v0().with_attribute("region", Attribute::optional_string()))
            .with_resource("example_bucket", Schema::new(1))
            .with_data_source("example_bucket_info", Schema::v0());

        assert!(schema.provider.block.attributes.contains_key("region"));
        assert_eq!(schema.resources["example_bucket"].version, 1);
        assert_eq!(NestedBlock::single(Block::new()).max_items, 1);
        assert_eq!(NestedBlock::list(Block::new()).max_items, 0);
    }

    #[test]
    fn test_diagnostic() {
        let err = Diagnostic::error("Invalid configuration")
            .with_detail("The value must be positive")
            .with_attribute("count");

        assert_eq!(err.severity, DiagnosticSeverity::Error);
        assert_eq!(err.summary, "Invalid configuration");
        assert_eq!(err.detail, Some("The value must be positive".to_string()));
        assert_eq!(err.attribute, Some("count".to_string()));
    }
}
