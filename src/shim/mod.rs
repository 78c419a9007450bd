//! Uniform schema abstraction over provider SDK generations.
//!
//! Every downstream component (paths, conversion, diffing) works against the
//! closed [`Schema`], [`Resource`] and [`Provider`] enums defined here. Each
//! variant wraps exactly one adapter, and each adapter wraps exactly one
//! upstream declaration:
//!
//! | Adapter | Wraps | Runtime operations |
//! |---|---|---|
//! | [`sdkv1`] | [`SdkSchema`](crate::sdk::SdkSchema) with legacy semantics | yes |
//! | [`sdkv2`] | [`SdkSchema`](crate::sdk::SdkSchema) | yes |
//! | [`framework`] | [`schema`](crate::schema) blocks and attributes | no |
//! | [`synthetic`] | [`SdkSchema`](crate::sdk::SdkSchema), for tests | no |
//! | [`object`] | an existing [`SchemaMap`] viewed as an object type | no |
//!
//! Schema-only adapters answer runtime calls with
//! [`BridgeError::Unsupported`]. Callers are expected to know statically which
//! kind they hold.
//!
//! An object-typed node is encoded as a `Map` whose element is a [`Resource`];
//! a list or set of objects is a `List`/`Set` whose element is a [`Resource`].

pub mod framework;
pub mod object;
pub mod sdkv1;
pub mod sdkv2;
pub mod synthetic;

use crate::error::{BridgeError, Result};
use crate::types::{InstanceDiff, InstanceState, ResourceConfig};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The declared type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    /// Not a valid type; indicates a malformed declaration.
    #[default]
    Invalid,
    /// A boolean.
    Bool,
    /// An integer.
    Int,
    /// A floating point number.
    Float,
    /// A string.
    String,
    /// An ordered list.
    List,
    /// A map, or an object when the element is a [`Resource`].
    Map,
    /// An unordered set identified by element hash.
    Set,
    /// Any value.
    Dynamic,
}

impl ValueType {
    /// Returns true for list and set.
    pub fn is_list_or_set(self) -> bool {
        matches!(self, Self::List | Self::Set)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "Invalid",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::List => "List",
            Self::Map => "Map",
            Self::Set => "Set",
            Self::Dynamic => "Dynamic",
        };
        write!(f, "{}", name)
    }
}

/// The element of a collection schema.
#[derive(Debug, Clone)]
pub enum Elem {
    /// No element declared: a scalar, or a collection of unknown element type.
    None,
    /// A primitive or nested collection element.
    Schema(Box<Schema>),
    /// An object element.
    Resource(Resource),
}

/// Capabilities every schema adapter provides.
pub trait SchemaLike {
    /// The declared type.
    fn value_type(&self) -> ValueType;
    /// The attribute may be set in configuration.
    fn optional(&self) -> bool;
    /// The attribute must be set in configuration.
    fn required(&self) -> bool;
    /// The provider may compute the value.
    fn computed(&self) -> bool;
    /// Changing the value replaces the resource.
    fn force_new(&self) -> bool;
    /// The value is sensitive.
    fn sensitive(&self) -> bool;
    /// The element declaration.
    fn elem(&self) -> Elem;

    /// Maximum collection size (0 = unlimited).
    fn max_items(&self) -> usize {
        0
    }

    /// Minimum collection size.
    fn min_items(&self) -> usize {
        0
    }

    /// Default value in Terraform's representation.
    fn default_value(&self) -> Option<Value> {
        None
    }

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Deprecation message.
    fn deprecated(&self) -> &str {
        ""
    }

    /// Attributes this one conflicts with.
    fn conflicts_with(&self) -> &[String] {
        &[]
    }

    /// Custom hash for set elements, if the declaration provides one.
    fn custom_set_hash(&self, _value: &Value) -> Option<u32> {
        None
    }

    /// Whether the provider accepts wholly unknown lists and sets.
    fn supports_unknown_collections(&self) -> bool {
        false
    }
}

/// A schema node from any adapter.
#[derive(Debug, Clone)]
pub enum Schema {
    /// Legacy SDK v1.
    V1(sdkv1::V1Schema),
    /// Structured SDK v2.
    V2(sdkv2::V2Schema),
    /// Plugin Framework.
    Framework(framework::FrameworkSchema),
    /// In-memory schema for tests.
    Synthetic(synthetic::SyntheticSchema),
    /// A schema map viewed as an object type.
    Object(object::ObjectSchema),
}

impl Schema {
    /// An object-typed schema with the given fields.
    pub fn object(fields: SchemaMap) -> Self {
        Self::Object(object::ObjectSchema::new(fields))
    }

    /// A bare schema of the given type with no flags and no element.
    pub fn primitive(value_type: ValueType) -> Self {
        Self::Synthetic(synthetic::SyntheticSchema::new(crate::sdk::SdkSchema::new(
            value_type,
        )))
    }

    fn adapter(&self) -> &dyn SchemaLike {
        match self {
            Self::V1(s) => s,
            Self::V2(s) => s,
            Self::Framework(s) => s,
            Self::Synthetic(s) => s,
            Self::Object(s) => s,
        }
    }

    /// Name of the adapter behind this schema.
    pub fn adapter_name(&self) -> &'static str {
        match self {
            Self::V1(_) => "sdkv1",
            Self::V2(_) => "sdkv2",
            Self::Framework(_) => "framework",
            Self::Synthetic(_) => "synthetic",
            Self::Object(_) => "object",
        }
    }

    /// Returns true if the element is an object (a nested block).
    pub fn is_object_collection(&self) -> bool {
        matches!(self.elem(), Elem::Resource(_))
    }

    /// Returns true for a single object: a `Map` whose element is a resource.
    pub fn is_object(&self) -> bool {
        self.value_type() == ValueType::Map && self.is_object_collection()
    }

    /// The fields of an object or of the objects in a collection.
    pub fn object_fields(&self) -> Option<SchemaMap> {
        match self.elem() {
            Elem::Resource(r) => Some(r.schema()),
            _ => None,
        }
    }

    /// The element schema of a primitive collection.
    pub fn elem_schema(&self) -> Option<Schema> {
        match self.elem() {
            Elem::Schema(s) => Some(*s),
            _ => None,
        }
    }

    /// The hash used to key this set's element `value` in flatmap form.
    pub fn set_hash(&self, value: &Value) -> u32 {
        if let Some(code) = self.adapter().custom_set_hash(value) {
            return code;
        }
        crate::diff::hashset::hash_value(value, &self.elem())
    }
}

impl SchemaLike for Schema {
    fn value_type(&self) -> ValueType {
        self.adapter().value_type()
    }

    fn optional(&self) -> bool {
        self.adapter().optional()
    }

    fn required(&self) -> bool {
        self.adapter().required()
    }

    fn computed(&self) -> bool {
        self.adapter().computed()
    }

    fn force_new(&self) -> bool {
        self.adapter().force_new()
    }

    fn sensitive(&self) -> bool {
        self.adapter().sensitive()
    }

    fn elem(&self) -> Elem {
        self.adapter().elem()
    }

    fn max_items(&self) -> usize {
        self.adapter().max_items()
    }

    fn min_items(&self) -> usize {
        self.adapter().min_items()
    }

    fn default_value(&self) -> Option<Value> {
        self.adapter().default_value()
    }

    fn description(&self) -> &str {
        self.adapter().description()
    }

    fn deprecated(&self) -> &str {
        self.adapter().deprecated()
    }

    fn conflicts_with(&self) -> &[String] {
        self.adapter().conflicts_with()
    }

    fn custom_set_hash(&self, value: &Value) -> Option<u32> {
        self.adapter().custom_set_hash(value)
    }

    fn supports_unknown_collections(&self) -> bool {
        self.adapter().supports_unknown_collections()
    }
}

/// Attribute schemas keyed by Terraform name, iterated in key order.
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    entries: BTreeMap<String, Schema>,
}

impl SchemaMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an attribute.
    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.entries.get(key)
    }

    /// Look up an attribute, failing with a schema error if it is absent.
    pub fn get_ok(&self, key: &str) -> Result<&Schema> {
        self.entries
            .get(key)
            .ok_or_else(|| BridgeError::Schema(format!("attribute {:?} not found", key)))
    }

    /// Returns true if the attribute exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attribute names in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Insert an attribute.
    pub fn insert(&mut self, key: impl Into<String>, schema: Schema) {
        self.entries.insert(key.into(), schema);
    }

    /// Check the declarations for combinations the SDKs reject.
    pub fn validate(&self) -> Result<()> {
        for (key, schema) in self.iter() {
            validate_schema(key, schema)?;
        }
        Ok(())
    }
}

impl FromIterator<(String, Schema)> for SchemaMap {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn validate_schema(key: &str, schema: &Schema) -> Result<()> {
    let invalid = |msg: &str| Err(BridgeError::Schema(format!("{}: {}", key, msg)));
    if schema.value_type() == ValueType::Invalid {
        return invalid("type is invalid");
    }
    if schema.required() && schema.optional() {
        return invalid("Optional or Required must be set, not both");
    }
    if schema.required() && schema.computed() {
        return invalid("Cannot be both Required and Computed");
    }
    if !schema.required() && !schema.optional() && !schema.computed() {
        return invalid("One of optional, required, or computed must be set");
    }
    if schema.required() && schema.default_value().is_some() {
        return invalid("Default must be nil if required");
    }
    if (schema.max_items() > 0 || schema.min_items() > 0) && !schema.value_type().is_list_or_set() {
        return invalid("MaxItems and MinItems are only supported on lists or sets");
    }
    match schema.elem() {
        Elem::Resource(r) => {
            let fields = r.schema();
            for (k, s) in fields.iter() {
                validate_schema(&format!("{}.{}", key, k), s)?;
            }
        },
        Elem::Schema(_) | Elem::None => {},
    }
    Ok(())
}

/// Capabilities every resource adapter provides.
pub trait ResourceLike {
    /// The resource's attribute schemas.
    fn schema(&self) -> SchemaMap;

    /// State schema version.
    fn schema_version(&self) -> u64 {
        0
    }

    /// Deprecation message.
    fn deprecation_message(&self) -> &str {
        ""
    }

    /// Whether the resource supports import.
    fn importable(&self) -> bool {
        false
    }

    /// Compute the diff from `state` to `config`.
    fn diff(&self, state: Option<&InstanceState>, config: &ResourceConfig) -> Result<InstanceDiff>;

    /// Apply `diff` to `state`.
    fn apply(&self, state: Option<&InstanceState>, diff: &InstanceDiff) -> Result<InstanceState>;

    /// Refresh `state` from the provider.
    fn refresh(&self, state: &InstanceState) -> Result<InstanceState>;
}

/// A resource, data source or nested object from any adapter.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Legacy SDK v1.
    V1(sdkv1::V1Resource),
    /// Structured SDK v2.
    V2(sdkv2::V2Resource),
    /// Plugin Framework.
    Framework(framework::FrameworkResource),
    /// In-memory resource for tests.
    Synthetic(synthetic::SyntheticResource),
    /// Pseudo-resource carrying an object type's fields.
    Object(object::ObjectResource),
}

impl Resource {
    fn adapter(&self) -> &dyn ResourceLike {
        match self {
            Self::V1(r) => r,
            Self::V2(r) => r,
            Self::Framework(r) => r,
            Self::Synthetic(r) => r,
            Self::Object(r) => r,
        }
    }
}

impl ResourceLike for Resource {
    fn schema(&self) -> SchemaMap {
        self.adapter().schema()
    }

    fn schema_version(&self) -> u64 {
        self.adapter().schema_version()
    }

    fn deprecation_message(&self) -> &str {
        self.adapter().deprecation_message()
    }

    fn importable(&self) -> bool {
        self.adapter().importable()
    }

    fn diff(&self, state: Option<&InstanceState>, config: &ResourceConfig) -> Result<InstanceDiff> {
        self.adapter().diff(state, config)
    }

    fn apply(&self, state: Option<&InstanceState>, diff: &InstanceDiff) -> Result<InstanceState> {
        self.adapter().apply(state, diff)
    }

    fn refresh(&self, state: &InstanceState) -> Result<InstanceState> {
        self.adapter().refresh(state)
    }
}

/// Resources keyed by Terraform token.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    entries: BTreeMap<String, Resource>,
}

impl ResourceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no resources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a resource.
    pub fn get(&self, token: &str) -> Option<&Resource> {
        self.entries.get(token)
    }

    /// Look up a resource, failing if it is absent.
    pub fn get_ok(&self, token: &str) -> Result<&Resource> {
        self.entries
            .get(token)
            .ok_or_else(|| BridgeError::UnknownResource(token.to_string()))
    }

    /// Iterate resources in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace a resource.
    pub fn set(&mut self, token: impl Into<String>, resource: Resource) {
        self.entries.insert(token.into(), resource);
    }

    /// Register an existing resource under an additional token.
    pub fn clone_resource(&mut self, old_token: &str, new_token: &str) -> Result<()> {
        let resource = self.get_ok(old_token)?.clone();
        self.set(new_token, resource);
        Ok(())
    }
}

impl FromIterator<(String, Resource)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (String, Resource)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A provider from any runtime-capable or schema-only adapter.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Legacy SDK v1.
    V1(sdkv1::V1Provider),
    /// Structured SDK v2.
    V2(sdkv2::V2Provider),
    /// Plugin Framework.
    Framework(framework::FrameworkProvider),
}

impl Provider {
    /// Provider configuration schema.
    pub fn schema(&self) -> SchemaMap {
        match self {
            Self::V1(p) => p.schema(),
            Self::V2(p) => p.schema(),
            Self::Framework(p) => p.schema(),
        }
    }

    /// Managed resources.
    pub fn resources_map(&self) -> ResourceMap {
        match self {
            Self::V1(p) => p.resources_map(),
            Self::V2(p) => p.resources_map(),
            Self::Framework(p) => p.resources_map(),
        }
    }

    /// Data sources.
    pub fn data_sources_map(&self) -> ResourceMap {
        match self {
            Self::V1(p) => p.data_sources_map(),
            Self::V2(p) => p.data_sources_map(),
            Self::Framework(p) => p.data_sources_map(),
        }
    }

    /// Whether wholly unknown lists and sets can be sent to this provider.
    pub fn supports_unknown_collections(&self) -> bool {
        !matches!(self, Self::V1(_))
    }

    /// Look up a managed resource by Terraform token.
    pub fn resource(&self, token: &str) -> Result<Resource> {
        self.resources_map().get_ok(token).cloned()
    }

    /// Diff a managed resource.
    pub fn diff(
        &self,
        token: &str,
        state: Option<&InstanceState>,
        config: &ResourceConfig,
    ) -> Result<InstanceDiff> {
        self.resource(token)?.diff(state, config)
    }

    /// Apply a diff to a managed resource.
    pub fn apply(
        &self,
        token: &str,
        state: Option<&InstanceState>,
        diff: &InstanceDiff,
    ) -> Result<InstanceState> {
        self.resource(token)?.apply(state, diff)
    }

    /// Refresh a managed resource.
    pub fn refresh(&self, token: &str, state: &InstanceState) -> Result<InstanceState> {
        self.resource(token)?.refresh(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkProvider, SdkResource, SdkSchema};

    fn provider() -> Provider {
        Provider::V2(sdkv2::V2Provider::new(
            SdkProvider::new().with_resource(
                "example_thing",
                SdkResource::new()
                    .with_field("name", SdkSchema::string().required())
                    .with_field(
                        "rule",
                        SdkSchema::list_block(
                            SdkResource::new().with_field("port", SdkSchema::int().optional()),
                        )
                        .optional()
                        .with_max_items(1),
                    ),
            ),
        ))
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::Set.to_string(), "Set");
        assert!(ValueType::List.is_list_or_set());
        assert!(!ValueType::Map.is_list_or_set());
    }

    #[test]
    fn test_provider_resource_lookup() {
        let p = provider();
        let res = p.resource("example_thing").unwrap();
        let fields = res.schema();
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["name", "rule"]);

        let rule = fields.get("rule").unwrap();
        assert!(rule.is_object_collection());
        assert!(!rule.is_object());
        assert_eq!(rule.max_items(), 1);

        let err = p.resource("example_missing").unwrap_err();
        assert!(matches!(err, BridgeError::UnknownResource(_)));
    }

    #[test]
    fn test_clone_resource() {
        let mut resources = provider().resources_map();
        resources
            .clone_resource("example_thing", "example_thing_legacy")
            .unwrap();
        assert_eq!(resources.len(), 2);
        assert!(resources.clone_resource("nope", "x").is_err());
    }

    #[test]
    fn test_validate() {
        let ok = provider().resource("example_thing").unwrap().schema();
        assert!(ok.validate().is_ok());

        let bad: SchemaMap = [(
            "x".to_string(),
            Schema::V2(sdkv2::V2Schema::new(SdkSchema::string().required().optional())),
        )]
        .into_iter()
        .collect();
        let err = bad.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error: x: Optional or Required must be set, not both"
        );

        let bad: SchemaMap = [(
            "y".to_string(),
            Schema::V2(sdkv2::V2Schema::new(SdkSchema::string().optional().with_max_items(1))),
        )]
        .into_iter()
        .collect();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_supports_unknown_collections() {
        assert!(provider().supports_unknown_collections());
        let v1 = Provider::V1(sdkv1::V1Provider::new(SdkProvider::new()));
        assert!(!v1.supports_unknown_collections());
    }
}
