//! Helper-schema declarations for SDK-style providers.
//!
//! Legacy (v1) and structured (v2) SDK providers declare resources as maps of
//! [`SdkSchema`] nodes. These declarations are wrapped by the
//! [`shim::sdkv1`](crate::shim::sdkv1), [`shim::sdkv2`](crate::shim::sdkv2) and
//! [`shim::synthetic`](crate::shim::synthetic) adapters.
//!
//! # Example
//!
//! ```
//! use hemmer_tf_bridge::sdk::{SdkResource, SdkSchema};
//!
//! let rule = SdkResource::new()
//!     .with_field("port", SdkSchema::int().required())
//!     .with_field("cidr", SdkSchema::string().optional());
//!
//! let resource = SdkResource::new()
//!     .with_field("name", SdkSchema::string().required().force_new())
//!     .with_field("rule", SdkSchema::set_block(rule).optional())
//!     .with_field("tags", SdkSchema::map_of(SdkSchema::string()).optional());
//!
//! assert_eq!(resource.schema.len(), 3);
//! ```

use crate::error::Result;
use crate::shim::ValueType;
use crate::types::InstanceState;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Custom set hash function for a set's elements.
pub type SetHashFn = fn(&Value) -> u32;

/// Refresh hook for a resource.
pub type ReadFn = fn(&InstanceState) -> Result<InstanceState>;

/// The element of a collection schema.
#[derive(Debug, Clone, Default)]
pub enum SdkElem {
    /// No element declared.
    #[default]
    None,
    /// A primitive or collection element.
    Schema(Arc<SdkSchema>),
    /// An object element (a nested block).
    Resource(Arc<SdkResource>),
}

/// A single attribute or block declaration.
#[derive(Debug, Clone, Default)]
pub struct SdkSchema {
    /// The value type.
    pub value_type: ValueType,
    /// The attribute may be set in configuration.
    pub optional: bool,
    /// The attribute must be set in configuration.
    pub required: bool,
    /// The provider may compute the value.
    pub computed: bool,
    /// Changing the value replaces the resource.
    pub force_new: bool,
    /// The value is sensitive.
    pub sensitive: bool,
    /// Maximum collection size (0 = unlimited).
    pub max_items: usize,
    /// Minimum collection size.
    pub min_items: usize,
    /// Default value, as Terraform would see it.
    pub default: Option<Value>,
    /// Human-readable description.
    pub description: String,
    /// Deprecation message.
    pub deprecated: String,
    /// Attributes this one conflicts with.
    pub conflicts_with: Vec<String>,
    /// Element declaration for collections.
    pub elem: SdkElem,
    /// Custom hash for set elements.
    pub set_hash: Option<SetHashFn>,
}

impl SdkSchema {
    /// Create a schema of the given type with no flags set.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Default::default()
        }
    }

    /// A string attribute.
    pub fn string() -> Self {
        Self::new(ValueType::String)
    }

    /// An integer attribute.
    pub fn int() -> Self {
        Self::new(ValueType::Int)
    }

    /// A float attribute.
    pub fn float() -> Self {
        Self::new(ValueType::Float)
    }

    /// A boolean attribute.
    pub fn bool() -> Self {
        Self::new(ValueType::Bool)
    }

    /// A list of primitive elements.
    pub fn list_of(elem: SdkSchema) -> Self {
        Self::new(ValueType::List).with_elem(elem)
    }

    /// A set of primitive elements.
    pub fn set_of(elem: SdkSchema) -> Self {
        Self::new(ValueType::Set).with_elem(elem)
    }

    /// A map with primitive values.
    pub fn map_of(elem: SdkSchema) -> Self {
        Self::new(ValueType::Map).with_elem(elem)
    }

    /// A list-nested block.
    pub fn list_block(block: SdkResource) -> Self {
        Self::new(ValueType::List).with_block(block)
    }

    /// A set-nested block.
    pub fn set_block(block: SdkResource) -> Self {
        Self::new(ValueType::Set).with_block(block)
    }

    /// Mark as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as computed.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark as forcing replacement.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Mark as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Set the maximum collection size.
    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    /// Set the minimum collection size.
    pub fn with_min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark as deprecated.
    pub fn with_deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = message.into();
        self
    }

    /// Declare a conflicting attribute.
    pub fn with_conflicts_with(mut self, key: impl Into<String>) -> Self {
        self.conflicts_with.push(key.into());
        self
    }

    /// Set a primitive element schema.
    pub fn with_elem(mut self, elem: SdkSchema) -> Self {
        self.elem = SdkElem::Schema(Arc::new(elem));
        self
    }

    /// Set an object element schema.
    pub fn with_block(mut self, block: SdkResource) -> Self {
        self.elem = SdkElem::Resource(Arc::new(block));
        self
    }

    /// Use a custom hash for set elements.
    pub fn with_set_hash(mut self, f: SetHashFn) -> Self {
        self.set_hash = Some(f);
        self
    }
}

/// A resource, data source or nested block declaration.
#[derive(Debug, Clone, Default)]
pub struct SdkResource {
    /// Field declarations by Terraform name.
    pub schema: BTreeMap<String, Arc<SdkSchema>>,
    /// State schema version.
    pub schema_version: u64,
    /// Deprecation message.
    pub deprecation_message: String,
    /// Whether the resource supports import.
    pub importable: bool,
    /// Refresh hook. Without one, refresh returns the prior state.
    pub read: Option<ReadFn>,
}

impl SdkResource {
    /// Create an empty resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn with_field(mut self, name: impl Into<String>, schema: SdkSchema) -> Self {
        self.schema.insert(name.into(), Arc::new(schema));
        self
    }

    /// Set the schema version.
    pub fn with_schema_version(mut self, version: u64) -> Self {
        self.schema_version = version;
        self
    }

    /// Mark as importable.
    pub fn importable(mut self) -> Self {
        self.importable = true;
        self
    }

    /// Mark as deprecated.
    pub fn with_deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = message.into();
        self
    }

    /// Install a refresh hook.
    pub fn with_read(mut self, read: ReadFn) -> Self {
        self.read = Some(read);
        self
    }
}

/// A provider declaration.
#[derive(Debug, Clone, Default)]
pub struct SdkProvider {
    /// Provider configuration fields.
    pub schema: BTreeMap<String, Arc<SdkSchema>>,
    /// Managed resources by Terraform token.
    pub resources: BTreeMap<String, Arc<SdkResource>>,
    /// Data sources by Terraform token.
    pub data_sources: BTreeMap<String, Arc<SdkResource>>,
}

impl SdkProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider configuration field.
    pub fn with_config_field(mut self, name: impl Into<String>, schema: SdkSchema) -> Self {
        self.schema.insert(name.into(), Arc::new(schema));
        self
    }

    /// Add a managed resource.
    pub fn with_resource(mut self, token: impl Into<String>, resource: SdkResource) -> Self {
        self.resources.insert(token.into(), Arc::new(resource));
        self
    }

    /// Add a data source.
    pub fn with_data_source(mut self, token: impl Into<String>, resource: SdkResource) -> Self {
        self.data_sources.insert(token.into(), Arc::new(resource));
        self
    }
}
