//! State and diff records exchanged with SDK-style providers.
//!
//! Legacy SDK providers keep resource state as a flat map of dotted keys to
//! strings ("flatmap") and describe planned changes as an [`InstanceDiff`]
//! keyed the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Terraform's sentinel for a value that is not yet known.
pub const UNKNOWN_VARIABLE_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// Configuration handed to a resource, shaped like Terraform inputs.
pub type ResourceConfig = serde_json::Map<String, Value>;

/// The persisted state of a resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstanceState {
    /// The resource identifier. Empty when not yet known.
    #[serde(default)]
    pub id: String,
    /// Flattened attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Provider-private metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl InstanceState {
    /// Create a state with the given id and attributes.
    pub fn new(id: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        let id = id.into();
        let mut attributes = attributes;
        if !id.is_empty() {
            attributes.insert("id".to_string(), id.clone());
        }
        Self {
            id,
            attributes,
            meta: BTreeMap::new(),
        }
    }

    /// Look up a flat attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Which side of a resource an attribute diff belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAttrType {
    /// Not recorded.
    #[default]
    Unknown,
    /// A configurable attribute.
    Input,
    /// A provider-computed attribute.
    Output,
}

/// A planned change to a single flat attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceAttrDiff {
    /// Prior value.
    #[serde(default)]
    pub old: String,
    /// Planned value. Meaningless when `new_computed` is set.
    #[serde(default)]
    pub new: String,
    /// The final value is not known until apply.
    #[serde(default)]
    pub new_computed: bool,
    /// The key is removed from its collection.
    #[serde(default)]
    pub new_removed: bool,
    /// Raw configuration value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_extra: Option<Value>,
    /// Changing this attribute replaces the resource.
    #[serde(default)]
    pub requires_new: bool,
    /// The attribute is sensitive.
    #[serde(default)]
    pub sensitive: bool,
    /// Input or output attribute.
    #[serde(default)]
    pub attr_type: DiffAttrType,
}

impl ResourceAttrDiff {
    /// A change from `old` to `new`.
    pub fn changed(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
            ..Default::default()
        }
    }

    /// A change whose result is not yet known.
    pub fn computed(old: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new_computed: true,
            ..Default::default()
        }
    }

    /// A removal of `old`.
    pub fn removed(old: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new_removed: true,
            ..Default::default()
        }
    }

    /// Mark this change as requiring replacement.
    pub fn with_requires_new(mut self) -> Self {
        self.requires_new = true;
        self
    }

    /// Returns true if applying this entry changes nothing.
    pub fn is_noop(&self) -> bool {
        !self.new_computed && !self.new_removed && self.old == self.new
    }
}

/// A planned change to a resource instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstanceDiff {
    /// Per-attribute changes keyed by flat key.
    #[serde(default)]
    pub attributes: BTreeMap<String, ResourceAttrDiff>,
    /// The instance is destroyed.
    #[serde(default)]
    pub destroy: bool,
    /// A deposed instance is destroyed.
    #[serde(default)]
    pub destroy_deposed: bool,
    /// A tainted instance is destroyed.
    #[serde(default)]
    pub destroy_tainted: bool,
}

impl InstanceDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// A diff that destroys the instance.
    pub fn destroy() -> Self {
        Self {
            destroy: true,
            ..Default::default()
        }
    }

    /// Add an attribute change.
    pub fn with_attribute(mut self, key: impl Into<String>, diff: ResourceAttrDiff) -> Self {
        self.attributes.insert(key.into(), diff);
        self
    }

    /// Look up the change for a flat key.
    pub fn attribute(&self, key: &str) -> Option<&ResourceAttrDiff> {
        self.attributes.get(key)
    }

    /// Returns true if any change forces replacement.
    pub fn requires_new(&self) -> bool {
        self.attributes.values().any(|d| d.requires_new)
    }

    /// Returns true if the diff changes nothing.
    pub fn has_no_changes(&self) -> bool {
        !self.destroy
            && !self.destroy_deposed
            && !self.destroy_tainted
            && self.attributes.values().all(ResourceAttrDiff::is_noop)
    }
}

/// A provider's recorded state, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawState(Value);

impl RawState {
    /// Wrap a JSON state document.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the JSON document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the JSON document.
    pub fn into_value(self) -> Value {
        self.0
    }
}
