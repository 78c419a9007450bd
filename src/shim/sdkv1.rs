//! Adapter for legacy SDK (v1) providers.
//!
//! The legacy SDK keeps state as flatmap attributes and cannot represent a
//! wholly unknown list or set: unknown collections are sent as collections
//! of unknowns instead.

use super::{Elem, Resource, ResourceLike, ResourceMap, Schema, SchemaLike, SchemaMap, ValueType};
use crate::diff::instance;
use crate::error::Result;
use crate::sdk::{SdkElem, SdkProvider, SdkResource, SdkSchema};
use crate::types::{InstanceDiff, InstanceState, ResourceConfig};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A v1 attribute or block.
#[derive(Debug, Clone)]
pub struct V1Schema {
    tf: Arc<SdkSchema>,
}

impl V1Schema {
    /// Wrap a declaration.
    pub fn new(tf: SdkSchema) -> Self {
        Self { tf: Arc::new(tf) }
    }

    pub(crate) fn from_arc(tf: Arc<SdkSchema>) -> Self {
        Self { tf }
    }
}

impl SchemaLike for V1Schema {
    fn value_type(&self) -> ValueType {
        self.tf.value_type
    }

    fn optional(&self) -> bool {
        self.tf.optional
    }

    fn required(&self) -> bool {
        self.tf.required
    }

    fn computed(&self) -> bool {
        self.tf.computed
    }

    fn force_new(&self) -> bool {
        self.tf.force_new
    }

    fn sensitive(&self) -> bool {
        self.tf.sensitive
    }

    fn elem(&self) -> Elem {
        match &self.tf.elem {
            // No single-nested blocks in the legacy SDK either.
            SdkElem::Resource(_) if self.tf.value_type == ValueType::Map => {
                Elem::Schema(Box::new(Schema::V1(V1Schema::new(SdkSchema::string()))))
            },
            SdkElem::Resource(r) => Elem::Resource(Resource::V1(V1Resource::from_arc(r.clone()))),
            SdkElem::Schema(s) => Elem::Schema(Box::new(Schema::V1(V1Schema::from_arc(s.clone())))),
            SdkElem::None => Elem::None,
        }
    }

    fn max_items(&self) -> usize {
        self.tf.max_items
    }

    fn min_items(&self) -> usize {
        self.tf.min_items
    }

    fn default_value(&self) -> Option<Value> {
        self.tf.default.clone()
    }

    fn description(&self) -> &str {
        &self.tf.description
    }

    fn deprecated(&self) -> &str {
        &self.tf.deprecated
    }

    fn conflicts_with(&self) -> &[String] {
        &self.tf.conflicts_with
    }

    fn custom_set_hash(&self, value: &Value) -> Option<u32> {
        self.tf.set_hash.map(|f| f(value))
    }

}

/// A v1 resource, data source or nested block.
#[derive(Debug, Clone)]
pub struct V1Resource {
    tf: Arc<SdkResource>,
}

impl V1Resource {
    /// Wrap a declaration.
    pub fn new(tf: SdkResource) -> Self {
        Self { tf: Arc::new(tf) }
    }

    pub(crate) fn from_arc(tf: Arc<SdkResource>) -> Self {
        Self { tf }
    }
}

impl ResourceLike for V1Resource {
    fn schema(&self) -> SchemaMap {
        v1_schema_map(&self.tf.schema)
    }

    fn schema_version(&self) -> u64 {
        self.tf.schema_version
    }

    fn deprecation_message(&self) -> &str {
        &self.tf.deprecation_message
    }

    fn importable(&self) -> bool {
        self.tf.importable
    }

    fn diff(&self, state: Option<&InstanceState>, config: &ResourceConfig) -> Result<InstanceDiff> {
        instance::diff_instance(&self.schema(), state, config)
    }

    fn apply(&self, state: Option<&InstanceState>, diff: &InstanceDiff) -> Result<InstanceState> {
        instance::apply_diff(&self.schema(), state, diff)
    }

    fn refresh(&self, state: &InstanceState) -> Result<InstanceState> {
        match self.tf.read {
            Some(read) => read(state),
            None => Ok(state.clone()),
        }
    }
}

/// A v1 provider.
#[derive(Debug, Clone)]
pub struct V1Provider {
    tf: Arc<SdkProvider>,
}

impl V1Provider {
    /// Wrap a declaration.
    pub fn new(tf: SdkProvider) -> Self {
        Self { tf: Arc::new(tf) }
    }

    /// Provider configuration schema.
    pub fn schema(&self) -> SchemaMap {
        v1_schema_map(&self.tf.schema)
    }

    /// Managed resources.
    pub fn resources_map(&self) -> ResourceMap {
        v1_resource_map(&self.tf.resources)
    }

    /// Data sources.
    pub fn data_sources_map(&self) -> ResourceMap {
        v1_resource_map(&self.tf.data_sources)
    }
}

/// Wrap a declaration map as v1 schemas.
pub fn v1_schema_map(fields: &BTreeMap<String, Arc<SdkSchema>>) -> SchemaMap {
    fields
        .iter()
        .map(|(k, s)| (k.clone(), Schema::V1(V1Schema::from_arc(s.clone()))))
        .collect()
}

fn v1_resource_map(resources: &BTreeMap<String, Arc<SdkResource>>) -> ResourceMap {
    resources
        .iter()
        .map(|(k, r)| (k.clone(), Resource::V1(V1Resource::from_arc(r.clone()))))
        .collect()
}
