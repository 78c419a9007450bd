//! In-memory schemas for tests and schema-only tooling.
//!
//! The synthetic adapter reads the same [`SdkSchema`] declarations as the SDK
//! adapters but offers no runtime operations.

use super::{Elem, Resource, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::error::{BridgeError, Result};
use crate::sdk::{SdkElem, SdkResource, SdkSchema};
use crate::types::{InstanceDiff, InstanceState, ResourceConfig};
use serde_json::Value;
use std::sync::Arc;

/// A schema-only attribute or block.
#[derive(Debug, Clone)]
pub struct SyntheticSchema {
    decl: Arc<SdkSchema>,
}

impl SyntheticSchema {
    /// Wrap a declaration.
    pub fn new(decl: SdkSchema) -> Self {
        Self {
            decl: Arc::new(decl),
        }
    }
}

impl SchemaLike for SyntheticSchema {
    fn value_type(&self) -> ValueType {
        self.decl.value_type
    }

    fn optional(&self) -> bool {
        self.decl.optional
    }

    fn required(&self) -> bool {
        self.decl.required
    }

    fn computed(&self) -> bool {
        self.decl.computed
    }

    fn force_new(&self) -> bool {
        self.decl.force_new
    }

    fn sensitive(&self) -> bool {
        self.decl.sensitive
    }

    fn elem(&self) -> Elem {
        match &self.decl.elem {
            SdkElem::Resource(r) => Elem::Resource(Resource::Synthetic(SyntheticResource {
                decl: r.clone(),
            })),
            SdkElem::Schema(s) => Elem::Schema(Box::new(Schema::Synthetic(SyntheticSchema {
                decl: s.clone(),
            }))),
            SdkElem::None => Elem::None,
        }
    }

    fn max_items(&self) -> usize {
        self.decl.max_items
    }

    fn min_items(&self) -> usize {
        self.decl.min_items
    }

    fn default_value(&self) -> Option<Value> {
        self.decl.default.clone()
    }

    fn description(&self) -> &str {
        &self.decl.description
    }

    fn custom_set_hash(&self, value: &Value) -> Option<u32> {
        self.decl.set_hash.map(|f| f(value))
    }
}

/// A schema-only resource.
#[derive(Debug, Clone)]
pub struct SyntheticResource {
    decl: Arc<SdkResource>,
}

impl SyntheticResource {
    /// Wrap a declaration.
    pub fn new(decl: SdkResource) -> Self {
        Self {
            decl: Arc::new(decl),
        }
    }
}

impl ResourceLike for SyntheticResource {
    fn schema(&self) -> SchemaMap {
        synthetic_schema_map(&self.decl)
    }

    fn schema_version(&self) -> u64 {
        self.decl.schema_version
    }

    fn diff(&self, _state: Option<&InstanceState>, _config: &ResourceConfig) -> Result<InstanceDiff> {
        Err(BridgeError::Unsupported {
            op: "diff",
            adapter: "synthetic",
        })
    }

    fn apply(&self, _state: Option<&InstanceState>, _diff: &InstanceDiff) -> Result<InstanceState> {
        Err(BridgeError::Unsupported {
            op: "apply",
            adapter: "synthetic",
        })
    }

    fn refresh(&self, _state: &InstanceState) -> Result<InstanceState> {
        Err(BridgeError::Unsupported {
            op: "refresh",
            adapter: "synthetic",
        })
    }
}

/// Build a schema map of synthetic schemas from a resource declaration.
pub fn synthetic_schema_map(decl: &SdkResource) -> SchemaMap {
    decl.schema
        .iter()
        .map(|(k, s)| {
            (
                k.clone(),
                Schema::Synthetic(SyntheticSchema { decl: s.clone() }),
            )
        })
        .collect()
}
