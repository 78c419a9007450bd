//! Object views over existing schema maps.
//!
//! Paths and visitors need to treat a bare [`SchemaMap`] (a resource's fields,
//! or a block's fields) as if it were a single object-typed attribute. These
//! pseudo schemas carry no flags of their own.

use super::{Elem, Resource, ResourceLike, SchemaLike, SchemaMap, ValueType};
use crate::error::{BridgeError, Result};
use crate::types::{InstanceDiff, InstanceState, ResourceConfig};

/// An object-typed schema over a set of fields.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    fields: SchemaMap,
}

impl ObjectSchema {
    /// Wrap the given fields.
    pub fn new(fields: SchemaMap) -> Self {
        Self { fields }
    }
}

impl SchemaLike for ObjectSchema {
    fn value_type(&self) -> ValueType {
        ValueType::Map
    }

    fn optional(&self) -> bool {
        false
    }

    fn required(&self) -> bool {
        false
    }

    fn computed(&self) -> bool {
        false
    }

    fn force_new(&self) -> bool {
        false
    }

    fn sensitive(&self) -> bool {
        false
    }

    fn elem(&self) -> Elem {
        Elem::Resource(Resource::Object(ObjectResource::new(self.fields.clone())))
    }
}

/// A pseudo-resource exposing an object type's fields.
#[derive(Debug, Clone)]
pub struct ObjectResource {
    fields: SchemaMap,
}

impl ObjectResource {
    /// Wrap the given fields.
    pub fn new(fields: SchemaMap) -> Self {
        Self { fields }
    }
}

impl ResourceLike for ObjectResource {
    fn schema(&self) -> SchemaMap {
        self.fields.clone()
    }

    fn diff(&self, _state: Option<&InstanceState>, _config: &ResourceConfig) -> Result<InstanceDiff> {
        Err(BridgeError::Unsupported {
            op: "diff",
            adapter: "object",
        })
    }

    fn apply(&self, _state: Option<&InstanceState>, _diff: &InstanceDiff) -> Result<InstanceState> {
        Err(BridgeError::Unsupported {
            op: "apply",
            adapter: "object",
        })
    }

    fn refresh(&self, _state: &InstanceState) -> Result<InstanceState> {
        Err(BridgeError::Unsupported {
            op: "refresh",
            adapter: "object",
        })
    }
}
