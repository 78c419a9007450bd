//! Schema path addressing and traversal.
//!
//! A [`SchemaPath`] names a node in a resource schema independently of any
//! particular value: `GetAttr` steps select an attribute of an object and
//! `Element` steps select "some element" of a list, set or map. Paths encode
//! as dotted strings with `$` standing for an element step:
//!
//! ```
//! use hemmer_tf_bridge::walk::{decode_schema_path, encode_schema_path, SchemaPath};
//!
//! let path = SchemaPath::new().get_attr("rule").element().get_attr("port");
//! assert_eq!(encode_schema_path(&path).unwrap(), "rule.$.port");
//! assert_eq!(decode_schema_path("rule.$.port"), path);
//! ```

use crate::error::{BridgeError, Result};
use crate::info::{self, SchemaInfo, SchemaInfos};
use crate::property_path::{PathElement, PropertyPath};
use crate::shim::{Elem, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::wire::WireType;
use std::fmt;

/// One step of a [`SchemaPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaPathStep {
    /// Select an attribute of an object.
    GetAttr(String),
    /// Select an element of a collection.
    Element,
}

impl fmt::Display for SchemaPathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetAttr(name) => write!(f, "GetAttr({:?})", name),
            Self::Element => write!(f, "Element()"),
        }
    }
}

/// A path through a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SchemaPath(Vec<SchemaPathStep>);

impl SchemaPath {
    /// The empty path addressing the root.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Return a new path extended by an attribute step.
    pub fn get_attr(&self, name: impl Into<String>) -> Self {
        self.with_step(SchemaPathStep::GetAttr(name.into()))
    }

    /// Return a new path extended by an element step.
    pub fn element(&self) -> Self {
        self.with_step(SchemaPathStep::Element)
    }

    /// Return a new path extended by `step`.
    pub fn with_step(&self, step: SchemaPathStep) -> Self {
        let mut next = self.0.clone();
        next.push(step);
        Self(next)
    }

    /// The steps of this path.
    pub fn steps(&self) -> &[SchemaPathStep] {
        &self.0
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaPath()")?;
        for step in &self.0 {
            write!(f, ".{}", step)?;
        }
        Ok(())
    }
}

impl FromIterator<SchemaPathStep> for SchemaPath {
    fn from_iter<I: IntoIterator<Item = SchemaPathStep>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Encode a path as a dotted string.
///
/// Fails for attribute names that contain `.` or are exactly `$`, since they
/// would not decode back to the same path.
pub fn encode_schema_path(path: &SchemaPath) -> Result<String> {
    let mut parts = Vec::with_capacity(path.len());
    for step in path.steps() {
        match step {
            SchemaPathStep::Element => parts.push("$"),
            SchemaPathStep::GetAttr(name) if name.contains('.') => {
                return Err(BridgeError::InvalidPath(format!(
                    "cannot encode attribute {:?} containing '.'",
                    name
                )));
            },
            SchemaPathStep::GetAttr(name) if name == "$" => {
                return Err(BridgeError::InvalidPath(format!("cannot encode attribute {:?}", name)));
            },
            SchemaPathStep::GetAttr(name) => parts.push(name),
        }
    }
    Ok(parts.join("."))
}

/// Decode a dotted string produced by [`encode_schema_path`].
pub fn decode_schema_path(encoded: &str) -> SchemaPath {
    if encoded.is_empty() {
        return SchemaPath::new();
    }
    encoded
        .split('.')
        .map(|part| match part {
            "$" => SchemaPathStep::Element,
            name => SchemaPathStep::GetAttr(name.to_string()),
        })
        .collect()
}

fn lookup_step(step: &SchemaPathStep, schema: &Schema) -> std::result::Result<Schema, String> {
    match step {
        SchemaPathStep::GetAttr(name) => {
            if !schema.is_object() {
                return Err(format!("{} is not applicable to {} schemas", step, schema.value_type()));
            }
            let fields = schema.object_fields().unwrap_or_default();
            fields
                .get(name)
                .cloned()
                .ok_or_else(|| format!("{} not found", step))
        },
        SchemaPathStep::Element => match schema.elem() {
            Elem::Resource(r) => match schema.value_type() {
                ValueType::Map => Err(format!("{} is not applicable to object types", step)),
                ValueType::List | ValueType::Set => Ok(Schema::object(r.schema())),
                other => Err(format!("{} is not applicable to {} schemas", step, other)),
            },
            Elem::Schema(s) => Ok(*s),
            Elem::None => Err(format!("{} is not applicable to {} schemas", step, schema.value_type())),
        },
    }
}

/// Resolve `path` against `root`.
///
/// Steps are applied left to right; the error names the longest prefix that
/// did resolve.
pub fn lookup_schema_path(path: &SchemaPath, root: &Schema) -> Result<Schema> {
    let mut current = SchemaPath::new();
    let mut schema = root.clone();
    for step in path.steps() {
        schema = lookup_step(step, &schema)
            .map_err(|message| BridgeError::schema_path(current.to_string(), message))?;
        current = current.with_step(step.clone());
    }
    Ok(schema)
}

/// Resolve `path` against the fields of a resource.
pub fn lookup_schema_map_path(path: &SchemaPath, schema_map: &SchemaMap) -> Result<Schema> {
    lookup_schema_path(path, &Schema::object(schema_map.clone()))
}

/// Resolve `path` against a wire type.
///
/// A dynamic type resolves every remaining step to dynamic.
pub fn lookup_type(path: &SchemaPath, root: &WireType) -> Result<WireType> {
    let mut current = SchemaPath::new();
    let mut ty = root.clone();
    for step in path.steps() {
        ty = match (step, &ty) {
            (_, WireType::Dynamic) => WireType::Dynamic,
            (SchemaPathStep::GetAttr(name), WireType::Object(attrs)) => match attrs.get(name) {
                Some(t) => t.clone(),
                None => {
                    return Err(BridgeError::schema_path(
                        current.to_string(),
                        format!("{} not found", step),
                    ))
                },
            },
            (
                SchemaPathStep::Element,
                WireType::List(element) | WireType::Set(element) | WireType::Map(element),
            ) => element.as_ref().clone(),
            (step, ty) => {
                return Err(BridgeError::schema_path(
                    current.to_string(),
                    format!("{} is not applicable to type {}", step, ty),
                ))
            },
        };
        current = current.with_step(step.clone());
    }
    Ok(ty)
}

/// Visit every schema node under `root` in depth-first pre-order.
///
/// Attributes are visited in sorted order. An object node's attributes are
/// addressed directly under the object's path, while the attributes of the
/// objects in a list or set sit under an element step.
pub fn visit_schema_map<F>(root: &SchemaMap, visitor: &mut F)
where
    F: FnMut(&SchemaPath, &Schema),
{
    visit_schema_map_inner(&SchemaPath::new(), root, visitor);
}

/// Visit `schema` and every node below it, starting at `path`.
pub fn visit_schema<F>(path: &SchemaPath, schema: &Schema, visitor: &mut F)
where
    F: FnMut(&SchemaPath, &Schema),
{
    visitor(path, schema);
    match schema.elem() {
        Elem::Resource(r) => {
            let nested = if schema.value_type() == ValueType::Map {
                path.clone()
            } else {
                path.element()
            };
            visit_schema_map_inner(&nested, &r.schema(), visitor);
        },
        Elem::Schema(s) => visit_schema(&path.element(), &s, visitor),
        Elem::None => {},
    }
}

fn visit_schema_map_inner<F>(path: &SchemaPath, schema_map: &SchemaMap, visitor: &mut F)
where
    F: FnMut(&SchemaPath, &Schema),
{
    for (key, schema) in schema_map.iter() {
        visit_schema(&path.get_attr(key), schema, visitor);
    }
}

/// Map a flatmap attribute key to the schema path it stores.
///
/// Count keys (`tags.%`, `rule.#`) map to the collection itself; list indexes
/// and set hash codes map to element steps.
pub fn schema_path_from_flat_key(key: &str, schema_map: &SchemaMap) -> Result<SchemaPath> {
    let mut path = SchemaPath::new();
    let mut schema = Schema::object(schema_map.clone());
    let mut parts = key.split('.').peekable();

    while let Some(part) = parts.next() {
        if schema.is_object() {
            path = path.get_attr(part);
        } else if matches!(part, "#" | "%") && parts.peek().is_none() {
            break;
        } else if matches!(schema.value_type(), ValueType::List | ValueType::Set | ValueType::Map) {
            path = path.element();
        } else {
            return Err(BridgeError::schema_path(
                path.to_string(),
                format!("flat key {:?} goes below a {} attribute", key, schema.value_type()),
            ));
        }
        let step = path.steps().last().cloned().unwrap_or(SchemaPathStep::Element);
        schema = lookup_step(&step, &schema)
            .map_err(|message| BridgeError::schema_path(path.to_string(), message))?;
    }
    Ok(path)
}

/// Translate a property path into the schema path it addresses.
///
/// Property names are mapped to attribute names through `infos`, and a
/// flattened single-item collection consumes no property step. Returns `None`
/// when the path leaves the schema.
pub fn schema_path_from_property_path(
    path: &PropertyPath,
    schema_map: &SchemaMap,
    infos: &SchemaInfos,
) -> Option<SchemaPath> {
    from_property_steps(SchemaPath::new(), path.elements(), schema_map, infos)
}

fn from_property_steps(
    base: SchemaPath,
    steps: &[PathElement],
    schema_map: &SchemaMap,
    infos: &SchemaInfos,
) -> Option<SchemaPath> {
    let Some((first, rest)) = steps.split_first() else {
        return Some(base);
    };
    let PathElement::Key(property) = first else {
        return None;
    };
    let tf_name = info::property_to_terraform_name(property, schema_map, infos);
    let schema = schema_map.get(&tf_name)?;
    from_property_steps_inner(base.get_attr(&tf_name), rest, schema, infos.get(&tf_name))
}

fn from_property_steps_inner(
    base: SchemaPath,
    steps: &[PathElement],
    schema: &Schema,
    info: Option<&SchemaInfo>,
) -> Option<SchemaPath> {
    if steps.is_empty() {
        return Some(base);
    }
    let empty = SchemaInfos::new();
    let fields_info = info.map_or(&empty, |i| &i.fields);

    if schema.is_object() {
        return from_property_steps(base, steps, &schema.object_fields()?, fields_info);
    }
    if !matches!(schema.value_type(), ValueType::List | ValueType::Set | ValueType::Map) {
        return None;
    }
    let element_steps = if info::is_max_items_one(schema, info) {
        steps
    } else {
        &steps[1..]
    };
    match schema.elem() {
        Elem::Resource(r) => from_property_steps(
            base.element(),
            element_steps,
            &r.schema(),
            fields_info,
        ),
        Elem::Schema(s) => {
            from_property_steps_inner(base.element(), element_steps, &s, info.and_then(|i| i.elem.as_deref()))
        },
        Elem::None => None,
    }
}
