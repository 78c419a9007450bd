//! The package document: named types, resources and functions.
//!
//! A package document is the JSON schema the bridge generates for the
//! orchestrator. Types reference each other through local `$ref` strings of
//! the form `#/types/<token>`. This module models the parts of the document
//! the bridge reads and keeps every other field in `extra` maps so a document
//! survives a parse and serialize round trip.
//!
//! # Example
//!
//! ```
//! use hemmer_tf_bridge::package::{parse_type_token, PackageSpec};
//!
//! let spec = PackageSpec::from_json(r##"{
//!     "name": "myprov",
//!     "types": {
//!         "myprov:index/rule:Rule": {
//!             "type": "object",
//!             "properties": { "port": { "type": "integer" } }
//!         }
//!     }
//! }"##).unwrap();
//!
//! assert!(spec.type_spec("myprov:index/rule:Rule").is_some());
//! assert_eq!(parse_type_token("#/types/myprov:index/rule:Rule"), Some("myprov:index/rule:Rule"));
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Prefix of local type references.
pub const TYPE_REF_PREFIX: &str = "#/types/";

/// A set of type tokens, iterated in sorted order.
pub type TypeRefs = BTreeSet<String>;

fn is_false(value: &bool) -> bool {
    !*value
}

/// The type of a property or of a collection element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Primitive kind: `boolean`, `integer`, `number`, `string`, `array` or
    /// `object`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Element type of an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<TypeSpec>>,

    /// Value type of a map (an `object` without a `$ref`).
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<TypeSpec>>,

    /// Reference to a named type.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Union alternatives.
    #[serde(rename = "oneOf", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<TypeSpec>>,

    /// Union discriminator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Value>,

    /// The value is never an output.
    #[serde(default, skip_serializing_if = "is_false")]
    pub plain: bool,
}

impl TypeSpec {
    /// A primitive or container kind.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// A reference to the named type `token`.
    pub fn of_ref(token: &str) -> Self {
        Self {
            reference: Some(type_ref(token)),
            ..Self::default()
        }
    }

    /// An array of `items`.
    pub fn array_of(items: TypeSpec) -> Self {
        Self {
            kind: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// A string-keyed map of `values`.
    pub fn map_of(values: TypeSpec) -> Self {
        Self {
            kind: Some("object".to_string()),
            additional_properties: Some(Box::new(values)),
            ..Self::default()
        }
    }
}

/// A property of an object, resource or function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// The property's type.
    #[serde(flatten)]
    pub type_spec: TypeSpec,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The only value the property may take.
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Environment-based default.
    #[serde(rename = "defaultInfo", default, skip_serializing_if = "Option::is_none")]
    pub default_info: Option<Value>,

    /// Set when the property is deprecated.
    #[serde(
        rename = "deprecationMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deprecation_message: Option<String>,

    /// Per-language code generation hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<BTreeMap<String, Value>>,

    /// The value is secret.
    #[serde(default, skip_serializing_if = "is_false")]
    pub secret: bool,

    /// Changing the value replaces the resource.
    #[serde(rename = "replaceOnChanges", default, skip_serializing_if = "is_false")]
    pub replace_on_changes: bool,

    /// The provider replaces the resource when the value changes.
    #[serde(
        rename = "willReplaceOnChanges",
        default,
        skip_serializing_if = "is_false"
    )]
    pub will_replace_on_changes: bool,
}

impl PropertySpec {
    /// A property of the given type.
    pub fn new(type_spec: TypeSpec) -> Self {
        Self {
            type_spec,
            ..Self::default()
        }
    }

    /// Mark the property secret.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// An object shape: the inputs or outputs of a resource or function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeSpec {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Usually `object`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The object's properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,

    /// Properties that must be set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Fields the bridge does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A named type in the `types` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexTypeSpec {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Usually `object`; `string`, `integer` and so on for enums.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The object's properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,

    /// Properties that must be set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Properties that are never outputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plain: Vec<String>,

    /// Enum cases. Present only on enum types.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// The type is hand-written rather than generated.
    #[serde(rename = "isOverlay", default, skip_serializing_if = "is_false")]
    pub is_overlay: bool,

    /// Per-language code generation hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<BTreeMap<String, Value>>,

    /// Fields the bridge does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ComplexTypeSpec {
    /// An object type with no properties.
    pub fn object() -> Self {
        Self {
            kind: Some("object".to_string()),
            ..Self::default()
        }
    }

    /// Add a property.
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySpec) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Mark a property required.
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Returns true for enum types.
    pub fn is_enum(&self) -> bool {
        self.enum_values.is_some()
    }
}

/// A resource in the `resources` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Output properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,

    /// Output properties that are always set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Input properties.
    #[serde(rename = "inputProperties", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_properties: BTreeMap<String, PropertySpec>,

    /// Inputs that must be set.
    #[serde(rename = "requiredInputs", default, skip_serializing_if = "Vec::is_empty")]
    pub required_inputs: Vec<String>,

    /// Properties used to look up existing resources.
    #[serde(rename = "stateInputs", default, skip_serializing_if = "Option::is_none")]
    pub state_inputs: Option<ObjectTypeSpec>,

    /// Fields the bridge does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResourceSpec {
    /// Add a property that is both an input and an output.
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySpec) -> Self {
        let name = name.into();
        self.input_properties.insert(name.clone(), property.clone());
        self.properties.insert(name, property);
        self
    }
}

/// A function (data source) in the `functions` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Function arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<ObjectTypeSpec>,

    /// Function results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<ObjectTypeSpec>,

    /// Fields the bridge does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A package document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// The package name.
    pub name: String,

    /// Named types by token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, ComplexTypeSpec>,

    /// Resources by token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceSpec>,

    /// Functions by token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub functions: BTreeMap<String, FunctionSpec>,

    /// Fields the bridge does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PackageSpec {
    /// Create an empty package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a package document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the document with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a named type.
    pub fn with_type(mut self, token: impl Into<String>, spec: ComplexTypeSpec) -> Self {
        self.types.insert(token.into(), spec);
        self
    }

    /// Add a resource.
    pub fn with_resource(mut self, token: impl Into<String>, spec: ResourceSpec) -> Self {
        self.resources.insert(token.into(), spec);
        self
    }

    /// Look up a resource by token.
    pub fn resource(&self, token: &str) -> Option<&ResourceSpec> {
        self.resources.get(token)
    }

    /// Look up a named type by token.
    pub fn type_spec(&self, token: &str) -> Option<&ComplexTypeSpec> {
        self.types.get(token)
    }
}

/// The token named by a local type reference.
///
/// Returns `None` for references that do not start with `#/types/`.
pub fn parse_type_token(raw_ref: &str) -> Option<&str> {
    raw_ref.strip_prefix(TYPE_REF_PREFIX)
}

/// The local reference to the type `token`.
pub fn type_ref(token: &str) -> String {
    format!("{}{}", TYPE_REF_PREFIX, token)
}

/// Collect the tokens of every local `$ref` anywhere inside `value`.
pub fn find_type_refs<T: Serialize>(value: &T) -> Result<TypeRefs> {
    let json = serde_json::to_value(value)?;
    let mut refs = TypeRefs::new();
    collect_refs(&json, &mut refs);
    Ok(refs)
}

fn collect_refs(value: &Value, refs: &mut TypeRefs) {
    match value {
        Value::Object(map) => {
            if let Some(token) = map.get("$ref").and_then(Value::as_str).and_then(parse_type_token) {
                refs.insert(token.to_string());
            }
            for child in map.values() {
                collect_refs(child, refs);
            }
        },
        Value::Array(items) => {
            for child in items {
                collect_refs(child, refs);
            }
        },
        _ => {},
    }
}

/// The types referenced directly by resources and functions, sorted.
pub fn starter_type_refs(spec: &PackageSpec) -> Result<Vec<String>> {
    let mut refs = TypeRefs::new();
    for resource in spec.resources.values() {
        refs.extend(find_type_refs(resource)?);
    }
    for function in spec.functions.values() {
        refs.extend(find_type_refs(function)?);
    }
    Ok(refs.into_iter().collect())
}

/// Every type reachable from `refs`, including `refs` themselves.
///
/// Tokens without a definition are kept in the result but not expanded.
pub fn type_ref_closure(spec: &PackageSpec, refs: &TypeRefs) -> Result<TypeRefs> {
    let mut seen = TypeRefs::new();
    let mut queue: Vec<String> = refs.iter().cloned().collect();
    while let Some(token) = queue.pop() {
        if seen.contains(&token) {
            continue;
        }
        if let Some(ty) = spec.types.get(&token) {
            queue.extend(find_type_refs(ty)?);
        }
        seen.insert(token);
    }
    Ok(seen)
}

/// Depth-first traversal of the type graph.
///
/// `visit` is called with the chain of ancestors (closest to the start
/// first) and the current token, once per path from a starter. Returning
/// false stops the descent below the current node. A token that already
/// appears among its ancestors is visited but not expanded, so recursive
/// types terminate. Children are visited in token order.
pub fn visit_types<F>(spec: &PackageSpec, starters: &[String], visit: &mut F) -> Result<()>
where
    F: FnMut(&[String], &str) -> bool,
{
    let mut visitor = TypeVisitor {
        spec,
        children: BTreeMap::new(),
        ancestors: Vec::new(),
    };
    for starter in starters {
        visitor.visit(starter, visit)?;
    }
    Ok(())
}

struct TypeVisitor<'a> {
    spec: &'a PackageSpec,
    children: BTreeMap<String, Vec<String>>,
    ancestors: Vec<String>,
}

impl TypeVisitor<'_> {
    fn visit<F>(&mut self, current: &str, visit: &mut F) -> Result<()>
    where
        F: FnMut(&[String], &str) -> bool,
    {
        if !visit(&self.ancestors, current) {
            return Ok(());
        }
        if self.ancestors.iter().any(|a| a == current) {
            return Ok(());
        }
        let children = self.children_of(current)?;
        self.ancestors.push(current.to_string());
        for child in &children {
            self.visit(child, visit)?;
        }
        self.ancestors.pop();
        Ok(())
    }

    fn children_of(&mut self, token: &str) -> Result<Vec<String>> {
        if let Some(children) = self.children.get(token) {
            return Ok(children.clone());
        }
        let children: Vec<String> = match self.spec.types.get(token) {
            Some(ty) => find_type_refs(ty)?.into_iter().collect(),
            None => Vec::new(),
        };
        self.children.insert(token.to_string(), children.clone());
        Ok(children)
    }
}

/// Point every `$ref` whose token is a key of `rewrites` at the mapped token,
/// then delete the rewritten types.
///
/// The document is replaced wholesale; callers must not hold on to parts of
/// the previous value.
pub fn rewrite_type_refs(spec: &mut PackageSpec, rewrites: &BTreeMap<String, String>) -> Result<()> {
    let mut json = serde_json::to_value(&*spec)?;
    rewrite_refs(&mut json, rewrites);
    let mut rewritten: PackageSpec = serde_json::from_value(json)?;
    for token in rewrites.keys() {
        rewritten.types.remove(token);
    }
    *spec = rewritten;
    Ok(())
}

fn rewrite_refs(value: &mut Value, rewrites: &BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(parse_type_token)
                .and_then(|token| rewrites.get(token));
            if let Some(target) = target {
                let new_ref = Value::String(type_ref(target));
                map.insert("$ref".to_string(), new_ref);
            }
            for child in map.values_mut() {
                rewrite_refs(child, rewrites);
            }
        },
        Value::Array(items) => {
            for child in items {
                rewrite_refs(child, rewrites);
            }
        },
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain_spec() -> PackageSpec {
        serde_json::from_value(json!({
            "name": "test",
            "version": "1.2.3",
            "resources": {
                "test:index:Thing": {
                    "properties": { "a": { "$ref": "#/types/test:index/a:A" } },
                    "inputProperties": { "a": { "$ref": "#/types/test:index/a:A" } }
                }
            },
            "types": {
                "test:index/a:A": {
                    "type": "object",
                    "properties": {
                        "b": { "type": "array", "items": { "$ref": "#/types/test:index/b:B" } },
                        "c": { "type": "object", "additionalProperties": { "$ref": "#/types/test:index/c:C" } }
                    }
                },
                "test:index/b:B": {
                    "type": "object",
                    "properties": { "a": { "$ref": "#/types/test:index/a:A" } }
                },
                "test:index/c:C": { "type": "object" },
                "test:index/unused:Unused": { "type": "string", "enum": [{ "value": "x" }] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_type_token() {
        assert_eq!(parse_type_token("#/types/pkg:index:T"), Some("pkg:index:T"));
        assert_eq!(parse_type_token("other.json#/Any"), None);
        assert_eq!(type_ref("pkg:index:T"), "#/types/pkg:index:T");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let spec = chain_spec();
        assert_eq!(spec.extra["version"], json!("1.2.3"));
        assert!(spec.types["test:index/unused:Unused"].is_enum());

        let text = spec.to_json_pretty().unwrap();
        let parsed = PackageSpec::from_json(&text).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_starters_and_closure() {
        let spec = chain_spec();
        let starters = starter_type_refs(&spec).unwrap();
        assert_eq!(starters, vec!["test:index/a:A".to_string()]);

        let closure = type_ref_closure(&spec, &starters.iter().cloned().collect()).unwrap();
        let expected: TypeRefs = ["test:index/a:A", "test:index/b:B", "test:index/c:C"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(closure, expected);
    }

    #[test]
    fn test_visit_types_stops_at_cycles() {
        let spec = chain_spec();
        let mut visited = Vec::new();
        visit_types(&spec, &starter_type_refs(&spec).unwrap(), &mut |ancestors, current| {
            visited.push((ancestors.len(), current.to_string()));
            true
        })
        .unwrap();
        assert_eq!(
            visited,
            vec![
                (0, "test:index/a:A".to_string()),
                (1, "test:index/b:B".to_string()),
                (2, "test:index/a:A".to_string()),
                (1, "test:index/c:C".to_string()),
            ]
        );
    }

    #[test]
    fn test_visit_types_prunes_on_false() {
        let spec = chain_spec();
        let mut count = 0;
        visit_types(&spec, &starter_type_refs(&spec).unwrap(), &mut |_, _| {
            count += 1;
            false
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rewrite_type_refs() {
        let mut spec = chain_spec();
        let rewrites = BTreeMap::from([("test:index/c:C".to_string(), "test:index/b:B".to_string())]);
        rewrite_type_refs(&mut spec, &rewrites).unwrap();

        assert!(!spec.types.contains_key("test:index/c:C"));
        let c = &spec.types["test:index/a:A"].properties["c"];
        let values = c.type_spec.additional_properties.as_ref().unwrap();
        assert_eq!(values.reference.as_deref(), Some("#/types/test:index/b:B"));
        assert_eq!(spec.extra["version"], json!("1.2.3"));
    }
}
