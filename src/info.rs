//! Per-field overlays on provider schemas and property naming.
//!
//! Provider schemas use Terraform's `snake_case` attribute names. Orchestrator
//! properties use `camelCase`, with per-field overrides supplied through
//! [`SchemaInfo`]: explicit names, forced secrecy, and `MaxItems=1`
//! flattening overrides.

use crate::shim::{Schema, SchemaLike, SchemaMap, ValueType};
use crate::walk::{SchemaPath, SchemaPathStep};
use serde_json::Value;
use std::collections::BTreeMap;

/// Overlays keyed by Terraform attribute name.
pub type SchemaInfos = BTreeMap<String, SchemaInfo>;

/// Customisation of one attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaInfo {
    /// Property name to use instead of the derived camelCase name.
    pub name: Option<String>,
    /// Force the value to be treated as secret (or not).
    pub secret: Option<bool>,
    /// Override whether a list or set is flattened to a single value.
    pub max_items_one: Option<bool>,
    /// Overlays for the attributes of an object or of the objects in a
    /// collection.
    pub fields: SchemaInfos,
    /// Overlay for the elements of a primitive collection.
    pub elem: Option<Box<SchemaInfo>>,
    /// Value to use when the property is not set.
    pub default: Option<Value>,
}

impl SchemaInfo {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the property name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the value secret.
    pub fn secret(mut self) -> Self {
        self.secret = Some(true);
        self
    }

    /// Override single-item flattening.
    pub fn with_max_items_one(mut self, max_items_one: bool) -> Self {
        self.max_items_one = Some(max_items_one);
        self
    }

    /// Add an overlay for a nested attribute.
    pub fn with_field(mut self, name: impl Into<String>, info: SchemaInfo) -> Self {
        self.fields.insert(name.into(), info);
        self
    }

    /// Set the element overlay.
    pub fn with_elem(mut self, info: SchemaInfo) -> Self {
        self.elem = Some(Box::new(info));
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Overlay for a whole resource or data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceInfo {
    /// The orchestrator type token.
    pub tok: String,
    /// Overlays for the resource's attributes.
    pub fields: SchemaInfos,
}

impl ResourceInfo {
    /// Create an overlay for the type token `tok`.
    pub fn new(tok: impl Into<String>) -> Self {
        Self {
            tok: tok.into(),
            fields: SchemaInfos::new(),
        }
    }

    /// Add an overlay for an attribute.
    pub fn with_field(mut self, name: impl Into<String>, info: SchemaInfo) -> Self {
        self.fields.insert(name.into(), info);
        self
    }
}

/// Derive the property name of the Terraform attribute `name`.
///
/// An explicit [`SchemaInfo::name`] wins. Otherwise underscores are dropped
/// and the following letter capitalised; leading underscores are kept and a
/// trailing underscore survives.
pub fn terraform_to_property_name(name: &str, infos: &SchemaInfos) -> String {
    if let Some(explicit) = infos.get(name).and_then(|i| i.name.as_ref()) {
        return explicit.clone();
    }

    let mut result = String::with_capacity(name.len());
    let mut next_cap = false;
    let mut casing_active = false;
    for c in name.chars() {
        if c == '_' && casing_active {
            next_cap = true;
            continue;
        }
        if c != '_' {
            casing_active = true;
        }
        if next_cap && c.is_ascii_lowercase() {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
        next_cap = false;
    }
    if next_cap {
        result.push('_');
    }
    result
}

/// Find the Terraform attribute that the property `name` maps to.
///
/// Attributes of `schema_map` are searched first so explicit renames are
/// honoured; unknown names fall back to camelCase to snake_case.
pub fn property_to_terraform_name(name: &str, schema_map: &SchemaMap, infos: &SchemaInfos) -> String {
    if let Some(key) = schema_map
        .keys()
        .find(|key| terraform_to_property_name(key, infos) == name)
    {
        return key.to_string();
    }

    let mut result = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i != 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Whether a list or set is projected as a single value.
///
/// An explicit override wins; otherwise a list or set with `max_items == 1`
/// is flattened.
pub fn is_max_items_one(schema: &Schema, info: Option<&SchemaInfo>) -> bool {
    if !matches!(schema.value_type(), ValueType::List | ValueType::Set) {
        return false;
    }
    if let Some(flag) = info.and_then(|i| i.max_items_one) {
        return flag;
    }
    schema.max_items() == 1
}

/// Whether the value of an attribute is secret.
pub fn is_secret(schema: &Schema, info: Option<&SchemaInfo>) -> bool {
    info.and_then(|i| i.secret).unwrap_or_else(|| schema.sensitive())
}

/// Find the overlay for the attribute at `path`.
///
/// Attribute steps descend through `fields`. An element step descends
/// through `elem` when one is set and otherwise stays put, since the fields of
/// a block's objects are listed on the block's own overlay.
pub fn lookup_schema_info<'a>(path: &SchemaPath, infos: &'a SchemaInfos) -> Option<&'a SchemaInfo> {
    let (first, rest) = path.steps().split_first()?;
    let SchemaPathStep::GetAttr(name) = first else {
        return None;
    };
    let mut current = infos.get(name)?;
    for step in rest {
        current = match step {
            SchemaPathStep::Element => current.elem.as_deref().unwrap_or(current),
            SchemaPathStep::GetAttr(name) => current.fields.get(name)?,
        };
    }
    Some(current)
}

/// Maps between Terraform attribute names and property keys.
pub trait PropertyNames {
    /// The property key of the attribute `tf_name`.
    fn property_key(&self, tf_name: &str) -> String;

    /// The Terraform attribute that `key` names, if any.
    fn terraform_name(&self, key: &str) -> Option<String>;
}

/// [`PropertyNames`] derived from a schema map and its overlays.
#[derive(Debug, Clone, Copy)]
pub struct SchemaNames<'a> {
    schema_map: &'a SchemaMap,
    infos: &'a SchemaInfos,
}

impl<'a> SchemaNames<'a> {
    /// Name the attributes of `schema_map`.
    pub fn new(schema_map: &'a SchemaMap, infos: &'a SchemaInfos) -> Self {
        Self { schema_map, infos }
    }
}

impl PropertyNames for SchemaNames<'_> {
    fn property_key(&self, tf_name: &str) -> String {
        terraform_to_property_name(tf_name, self.infos)
    }

    fn terraform_name(&self, key: &str) -> Option<String> {
        let name = property_to_terraform_name(key, self.schema_map, self.infos);
        self.schema_map.contains_key(&name).then_some(name)
    }
}

/// [`PropertyNames`] that uses attribute names unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNames;

impl PropertyNames for IdentityNames {
    fn property_key(&self, tf_name: &str) -> String {
        tf_name.to_string()
    }

    fn terraform_name(&self, key: &str) -> Option<String> {
        Some(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::{SdkResource, SdkSchema};
    use crate::shim::sdkv2::{v2_schema_map, V2Schema};
    use crate::walk::decode_schema_path;

    #[test]
    fn test_terraform_to_property_name() {
        let infos = SchemaInfos::new();
        let cases = [
            ("name", "name"),
            ("assign_public_ip", "assignPublicIp"),
            ("_private", "_private"),
            ("__double_lead", "__doubleLead"),
            ("foo__dot__bar", "fooDotBar"),
            ("trailing_", "trailing_"),
            ("ipv6_cidr", "ipv6Cidr"),
        ];
        for (tf, expected) in cases {
            assert_eq!(terraform_to_property_name(tf, &infos), expected, "{}", tf);
        }
    }

    #[test]
    fn test_explicit_name_wins() {
        let infos = SchemaInfos::from([("arn".to_string(), SchemaInfo::new().with_name("resourceArn"))]);
        assert_eq!(terraform_to_property_name("arn", &infos), "resourceArn");
    }

    #[test]
    fn test_property_to_terraform_name() {
        let resource = SdkResource::new()
            .with_field("arn", SdkSchema::string().computed())
            .with_field("assign_public_ip", SdkSchema::bool().optional());
        let map = v2_schema_map(&resource.schema);
        let infos = SchemaInfos::from([("arn".to_string(), SchemaInfo::new().with_name("resourceArn"))]);

        assert_eq!(property_to_terraform_name("resourceArn", &map, &infos), "arn");
        assert_eq!(property_to_terraform_name("assignPublicIp", &map, &infos), "assign_public_ip");
        assert_eq!(property_to_terraform_name("someOtherName", &map, &infos), "some_other_name");

        let names = SchemaNames::new(&map, &infos);
        assert_eq!(names.terraform_name("resourceArn").as_deref(), Some("arn"));
        assert_eq!(names.terraform_name("unknownKey"), None);
    }

    #[test]
    fn test_is_max_items_one() {
        let single = Schema::V2(V2Schema::new(
            SdkSchema::list_of(SdkSchema::string()).with_max_items(1),
        ));
        let many = Schema::V2(V2Schema::new(SdkSchema::list_of(SdkSchema::string())));
        let scalar = Schema::V2(V2Schema::new(SdkSchema::string().with_max_items(1)));

        assert!(is_max_items_one(&single, None));
        assert!(!is_max_items_one(&many, None));
        assert!(!is_max_items_one(&scalar, None));

        let forced = SchemaInfo::new().with_max_items_one(true);
        assert!(is_max_items_one(&many, Some(&forced)));
        let disabled = SchemaInfo::new().with_max_items_one(false);
        assert!(!is_max_items_one(&single, Some(&disabled)));
    }

    #[test]
    fn test_lookup_schema_info() {
        let infos = SchemaInfos::from([(
            "rule".to_string(),
            SchemaInfo::new().with_field("cidr", SchemaInfo::new().with_name("cidrBlock")),
        )]);
        let found = lookup_schema_info(&decode_schema_path("rule.$.cidr"), &infos).unwrap();
        assert_eq!(found.name.as_deref(), Some("cidrBlock"));
        assert!(lookup_schema_info(&decode_schema_path("rule.$.port"), &infos).is_none());
        assert!(lookup_schema_info(&decode_schema_path("other"), &infos).is_none());
    }
}
