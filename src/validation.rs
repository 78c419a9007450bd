//! Input validation.
//!
//! Two validators live here:
//!
//! - [`TypeChecker`] checks resource inputs against the property types of a
//!   package document before any conversion happens, so mistyped inputs are
//!   reported against the user's property names instead of surfacing as
//!   conversion errors.
//! - [`validate`] checks a JSON configuration against a framework
//!   [`Schema`], reporting [`Diagnostic`]s the way Terraform core would.
//!
//! # Example
//!
//! ```
//! use hemmer_tf_bridge::package::{ComplexTypeSpec, PackageSpec, PropertySpec, ResourceSpec, TypeSpec};
//! use hemmer_tf_bridge::validation::{TypeCheckOptions, TypeChecker};
//! use hemmer_tf_bridge::value::{PropertyMap, PropertyValue};
//!
//! let package = PackageSpec::new("aws")
//!     .with_type(
//!         "aws:ecs/ServiceNetworkConfiguration:ServiceNetworkConfiguration",
//!         ComplexTypeSpec::object()
//!             .with_property("assignPublicIp", PropertySpec::new(TypeSpec::of_kind("boolean"))),
//!     )
//!     .with_resource(
//!         "aws:ecs/service:Service",
//!         ResourceSpec::default().with_property(
//!             "networkConfiguration",
//!             PropertySpec::new(TypeSpec::of_ref(
//!                 "aws:ecs/ServiceNetworkConfiguration:ServiceNetworkConfiguration",
//!             )),
//!         ),
//!     );
//!
//! let inputs = PropertyMap::from([(
//!     "networkConfiguration".to_string(),
//!     PropertyValue::object([("assignPublicIp", PropertyValue::string("DISABLED"))]),
//! )]);
//! let checker = TypeChecker::new(&package, TypeCheckOptions::new().with_resource_name("my-ecs-service"));
//! let failures = checker.validate_inputs("aws:ecs/service:Service", &inputs);
//!
//! assert_eq!(failures.len(), 1);
//! assert_eq!(failures[0].resource_path, "my-ecs-service.networkConfiguration.assignPublicIp");
//! assert_eq!(failures[0].reason, r#"expected boolean type, got "DISABLED" of type string"#);
//! ```

use crate::package::{parse_type_token, ComplexTypeSpec, PackageSpec, PropertySpec, TypeSpec};
use crate::property_path::PropertyPath;
use crate::schema::{Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema};
use crate::value::{PropertyMap, PropertyValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

const MAX_PREVIEW_LEN: usize = 30;

/// Options for [`TypeChecker`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeCheckOptions {
    resource_name: Option<String>,
    validate_unknown_types: bool,
}

impl TypeCheckOptions {
    /// Default options: no path prefix, unexpected properties pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every failure path with the name of the resource.
    pub fn with_resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    /// Report properties that the package document does not declare.
    pub fn with_validate_unknown_types(mut self, validate: bool) -> Self {
        self.validate_unknown_types = validate;
        self
    }
}

/// A type mismatch found by [`TypeChecker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What is wrong with the value.
    pub reason: String,
    /// Where the value is, as `resource.property.path`.
    pub resource_path: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resource_path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}. Examine values at '{}'.", self.reason, self.resource_path)
        }
    }
}

/// Checks property values against the types of a package document.
///
/// Only mismatches the bridge cannot coerce are reported: booleans accept
/// `"true"` and `"false"`, numbers accept numeric strings and strings accept
/// numbers and booleans. Unknowns, nulls, assets and archives are never
/// checked, and secrets and known outputs are checked by their contents.
/// Required properties are not enforced since they may be filled in later.
#[derive(Debug, Clone)]
pub struct TypeChecker<'a> {
    package: &'a PackageSpec,
    options: TypeCheckOptions,
}

impl<'a> TypeChecker<'a> {
    /// A checker over `package`.
    pub fn new(package: &'a PackageSpec, options: TypeCheckOptions) -> Self {
        Self { package, options }
    }

    /// Check the inputs of the resource `token`.
    ///
    /// Resources missing from the package are not checked.
    pub fn validate_inputs(&self, token: &str, inputs: &PropertyMap) -> Vec<Failure> {
        let Some(resource) = self.package.resource(token) else {
            return Vec::new();
        };
        let mut failures = Vec::new();
        self.check_map(inputs, &resource.input_properties, &PropertyPath::new(), &mut failures);
        failures
    }

    fn check_map(
        &self,
        map: &PropertyMap,
        properties: &BTreeMap<String, PropertySpec>,
        path: &PropertyPath,
        failures: &mut Vec<Failure>,
    ) {
        for (key, value) in map {
            match properties.get(key) {
                Some(prop) => self.check_value(value, &prop.type_spec, &path.key(key.as_str()), failures),
                None if self.options.validate_unknown_types => failures.push(Failure {
                    reason: format!("an unexpected argument {:?} was provided", key),
                    resource_path: self.render_path(path),
                }),
                None => {},
            }
        }
    }

    fn check_value(&self, value: &PropertyValue, spec: &TypeSpec, path: &PropertyPath, failures: &mut Vec<Failure>) {
        let value = match value {
            PropertyValue::Null
            | PropertyValue::Computed(_)
            | PropertyValue::Asset(_)
            | PropertyValue::Archive(_) => return,
            PropertyValue::Output(output) if !output.known => return,
            PropertyValue::Output(output) => return self.check_value(&output.element, spec, path, failures),
            PropertyValue::Secret(inner) => return self.check_value(inner, spec, path, failures),
            value => value,
        };

        if let Some(reference) = &spec.reference {
            // Enums and foreign or dangling references are not checked.
            let Some(object_type) = self.object_type(reference) else {
                return;
            };
            match value {
                PropertyValue::Object(map) => self.check_map(map, &object_type.properties, path, failures),
                _ => failures.push(self.type_failure(path, "object", value)),
            }
            return;
        }
        if spec.one_of.is_some() {
            return;
        }

        let Some(kind) = spec.kind.as_deref() else {
            return;
        };
        let matches = match (kind, value) {
            ("boolean", PropertyValue::Bool(_)) => true,
            ("boolean", PropertyValue::String(s)) => matches!(s.as_str(), "true" | "false"),
            ("integer" | "number", PropertyValue::Number(_)) => true,
            ("integer" | "number", PropertyValue::String(s)) => s.trim().parse::<f64>().is_ok(),
            ("string", PropertyValue::String(_) | PropertyValue::Number(_) | PropertyValue::Bool(_)) => true,
            ("array", PropertyValue::Array(items)) => {
                if let Some(item_spec) = &spec.items {
                    for (i, item) in items.iter().enumerate() {
                        self.check_value(item, item_spec, &path.index(i), failures);
                    }
                }
                true
            },
            // A single value converts as a one-element list.
            ("array", single) => {
                if let Some(item_spec) = &spec.items {
                    self.check_value(single, item_spec, path, failures);
                }
                true
            },
            ("object", PropertyValue::Object(map)) => {
                if let Some(value_spec) = &spec.additional_properties {
                    for (key, item) in map.iter().filter(|(key, _)| !key.starts_with("__")) {
                        self.check_value(item, value_spec, &path.key(key.as_str()), failures);
                    }
                }
                true
            },
            ("boolean" | "integer" | "number" | "string" | "object", _) => false,
            _ => true,
        };
        if !matches {
            failures.push(self.type_failure(path, kind, value));
        }
    }

    fn object_type(&self, reference: &str) -> Option<&'a ComplexTypeSpec> {
        let package: &'a PackageSpec = self.package;
        parse_type_token(reference)
            .and_then(|token| package.type_spec(token))
            .filter(|spec| !spec.is_enum())
    }

    fn type_failure(&self, path: &PropertyPath, expected: &str, value: &PropertyValue) -> Failure {
        Failure {
            reason: format!(
                "expected {} type, got {} of type {}",
                expected,
                preview(value),
                value.type_name()
            ),
            resource_path: self.render_path(path),
        }
    }

    fn render_path(&self, path: &PropertyPath) -> String {
        match &self.options.resource_name {
            Some(name) if path.is_empty() => name.clone(),
            Some(name) => format!("{}.{}", name, path),
            None => path.to_string(),
        }
    }
}

/// A short rendering of `value` for failure messages.
fn preview(value: &PropertyValue) -> String {
    let rendered = match value {
        PropertyValue::Computed(_) => return "(unknown value)".to_string(),
        PropertyValue::Secret(inner) => return format!("secret({})", preview(inner)),
        PropertyValue::String(s) => format!("{:?}", s),
        other => other.to_string(),
    };
    if rendered.chars().count() <= MAX_PREVIEW_LEN {
        return rendered;
    }
    let truncated: String = rendered.chars().take(MAX_PREVIEW_LEN - 3).collect();
    format!("{}...", truncated)
}

/// Validate a JSON configuration against a framework schema.
///
/// Required attributes must be present and non-null, computed-only
/// attributes are ignored, values must match their attribute types and
/// nested blocks must respect their item limits. An empty result means the
/// value is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut validator = Validator::default();
    validator.block(&schema.block, value, &PropertyPath::new());
    validator.diagnostics
}

/// Like [`validate`], as a `Result`.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Returns true if [`validate`] reports nothing.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

#[derive(Debug, Default)]
struct Validator {
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    fn report(&mut self, diagnostic: Diagnostic, path: &PropertyPath) {
        let diagnostic = if path.is_empty() {
            diagnostic
        } else {
            diagnostic.with_attribute(path.to_string())
        };
        self.diagnostics.push(diagnostic);
    }

    fn mismatch(&mut self, expected: &str, value: &Value, path: &PropertyPath) {
        self.report(
            Diagnostic::error("Incorrect attribute value type")
                .with_detail(format!("expected {}, got {}", expected, json_kind(value))),
            path,
        );
    }

    fn block(&mut self, block: &Block, value: &Value, path: &PropertyPath) {
        let object = match value {
            Value::Object(object) => object,
            Value::Null => return,
            other => return self.mismatch("object", other, path),
        };
        for (name, attr) in &block.attributes {
            self.attribute(attr, object.get(name), &path.key(name.as_str()));
        }
        for (name, nested) in &block.blocks {
            self.nested_block(nested, object.get(name), &path.key(name.as_str()));
        }
    }

    fn attribute(&mut self, attr: &Attribute, value: Option<&Value>, path: &PropertyPath) {
        let flags = attr.flags;
        if flags.computed && !flags.optional && !flags.required {
            return;
        }
        let value = match value {
            None | Some(Value::Null) => {
                if flags.required {
                    self.report(
                        Diagnostic::error("Missing required argument")
                            .with_detail(format!("The argument \"{}\" is required", path)),
                        path,
                    );
                }
                return;
            },
            Some(value) => value,
        };
        match &attr.nested {
            Some(nested) => self.nested_attributes(nested.nesting_mode, &nested.attributes, value, path),
            None => self.typed(&attr.attr_type, value, path),
        }
    }

    fn nested_attributes(
        &mut self,
        mode: BlockNestingMode,
        attributes: &BTreeMap<String, Attribute>,
        value: &Value,
        path: &PropertyPath,
    ) {
        let object = |validator: &mut Self, value: &Value, path: &PropertyPath| match value {
            Value::Object(object) => {
                for (name, attr) in attributes {
                    validator.attribute(attr, object.get(name), &path.key(name.as_str()));
                }
            },
            Value::Null => {},
            other => validator.mismatch("object", other, path),
        };
        match (mode, value) {
            (BlockNestingMode::Single, _) => object(self, value, path),
            (BlockNestingMode::List | BlockNestingMode::Set, Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    object(self, item, &path.index(i));
                }
            },
            (BlockNestingMode::Map, Value::Object(entries)) => {
                for (key, item) in entries {
                    object(self, item, &path.key(key.as_str()));
                }
            },
            (BlockNestingMode::Map, other) => self.mismatch("map", other, path),
            (_, other) => self.mismatch("list", other, path),
        }
    }

    fn typed(&mut self, ty: &AttributeType, value: &Value, path: &PropertyPath) {
        match (ty, value) {
            (AttributeType::Dynamic, _) | (_, Value::Null) => {},
            (AttributeType::String, Value::String(_)) | (AttributeType::Bool, Value::Bool(_)) => {},
            (AttributeType::Float64, Value::Number(_)) => {},
            (AttributeType::Int64, Value::Number(n)) if is_integral(n) => {},
            (AttributeType::List(element) | AttributeType::Set(element), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.typed(element, item, &path.index(i));
                }
            },
            (AttributeType::Map(element), Value::Object(entries)) => {
                for (key, item) in entries {
                    self.typed(element, item, &path.key(key.as_str()));
                }
            },
            (AttributeType::Object(attrs), Value::Object(entries)) => {
                for (name, attr_type) in attrs {
                    if let Some(item) = entries.get(name) {
                        self.typed(attr_type, item, &path.key(name.as_str()));
                    }
                }
            },
            (ty, other) => self.mismatch(attribute_kind(ty), other, path),
        }
    }

    fn nested_block(&mut self, nested: &NestedBlock, value: Option<&Value>, path: &PropertyPath) {
        let count = match (nested.nesting_mode, value) {
            (_, None | Some(Value::Null)) => 0,
            (BlockNestingMode::Single, Some(v)) => {
                self.block(&nested.block, v, path);
                1
            },
            (BlockNestingMode::List | BlockNestingMode::Set, Some(Value::Array(items))) => {
                for (i, item) in items.iter().enumerate() {
                    self.block(&nested.block, item, &path.index(i));
                }
                items.len()
            },
            (BlockNestingMode::Map, Some(Value::Object(entries))) => {
                for (key, item) in entries {
                    self.block(&nested.block, item, &path.key(key.as_str()));
                }
                entries.len()
            },
            (BlockNestingMode::Map, Some(other)) => return self.mismatch("map of blocks", other, path),
            (_, Some(other)) => return self.mismatch("list of blocks", other, path),
        };

        let min = nested.min_items as usize;
        let max = nested.max_items as usize;
        if count < min {
            self.report(
                Diagnostic::error("Insufficient blocks")
                    .with_detail(format!("At least {} \"{}\" blocks are required, got {}", min, path, count)),
                path,
            );
        }
        if max > 0 && count > max {
            self.report(
                Diagnostic::error("Too many blocks")
                    .with_detail(format!("No more than {} \"{}\" blocks are allowed, got {}", max, path, count)),
                path,
            );
        }
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
}

fn attribute_kind(ty: &AttributeType) -> &'static str {
    match ty {
        AttributeType::String => "string",
        AttributeType::Int64 => "int64",
        AttributeType::Float64 => "float64",
        AttributeType::Bool => "bool",
        AttributeType::List(_) => "list",
        AttributeType::Set(_) => "set",
        AttributeType::Map(_) => "map",
        AttributeType::Object(_) => "object",
        AttributeType::Dynamic => "dynamic",
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ResourceSpec;
    use crate::schema::AttributeFlags;
    use serde_json::json;

    const SERVICE: &str = "aws:ecs/service:Service";
    const NETWORK: &str = "aws:ecs/ServiceNetworkConfiguration:ServiceNetworkConfiguration";

    fn package() -> PackageSpec {
        PackageSpec::new("aws")
            .with_type(
                NETWORK,
                ComplexTypeSpec::object()
                    .with_property("assignPublicIp", PropertySpec::new(TypeSpec::of_kind("boolean")))
                    .with_property("subnets", PropertySpec::new(TypeSpec::array_of(TypeSpec::of_kind("string")))),
            )
            .with_type(
                "aws:ecs/LaunchType:LaunchType",
                ComplexTypeSpec {
                    enum_values: Some(vec![json!("EC2"), json!("FARGATE")]),
                    ..ComplexTypeSpec::object()
                },
            )
            .with_resource(
                SERVICE,
                ResourceSpec::default()
                    .with_property("networkConfiguration", PropertySpec::new(TypeSpec::of_ref(NETWORK)))
                    .with_property("desiredCount", PropertySpec::new(TypeSpec::of_kind("integer")))
                    .with_property("name", PropertySpec::new(TypeSpec::of_kind("string")))
                    .with_property("launchType", PropertySpec::new(TypeSpec::of_ref("aws:ecs/LaunchType:LaunchType")))
                    .with_property(
                        "ports",
                        PropertySpec::new(TypeSpec::array_of(TypeSpec::of_kind("number"))),
                    )
                    .with_property(
                        "tags",
                        PropertySpec::new(TypeSpec::map_of(TypeSpec::of_kind("string"))),
                    ),
            )
    }

    fn check(inputs: PropertyValue) -> Vec<Failure> {
        let package = package();
        let checker = TypeChecker::new(&package, TypeCheckOptions::new().with_resource_name("my-ecs-service"));
        let inputs = inputs.as_object().cloned().unwrap_or_default();
        checker.validate_inputs(SERVICE, &inputs)
    }

    #[test]
    fn test_boolean_mismatch_is_reported_with_resource_path() {
        let failures = check(PropertyValue::object([
            (
                "networkConfiguration",
                PropertyValue::object([
                    ("assignPublicIp", PropertyValue::string("DISABLED")),
                    ("subnets", PropertyValue::unknown()),
                ]),
            ),
            ("desiredCount", PropertyValue::unknown()),
        ]));
        assert_eq!(
            failures,
            vec![Failure {
                reason: r#"expected boolean type, got "DISABLED" of type string"#.to_string(),
                resource_path: "my-ecs-service.networkConfiguration.assignPublicIp".to_string(),
            }]
        );
        assert_eq!(
            failures[0].to_string(),
            r#"expected boolean type, got "DISABLED" of type string. Examine values at 'my-ecs-service.networkConfiguration.assignPublicIp'."#
        );
    }

    #[test]
    fn test_coercible_values_pass() {
        let failures = check(PropertyValue::object([
            (
                "networkConfiguration",
                PropertyValue::object([("assignPublicIp", PropertyValue::string("true"))]),
            ),
            ("desiredCount", PropertyValue::string(" 3 ")),
            ("name", PropertyValue::Number(42.0)),
            ("launchType", PropertyValue::Number(1.0)),
        ]));
        assert!(failures.is_empty(), "{:?}", failures);
    }

    #[test]
    fn test_markers_are_skipped_or_unwrapped() {
        let failures = check(PropertyValue::object([
            ("desiredCount", PropertyValue::unknown()),
            ("name", PropertyValue::Null),
            ("ports", PropertyValue::make_secret(PropertyValue::Array(vec![PropertyValue::Bool(true)]))),
        ]));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].resource_path, "my-ecs-service.ports[0]");
        assert_eq!(failures[0].reason, "expected number type, got true of type bool");
    }

    #[test]
    fn test_single_values_check_against_array_items() {
        let failures = check(PropertyValue::object([("ports", PropertyValue::Bool(true))]));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].resource_path, "my-ecs-service.ports");

        assert!(check(PropertyValue::object([("ports", PropertyValue::Number(80.0))])).is_empty());
    }

    #[test]
    fn test_maps_check_values_and_skip_internal_keys() {
        let failures = check(PropertyValue::object([(
            "tags",
            PropertyValue::object([
                ("__defaults", PropertyValue::Array(vec![])),
                ("env", PropertyValue::object([("nested", PropertyValue::Null)])),
            ]),
        )]));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].resource_path, "my-ecs-service.tags.env");
    }

    #[test]
    fn test_unexpected_properties() {
        let package = package();
        let inputs = PropertyMap::from([("bogus".to_string(), PropertyValue::Bool(true))]);

        let lenient = TypeChecker::new(&package, TypeCheckOptions::new());
        assert!(lenient.validate_inputs(SERVICE, &inputs).is_empty());

        let strict = TypeChecker::new(&package, TypeCheckOptions::new().with_validate_unknown_types(true));
        let failures = strict.validate_inputs(SERVICE, &inputs);
        assert_eq!(failures[0].reason, "an unexpected argument \"bogus\" was provided");
        assert_eq!(failures[0].resource_path, "");

        assert!(strict.validate_inputs("aws:ecs/cluster:Cluster", &inputs).is_empty());
    }

    #[test]
    fn test_preview_truncates() {
        let long = PropertyValue::string("x".repeat(40));
        assert_eq!(preview(&long), format!("\"{}...", "x".repeat(26)));
        assert_eq!(
            preview(&PropertyValue::make_secret("pw".into())),
            "secret(\"pw\")"
        );
    }

    fn framework_schema() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("count", Attribute::optional_int64())
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "ports",
                Attribute::new(AttributeType::list(AttributeType::Int64), AttributeFlags::optional()),
            )
            .with_attribute(
                "endpoints",
                Attribute::nested(
                    BlockNestingMode::List,
                    [("url", Attribute::required_string())],
                    AttributeFlags::optional(),
                ),
            )
            .with_block(
                "rule",
                NestedBlock::list(Block::new().with_attribute("port", Attribute::required_string()))
                    .with_min_items(1)
                    .with_max_items(2),
            )
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        let config = json!({
            "name": "web",
            "count": 3,
            "id": 12,
            "ports": [80, 443],
            "endpoints": [{"url": "https://example.com"}],
            "rule": [{"port": "80"}]
        });
        assert!(is_valid(&framework_schema(), &config));
        assert!(validate_result(&framework_schema(), &config).is_ok());
    }

    #[test]
    fn test_validate_reports_paths() {
        let config = json!({
            "count": 1.5,
            "ports": [80, "https"],
            "endpoints": [{}],
            "rule": [{"port": "1"}, {"port": "2"}, {"port": "3"}]
        });
        let diagnostics = validate(&framework_schema(), &config);
        let attributes: Vec<_> = diagnostics.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attributes, vec!["count", "endpoints[0].url", "name", "ports[1]", "rule"]);
        assert_eq!(diagnostics[0].detail.as_deref(), Some("expected int64, got number"));
        assert_eq!(diagnostics[4].summary, "Too many blocks");
    }

    #[test]
    fn test_validate_block_limits() {
        let diagnostics = validate(&framework_schema(), &json!({"name": "web"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Insufficient blocks");

        let diagnostics = validate(&framework_schema(), &json!({"name": "web", "rule": {"port": "1"}}));
        assert_eq!(diagnostics[0].detail.as_deref(), Some("expected list of blocks, got object"));
    }

    #[test]
    fn test_validate_root_must_be_an_object() {
        let err = validate_result(&framework_schema(), &json!("web")).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].attribute, None);
        assert_eq!(err[0].detail.as_deref(), Some("expected object, got string"));
    }
}
