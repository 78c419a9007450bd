//! The orchestrator-side property value model.
//!
//! A [`PropertyValue`] is a dynamically typed tree: scalars, arrays, objects,
//! assets/archives and the three wrappers that carry orchestration metadata
//! ([`PropertyValue::Secret`], [`PropertyValue::Output`] and
//! [`PropertyValue::Computed`]). Values are plain data: every transform in
//! this module returns a new tree.
//!
//! Objects are stored in a [`BTreeMap`] so iteration is always in key order,
//! which keeps every downstream conversion deterministic.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Signature key marking a JSON object as a special orchestrator value.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";
/// Signature value for secrets.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";
/// Signature value for assets.
pub const ASSET_SIG: &str = "c44067f5952c0a294b673a41bacd8c17";
/// Signature value for archives.
pub const ARCHIVE_SIG: &str = "0def7320c3a5731c473e5ecbe6d01bc7";
/// Signature value for first-class outputs.
pub const OUTPUT_SIG: &str = "d0e6a833031e9bbcd3f4e8bde6ca49a4";
/// String sentinel the orchestrator uses for unknown values on the wire.
pub const UNKNOWN_STRING: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// An object of property values keyed by property name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A file-like asset. Exactly one of `text`, `path` or `uri` is normally set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Asset {
    /// Content hash, if computed.
    pub hash: String,
    /// Inline text content.
    pub text: Option<String>,
    /// Path to a local file.
    pub path: Option<String>,
    /// Remote location.
    pub uri: Option<String>,
}

/// A directory-like archive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Archive {
    /// Content hash, if computed.
    pub hash: String,
    /// Named members, each an asset or archive value.
    pub assets: Option<PropertyMap>,
    /// Path to a local archive.
    pub path: Option<String>,
    /// Remote location.
    pub uri: Option<String>,
}

/// A first-class output value.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// The underlying value. Shape-only when `known` is false.
    pub element: Box<PropertyValue>,
    /// Whether `element` is the final value.
    pub known: bool,
    /// Whether the value is secret.
    pub secret: bool,
    /// URNs of resources this output depends on.
    pub dependencies: Vec<String>,
}

/// A property value as exchanged with the orchestrator.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyValue {
    /// The absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. The orchestrator has a single numeric kind.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered sequence.
    Array(Vec<PropertyValue>),
    /// A string-keyed object.
    Object(PropertyMap),
    /// A file-like asset.
    Asset(Asset),
    /// A directory-like archive.
    Archive(Archive),
    /// A secret wrapping exactly one value.
    Secret(Box<PropertyValue>),
    /// A first-class output.
    Output(Output),
    /// A value not known until after an update; the element only carries shape.
    Computed(Box<PropertyValue>),
}

impl PropertyValue {
    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Create an object value from key/value pairs.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, PropertyValue)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wrap a value as secret.
    pub fn make_secret(value: PropertyValue) -> Self {
        Self::Secret(Box::new(value))
    }

    /// Create a computed value with the given shape element.
    pub fn make_computed(element: PropertyValue) -> Self {
        Self::Computed(Box::new(element))
    }

    /// The canonical unknown: a computed string.
    pub fn unknown() -> Self {
        Self::make_computed(Self::String(String::new()))
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for `Computed` and unknown outputs.
    pub fn is_computed(&self) -> bool {
        match self {
            Self::Computed(_) => true,
            Self::Output(o) => !o.known,
            _ => false,
        }
    }

    /// Returns true for secrets and secret outputs.
    pub fn is_secret(&self) -> bool {
        match self {
            Self::Secret(_) => true,
            Self::Output(o) => o.secret,
            _ => false,
        }
    }

    /// Get the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object payload, if this is an object.
    pub fn as_object(&self) -> Option<&PropertyMap> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Get the array payload, if this is an array.
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The orchestrator's name for the kind of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "[]",
            Self::Object(_) => "object",
            Self::Asset(_) => "asset",
            Self::Archive(_) => "archive",
            Self::Secret(_) => "secret",
            Self::Output(_) => "output",
            Self::Computed(_) => "output<string>",
        }
    }

    /// Returns true if any node in the tree is unknown.
    pub fn contains_unknowns(&self) -> bool {
        match self {
            Self::Computed(_) => true,
            Self::Output(o) => !o.known || o.element.contains_unknowns(),
            Self::Secret(e) => e.contains_unknowns(),
            Self::Array(a) => a.iter().any(Self::contains_unknowns),
            Self::Object(m) => m.values().any(Self::contains_unknowns),
            _ => false,
        }
    }

    /// Returns true if any node in the tree is secret.
    pub fn contains_secrets(&self) -> bool {
        match self {
            Self::Secret(_) => true,
            Self::Output(o) => o.secret || o.element.contains_secrets(),
            Self::Computed(e) => e.contains_secrets(),
            Self::Array(a) => a.iter().any(Self::contains_secrets),
            Self::Object(m) => m.values().any(Self::contains_secrets),
            _ => false,
        }
    }

    /// Strip secret and known-output wrappers from the top of this value.
    pub fn unwrap_markers(&self) -> &PropertyValue {
        match self {
            Self::Secret(e) => e.unwrap_markers(),
            Self::Output(o) if o.known => o.element.unwrap_markers(),
            other => other,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            },
            Self::Object(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "}}")
            },
            Self::Asset(a) => write!(f, "asset({})", a.hash),
            Self::Archive(a) => write!(f, "archive({})", a.hash),
            Self::Secret(_) => write!(f, "[secret]"),
            Self::Output(o) if o.known => write!(f, "output({})", o.element),
            Self::Output(_) | Self::Computed(_) => write!(f, "output<string>{{}}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(a: Vec<PropertyValue>) -> Self {
        Self::Array(a)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(m: PropertyMap) -> Self {
        Self::Object(m)
    }
}

// =========================================================================
// Transforms
// =========================================================================

/// Rewrite every node of `value` bottom-up with `f`.
///
/// Children are transformed before their parent, and the wrapped element of a
/// secret or output is transformed before the wrapper.
pub fn transform<F>(value: &PropertyValue, f: &F) -> PropertyValue
where
    F: Fn(PropertyValue) -> PropertyValue,
{
    let rebuilt = match value {
        PropertyValue::Array(a) => PropertyValue::Array(a.iter().map(|v| transform(v, f)).collect()),
        PropertyValue::Object(m) => PropertyValue::Object(
            m.iter()
                .map(|(k, v)| (k.clone(), transform(v, f)))
                .collect(),
        ),
        PropertyValue::Secret(e) => PropertyValue::Secret(Box::new(transform(e, f))),
        PropertyValue::Output(o) => PropertyValue::Output(Output {
            element: Box::new(transform(&o.element, f)),
            known: o.known,
            secret: o.secret,
            dependencies: o.dependencies.clone(),
        }),
        other => other.clone(),
    };
    f(rebuilt)
}

/// Remove every secret wrapper and clear the secret flag on outputs.
pub fn remove_secrets(value: &PropertyValue) -> PropertyValue {
    transform(value, &|v| match v {
        PropertyValue::Secret(e) => *e,
        PropertyValue::Output(o) => PropertyValue::Output(Output { secret: false, ..o }),
        other => other,
    })
}

/// Remove secrets and collapse outputs: known outputs become their element,
/// unknown outputs become a computed string.
pub fn remove_secrets_and_outputs(value: &PropertyValue) -> PropertyValue {
    transform(value, &|v| match v {
        PropertyValue::Secret(e) => *e,
        PropertyValue::Output(o) if o.known => *o.element,
        PropertyValue::Output(_) => PropertyValue::unknown(),
        other => other,
    })
}

/// Apply [`remove_secrets`] to every entry of a map.
pub fn remove_secrets_from_map(map: &PropertyMap) -> PropertyMap {
    map.iter()
        .map(|(k, v)| (k.clone(), remove_secrets(v)))
        .collect()
}

// =========================================================================
// JSON
// =========================================================================

/// Convert a property value to its JSON wire form, using signature keys for
/// secrets, assets and archives and the unknown sentinel for computed values.
pub fn to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => number_to_json(*n),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Array(a) => Value::Array(a.iter().map(to_json).collect()),
        PropertyValue::Object(m) => {
            Value::Object(m.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
        },
        PropertyValue::Computed(_) => Value::String(UNKNOWN_STRING.to_string()),
        PropertyValue::Secret(e) => {
            let mut obj = Map::new();
            obj.insert(SIG_KEY.to_string(), Value::String(SECRET_SIG.to_string()));
            obj.insert("value".to_string(), to_json(e));
            Value::Object(obj)
        },
        PropertyValue::Output(o) => {
            let mut obj = Map::new();
            obj.insert(SIG_KEY.to_string(), Value::String(OUTPUT_SIG.to_string()));
            if o.known {
                obj.insert("value".to_string(), to_json(&o.element));
            }
            if o.secret {
                obj.insert("secret".to_string(), Value::Bool(true));
            }
            if !o.dependencies.is_empty() {
                obj.insert(
                    "dependencies".to_string(),
                    Value::Array(o.dependencies.iter().cloned().map(Value::String).collect()),
                );
            }
            Value::Object(obj)
        },
        PropertyValue::Asset(a) => {
            let mut obj = Map::new();
            obj.insert(SIG_KEY.to_string(), Value::String(ASSET_SIG.to_string()));
            if !a.hash.is_empty() {
                obj.insert("hash".to_string(), Value::String(a.hash.clone()));
            }
            for (key, field) in [("text", &a.text), ("path", &a.path), ("uri", &a.uri)] {
                if let Some(v) = field {
                    obj.insert(key.to_string(), Value::String(v.clone()));
                }
            }
            Value::Object(obj)
        },
        PropertyValue::Archive(a) => {
            let mut obj = Map::new();
            obj.insert(SIG_KEY.to_string(), Value::String(ARCHIVE_SIG.to_string()));
            if !a.hash.is_empty() {
                obj.insert("hash".to_string(), Value::String(a.hash.clone()));
            }
            if let Some(assets) = &a.assets {
                obj.insert(
                    "assets".to_string(),
                    Value::Object(assets.iter().map(|(k, v)| (k.clone(), to_json(v))).collect()),
                );
            }
            for (key, field) in [("path", &a.path), ("uri", &a.uri)] {
                if let Some(v) = field {
                    obj.insert(key.to_string(), Value::String(v.clone()));
                }
            }
            Value::Object(obj)
        },
    }
}

/// Convert a JSON value into a property value, recognizing signature keys and
/// the unknown sentinel string.
pub fn from_json(value: &Value) -> PropertyValue {
    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or_default()),
        Value::String(s) if s == UNKNOWN_STRING => PropertyValue::unknown(),
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Array(a) => PropertyValue::Array(a.iter().map(from_json).collect()),
        Value::Object(obj) => match obj.get(SIG_KEY).and_then(Value::as_str) {
            Some(SECRET_SIG) => {
                PropertyValue::make_secret(obj.get("value").map(from_json).unwrap_or_default())
            },
            Some(OUTPUT_SIG) => {
                let known = obj.contains_key("value");
                let element = obj
                    .get("value")
                    .map(from_json)
                    .unwrap_or_else(|| PropertyValue::String(String::new()));
                PropertyValue::Output(Output {
                    element: Box::new(element),
                    known,
                    secret: obj.get("secret").and_then(Value::as_bool).unwrap_or(false),
                    dependencies: obj
                        .get("dependencies")
                        .and_then(Value::as_array)
                        .map(|deps| {
                            deps.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                })
            },
            Some(ASSET_SIG) => PropertyValue::Asset(Asset {
                hash: json_string(obj, "hash").unwrap_or_default(),
                text: json_string(obj, "text"),
                path: json_string(obj, "path"),
                uri: json_string(obj, "uri"),
            }),
            Some(ARCHIVE_SIG) => PropertyValue::Archive(Archive {
                hash: json_string(obj, "hash").unwrap_or_default(),
                assets: obj.get("assets").and_then(Value::as_object).map(|m| {
                    m.iter()
                        .map(|(k, v)| (k.clone(), from_json(v)))
                        .collect()
                }),
                path: json_string(obj, "path"),
                uri: json_string(obj, "uri"),
            }),
            _ => PropertyValue::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), from_json(v)))
                    .collect(),
            ),
        },
    }
}

/// Convert a JSON object into a property map. Non-objects produce an empty map.
pub fn map_from_json(value: &Value) -> PropertyMap {
    match from_json(value) {
        PropertyValue::Object(m) => m,
        _ => PropertyMap::new(),
    }
}

/// Integral numbers are emitted as JSON integers so `1.0` prints as `1`.
pub(crate) fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn json_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predicates() {
        assert!(PropertyValue::Null.is_null());
        assert!(PropertyValue::unknown().is_computed());
        let out = PropertyValue::Output(Output {
            element: Box::new(PropertyValue::Null),
            known: false,
            secret: true,
            dependencies: vec![],
        });
        assert!(out.is_computed());
        assert!(out.is_secret());
        assert!(!PropertyValue::from("x").is_computed());
    }

    #[test]
    fn test_contains_unknowns_and_secrets() {
        let v = PropertyValue::object([
            ("a", PropertyValue::from(1.0)),
            (
                "b",
                PropertyValue::Array(vec![PropertyValue::make_secret("s".into())]),
            ),
        ]);
        assert!(v.contains_secrets());
        assert!(!v.contains_unknowns());

        let v = PropertyValue::object([("c", PropertyValue::unknown())]);
        assert!(v.contains_unknowns());
    }

    #[test]
    fn test_remove_secrets() {
        let v = PropertyValue::object([
            ("a", PropertyValue::make_secret("x".into())),
            (
                "b",
                PropertyValue::Output(Output {
                    element: Box::new(PropertyValue::from(true)),
                    known: true,
                    secret: true,
                    dependencies: vec!["urn".to_string()],
                }),
            ),
        ]);
        let stripped = remove_secrets(&v);
        assert!(!stripped.contains_secrets());
        let obj = stripped.as_object().unwrap();
        assert_eq!(obj["a"], PropertyValue::from("x"));
        assert!(matches!(&obj["b"], PropertyValue::Output(o) if !o.secret && o.known));
    }

    #[test]
    fn test_remove_secrets_and_outputs() {
        let v = PropertyValue::Array(vec![
            PropertyValue::Output(Output {
                element: Box::new(PropertyValue::from(2.0)),
                known: true,
                secret: false,
                dependencies: vec![],
            }),
            PropertyValue::Output(Output {
                element: Box::new(PropertyValue::Null),
                known: false,
                secret: true,
                dependencies: vec![],
            }),
        ]);
        let out = remove_secrets_and_outputs(&v);
        assert_eq!(
            out,
            PropertyValue::Array(vec![PropertyValue::from(2.0), PropertyValue::unknown()])
        );
    }

    #[test]
    fn test_json_signatures() {
        let input = json!({
            "plain": "x",
            "secret": {SIG_KEY: SECRET_SIG, "value": 1},
            "unknown": UNKNOWN_STRING,
            "asset": {SIG_KEY: ASSET_SIG, "text": "hello"},
        });
        let map = map_from_json(&input);
        assert_eq!(map["plain"], PropertyValue::from("x"));
        assert_eq!(map["secret"], PropertyValue::make_secret(1.0.into()));
        assert!(map["unknown"].is_computed());
        assert!(matches!(&map["asset"], PropertyValue::Asset(a) if a.text.as_deref() == Some("hello")));

        assert_eq!(to_json(&PropertyValue::Object(map)), input);
    }

    #[test]
    fn test_display() {
        let v = PropertyValue::object([("a", PropertyValue::Array(vec![true.into(), 1.5.into()]))]);
        assert_eq!(v.to_string(), "{a:[true,1.5]}");
    }
}
