//! Provider-side typed values.
//!
//! Structured SDK and Plugin Framework providers exchange values as a typed
//! tree in which every node may be known, unknown or null. [`WireType`]
//! describes the shape; [`WireValue`] pairs a type with a payload.

use crate::value::number_to_json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The type of a wire value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    /// A boolean.
    Bool,
    /// A number.
    Number,
    /// A string.
    String,
    /// An ordered list.
    List(Box<WireType>),
    /// An unordered set.
    Set(Box<WireType>),
    /// A string-keyed map with uniform element type.
    Map(Box<WireType>),
    /// An object with a fixed set of attributes.
    Object(BTreeMap<String, WireType>),
    /// A fixed-length tuple.
    Tuple(Vec<WireType>),
    /// Any type; the value carries its own type.
    Dynamic,
}

impl WireType {
    /// Create a list type.
    pub fn list(element: WireType) -> Self {
        Self::List(Box::new(element))
    }

    /// Create a set type.
    pub fn set(element: WireType) -> Self {
        Self::Set(Box::new(element))
    }

    /// Create a map type.
    pub fn map(element: WireType) -> Self {
        Self::Map(Box::new(element))
    }

    /// Create an object type from attribute pairs.
    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, WireType)>) -> Self {
        Self::Object(attrs.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// The element type of a list, set or map.
    pub fn element_type(&self) -> Option<&WireType> {
        match self {
            Self::List(e) | Self::Set(e) | Self::Map(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true for list, set, map, object and tuple types.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::List(_) | Self::Set(_) | Self::Map(_) | Self::Object(_) | Self::Tuple(_)
        )
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::List(e) => write!(f, "list({})", e),
            Self::Set(e) => write!(f, "set({})", e),
            Self::Map(e) => write!(f, "map({})", e),
            Self::Object(attrs) => {
                write!(f, "object({{")?;
                for (i, (k, t)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, t)?;
                }
                write!(f, "}})")
            },
            Self::Tuple(ts) => {
                write!(f, "tuple([")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, "])")
            },
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// The payload of a known wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum WireData {
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// Elements of a list, set or tuple.
    List(Vec<WireValue>),
    /// Entries of a map or attributes of an object.
    Map(BTreeMap<String, WireValue>),
}

/// The state of a wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum WireState {
    /// A concrete payload.
    Known(WireData),
    /// Not known until after apply.
    Unknown,
    /// Explicitly absent.
    Null,
}

/// A typed provider value.
#[derive(Debug, Clone, PartialEq)]
pub struct WireValue {
    ty: WireType,
    state: WireState,
}

impl WireValue {
    /// A null of the given type.
    pub fn null(ty: WireType) -> Self {
        Self {
            ty,
            state: WireState::Null,
        }
    }

    /// An unknown of the given type.
    pub fn unknown(ty: WireType) -> Self {
        Self {
            ty,
            state: WireState::Unknown,
        }
    }

    /// A known boolean.
    pub fn bool(b: bool) -> Self {
        Self::known(WireType::Bool, WireData::Bool(b))
    }

    /// A known number.
    pub fn number(n: f64) -> Self {
        Self::known(WireType::Number, WireData::Number(n))
    }

    /// A known string.
    pub fn string(s: impl Into<String>) -> Self {
        Self::known(WireType::String, WireData::String(s.into()))
    }

    /// A known list with the given element type.
    pub fn list(element: WireType, items: Vec<WireValue>) -> Self {
        Self::known(WireType::list(element), WireData::List(items))
    }

    /// A known set with the given element type.
    pub fn set(element: WireType, items: Vec<WireValue>) -> Self {
        Self::known(WireType::set(element), WireData::List(items))
    }

    /// A known map with the given element type.
    pub fn map(element: WireType, entries: BTreeMap<String, WireValue>) -> Self {
        Self::known(WireType::map(element), WireData::Map(entries))
    }

    /// A known object. The type is taken from the attribute values.
    pub fn object(attrs: BTreeMap<String, WireValue>) -> Self {
        let ty = WireType::Object(
            attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.ty.clone()))
                .collect(),
        );
        Self::known(ty, WireData::Map(attrs))
    }

    /// A known object of a declared type. Attributes missing from `attrs`
    /// are filled with typed nulls.
    pub fn object_of(ty: &BTreeMap<String, WireType>, mut attrs: BTreeMap<String, WireValue>) -> Self {
        for (name, attr_ty) in ty {
            attrs
                .entry(name.clone())
                .or_insert_with(|| WireValue::null(attr_ty.clone()));
        }
        Self::known(WireType::Object(ty.clone()), WireData::Map(attrs))
    }

    /// A known tuple.
    pub fn tuple(items: Vec<WireValue>) -> Self {
        let ty = WireType::Tuple(items.iter().map(|v| v.ty.clone()).collect());
        Self::known(ty, WireData::List(items))
    }

    /// A known value with an explicit type.
    pub fn known(ty: WireType, data: WireData) -> Self {
        Self {
            ty,
            state: WireState::Known(data),
        }
    }

    /// The type of this value.
    pub fn ty(&self) -> &WireType {
        &self.ty
    }

    /// The state of this value.
    pub fn state(&self) -> &WireState {
        &self.state
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self.state, WireState::Null)
    }

    /// Returns true if this value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self.state, WireState::Unknown)
    }

    /// Returns true if this value is fully known, including all nested values.
    pub fn is_fully_known(&self) -> bool {
        match &self.state {
            WireState::Unknown => false,
            WireState::Null => true,
            WireState::Known(WireData::List(items)) => items.iter().all(Self::is_fully_known),
            WireState::Known(WireData::Map(entries)) => entries.values().all(Self::is_fully_known),
            WireState::Known(_) => true,
        }
    }

    /// The known payload, if any.
    pub fn data(&self) -> Option<&WireData> {
        match &self.state {
            WireState::Known(d) => Some(d),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self.data()? {
            WireData::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Number payload.
    pub fn as_number(&self) -> Option<f64> {
        match self.data()? {
            WireData::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self.data()? {
            WireData::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a known list, set or tuple.
    pub fn as_list(&self) -> Option<&[WireValue]> {
        match self.data()? {
            WireData::List(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a known map or object.
    pub fn as_map(&self) -> Option<&BTreeMap<String, WireValue>> {
        match self.data()? {
            WireData::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Consume the value, returning its type and state.
    pub fn into_parts(self) -> (WireType, WireState) {
        (self.ty, self.state)
    }

    /// Render the known parts of this value as JSON. Unknowns render as null.
    pub fn to_json(&self) -> Value {
        match &self.state {
            WireState::Null | WireState::Unknown => Value::Null,
            WireState::Known(WireData::Bool(b)) => Value::Bool(*b),
            WireState::Known(WireData::Number(n)) => number_to_json(*n),
            WireState::Known(WireData::String(s)) => Value::String(s.clone()),
            WireState::Known(WireData::List(items)) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            },
            WireState::Known(WireData::Map(entries)) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            WireState::Null => write!(f, "null"),
            WireState::Unknown => write!(f, "unknown"),
            WireState::Known(_) => write!(f, "{}", self.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        let ty = WireType::object([
            ("name", WireType::String),
            ("ports", WireType::list(WireType::Number)),
        ]);
        assert_eq!(ty.to_string(), "object({name=string, ports=list(number)})");
    }

    #[test]
    fn test_object_of_fills_nulls() {
        let ty: BTreeMap<String, WireType> = [
            ("a".to_string(), WireType::String),
            ("b".to_string(), WireType::Bool),
        ]
        .into_iter()
        .collect();
        let v = WireValue::object_of(
            &ty,
            [("a".to_string(), WireValue::string("x"))]
                .into_iter()
                .collect(),
        );
        let attrs = v.as_map().unwrap();
        assert!(attrs["b"].is_null());
        assert_eq!(attrs["b"].ty(), &WireType::Bool);
        assert_eq!(v.ty(), &WireType::Object(ty));
    }

    #[test]
    fn test_fully_known() {
        let v = WireValue::list(
            WireType::String,
            vec![WireValue::string("a"), WireValue::unknown(WireType::String)],
        );
        assert!(!v.is_fully_known());
        assert!(!v.is_unknown());
        assert!(WireValue::null(WireType::Number).is_fully_known());
    }

    #[test]
    fn test_to_json() {
        let v = WireValue::list(WireType::Number, vec![WireValue::number(1.0), WireValue::number(1.5)]);
        assert_eq!(v.to_json(), serde_json::json!([1, 1.5]));
    }
}
