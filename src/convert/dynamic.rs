//! Codecs for dynamically typed values.
//!
//! Without type information, conversion is best effort and driven by the
//! data: arrays of uniformly typed elements become lists, other arrays become
//! tuples, and objects always become objects since maps and objects cannot be
//! told apart on the property side.

use super::{Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::value::{PropertyMap, PropertyValue};
use crate::wire::{WireData, WireType, WireValue};
use std::collections::BTreeMap;

/// Encodes any property value by inspecting it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    fn wire_type(&self) -> WireType {
        WireType::Dynamic
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::Bool(b) => Ok(WireValue::bool(*b)),
            PropertyValue::Number(n) => Ok(WireValue::number(*n)),
            PropertyValue::String(s) => Ok(WireValue::string(s.as_str())),
            PropertyValue::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.from_property_value(item))
                    .collect::<Result<Vec<_>>>()?;
                let first = items.first().map(|item| item.ty().clone());
                match first {
                    Some(ty) if items.iter().all(|item| item.ty() == &ty) => Ok(WireValue::list(ty, items)),
                    Some(_) => Ok(WireValue::tuple(items)),
                    None => Ok(WireValue::list(WireType::Dynamic, items)),
                }
            },
            PropertyValue::Object(map) => {
                let mut attrs = BTreeMap::new();
                for (key, item) in map {
                    attrs.insert(key.clone(), self.from_property_value(item)?);
                }
                Ok(WireValue::object(attrs))
            },
            PropertyValue::Asset(_) => Err(BridgeError::conversion(
                "Assets inside dynamically typed blocks are not yet supported",
            )),
            PropertyValue::Archive(_) => Err(BridgeError::conversion(
                "Archives inside dynamically typed blocks are not yet supported",
            )),
            PropertyValue::Secret(_) | PropertyValue::Output(_) | PropertyValue::Computed(_) | PropertyValue::Null => {
                self.from_property_value(value)
            },
        }
    }

    fn from_property_value(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::Computed(_) => self.encode_unknown(),
            PropertyValue::Output(output) if !output.known => self.encode_unknown(),
            PropertyValue::Null => self.encode_null(),
            PropertyValue::Secret(_) | PropertyValue::Output(_) if value.is_secret() => Err(
                BridgeError::conversion("Secrets inside dynamically typed blocks are not yet supported"),
            ),
            PropertyValue::Output(output) => self.from_property_value(&output.element),
            known => self.encode_known(known),
        }
    }
}

/// Decodes any wire value by inspecting its data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicDecoder;

impl Decoder for DynamicDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let Some(data) = value.data() else {
            return self.to_property_value(value);
        };
        match data {
            WireData::Bool(b) => Ok(PropertyValue::Bool(*b)),
            WireData::Number(n) => Ok(PropertyValue::Number(*n)),
            WireData::String(s) => Ok(PropertyValue::string(s.as_str())),
            WireData::List(items) => items
                .iter()
                .map(|item| self.to_property_value(item))
                .collect::<Result<Vec<_>>>()
                .map(PropertyValue::Array),
            WireData::Map(entries) => {
                let mut map = PropertyMap::new();
                for (key, item) in entries {
                    map.insert(key.clone(), self.to_property_value(item)?);
                }
                Ok(PropertyValue::Object(map))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Output;

    #[test]
    fn test_uniform_arrays_become_lists() {
        let value = PropertyValue::Array(vec!["a".into(), "b".into()]);
        let wire = DynamicEncoder.from_property_value(&value).unwrap();
        assert_eq!(wire.ty(), &WireType::list(WireType::String));
        assert_eq!(DynamicDecoder.to_property_value(&wire).unwrap(), value);
    }

    #[test]
    fn test_mixed_arrays_become_tuples() {
        let value = PropertyValue::Array(vec!["a".into(), 1.0.into()]);
        let wire = DynamicEncoder.from_property_value(&value).unwrap();
        assert_eq!(wire.ty(), &WireType::Tuple(vec![WireType::String, WireType::Number]));
        assert_eq!(DynamicDecoder.to_property_value(&wire).unwrap(), value);
    }

    #[test]
    fn test_objects_keep_their_keys() {
        let value = PropertyValue::object([("someKey", PropertyValue::Bool(true))]);
        let wire = DynamicEncoder.from_property_value(&value).unwrap();
        assert_eq!(wire.ty(), &WireType::object([("someKey", WireType::Bool)]));
        assert_eq!(DynamicDecoder.to_property_value(&wire).unwrap(), value);
    }

    #[test]
    fn test_markers() {
        assert!(DynamicEncoder
            .from_property_value(&PropertyValue::unknown())
            .unwrap()
            .is_unknown());

        let err = DynamicEncoder
            .from_property_value(&PropertyValue::make_secret("s".into()))
            .unwrap_err();
        assert_eq!(err.message(), "Secrets inside dynamically typed blocks are not yet supported");

        let output = PropertyValue::Output(Output {
            element: Box::new(1.0.into()),
            known: true,
            secret: false,
            dependencies: vec![],
        });
        assert_eq!(DynamicEncoder.from_property_value(&output).unwrap(), WireValue::number(1.0));
    }
}
