//! Codecs for objects with named attributes.

use super::{describe, Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::value::{PropertyMap, PropertyValue};
use crate::wire::{WireType, WireValue};
use std::collections::BTreeMap;
use tracing::debug;

/// Encodes property objects as wire objects.
///
/// Each wire attribute is read from the property with its mapped key. Missing
/// properties encode as typed nulls and properties without an attribute are
/// ignored.
#[derive(Debug)]
pub struct ObjectEncoder {
    attrs: BTreeMap<String, WireType>,
    properties: BTreeMap<String, (String, Box<dyn Encoder>)>,
    drop_unknowns: bool,
}

impl ObjectEncoder {
    /// An encoder for the object type `attrs`.
    ///
    /// `properties` maps each attribute name to its property key and encoder.
    /// Every attribute must have an entry.
    pub fn new(
        attrs: BTreeMap<String, WireType>,
        properties: BTreeMap<String, (String, Box<dyn Encoder>)>,
    ) -> Result<Self> {
        if let Some(missing) = attrs.keys().find(|name| !properties.contains_key(*name)) {
            return Err(BridgeError::Schema(format!("no encoder for attribute {:?}", missing)));
        }
        Ok(Self {
            attrs,
            properties,
            drop_unknowns: false,
        })
    }

    /// Encode unknown attributes as nulls.
    pub fn with_drop_unknowns(mut self, drop_unknowns: bool) -> Self {
        self.drop_unknowns = drop_unknowns;
        self
    }
}

impl Encoder for ObjectEncoder {
    fn wire_type(&self) -> WireType {
        WireType::Object(self.attrs.clone())
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        let map = value.as_object().ok_or_else(|| {
            BridgeError::conversion(format!("expected an object, got {}", value.type_name()))
        })?;
        let mut encoded = BTreeMap::new();
        for (name, (key, enc)) in &self.properties {
            let Some(property) = map.get(key) else {
                continue;
            };
            if self.drop_unknowns && property.is_computed() {
                debug!(attribute = %name, "Dropping unknown attribute");
                continue;
            }
            let item = enc.from_property_value(property).map_err(|e| e.with_context(key))?;
            encoded.insert(name.clone(), item);
        }
        Ok(WireValue::object_of(&self.attrs, encoded))
    }
}

/// Decodes wire objects into property objects.
///
/// Attributes that decode to `Null` are omitted from the result.
#[derive(Debug)]
pub struct ObjectDecoder {
    properties: BTreeMap<String, (String, Box<dyn Decoder>)>,
}

impl ObjectDecoder {
    /// A decoder mapping each attribute name to its property key and decoder.
    pub fn new(properties: BTreeMap<String, (String, Box<dyn Decoder>)>) -> Self {
        Self { properties }
    }

    /// Add or replace the decoder of one attribute.
    pub fn with_property(mut self, name: impl Into<String>, key: impl Into<String>, dec: Box<dyn Decoder>) -> Self {
        self.properties.insert(name.into(), (key.into(), dec));
        self
    }
}

impl Decoder for ObjectDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let attrs = value
            .as_map()
            .ok_or_else(|| BridgeError::conversion(format!("expected an object, got {}", describe(value))))?;
        let mut decoded = PropertyMap::new();
        for (name, item) in attrs {
            let Some((key, dec)) = self.properties.get(name) else {
                debug!(attribute = %name, "Skipping attribute without a decoder");
                continue;
            };
            let property = dec.to_property_value(item).map_err(|e| e.with_context(key))?;
            if !property.is_null() {
                decoded.insert(key.clone(), property);
            }
        }
        Ok(PropertyValue::Object(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{NumberDecoder, NumberEncoder, StringDecoder, StringEncoder};

    fn encoder() -> ObjectEncoder {
        let attrs = BTreeMap::from([
            ("bucket_name".to_string(), WireType::String),
            ("max_size".to_string(), WireType::Number),
        ]);
        let properties: BTreeMap<String, (String, Box<dyn Encoder>)> = BTreeMap::from([
            (
                "bucket_name".to_string(),
                ("bucketName".to_string(), Box::new(StringEncoder) as Box<dyn Encoder>),
            ),
            (
                "max_size".to_string(),
                ("maxSize".to_string(), Box::new(NumberEncoder) as Box<dyn Encoder>),
            ),
        ]);
        ObjectEncoder::new(attrs, properties).unwrap()
    }

    fn decoder() -> ObjectDecoder {
        ObjectDecoder::new(BTreeMap::new())
            .with_property("bucket_name", "bucketName", Box::new(StringDecoder))
            .with_property("max_size", "maxSize", Box::new(NumberDecoder))
    }

    #[test]
    fn test_missing_properties_become_typed_nulls() {
        let value = PropertyValue::object([("bucketName", PropertyValue::string("logs"))]);
        let wire = encoder().from_property_value(&value).unwrap();
        let attrs = wire.as_map().unwrap();
        assert_eq!(attrs["bucket_name"], WireValue::string("logs"));
        assert_eq!(attrs["max_size"], WireValue::null(WireType::Number));

        let decoded = decoder().to_property_value(&wire).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_unexpected_properties_are_ignored() {
        let value = PropertyValue::object([
            ("bucketName", PropertyValue::string("logs")),
            ("somethingElse", PropertyValue::Bool(true)),
        ]);
        let wire = encoder().from_property_value(&value).unwrap();
        assert_eq!(wire.as_map().unwrap().len(), 2);
    }

    #[test]
    fn test_errors_name_the_property() {
        let value = PropertyValue::object([("maxSize", PropertyValue::string("big"))]);
        let err = encoder().from_property_value(&value).unwrap_err();
        assert_eq!(err.path(), Some("maxSize"));
        assert!(encoder().from_property_value(&PropertyValue::Bool(true)).is_err());
    }

    #[test]
    fn test_drop_unknowns() {
        let value = PropertyValue::object([("maxSize", PropertyValue::unknown())]);
        let wire = encoder().from_property_value(&value).unwrap();
        assert!(wire.as_map().unwrap()["max_size"].is_unknown());

        let wire = encoder()
            .with_drop_unknowns(true)
            .from_property_value(&value)
            .unwrap();
        assert!(wire.as_map().unwrap()["max_size"].is_null());
    }

    #[test]
    fn test_encoder_requires_every_attribute() {
        let attrs = BTreeMap::from([("a".to_string(), WireType::String)]);
        assert!(ObjectEncoder::new(attrs, BTreeMap::new()).is_err());
    }
}
