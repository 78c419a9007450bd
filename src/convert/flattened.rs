//! Codecs projecting single-item collections onto their element.

use super::{describe, Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::value::PropertyValue;
use crate::wire::{WireData, WireType, WireValue};

/// Encodes a single value as a list or set of at most one element.
///
/// `Null` encodes as an empty collection. An array is encoded element-wise.
#[derive(Debug)]
pub struct FlattenedEncoder {
    collection_type: WireType,
    element: Box<dyn Encoder>,
}

impl FlattenedEncoder {
    /// Wrap `element` into a `collection_type`, which must be a list or set.
    pub fn new(collection_type: WireType, element: Box<dyn Encoder>) -> Self {
        Self {
            collection_type,
            element,
        }
    }

    fn collection(&self, items: Vec<WireValue>) -> WireValue {
        WireValue::known(self.collection_type.clone(), WireData::List(items))
    }
}

impl Encoder for FlattenedEncoder {
    fn wire_type(&self) -> WireType {
        self.collection_type.clone()
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        if let PropertyValue::Array(items) = value {
            let items = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.element
                        .from_property_value(item)
                        .map_err(|e| e.with_context(&format!("[{}]", i)))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(self.collection(items));
        }
        Ok(self.collection(vec![self.element.from_property_value(value)?]))
    }

    fn encode_null(&self) -> Result<WireValue> {
        Ok(self.collection(Vec::new()))
    }
}

/// Decodes a list or set of at most one element into that element.
///
/// An empty collection decodes as `Null`.
#[derive(Debug)]
pub struct FlattenedDecoder {
    element: Box<dyn Decoder>,
}

impl FlattenedDecoder {
    /// Unwrap collections decoded by `element`.
    pub fn new(element: Box<dyn Decoder>) -> Self {
        Self { element }
    }
}

impl Decoder for FlattenedDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let items = match (value.ty(), value.as_list()) {
            (WireType::List(_) | WireType::Set(_), Some(items)) => items,
            _ => {
                return Err(BridgeError::conversion(format!(
                    "expected a list or set, got {}",
                    describe(value)
                )))
            },
        };
        match items {
            [] => Ok(PropertyValue::Null),
            [item] => self.element.to_property_value(item),
            _ => Err(BridgeError::conversion(format!(
                "expected at most one element, got {}",
                items.len()
            ))),
        }
    }

    fn unknown_value(&self, ty: &WireType) -> PropertyValue {
        let element_ty = ty.element_type().cloned().unwrap_or(WireType::Dynamic);
        self.element.unknown_value(&element_ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{StringDecoder, StringEncoder};

    fn list_encoder() -> FlattenedEncoder {
        FlattenedEncoder::new(WireType::list(WireType::String), Box::new(StringEncoder))
    }

    fn set_encoder() -> FlattenedEncoder {
        FlattenedEncoder::new(WireType::set(WireType::String), Box::new(StringEncoder))
    }

    fn decoder() -> FlattenedDecoder {
        FlattenedDecoder::new(Box::new(StringDecoder))
    }

    #[test]
    fn test_flattened_encoder() {
        assert_eq!(
            list_encoder().from_property_value(&"foo".into()).unwrap(),
            WireValue::list(WireType::String, vec![WireValue::string("foo")])
        );
        assert_eq!(
            list_encoder().from_property_value(&PropertyValue::Null).unwrap(),
            WireValue::list(WireType::String, vec![])
        );
        assert_eq!(
            set_encoder().from_property_value(&"foo".into()).unwrap(),
            WireValue::set(WireType::String, vec![WireValue::string("foo")])
        );
        assert_eq!(
            set_encoder().from_property_value(&PropertyValue::Null).unwrap(),
            WireValue::set(WireType::String, vec![])
        );
        assert_eq!(
            list_encoder()
                .from_property_value(&PropertyValue::Array(vec!["a".into()]))
                .unwrap(),
            WireValue::list(WireType::String, vec![WireValue::string("a")])
        );
        assert!(list_encoder()
            .from_property_value(&PropertyValue::object(Vec::<(String, PropertyValue)>::new()))
            .is_err());
    }

    #[test]
    fn test_flattened_decoder() {
        let single = WireValue::list(WireType::String, vec![WireValue::string("foo")]);
        assert_eq!(decoder().to_property_value(&single).unwrap(), "foo".into());

        let empty = WireValue::set(WireType::String, vec![]);
        assert_eq!(decoder().to_property_value(&empty).unwrap(), PropertyValue::Null);

        let two = WireValue::list(WireType::String, vec![WireValue::string("a"), WireValue::string("b")]);
        assert!(decoder().to_property_value(&two).is_err());

        assert!(decoder().to_property_value(&WireValue::string("mistyped")).is_err());
    }

    #[test]
    fn test_flattened_unknowns() {
        let unknown_element = WireValue::list(WireType::String, vec![WireValue::unknown(WireType::String)]);
        assert_eq!(
            decoder().to_property_value(&unknown_element).unwrap(),
            PropertyValue::unknown()
        );

        let unknown_set = WireValue::unknown(WireType::set(WireType::String));
        assert_eq!(decoder().to_property_value(&unknown_set).unwrap(), PropertyValue::unknown());

        assert_eq!(
            list_encoder().from_property_value(&PropertyValue::unknown()).unwrap(),
            WireValue::unknown(WireType::list(WireType::String))
        );
    }
}
