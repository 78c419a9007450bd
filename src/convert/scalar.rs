//! Codecs for booleans, numbers and strings.

use super::{describe, Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::flatmap::format_float;
use crate::value::PropertyValue;
use crate::wire::{WireType, WireValue};

/// Encodes booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolEncoder;

impl Encoder for BoolEncoder {
    fn wire_type(&self) -> WireType {
        WireType::Bool
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::Bool(b) => Ok(WireValue::bool(*b)),
            other => Err(BridgeError::conversion(format!(
                "expected a bool, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Encodes numbers. Strings holding a number are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberEncoder;

impl Encoder for NumberEncoder {
    fn wire_type(&self) -> WireType {
        WireType::Number
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::Number(n) => Ok(WireValue::number(*n)),
            PropertyValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(WireValue::number)
                .ok_or_else(|| BridgeError::conversion(format!("expected a number, got string {:?}", s))),
            other => Err(BridgeError::conversion(format!(
                "expected a number, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Encodes strings. Booleans and numbers are formatted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringEncoder;

impl Encoder for StringEncoder {
    fn wire_type(&self) -> WireType {
        WireType::String
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::String(s) => Ok(WireValue::string(s.as_str())),
            PropertyValue::Bool(b) => Ok(WireValue::string(b.to_string())),
            PropertyValue::Number(n) => Ok(WireValue::string(format_float(*n))),
            other => Err(BridgeError::conversion(format!(
                "expected a string, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Decodes booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolDecoder;

impl Decoder for BoolDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        value
            .as_bool()
            .map(PropertyValue::Bool)
            .ok_or_else(|| BridgeError::conversion(format!("expected a bool, got {}", describe(value))))
    }
}

/// Decodes numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberDecoder;

impl Decoder for NumberDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        value
            .as_number()
            .map(PropertyValue::Number)
            .ok_or_else(|| BridgeError::conversion(format!("expected a number, got {}", describe(value))))
    }
}

/// Decodes strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringDecoder;

impl Decoder for StringDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        value
            .as_str()
            .map(PropertyValue::string)
            .ok_or_else(|| BridgeError::conversion(format!("expected a string, got {}", describe(value))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_encoder_accepts_numeric_strings() {
        let enc = NumberEncoder;
        assert_eq!(enc.encode_known(&"42".into()).unwrap(), WireValue::number(42.0));
        assert_eq!(enc.encode_known(&" 1.5".into()).unwrap(), WireValue::number(1.5));

        let err = enc.encode_known(&"forty".into()).unwrap_err();
        assert_eq!(err.to_string(), "expected a number, got string \"forty\"");
        assert!(enc.encode_known(&true.into()).is_err());
    }

    #[test]
    fn test_string_encoder_formats_scalars() {
        let enc = StringEncoder;
        assert_eq!(enc.encode_known(&true.into()).unwrap(), WireValue::string("true"));
        assert_eq!(enc.encode_known(&PropertyValue::Number(8080.0)).unwrap(), WireValue::string("8080"));
        assert_eq!(enc.encode_known(&PropertyValue::Number(0.25)).unwrap(), WireValue::string("0.25"));
        assert!(enc.encode_known(&PropertyValue::Array(vec![])).is_err());
    }

    #[test]
    fn test_bool_encoder_is_strict() {
        assert_eq!(BoolEncoder.encode_known(&false.into()).unwrap(), WireValue::bool(false));
        assert!(BoolEncoder.encode_known(&"true".into()).is_err());
    }

    #[test]
    fn test_scalar_decoders() {
        assert_eq!(
            StringDecoder.to_property_value(&WireValue::string("a")).unwrap(),
            PropertyValue::string("a")
        );
        assert_eq!(
            BoolDecoder.to_property_value(&WireValue::bool(true)).unwrap(),
            PropertyValue::Bool(true)
        );
        let err = NumberDecoder.decode_known(&WireValue::string("1")).unwrap_err();
        assert_eq!(err.message(), "expected a number, got string");
    }
}
