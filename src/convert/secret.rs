//! Codecs for properties marked secret.

use super::{Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::value::PropertyValue;
use crate::wire::{WireType, WireValue};

/// Encodes secret values with a base encoder.
///
/// Known values must arrive wrapped as secrets. Nulls and unknowns are passed
/// to the base encoder.
#[derive(Debug)]
pub struct SecretEncoder {
    base: Box<dyn Encoder>,
}

impl SecretEncoder {
    /// Wrap `base`.
    pub fn new(base: Box<dyn Encoder>) -> Self {
        Self { base }
    }
}

impl Encoder for SecretEncoder {
    fn wire_type(&self) -> WireType {
        self.base.wire_type()
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        Err(BridgeError::conversion(format!(
            "expected a secret value, got {}",
            value.type_name()
        )))
    }

    fn encode_null(&self) -> Result<WireValue> {
        self.base.encode_null()
    }

    fn encode_unknown(&self) -> Result<WireValue> {
        self.base.encode_unknown()
    }

    fn from_property_value(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::Secret(inner) => self.base.from_property_value(inner),
            PropertyValue::Output(output) if output.known && output.secret => {
                self.base.from_property_value(&output.element)
            },
            PropertyValue::Output(output) if output.known => self.from_property_value(&output.element),
            PropertyValue::Output(_) | PropertyValue::Computed(_) => self.encode_unknown(),
            PropertyValue::Null => self.encode_null(),
            known => self.encode_known(known),
        }
    }
}

/// Decodes with a base decoder and marks the result secret.
///
/// Known results are wrapped even when the provider did not flag the value
/// as sensitive: upstream providers drop the flag on some nested values, so
/// the schema is trusted instead. Nulls and unknowns are left unwrapped.
#[derive(Debug)]
pub struct SecretDecoder {
    base: Box<dyn Decoder>,
}

impl SecretDecoder {
    /// Wrap `base`.
    pub fn new(base: Box<dyn Decoder>) -> Self {
        Self { base }
    }
}

impl Decoder for SecretDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let decoded = self.base.decode_known(value)?;
        if decoded.is_null() || decoded.is_computed() || decoded.is_secret() {
            return Ok(decoded);
        }
        Ok(PropertyValue::make_secret(decoded))
    }

    fn unknown_value(&self, ty: &WireType) -> PropertyValue {
        self.base.unknown_value(ty)
    }
}
