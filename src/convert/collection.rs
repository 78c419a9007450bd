//! Codecs for lists, sets, maps and tuples.
//!
//! Element errors are prefixed with the index (`[2]`) or key of the element.

use super::{describe, Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::value::{PropertyMap, PropertyValue};
use crate::wire::{WireData, WireType, WireValue};
use std::collections::BTreeMap;

fn index(i: usize) -> String {
    format!("[{}]", i)
}

/// Encodes arrays as lists or sets.
#[derive(Debug)]
pub struct ListEncoder {
    ty: WireType,
    element: Box<dyn Encoder>,
    unknown_collections: bool,
}

impl ListEncoder {
    /// A list encoder.
    pub fn list(element: Box<dyn Encoder>) -> Self {
        Self {
            ty: WireType::list(element.wire_type()),
            element,
            unknown_collections: true,
        }
    }

    /// A set encoder. Sets are encoded in array order.
    pub fn set(element: Box<dyn Encoder>) -> Self {
        Self {
            ty: WireType::set(element.wire_type()),
            element,
            unknown_collections: true,
        }
    }

    /// Encode computed arrays as a collection of one unknown element
    /// instead of an unknown collection.
    pub fn without_unknown_collections(mut self) -> Self {
        self.unknown_collections = false;
        self
    }
}

impl Encoder for ListEncoder {
    fn wire_type(&self) -> WireType {
        self.ty.clone()
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        let items = value.as_array().ok_or_else(|| {
            BridgeError::conversion(format!("expected an array, got {}", value.type_name()))
        })?;
        let encoded = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.element
                    .from_property_value(item)
                    .map_err(|e| e.with_context(&index(i)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(WireValue::known(self.ty.clone(), WireData::List(encoded)))
    }

    fn encode_unknown(&self) -> Result<WireValue> {
        if self.unknown_collections {
            return Ok(WireValue::unknown(self.ty.clone()));
        }
        let element = self.element.encode_unknown()?;
        Ok(WireValue::known(self.ty.clone(), WireData::List(vec![element])))
    }
}

/// Encodes objects as maps.
#[derive(Debug)]
pub struct MapEncoder {
    element: Box<dyn Encoder>,
}

impl MapEncoder {
    /// A map encoder with the given element encoder.
    pub fn new(element: Box<dyn Encoder>) -> Self {
        Self { element }
    }
}

impl Encoder for MapEncoder {
    fn wire_type(&self) -> WireType {
        WireType::map(self.element.wire_type())
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        let entries = value.as_object().ok_or_else(|| {
            BridgeError::conversion(format!("expected an object, got {}", value.type_name()))
        })?;
        let mut encoded = BTreeMap::new();
        for (key, item) in entries {
            let item = self
                .element
                .from_property_value(item)
                .map_err(|e| e.with_context(key))?;
            encoded.insert(key.clone(), item);
        }
        Ok(WireValue::map(self.element.wire_type(), encoded))
    }
}

/// Encodes arrays positionally as tuples.
#[derive(Debug)]
pub struct TupleEncoder {
    elements: Vec<Box<dyn Encoder>>,
}

impl TupleEncoder {
    /// A tuple encoder with one encoder per position.
    pub fn new(elements: Vec<Box<dyn Encoder>>) -> Self {
        Self { elements }
    }
}

impl Encoder for TupleEncoder {
    fn wire_type(&self) -> WireType {
        WireType::Tuple(self.elements.iter().map(|e| e.wire_type()).collect())
    }

    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue> {
        let items = value.as_array().ok_or_else(|| {
            BridgeError::conversion(format!("expected an array, got {}", value.type_name()))
        })?;
        if items.len() != self.elements.len() {
            return Err(BridgeError::conversion(format!(
                "expected an array of {} elements, got {}",
                self.elements.len(),
                items.len()
            )));
        }
        let encoded = self
            .elements
            .iter()
            .zip(items)
            .enumerate()
            .map(|(i, (enc, item))| enc.from_property_value(item).map_err(|e| e.with_context(&index(i))))
            .collect::<Result<Vec<_>>>()?;
        Ok(WireValue::known(self.wire_type(), WireData::List(encoded)))
    }
}

/// Decodes lists and sets into arrays.
#[derive(Debug)]
pub struct ListDecoder {
    element: Box<dyn Decoder>,
    unknown_collections: bool,
}

impl ListDecoder {
    /// A list or set decoder with the given element decoder.
    pub fn new(element: Box<dyn Decoder>) -> Self {
        Self {
            element,
            unknown_collections: true,
        }
    }

    /// Decode unknown collections as an array holding one unknown element.
    pub fn without_unknown_collections(mut self) -> Self {
        self.unknown_collections = false;
        self
    }
}

impl Decoder for ListDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let items = value
            .as_list()
            .ok_or_else(|| BridgeError::conversion(format!("expected a list, got {}", describe(value))))?;
        let decoded = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.element
                    .to_property_value(item)
                    .map_err(|e| e.with_context(&index(i)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PropertyValue::Array(decoded))
    }

    fn unknown_value(&self, ty: &WireType) -> PropertyValue {
        if self.unknown_collections {
            return PropertyValue::make_computed(PropertyValue::Array(Vec::new()));
        }
        let element_ty = ty.element_type().cloned().unwrap_or(WireType::Dynamic);
        PropertyValue::Array(vec![self.element.unknown_value(&element_ty)])
    }
}

/// Decodes maps into objects.
#[derive(Debug)]
pub struct MapDecoder {
    element: Box<dyn Decoder>,
}

impl MapDecoder {
    /// A map decoder with the given element decoder.
    pub fn new(element: Box<dyn Decoder>) -> Self {
        Self { element }
    }
}

impl Decoder for MapDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let entries = value
            .as_map()
            .ok_or_else(|| BridgeError::conversion(format!("expected a map, got {}", describe(value))))?;
        let mut decoded = PropertyMap::new();
        for (key, item) in entries {
            let item = self
                .element
                .to_property_value(item)
                .map_err(|e| e.with_context(key))?;
            decoded.insert(key.clone(), item);
        }
        Ok(PropertyValue::Object(decoded))
    }
}

/// Decodes tuples into arrays.
#[derive(Debug)]
pub struct TupleDecoder {
    elements: Vec<Box<dyn Decoder>>,
}

impl TupleDecoder {
    /// A tuple decoder with one decoder per position.
    pub fn new(elements: Vec<Box<dyn Decoder>>) -> Self {
        Self { elements }
    }
}

impl Decoder for TupleDecoder {
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue> {
        let items = value
            .as_list()
            .ok_or_else(|| BridgeError::conversion(format!("expected a tuple, got {}", describe(value))))?;
        if items.len() != self.elements.len() {
            return Err(BridgeError::conversion(format!(
                "expected a tuple of {} elements, got {}",
                self.elements.len(),
                items.len()
            )));
        }
        let decoded = self
            .elements
            .iter()
            .zip(items)
            .enumerate()
            .map(|(i, (dec, item))| dec.to_property_value(item).map_err(|e| e.with_context(&index(i))))
            .collect::<Result<Vec<_>>>()?;
        Ok(PropertyValue::Array(decoded))
    }
}
