//! Codecs derived from a package document instead of provider schemas.
//!
//! Properties are typed by the package document: `$ref`s to named object
//! types are followed, arrays map to lists and `additionalProperties`
//! objects map to maps. Property names are looked up per type token in a
//! [`RenamedProperties`] table and fall back to the attribute name.

use super::collection::{ListDecoder, ListEncoder, MapDecoder, MapEncoder};
use super::object::{ObjectDecoder, ObjectEncoder};
use super::scalar::{BoolDecoder, BoolEncoder, NumberDecoder, NumberEncoder, StringDecoder, StringEncoder};
use super::secret::{SecretDecoder, SecretEncoder};
use super::{Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::package::{parse_type_token, PackageSpec, PropertySpec, TypeSpec};
use crate::wire::WireType;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Property keys of renamed attributes, per type token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenamedProperties(BTreeMap<String, BTreeMap<String, String>>);

impl RenamedProperties {
    /// An empty table: every attribute keeps its name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the attribute `tf_name` of `token` to `key`.
    pub fn with_rename(mut self, token: impl Into<String>, tf_name: impl Into<String>, key: impl Into<String>) -> Self {
        self.0
            .entry(token.into())
            .or_default()
            .insert(tf_name.into(), key.into());
        self
    }

    /// The renames of one type.
    pub fn renames(&self, token: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(token)
    }

    /// The property key of the attribute `tf_name` of `token`.
    pub fn property_key(&self, token: &str, tf_name: &str) -> String {
        self.0
            .get(token)
            .and_then(|renames| renames.get(tf_name))
            .cloned()
            .unwrap_or_else(|| tf_name.to_string())
    }
}

/// Codec factory over a package document.
#[derive(Debug, Clone)]
pub struct PackageEncoding {
    spec: PackageSpec,
    names: RenamedProperties,
}

type PropertyLookup<'a> = dyn Fn(&str) -> Option<Cow<'a, PropertySpec>> + 'a;

impl PackageEncoding {
    /// Codecs for the types of `spec`.
    pub fn new(spec: PackageSpec, names: RenamedProperties) -> Self {
        Self { spec, names }
    }

    /// Encoder for the resource `token` with wire type `object_type`.
    pub fn new_resource_encoder(&self, token: &str, object_type: &BTreeMap<String, WireType>) -> Result<ObjectEncoder> {
        let lookup = self.resource_lookup(token)?;
        let properties = self
            .build_property_encoders(token, &lookup, object_type)
            .map_err(|e| BridgeError::Schema(format!("cannot derive an encoder for resource {:?}: {}", token, e)))?;
        ObjectEncoder::new(object_type.clone(), properties)
    }

    /// Decoder for the resource `token` with wire type `object_type`.
    ///
    /// The `id` attribute always decodes as a string.
    pub fn new_resource_decoder(&self, token: &str, object_type: &BTreeMap<String, WireType>) -> Result<ObjectDecoder> {
        let lookup = self.resource_lookup(token)?;
        let properties = self
            .build_property_decoders(token, &lookup, object_type)
            .map_err(|e| BridgeError::Schema(format!("cannot derive a decoder for resource {:?}: {}", token, e)))?;
        Ok(ObjectDecoder::new(properties).with_property("id", "id", Box::new(StringDecoder)))
    }

    fn resource_lookup(&self, token: &str) -> Result<Box<PropertyLookup<'_>>> {
        let resource = self
            .spec
            .resource(token)
            .ok_or_else(|| BridgeError::Schema(format!("dangling resource token {:?}", token)))?;
        let lookup: Box<PropertyLookup<'_>> = Box::new(move |key: &str| match resource.properties.get(key) {
            Some(prop) => Some(Cow::Borrowed(prop)),
            // The implicit `id` is not listed among the properties.
            None if key == "id" => Some(Cow::Owned(PropertySpec::new(TypeSpec::of_kind("string")))),
            None => None,
        });
        Ok(lookup)
    }

    fn resolve_ref(&self, raw_ref: &str) -> Result<(String, Box<PropertyLookup<'_>>)> {
        let spec = parse_type_token(raw_ref)
            .and_then(|token| self.spec.type_spec(token).map(|spec| (token, spec)));
        let (token, spec) = spec.ok_or_else(|| BridgeError::Schema(format!("dangling schema ref: {:?}", raw_ref)))?;
        if spec.is_enum() {
            return Err(BridgeError::Schema(format!("enums are not supported: {:?}", raw_ref)));
        }
        let lookup: Box<PropertyLookup<'_>> = Box::new(move |key: &str| spec.properties.get(key).map(Cow::Borrowed));
        Ok((token.to_string(), lookup))
    }

    fn build_property_encoders(
        &self,
        token: &str,
        lookup: &PropertyLookup<'_>,
        attrs: &BTreeMap<String, WireType>,
    ) -> Result<BTreeMap<String, (String, Box<dyn Encoder>)>> {
        let mut encoders = BTreeMap::new();
        for (name, ty) in attrs {
            let key = self.names.property_key(token, name);
            let prop = lookup(&key).ok_or_else(|| BridgeError::Schema(format!("missing property {:?}", key)))?;
            let mut enc = self.derive_encoder(&prop.type_spec, ty).map_err(|e| {
                BridgeError::Schema(format!("cannot derive an encoder for property {:?}: {}", name, e))
            })?;
            if prop.secret {
                enc = Box::new(SecretEncoder::new(enc));
            }
            encoders.insert(name.clone(), (key, enc));
        }
        Ok(encoders)
    }

    fn build_property_decoders(
        &self,
        token: &str,
        lookup: &PropertyLookup<'_>,
        attrs: &BTreeMap<String, WireType>,
    ) -> Result<BTreeMap<String, (String, Box<dyn Decoder>)>> {
        let mut decoders = BTreeMap::new();
        for (name, ty) in attrs {
            let key = self.names.property_key(token, name);
            let prop = lookup(&key).ok_or_else(|| BridgeError::Schema(format!("missing property {:?}", key)))?;
            let mut dec = self.derive_decoder(&prop.type_spec, ty).map_err(|e| {
                BridgeError::Schema(format!("cannot derive a decoder for property {:?}: {}", name, e))
            })?;
            if prop.secret {
                dec = Box::new(SecretDecoder::new(dec));
            }
            decoders.insert(name.clone(), (key, dec));
        }
        Ok(decoders)
    }

    fn derive_encoder(&self, spec: &TypeSpec, ty: &WireType) -> Result<Box<dyn Encoder>> {
        if let Some(raw_ref) = &spec.reference {
            let WireType::Object(attrs) = ty else {
                return Err(BridgeError::Schema(format!("expected Object type but got {}", ty)));
            };
            let (token, lookup) = self.resolve_ref(raw_ref)?;
            let properties = self.build_property_encoders(&token, &lookup, attrs)?;
            return Ok(Box::new(ObjectEncoder::new(attrs.clone(), properties)?));
        }
        match (spec.kind.as_deref(), ty) {
            (Some("boolean"), _) => Ok(Box::new(BoolEncoder)),
            (Some("integer" | "number"), _) => Ok(Box::new(NumberEncoder)),
            (Some("string"), _) => Ok(Box::new(StringEncoder)),
            (Some("array"), WireType::List(element)) => {
                let items = element_spec(spec.items.as_deref(), "items")?;
                Ok(Box::new(ListEncoder::list(self.derive_encoder(items, element)?)))
            },
            (Some("array"), other) => Err(BridgeError::Schema(format!("expected a List, got {}", other))),
            (Some("object"), ty) => {
                let values = element_spec(spec.additional_properties.as_deref(), "additionalProperties")?;
                let WireType::Map(element) = ty else {
                    return Err(BridgeError::Schema(format!("expected a Map, got {}", ty)));
                };
                Ok(Box::new(MapEncoder::new(self.derive_encoder(values, element)?)))
            },
            (kind, _) => Err(BridgeError::Schema(format!(
                "cannot build an encoder for type {:?}",
                kind.unwrap_or_default()
            ))),
        }
    }

    fn derive_decoder(&self, spec: &TypeSpec, ty: &WireType) -> Result<Box<dyn Decoder>> {
        if let Some(raw_ref) = &spec.reference {
            let WireType::Object(attrs) = ty else {
                return Err(BridgeError::Schema(format!("expected Object type but got {}", ty)));
            };
            let (token, lookup) = self.resolve_ref(raw_ref)?;
            let properties = self.build_property_decoders(&token, &lookup, attrs)?;
            return Ok(Box::new(ObjectDecoder::new(properties)));
        }
        match (spec.kind.as_deref(), ty) {
            (Some("boolean"), _) => Ok(Box::new(BoolDecoder)),
            (Some("integer" | "number"), _) => Ok(Box::new(NumberDecoder)),
            (Some("string"), _) => Ok(Box::new(StringDecoder)),
            (Some("array"), WireType::List(element)) => {
                let items = element_spec(spec.items.as_deref(), "items")?;
                Ok(Box::new(ListDecoder::new(self.derive_decoder(items, element)?)))
            },
            (Some("array"), other) => Err(BridgeError::Schema(format!("expected a List, got {}", other))),
            (Some("object"), ty) => {
                let values = element_spec(spec.additional_properties.as_deref(), "additionalProperties")?;
                let WireType::Map(element) = ty else {
                    return Err(BridgeError::Schema(format!("expected a Map, got {}", ty)));
                };
                Ok(Box::new(MapDecoder::new(self.derive_decoder(values, element)?)))
            },
            (kind, _) => Err(BridgeError::Schema(format!(
                "cannot build a decoder for type {:?}",
                kind.unwrap_or_default()
            ))),
        }
    }
}

fn element_spec<'s>(spec: Option<&'s TypeSpec>, field: &str) -> Result<&'s TypeSpec> {
    spec.ok_or_else(|| match field {
        "additionalProperties" => BridgeError::Schema("expected Ref or AdditionalProperties set".to_string()),
        _ => BridgeError::Schema(format!("expected {} to be set", field)),
    })
}
