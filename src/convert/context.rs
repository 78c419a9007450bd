//! Deriving encoders and decoders from provider schemas.
//!
//! A wire type says how a value is shaped; the schema and its overlays say
//! how the property tree names and presents it. Derivation walks both in
//! lockstep, carrying the schema node and overlay of the current position.

use super::collection::{ListDecoder, ListEncoder, MapDecoder, MapEncoder, TupleDecoder, TupleEncoder};
use super::dynamic::{DynamicDecoder, DynamicEncoder};
use super::flattened::{FlattenedDecoder, FlattenedEncoder};
use super::object::{ObjectDecoder, ObjectEncoder};
use super::scalar::{BoolDecoder, BoolEncoder, NumberDecoder, NumberEncoder, StringDecoder, StringEncoder};
use super::secret::SecretDecoder;
use super::{Decoder, Encoder};
use crate::error::{BridgeError, Result};
use crate::info::{self, ResourceInfo, SchemaInfo, SchemaInfos};
use crate::shim::{Elem, Provider, ResourceLike, Schema, SchemaLike, SchemaMap, ValueType};
use crate::value::{remove_secrets, PropertyMap, PropertyValue};
use crate::walk::{lookup_schema_map_path, lookup_schema_path, SchemaPath};
use crate::wire::{WireType, WireValue};
use std::collections::BTreeMap;

/// Switches for derived codecs.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Whether the provider accepts wholly unknown lists and sets.
    pub unknown_collections: bool,
    /// Encode unknown top-level attributes as nulls.
    pub drop_unknowns: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            unknown_collections: true,
            drop_unknowns: false,
        }
    }
}

impl ConvertOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options matching what `provider` can represent.
    pub fn for_provider(provider: &Provider) -> Self {
        Self::default().with_unknown_collections(provider.supports_unknown_collections())
    }

    /// Set whether unknown lists and sets are supported.
    pub fn with_unknown_collections(mut self, supported: bool) -> Self {
        self.unknown_collections = supported;
        self
    }

    /// Set whether unknown top-level attributes are dropped.
    pub fn with_drop_unknowns(mut self, drop: bool) -> Self {
        self.drop_unknowns = drop;
        self
    }
}

/// The schema information needed to derive object codecs.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    /// Attributes of the object.
    pub schema_map: SchemaMap,
    /// Overlays for the attributes.
    pub infos: SchemaInfos,
    /// The wire type to convert to. Inferred from `schema_map` when unset.
    pub object_type: Option<BTreeMap<String, WireType>>,
}

impl ObjectSchema {
    /// An object schema over `schema_map` with no overlays.
    pub fn new(schema_map: SchemaMap) -> Self {
        Self {
            schema_map,
            ..Self::default()
        }
    }

    /// Set the overlays.
    pub fn with_infos(mut self, infos: SchemaInfos) -> Self {
        self.infos = infos;
        self
    }

    /// Set the wire type explicitly.
    pub fn with_object_type(mut self, object_type: BTreeMap<String, WireType>) -> Self {
        self.object_type = Some(object_type);
        self
    }

    /// The wire type codecs derived from this schema convert to.
    pub fn object_type(&self) -> BTreeMap<String, WireType> {
        self.object_type
            .clone()
            .unwrap_or_else(|| infer_object_type(&self.schema_map))
    }
}

/// The wire type implied by a schema node.
///
/// Numbers of either kind share one wire type. Collections without an
/// element type hold strings.
pub fn schema_wire_type(schema: &Schema) -> WireType {
    let element = || match schema.elem() {
        Elem::Resource(r) => WireType::Object(infer_object_type(&r.schema())),
        Elem::Schema(s) => schema_wire_type(&s),
        Elem::None => WireType::String,
    };
    match schema.value_type() {
        ValueType::Bool => WireType::Bool,
        ValueType::Int | ValueType::Float => WireType::Number,
        ValueType::String => WireType::String,
        ValueType::List => WireType::list(element()),
        ValueType::Set => WireType::set(element()),
        ValueType::Map if schema.is_object() => element(),
        ValueType::Map => WireType::map(element()),
        ValueType::Dynamic | ValueType::Invalid => WireType::Dynamic,
    }
}

/// The object type implied by a schema map.
pub fn infer_object_type(schema_map: &SchemaMap) -> BTreeMap<String, WireType> {
    schema_map
        .iter()
        .map(|(name, schema)| (name.to_string(), schema_wire_type(schema)))
        .collect()
}

/// Build the encoder for the object described by `schema`.
pub fn new_object_encoder(schema: &ObjectSchema, options: &ConvertOptions) -> Result<ObjectEncoder> {
    let ctx = MapContext::new(SchemaPath::new(), schema.schema_map.clone(), schema.infos.clone());
    let attrs = schema.object_type();
    let properties = build_property_encoders(&ctx, &attrs, options)?;
    Ok(ObjectEncoder::new(attrs, properties)?.with_drop_unknowns(options.drop_unknowns))
}

/// Build the decoder for the object described by `schema`.
pub fn new_object_decoder(schema: &ObjectSchema, options: &ConvertOptions) -> Result<ObjectDecoder> {
    let ctx = MapContext::new(SchemaPath::new(), schema.schema_map.clone(), schema.infos.clone());
    let attrs = schema.object_type();
    Ok(ObjectDecoder::new(build_property_decoders(&ctx, &attrs, options)?))
}

/// Encode a property map with an object encoder.
///
/// Secrets are stripped first; the wire protocol carries sensitivity in the
/// schema rather than in values.
pub fn encode_property_map(enc: &dyn Encoder, map: &PropertyMap) -> Result<WireValue> {
    enc.from_property_value(&remove_secrets(&PropertyValue::Object(map.clone())))
}

/// Decode a wire object into a property map.
pub fn decode_property_map(dec: &dyn Decoder, value: &WireValue) -> Result<PropertyMap> {
    match dec.to_property_value(value)? {
        PropertyValue::Object(map) => Ok(map),
        other => Err(BridgeError::conversion(format!(
            "expected the decoder to return an object, got {}",
            other.type_name()
        ))),
    }
}

/// Codec factory for the resources, data sources and configuration of a
/// provider.
#[derive(Debug, Clone)]
pub struct Encoding {
    provider: Provider,
    config: SchemaInfos,
    resources: BTreeMap<String, ResourceInfo>,
    data_sources: BTreeMap<String, ResourceInfo>,
    options: ConvertOptions,
}

impl Encoding {
    /// Codecs for `provider`, with options matching its capabilities.
    pub fn new(provider: Provider) -> Self {
        let options = ConvertOptions::for_provider(&provider);
        Self {
            provider,
            config: SchemaInfos::new(),
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
            options,
        }
    }

    /// Set the overlays of the provider configuration.
    pub fn with_config_infos(mut self, infos: SchemaInfos) -> Self {
        self.config = infos;
        self
    }

    /// Add the overlay of a resource.
    pub fn with_resource_info(mut self, token: impl Into<String>, info: ResourceInfo) -> Self {
        self.resources.insert(token.into(), info);
        self
    }

    /// Add the overlay of a data source.
    pub fn with_data_source_info(mut self, token: impl Into<String>, info: ResourceInfo) -> Self {
        self.data_sources.insert(token.into(), info);
        self
    }

    /// Override the conversion options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Encoder for the provider configuration. Unknown settings are dropped.
    pub fn new_config_encoder(&self) -> Result<ObjectEncoder> {
        let schema = ObjectSchema::new(self.provider.schema()).with_infos(self.config.clone());
        new_object_encoder(&schema, &self.options.clone().with_drop_unknowns(true))
    }

    /// Encoder for the resource `token`.
    pub fn new_resource_encoder(&self, token: &str) -> Result<ObjectEncoder> {
        new_object_encoder(&self.resource_schema(token)?, &self.options)
    }

    /// Decoder for the resource `token`.
    pub fn new_resource_decoder(&self, token: &str) -> Result<ObjectDecoder> {
        new_object_decoder(&self.resource_schema(token)?, &self.options)
    }

    /// Encoder for the data source `token`.
    pub fn new_data_source_encoder(&self, token: &str) -> Result<ObjectEncoder> {
        new_object_encoder(&self.data_source_schema(token)?, &self.options)
    }

    /// Decoder for the data source `token`.
    pub fn new_data_source_decoder(&self, token: &str) -> Result<ObjectDecoder> {
        new_object_decoder(&self.data_source_schema(token)?, &self.options)
    }

    fn resource_schema(&self, token: &str) -> Result<ObjectSchema> {
        let resource = self.provider.resources_map().get_ok(token)?.clone();
        let infos = self.resources.get(token).map(|r| r.fields.clone()).unwrap_or_default();
        Ok(ObjectSchema::new(resource.schema()).with_infos(infos))
    }

    fn data_source_schema(&self, token: &str) -> Result<ObjectSchema> {
        let data_source = self.provider.data_sources_map().get_ok(token)?.clone();
        let infos = self
            .data_sources
            .get(token)
            .map(|r| r.fields.clone())
            .unwrap_or_default();
        Ok(ObjectSchema::new(data_source.schema()).with_infos(infos))
    }
}

// =========================================================================
// Derivation
// =========================================================================

struct MapContext {
    path: SchemaPath,
    schema_map: SchemaMap,
    infos: SchemaInfos,
}

impl MapContext {
    fn new(path: SchemaPath, schema_map: SchemaMap, infos: SchemaInfos) -> Self {
        Self {
            path,
            schema_map,
            infos,
        }
    }

    fn property_key(&self, tf_name: &str) -> String {
        info::terraform_to_property_name(tf_name, &self.infos)
    }

    fn get_attr(&self, tf_name: &str) -> Result<PropContext> {
        let step = SchemaPath::new().get_attr(tf_name);
        let schema = lookup_schema_map_path(&step, &self.schema_map)?;
        Ok(PropContext {
            path: self.path.get_attr(tf_name),
            schema: Some(schema),
            info: info::lookup_schema_info(&step, &self.infos).cloned(),
        })
    }
}

struct PropContext {
    path: SchemaPath,
    schema: Option<Schema>,
    info: Option<SchemaInfo>,
}

impl PropContext {
    fn untyped(path: SchemaPath) -> Self {
        Self {
            path,
            schema: None,
            info: None,
        }
    }

    fn secret(&self) -> bool {
        match (&self.schema, &self.info) {
            (Some(schema), info) => info::is_secret(schema, info.as_ref()),
            (None, Some(info)) => info.secret.unwrap_or(false),
            (None, None) => false,
        }
    }

    fn element(&self) -> Result<PropContext> {
        let schema = match &self.schema {
            Some(schema) if !matches!(schema.elem(), Elem::None) => {
                Some(lookup_schema_path(&SchemaPath::new().element(), schema)?)
            },
            _ => None,
        };
        let info = self
            .info
            .as_ref()
            .map(|info| info.elem.as_deref().unwrap_or(info).clone());
        Ok(PropContext {
            path: self.path.element(),
            schema,
            info,
        })
    }

    fn object(&self) -> Result<MapContext> {
        if let Some(Elem::Resource(r)) = self.schema.as_ref().map(Schema::elem) {
            let infos = self.info.as_ref().map(|i| i.fields.clone()).unwrap_or_default();
            return Ok(MapContext::new(self.path.clone(), r.schema(), infos));
        }
        Err(BridgeError::schema_path(
            self.path.to_string(),
            "expected an object type schema",
        ))
    }

    fn max_items_one_element<'t>(&self, ty: &'t WireType) -> Option<&'t WireType> {
        let (WireType::List(element) | WireType::Set(element)) = ty else {
            return None;
        };
        let schema = self.schema.as_ref()?;
        info::is_max_items_one(schema, self.info.as_ref()).then_some(element.as_ref())
    }
}

fn derive_failure(what: &str, name: &str, err: BridgeError) -> BridgeError {
    match err {
        BridgeError::Schema(message) => {
            BridgeError::Schema(format!("cannot derive {} for property {:?}: {}", what, name, message))
        },
        other => BridgeError::Schema(format!("cannot derive {} for property {:?}: {}", what, name, other)),
    }
}

fn build_property_encoders(
    ctx: &MapContext,
    attrs: &BTreeMap<String, WireType>,
    options: &ConvertOptions,
) -> Result<BTreeMap<String, (String, Box<dyn Encoder>)>> {
    let mut encoders = BTreeMap::new();
    for (name, ty) in attrs {
        let enc = ctx
            .get_attr(name)
            .and_then(|pctx| derive_encoder(&pctx, ty, options))
            .map_err(|e| derive_failure("an encoder", name, e))?;
        encoders.insert(name.clone(), (ctx.property_key(name), enc));
    }
    Ok(encoders)
}

fn build_property_decoders(
    ctx: &MapContext,
    attrs: &BTreeMap<String, WireType>,
    options: &ConvertOptions,
) -> Result<BTreeMap<String, (String, Box<dyn Decoder>)>> {
    let mut decoders = BTreeMap::new();
    for (name, ty) in attrs {
        let pctx = ctx.get_attr(name).map_err(|e| derive_failure("a decoder", name, e))?;
        let mut dec = derive_decoder(&pctx, ty, options).map_err(|e| derive_failure("a decoder", name, e))?;
        if pctx.secret() {
            dec = Box::new(SecretDecoder::new(dec));
        }
        decoders.insert(name.clone(), (ctx.property_key(name), dec));
    }
    Ok(decoders)
}

fn derive_encoder(pctx: &PropContext, ty: &WireType, options: &ConvertOptions) -> Result<Box<dyn Encoder>> {
    if let Some(element_ty) = pctx.max_items_one_element(ty) {
        let element = derive_encoder(&pctx.element()?, element_ty, options)?;
        return Ok(Box::new(FlattenedEncoder::new(ty.clone(), element)));
    }
    let enc: Box<dyn Encoder> = match ty {
        WireType::Bool => Box::new(BoolEncoder),
        WireType::Number => Box::new(NumberEncoder),
        WireType::String => Box::new(StringEncoder),
        WireType::Dynamic => Box::new(DynamicEncoder),
        WireType::Object(attrs) => {
            let ctx = pctx.object()?;
            let properties = build_property_encoders(&ctx, attrs, options)?;
            Box::new(ObjectEncoder::new(attrs.clone(), properties)?)
        },
        WireType::List(element) | WireType::Set(element) => {
            let element = derive_encoder(&pctx.element()?, element, options)?;
            let enc = if matches!(ty, WireType::Set(_)) {
                ListEncoder::set(element)
            } else {
                ListEncoder::list(element)
            };
            if options.unknown_collections {
                Box::new(enc)
            } else {
                Box::new(enc.without_unknown_collections())
            }
        },
        WireType::Map(element) => Box::new(MapEncoder::new(derive_encoder(&pctx.element()?, element, options)?)),
        WireType::Tuple(elements) => {
            let encoders = elements
                .iter()
                .map(|element| derive_encoder(&PropContext::untyped(pctx.path.element()), element, options))
                .collect::<Result<Vec<_>>>()?;
            Box::new(TupleEncoder::new(encoders))
        },
    };
    Ok(enc)
}

fn derive_decoder(pctx: &PropContext, ty: &WireType, options: &ConvertOptions) -> Result<Box<dyn Decoder>> {
    if let Some(element_ty) = pctx.max_items_one_element(ty) {
        let element = derive_decoder(&pctx.element()?, element_ty, options)?;
        return Ok(Box::new(FlattenedDecoder::new(element)));
    }
    let dec: Box<dyn Decoder> = match ty {
        WireType::Bool => Box::new(BoolDecoder),
        WireType::Number => Box::new(NumberDecoder),
        WireType::String => Box::new(StringDecoder),
        WireType::Dynamic => Box::new(DynamicDecoder),
        WireType::Object(attrs) => {
            let ctx = pctx.object()?;
            Box::new(ObjectDecoder::new(build_property_decoders(&ctx, attrs, options)?))
        },
        WireType::List(element) | WireType::Set(element) => {
            let dec = ListDecoder::new(derive_decoder(&pctx.element()?, element, options)?);
            if options.unknown_collections {
                Box::new(dec)
            } else {
                Box::new(dec.without_unknown_collections())
            }
        },
        WireType::Map(element) => Box::new(MapDecoder::new(derive_decoder(&pctx.element()?, element, options)?)),
        WireType::Tuple(elements) => {
            let decoders = elements
                .iter()
                .map(|element| derive_decoder(&PropContext::untyped(pctx.path.element()), element, options))
                .collect::<Result<Vec<_>>>()?;
            Box::new(TupleDecoder::new(decoders))
        },
    };
    Ok(dec)
}
