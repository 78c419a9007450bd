//! Conversion between property values and typed provider values.
//!
//! Conversions are type-driven: a [`WireValue`] must carry its [`WireType`],
//! so encoders and decoders are derived ahead of time from the wire type of a
//! resource plus its schema and overlays (see [`context`]). Schema metadata
//! decides the finer points the wire type cannot express: property names,
//! `MaxItems = 1` flattening and secrets.
//!
//! ```
//! use hemmer_tf_bridge::convert::{decode_property_map, encode_property_map, ObjectSchema};
//! use hemmer_tf_bridge::convert::{new_object_decoder, new_object_encoder, ConvertOptions};
//! use hemmer_tf_bridge::sdk::{SdkResource, SdkSchema};
//! use hemmer_tf_bridge::shim::sdkv2::V2Resource;
//! use hemmer_tf_bridge::shim::ResourceLike;
//! use hemmer_tf_bridge::value::{PropertyMap, PropertyValue};
//!
//! let resource = V2Resource::new(
//!     SdkResource::new().with_field("bucket_name", SdkSchema::string().required()),
//! );
//! let schema = ObjectSchema::new(resource.schema());
//! let options = ConvertOptions::default();
//!
//! let encoder = new_object_encoder(&schema, &options).unwrap();
//! let decoder = new_object_decoder(&schema, &options).unwrap();
//!
//! let inputs = PropertyMap::from([("bucketName".to_string(), PropertyValue::string("logs"))]);
//! let wire = encode_property_map(&encoder, &inputs).unwrap();
//! assert_eq!(decode_property_map(&decoder, &wire).unwrap(), inputs);
//! ```

pub mod context;
pub mod named;

mod collection;
mod dynamic;
mod flattened;
mod object;
mod scalar;
mod secret;

pub use collection::{ListDecoder, ListEncoder, MapDecoder, MapEncoder, TupleDecoder, TupleEncoder};
pub use context::{
    decode_property_map, encode_property_map, infer_object_type, new_object_decoder, new_object_encoder,
    schema_wire_type, ConvertOptions, Encoding, ObjectSchema,
};
pub use dynamic::{DynamicDecoder, DynamicEncoder};
pub use flattened::{FlattenedDecoder, FlattenedEncoder};
pub use named::{PackageEncoding, RenamedProperties};
pub use object::{ObjectDecoder, ObjectEncoder};
pub use scalar::{BoolDecoder, BoolEncoder, NumberDecoder, NumberEncoder, StringDecoder, StringEncoder};
pub use secret::{SecretDecoder, SecretEncoder};

use crate::error::Result;
use crate::value::{PropertyMap, PropertyValue};
use crate::wire::{WireState, WireType, WireValue};
use std::fmt;

/// Converts property values into wire values of one type.
pub trait Encoder: fmt::Debug {
    /// The wire type every encoded value has.
    fn wire_type(&self) -> WireType;

    /// Encode a value that is known, not null, and has had its secret and
    /// output wrappers removed.
    fn encode_known(&self, value: &PropertyValue) -> Result<WireValue>;

    /// The encoding of `Null`.
    fn encode_null(&self) -> Result<WireValue> {
        Ok(WireValue::null(self.wire_type()))
    }

    /// The encoding of a computed value.
    fn encode_unknown(&self) -> Result<WireValue> {
        Ok(WireValue::unknown(self.wire_type()))
    }

    /// Encode any property value.
    ///
    /// Secrets and known outputs are unwrapped, computed values and unknown
    /// outputs become wire unknowns and `Null` becomes a typed null.
    fn from_property_value(&self, value: &PropertyValue) -> Result<WireValue> {
        match value {
            PropertyValue::Secret(inner) => self.from_property_value(inner),
            PropertyValue::Output(output) if output.known => self.from_property_value(&output.element),
            PropertyValue::Output(_) | PropertyValue::Computed(_) => self.encode_unknown(),
            PropertyValue::Null => self.encode_null(),
            known => self.encode_known(known),
        }
    }
}

/// Converts wire values back into property values.
pub trait Decoder: fmt::Debug {
    /// Decode a known, non-null wire value.
    fn decode_known(&self, value: &WireValue) -> Result<PropertyValue>;

    /// The property value an unknown of type `ty` decodes to.
    fn unknown_value(&self, ty: &WireType) -> PropertyValue {
        PropertyValue::make_computed(zero_value(ty))
    }

    /// Decode any wire value.
    ///
    /// Unknowns decode to a computed value shaped like the type and nulls
    /// decode to `Null`.
    fn to_property_value(&self, value: &WireValue) -> Result<PropertyValue> {
        match value.state() {
            WireState::Unknown => Ok(self.unknown_value(value.ty())),
            WireState::Null => Ok(PropertyValue::Null),
            WireState::Known(_) => self.decode_known(value),
        }
    }
}

/// The zero-shaped property value of a wire type.
pub fn zero_value(ty: &WireType) -> PropertyValue {
    match ty {
        WireType::Bool => PropertyValue::Bool(false),
        WireType::Number => PropertyValue::Number(0.0),
        WireType::String | WireType::Dynamic => PropertyValue::String(String::new()),
        WireType::List(_) | WireType::Set(_) | WireType::Tuple(_) => PropertyValue::Array(Vec::new()),
        WireType::Map(_) | WireType::Object(_) => PropertyValue::Object(PropertyMap::new()),
    }
}

/// A short description of a wire value for error messages.
pub(crate) fn describe(value: &WireValue) -> String {
    match value.state() {
        WireState::Known(_) => value.ty().to_string(),
        WireState::Unknown => format!("unknown {}", value.ty()),
        WireState::Null => format!("null {}", value.ty()),
    }
}
