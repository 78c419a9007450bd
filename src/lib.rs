//! Hemmer Terraform Bridge
//!
//! This crate adapts Terraform providers to Hemmer. It does not talk to a
//! provider process; it is the schema-driven core a plugin host builds on:
//! converting Hemmer property values into the values a Terraform provider
//! understands and back, diffing legacy SDK state, and rewriting package
//! schemas so recursive types become finite.
//!
//! # Overview
//!
//! - **Schema abstraction** ([`shim`], [`sdk`], [`schema`]): one view over
//!   the SDK v1, SDK v2 and Plugin Framework schema models
//! - **Overlays** ([`info`]): property renames, secrets and `MaxItems = 1`
//!   overrides layered on top of a provider schema
//! - **Schema paths** ([`walk`]): addressing and visiting nested attributes
//! - **Value conversion** ([`convert`]): encoders and decoders derived from
//!   a resource's wire type and schema
//! - **Flatmap** ([`flatmap`]): the legacy `a.0.b` attribute encoding
//! - **Diff engine** ([`diff`]): field readers, set hashing and instance
//!   diffs for the legacy SDK
//! - **Recursive-type unroller** ([`unrec`], [`package`]): collapses
//!   unrolled recursive object types in a package document
//! - **Planning** ([`plan`]): the proposed new state of a framework resource
//! - **Type checking** ([`validation`]) and check normalization ([`check`])
//! - **Logging** ([`logging`]): `tracing` subscribers for embedding hosts
//!
//! # Quick Start
//!
//! ```
//! use hemmer_tf_bridge::testing::{example_provider, EXAMPLE_BUCKET};
//! use hemmer_tf_bridge::convert::{decode_property_map, encode_property_map, Encoding};
//! use hemmer_tf_bridge::value::map_from_json;
//! use serde_json::json;
//!
//! let encoding = Encoding::new(example_provider());
//! let encoder = encoding.new_resource_encoder(EXAMPLE_BUCKET).unwrap();
//! let decoder = encoding.new_resource_decoder(EXAMPLE_BUCKET).unwrap();
//!
//! let inputs = map_from_json(&json!({"bucketName": "logs", "tags": {"team": "storage"}}));
//! let wire = encode_property_map(&encoder, &inputs).unwrap();
//! assert_eq!(decode_property_map(&decoder, &wire).unwrap(), inputs);
//! ```
//!
//! # Schema Paths
//!
//! Schema paths encode as `.` separated attribute names with `$` standing
//! for a collection element:
//!
//! ```
//! use hemmer_tf_bridge::walk::{decode_schema_path, encode_schema_path, SchemaPath};
//!
//! let path = SchemaPath::new().get_attr("rule").element().get_attr("port");
//! assert_eq!(encode_schema_path(&path).unwrap(), "rule.$.port");
//! assert_eq!(decode_schema_path("rule.$.port"), path);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod convert;
pub mod diff;
pub mod error;
pub mod flatmap;
pub mod info;
pub mod logging;
pub mod package;
pub mod plan;
pub mod property_path;
pub mod schema;
pub mod sdk;
pub mod shim;
pub mod testing;
pub mod types;
pub mod unrec;
pub mod validation;
pub mod value;
pub mod walk;
pub mod wire;

// Re-export main types at crate root
pub use check::normalize_empty_collections;
pub use error::{BridgeError, Result};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use package::PackageSpec;
pub use plan::proposed_new;
pub use schema::ProviderSchema;
pub use shim::Provider;
pub use unrec::{simplify_recursive_types, simplify_recursive_types_with, UnrollOptions};
pub use validation::{is_valid, validate, validate_result, TypeCheckOptions, TypeChecker};
pub use value::{PropertyMap, PropertyValue};
pub use walk::{SchemaPath, SchemaPathStep};
pub use wire::{WireType, WireValue};

// Re-export commonly used dependencies
pub use serde_json;
pub use tracing;
