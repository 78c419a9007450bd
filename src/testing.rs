//! Testing utilities for bridge consumers.
//!
//! [`ConversionTester`] drives the resource codecs of a provider without a
//! running plugin: property maps go in, typed wire values come out, and the
//! round trip back is checked for loss. The fixture builders describe a small
//! storage provider that covers the shapes conversion cares about.
//!
//! # Example
//!
//! ```
//! use hemmer_tf_bridge::testing::{example_provider, ConversionTester, EXAMPLE_BUCKET};
//! use hemmer_tf_bridge::value::map_from_json;
//! use serde_json::json;
//!
//! let tester = ConversionTester::new(example_provider(), EXAMPLE_BUCKET);
//! tester.assert_round_trip(&map_from_json(&json!({
//!     "bucketName": "logs",
//!     "versioning": {"enabled": true}
//! })));
//! ```

use crate::convert::{decode_property_map, encode_property_map, ConvertOptions, Encoding};
use crate::error::Result;
use crate::info::ResourceInfo;
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, Diagnostic, DiagnosticSeverity, NestedBlock, Schema,
};
use crate::sdk::{SdkProvider, SdkResource, SdkSchema};
use crate::shim::sdkv2::V2Provider;
use crate::shim::Provider;
use crate::value::PropertyMap;
use crate::wire::WireValue;

/// Terraform token of the fixture bucket resource.
pub const EXAMPLE_BUCKET: &str = "example_bucket";

/// Terraform token of the fixture bucket data source.
pub const EXAMPLE_BUCKET_DATA: &str = "example_bucket_info";

// =========================================================================
// Fixtures
// =========================================================================

/// The fixture bucket resource.
///
/// It has a required string, a computed string, a sensitive string, a map,
/// a list of numbers, a `MaxItems = 1` block and a repeated block.
pub fn example_bucket() -> SdkResource {
    let versioning = SdkResource::new().with_field("enabled", SdkSchema::bool().optional());
    let lifecycle_rule = SdkResource::new()
        .with_field("prefix", SdkSchema::string().optional())
        .with_field("expiration_days", SdkSchema::int().required());

    SdkResource::new()
        .with_field("bucket_name", SdkSchema::string().required().force_new())
        .with_field("arn", SdkSchema::string().computed())
        .with_field("access_key", SdkSchema::string().optional().sensitive())
        .with_field("tags", SdkSchema::map_of(SdkSchema::string()).optional())
        .with_field("allowed_ports", SdkSchema::list_of(SdkSchema::int()).optional())
        .with_field(
            "versioning",
            SdkSchema::list_block(versioning).optional().with_max_items(1),
        )
        .with_field("lifecycle_rule", SdkSchema::list_block(lifecycle_rule).optional())
        .importable()
}

/// The fixture provider: a `region` setting, the bucket resource and a
/// bucket data source.
pub fn example_sdk_provider() -> SdkProvider {
    let info = SdkResource::new()
        .with_field("bucket_name", SdkSchema::string().required())
        .with_field("arn", SdkSchema::string().computed());

    SdkProvider::new()
        .with_config_field("region", SdkSchema::string().optional())
        .with_resource(EXAMPLE_BUCKET, example_bucket())
        .with_data_source(EXAMPLE_BUCKET_DATA, info)
}

/// The fixture provider behind the SDK v2 adapter.
pub fn example_provider() -> Provider {
    Provider::V2(V2Provider::new(example_sdk_provider()))
}

/// The framework schema of the fixture bucket.
pub fn example_framework_schema() -> Schema {
    let rule = Block::new()
        .with_attribute("prefix", Attribute::optional_string())
        .with_attribute(
            "expiration_days",
            Attribute::new(AttributeType::Int64, AttributeFlags::required()),
        );

    Schema::v0()
        .with_attribute("bucket_name", Attribute::required_string())
        .with_attribute("arn", Attribute::computed_string())
        .with_attribute("access_key", Attribute::optional_string().sensitive())
        .with_block("lifecycle_rule", NestedBlock::list(rule).with_max_items(10))
}

// =========================================================================
// Conversion harness
// =========================================================================

/// A test harness for the codecs of one resource.
///
/// Encoders and decoders are rebuilt on every call so overlays added with
/// [`ConversionTester::with_resource_info`] always apply.
#[derive(Debug, Clone)]
pub struct ConversionTester {
    encoding: Encoding,
    token: String,
}

impl ConversionTester {
    /// Create a tester for resource `token` of `provider`.
    pub fn new(provider: Provider, token: impl Into<String>) -> Self {
        Self {
            encoding: Encoding::new(provider),
            token: token.into(),
        }
    }

    /// Apply a resource overlay.
    pub fn with_resource_info(mut self, info: ResourceInfo) -> Self {
        self.encoding = self.encoding.with_resource_info(self.token.clone(), info);
        self
    }

    /// Override the conversion options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.encoding = self.encoding.with_options(options);
        self
    }

    /// The resource token under test.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Encode `inputs` into the resource's object type.
    pub fn encode(&self, inputs: &PropertyMap) -> Result<WireValue> {
        let encoder = self.encoding.new_resource_encoder(&self.token)?;
        encode_property_map(&encoder, inputs)
    }

    /// Decode a resource object back into properties.
    pub fn decode(&self, value: &WireValue) -> Result<PropertyMap> {
        let decoder = self.encoding.new_resource_decoder(&self.token)?;
        decode_property_map(&decoder, value)
    }

    /// Encode then decode `inputs`.
    pub fn round_trip(&self, inputs: &PropertyMap) -> Result<PropertyMap> {
        self.decode(&self.encode(inputs)?)
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Assert that `inputs` survive a round trip unchanged.
    ///
    /// # Panics
    ///
    /// Panics if either direction fails or the decoded map differs.
    pub fn assert_round_trip(&self, inputs: &PropertyMap) {
        match self.round_trip(inputs) {
            Ok(decoded) => assert_eq!(&decoded, inputs, "round trip of {} changed the inputs", self.token),
            Err(e) => panic!("round trip of {} failed: {}", self.token, e),
        }
    }

    /// Assert that `inputs` encode to `expected`.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails or produces a different value.
    pub fn assert_encodes_to(&self, inputs: &PropertyMap, expected: &WireValue) {
        match self.encode(inputs) {
            Ok(actual) => assert_eq!(&actual, expected, "unexpected encoding for {}", self.token),
            Err(e) => panic!("encoding {} failed: {}", self.token, e),
        }
    }

    /// Assert that encoding `inputs` fails with a message containing
    /// `substring`.
    ///
    /// # Panics
    ///
    /// Panics if encoding succeeds or the error does not match.
    pub fn assert_encode_error_contains(&self, inputs: &PropertyMap, substring: &str) {
        match self.encode(inputs) {
            Ok(value) => panic!("expected encoding of {} to fail, got {:?}", self.token, value),
            Err(e) => assert!(
                e.to_string().contains(substring),
                "expected an error containing '{}', got '{}'",
                substring,
                e
            ),
        }
    }
}

// =========================================================================
// Diagnostic assertions
// =========================================================================

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if any diagnostic has error severity.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = errors(diagnostics).collect();
    assert!(errors.is_empty(), "Expected no errors, but got: {:?}", errors);
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if no diagnostic has error severity.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        errors(diagnostics).next().is_some(),
        "Expected at least one error, but got none"
    );
}

/// Assert that diagnostics contain an error whose summary or detail
/// contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let matched = errors(diagnostics).any(|d| {
        d.summary.contains(substring) || d.detail.as_deref().is_some_and(|detail| detail.contains(substring))
    });
    assert!(
        matched,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        errors(diagnostics).map(|d| &d.summary).collect::<Vec<_>>()
    );
}

fn errors(diagnostics: &[Diagnostic]) -> impl Iterator<Item = &Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
}
