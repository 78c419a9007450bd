//! Bridge scenario tests.
//!
//! ## Purpose
//! Walk resource inputs through the same steps a plugin host takes: type
//! check against the package document, encode for the provider, decode the
//! provider's answer, normalize it and plan the next state.
//!
//! ## What is covered
//! - `MaxItems = 1` flattening at the resource level.
//! - Secret marking of sensitive attributes.
//! - Empty collections surviving a check round trip.
//! - Framework resources: conversion and proposed new state.
//! - Type checking ahead of conversion.
// tests/scenarios.rs
// ============================================================================
// Module: Bridge Scenario Tests
// Description: Cross-module flows over the fixture provider.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use hemmer_tf_bridge::info::SchemaInfos;
use hemmer_tf_bridge::package::{PackageSpec, PropertySpec, ResourceSpec, TypeSpec};
use hemmer_tf_bridge::schema::ProviderSchema;
use hemmer_tf_bridge::sdk::{SdkResource, SdkSchema};
use hemmer_tf_bridge::shim::framework::FrameworkProvider;
use hemmer_tf_bridge::shim::sdkv2::V2Resource;
use hemmer_tf_bridge::shim::{Provider, ResourceLike};
use hemmer_tf_bridge::testing::{
    example_bucket, example_framework_schema, example_provider, ConversionTester, EXAMPLE_BUCKET,
};
use hemmer_tf_bridge::value::{map_from_json, PropertyMap, PropertyValue};
use hemmer_tf_bridge::wire::WireValue;
use hemmer_tf_bridge::{normalize_empty_collections, proposed_new, TypeCheckOptions, TypeChecker};
use serde_json::json;

fn bucket_tester() -> ConversionTester {
    ConversionTester::new(example_provider(), EXAMPLE_BUCKET)
}

#[test]
fn max_items_one_block_is_flattened() {
    let tester = bucket_tester();
    let inputs = map_from_json(&json!({"bucketName": "logs", "versioning": {"enabled": false}}));

    let wire = tester.encode(&inputs).unwrap();
    let versioning = wire.as_map().unwrap()["versioning"].as_list().unwrap().to_vec();
    assert_eq!(versioning.len(), 1);
    assert_eq!(versioning[0].as_map().unwrap()["enabled"], WireValue::bool(false));
    assert_eq!(tester.decode(&wire).unwrap(), inputs);
}

#[test]
fn null_flattened_block_is_an_empty_list() {
    let tester = bucket_tester();
    let inputs = PropertyMap::from([
        ("bucketName".to_string(), PropertyValue::string("logs")),
        ("versioning".to_string(), PropertyValue::Null),
    ]);

    let wire = tester.encode(&inputs).unwrap();
    assert_eq!(wire.as_map().unwrap()["versioning"].as_list().unwrap().len(), 0);

    let decoded = tester.decode(&wire).unwrap();
    assert!(!decoded.contains_key("versioning"));
    assert_eq!(decoded["bucketName"], PropertyValue::string("logs"));
}

#[test]
fn sensitive_attributes_decode_as_secrets() {
    let tester = bucket_tester();
    let inputs = map_from_json(&json!({"bucketName": "logs", "accessKey": "hunter2"}));

    let wire = tester.encode(&inputs).unwrap();
    assert_eq!(wire.as_map().unwrap()["access_key"], WireValue::string("hunter2"));

    let decoded = tester.decode(&wire).unwrap();
    assert_eq!(
        decoded["accessKey"],
        PropertyValue::make_secret(PropertyValue::string("hunter2"))
    );
    assert_eq!(decoded["bucketName"], PropertyValue::string("logs"));

    let secret_inputs = PropertyMap::from([
        ("bucketName".to_string(), PropertyValue::string("logs")),
        (
            "accessKey".to_string(),
            PropertyValue::make_secret(PropertyValue::string("hunter2")),
        ),
    ]);
    tester.assert_round_trip(&secret_inputs);
}

#[test]
fn check_keeps_empty_array_after_round_trip() {
    let resource = SdkResource::new()
        .with_field("array_property_values", SdkSchema::list_of(SdkSchema::string()).optional());
    let schema_map = V2Resource::new(resource).schema();

    let news = map_from_json(&json!({"arrayPropertyValues": []}));

    // The provider drops the empty list; its inputs come back empty.
    let inputs = PropertyMap::new();
    let checked = normalize_empty_collections(&news, inputs, &schema_map, &SchemaInfos::new());
    assert_eq!(checked, news);
}

#[test]
fn check_restores_collections_inside_the_fixture_bucket() {
    let schema_map = V2Resource::new(example_bucket()).schema();
    let news = map_from_json(&json!({
        "bucketName": "logs",
        "tags": {},
        "allowedPorts": [],
        "lifecycleRule": [{"expirationDays": 1}]
    }));
    let returned = map_from_json(&json!({
        "bucketName": "logs",
        "lifecycleRule": [{"expirationDays": 1}]
    }));

    let checked = normalize_empty_collections(&news, returned, &schema_map, &SchemaInfos::new());
    assert_eq!(checked, news);
}

fn framework_provider() -> Provider {
    Provider::Framework(FrameworkProvider::new(
        ProviderSchema::new().with_resource(EXAMPLE_BUCKET, example_framework_schema()),
    ))
}

#[test]
fn framework_resource_round_trips() {
    let tester = ConversionTester::new(framework_provider(), EXAMPLE_BUCKET);
    tester.assert_round_trip(&map_from_json(&json!({
        "bucketName": "logs",
        "lifecycleRule": [{"prefix": "tmp/", "expirationDays": 3}]
    })));
}

#[test]
fn framework_plan_keeps_computed_attributes() {
    let tester = ConversionTester::new(framework_provider(), EXAMPLE_BUCKET);
    let schema = example_framework_schema();

    let prior = tester
        .encode(&map_from_json(&json!({"bucketName": "logs", "arn": "arn:bucket:logs"})))
        .unwrap();
    let config = tester
        .encode(&map_from_json(&json!({"bucketName": "archive"})))
        .unwrap();

    let planned = proposed_new(&schema.block, &prior, &config);
    let attrs = planned.as_map().unwrap();
    assert_eq!(attrs["bucket_name"], WireValue::string("archive"));
    assert_eq!(attrs["arn"], WireValue::string("arn:bucket:logs"));
}

#[test]
fn type_checker_runs_before_conversion() {
    let package = PackageSpec::new("example").with_resource(
        "example:storage/bucket:Bucket",
        ResourceSpec::default()
            .with_property("bucketName", PropertySpec::new(TypeSpec::of_kind("string")))
            .with_property(
                "allowedPorts",
                PropertySpec::new(TypeSpec::array_of(TypeSpec::of_kind("integer"))),
            ),
    );
    let checker = TypeChecker::new(&package, TypeCheckOptions::new().with_resource_name("logs-bucket"));

    let good = map_from_json(&json!({"bucketName": "logs", "allowedPorts": [80, "443"]}));
    assert!(checker.validate_inputs("example:storage/bucket:Bucket", &good).is_empty());
    bucket_tester().encode(&good).unwrap();

    let bad = map_from_json(&json!({"bucketName": "logs", "allowedPorts": [80, "http"]}));
    let failures = checker.validate_inputs("example:storage/bucket:Bucket", &bad);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resource_path, "logs-bucket.allowedPorts[1]");
    bucket_tester().assert_encode_error_contains(&bad, "allowedPorts[1]");
}
