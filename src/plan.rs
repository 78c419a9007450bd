//! Proposed new state.
//!
//! Terraform core hands providers a proposed new state when planning: the
//! configuration merged with the computed parts of the prior state. The
//! bridge stands in for Terraform core, so it computes the same merge here.
//!
//! - Non-computed attributes always take the configuration value, nulls
//!   included, so retracted attributes plan as deletions.
//! - Computed attributes left null in the configuration keep their prior
//!   value.
//! - Nested blocks and nested attributes are correlated element by element:
//!   lists by index, maps by key and sets by comparing elements with their
//!   computed attributes blanked out.

use crate::schema::{Attribute, Block, BlockNestingMode, NestedAttributes, NestedBlock};
use crate::wire::{WireData, WireType, WireValue};
use std::collections::BTreeMap;
use tracing::debug;

/// Compute the proposed new state of a resource of `schema`.
///
/// `prior` and `config` must both be values of the block's implied type.
/// When both are null the result is null.
pub fn proposed_new(schema: &Block, prior: &WireValue, config: &WireValue) -> WireValue {
    if config.is_null() && prior.is_null() {
        return prior.clone();
    }
    if prior.is_null() {
        return propose_block(schema, &empty_value(schema), config);
    }
    propose_block(schema, prior, config)
}

/// A value of the block with every attribute null and every nested block
/// absent.
fn empty_value(schema: &Block) -> WireValue {
    let mut attrs = BTreeMap::new();
    for (name, nested) in &schema.blocks {
        let empty = match nested.nesting_mode {
            BlockNestingMode::Single => WireValue::null(nested.wire_type()),
            BlockNestingMode::Map => WireValue::known(nested.wire_type(), WireData::Map(BTreeMap::new())),
            BlockNestingMode::List | BlockNestingMode::Set => {
                WireValue::known(nested.wire_type(), WireData::List(Vec::new()))
            },
        };
        attrs.insert(name.clone(), empty);
    }
    WireValue::object_of(&schema.implied_attributes(), attrs)
}

fn propose_block(schema: &Block, prior: &WireValue, config: &WireValue) -> WireValue {
    if config.is_null() || config.is_unknown() {
        // Validation rejects these configs; keep the prior value until it does.
        debug!(config_null = config.is_null(), "Keeping prior block value");
        return prior.clone();
    }
    let mut attrs = propose_attributes(&schema.attributes, prior, config);
    for (name, nested) in &schema.blocks {
        let ty = nested.wire_type();
        let prior_v = get_attr(prior, name, &ty);
        let config_v = get_attr(config, name, &ty);
        attrs.insert(name.clone(), propose_nested_block(nested, &prior_v, &config_v));
    }
    WireValue::known(config.ty().clone(), WireData::Map(attrs))
}

fn propose_nested_block(nested: &NestedBlock, prior: &WireValue, config: &WireValue) -> WireValue {
    if config.is_unknown() {
        // Only a dynamic block with an unknown `for_each` gets here.
        debug!("Nested block configuration is unknown");
        return config.clone();
    }
    let block = &nested.block;
    if nested.nesting_mode == BlockNestingMode::Single {
        if config.is_null() {
            return config.clone();
        }
        return proposed_new(block, prior, config);
    }

    let element_type = block.implied_type();
    let merged = merge_elements(
        nested.nesting_mode,
        prior,
        config,
        &|element| block_compare_value(block, element),
        &|prior_element, config_element| match prior_element {
            Some(prior_element) => proposed_new(block, prior_element, config_element),
            None if nested.nesting_mode == BlockNestingMode::Set => {
                proposed_new(block, &WireValue::null(element_type.clone()), config_element)
            },
            None => config_element.clone(),
        },
    );
    match merged {
        Some(data) => WireValue::known(config.ty().clone(), data),
        None if nested.nesting_mode == BlockNestingMode::Map => {
            WireValue::known(nested.wire_type(), WireData::Map(BTreeMap::new()))
        },
        None => WireValue::known(nested.wire_type(), WireData::List(Vec::new())),
    }
}

fn propose_attributes(
    attributes: &BTreeMap<String, Attribute>,
    prior: &WireValue,
    config: &WireValue,
) -> BTreeMap<String, WireValue> {
    let mut merged = BTreeMap::new();
    for (name, attr) in attributes {
        let ty = attr.wire_type();
        let prior_v = get_attr(prior, name, &ty);
        let config_v = get_attr(config, name, &ty);
        let value = match &attr.nested {
            _ if attr.flags.computed && config_v.is_null() => prior_v,
            Some(nested) => propose_nested_attributes(nested, &prior_v, &config_v),
            None => config_v,
        };
        merged.insert(name.clone(), value);
    }
    merged
}

fn propose_nested_attributes(nested: &NestedAttributes, prior: &WireValue, config: &WireValue) -> WireValue {
    if config.is_unknown() || config.is_null() {
        return config.clone();
    }
    if nested.nesting_mode == BlockNestingMode::Single {
        let attrs = propose_attributes(&nested.attributes, prior, config);
        return WireValue::known(config.ty().clone(), WireData::Map(attrs));
    }

    let merged = merge_elements(
        nested.nesting_mode,
        prior,
        config,
        &|element| attributes_compare_value(&nested.attributes, element),
        &|prior_element, config_element| match prior_element {
            Some(prior_element) => WireValue::known(
                config_element.ty().clone(),
                WireData::Map(propose_attributes(&nested.attributes, prior_element, config_element)),
            ),
            None => config_element.clone(),
        },
    );
    match merged {
        Some(data) => WireValue::known(config.ty().clone(), data),
        None => config.clone(),
    }
}

type CompareFn<'a> = dyn Fn(&WireValue) -> WireValue + 'a;
type MergeFn<'a> = dyn Fn(Option<&WireValue>, &WireValue) -> WireValue + 'a;

/// Pair every element of a non-empty `config` collection with its prior
/// element and merge the two.
///
/// Returns `None` when the configuration holds no elements.
fn merge_elements(
    mode: BlockNestingMode,
    prior: &WireValue,
    config: &WireValue,
    compare: &CompareFn<'_>,
    merge: &MergeFn<'_>,
) -> Option<WireData> {
    match mode {
        BlockNestingMode::Single => None,
        BlockNestingMode::List => {
            let items = config.as_list().filter(|items| !items.is_empty())?;
            let prior_items = prior.as_list().unwrap_or_default();
            let merged = items
                .iter()
                .enumerate()
                .map(|(i, config_element)| match prior_items.get(i) {
                    Some(prior_element) => merge(Some(prior_element), config_element),
                    None if prior.is_unknown() => {
                        merge(Some(&WireValue::unknown(config_element.ty().clone())), config_element)
                    },
                    None => merge(None, config_element),
                })
                .collect();
            Some(WireData::List(merged))
        },
        BlockNestingMode::Map => {
            let entries = config.as_map().filter(|entries| !entries.is_empty())?;
            let prior_entries = prior.as_map();
            let merged = entries
                .iter()
                .map(|(key, config_element)| {
                    let value = match prior_entries.and_then(|p| p.get(key)) {
                        Some(prior_element) => merge(Some(prior_element), config_element),
                        None if prior.is_unknown() => {
                            merge(Some(&WireValue::unknown(config_element.ty().clone())), config_element)
                        },
                        None => merge(None, config_element),
                    };
                    (key.clone(), value)
                })
                .collect();
            Some(WireData::Map(merged))
        },
        BlockNestingMode::Set => {
            let items = config.as_list().filter(|items| !items.is_empty())?;
            let candidates: Vec<(&WireValue, WireValue)> = prior
                .as_list()
                .unwrap_or_default()
                .iter()
                .map(|element| (element, compare(element)))
                .collect();
            let mut used = vec![false; candidates.len()];
            let merged = items
                .iter()
                .map(|config_element| {
                    let found = candidates
                        .iter()
                        .enumerate()
                        .find(|(i, (_, cmp))| !used[*i] && cmp == config_element);
                    match found {
                        Some((i, (prior_element, _))) => {
                            used[i] = true;
                            merge(Some(*prior_element), config_element)
                        },
                        None => merge(None, config_element),
                    }
                })
                .collect();
            Some(WireData::List(merged))
        },
    }
}

/// A set element of a block with its computed attributes blanked out.
fn block_compare_value(block: &Block, element: &WireValue) -> WireValue {
    let Some(entries) = element.as_map() else {
        return element.clone();
    };
    let mut attrs = blank_computed(&block.attributes, entries);
    for (name, nested) in &block.blocks {
        let ty = nested.wire_type();
        let value = get_attr(element, name, &ty);
        let compared = match (nested.nesting_mode, value.data()) {
            (BlockNestingMode::Single, Some(_)) => block_compare_value(&nested.block, &value),
            (_, Some(WireData::List(items))) => WireValue::known(
                ty,
                WireData::List(items.iter().map(|v| block_compare_value(&nested.block, v)).collect()),
            ),
            (_, Some(WireData::Map(items))) => WireValue::known(
                ty,
                WireData::Map(
                    items
                        .iter()
                        .map(|(k, v)| (k.clone(), block_compare_value(&nested.block, v)))
                        .collect(),
                ),
            ),
            _ => value,
        };
        attrs.insert(name.clone(), compared);
    }
    WireValue::known(element.ty().clone(), WireData::Map(attrs))
}

/// A set element of nested attributes with its computed attributes blanked
/// out.
fn attributes_compare_value(attributes: &BTreeMap<String, Attribute>, element: &WireValue) -> WireValue {
    match element.as_map() {
        Some(entries) => WireValue::known(element.ty().clone(), WireData::Map(blank_computed(attributes, entries))),
        None => element.clone(),
    }
}

fn blank_computed(
    attributes: &BTreeMap<String, Attribute>,
    entries: &BTreeMap<String, WireValue>,
) -> BTreeMap<String, WireValue> {
    let mut blanked = entries.clone();
    for (name, attr) in attributes {
        if attr.flags.computed {
            blanked.insert(name.clone(), WireValue::null(attr.wire_type()));
        }
    }
    blanked
}

/// The attribute `name` of an object value. Nulls yield nulls and unknowns
/// yield unknowns, both of type `ty`.
fn get_attr(value: &WireValue, name: &str, ty: &WireType) -> WireValue {
    if value.is_unknown() {
        return WireValue::unknown(ty.clone());
    }
    value
        .as_map()
        .and_then(|attrs| attrs.get(name))
        .cloned()
        .unwrap_or_else(|| WireValue::null(ty.clone()))
}
