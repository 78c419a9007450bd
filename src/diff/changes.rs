//! Structural patching of typed wire values.

use crate::error::{BridgeError, Result};
use crate::wire::{WireData, WireState, WireType, WireValue};
use std::collections::BTreeMap;

/// Apply the leaves of `changes` that differ from `old` onto `old`.
///
/// Both values must have the same type. Lists and tuples of equal length and
/// objects are patched element by element; maps are patched key by key, with
/// keys missing from `changes` dropped. Anything else that differs is taken
/// from `changes` whole.
pub fn apply_changes(old: &WireValue, changes: &WireValue) -> Result<WireValue> {
    if old.ty() != changes.ty() {
        return Err(BridgeError::Diff(format!(
            "cannot apply changes of type {} to a value of type {}",
            changes.ty(),
            old.ty()
        )));
    }
    if old == changes {
        return Ok(old.clone());
    }

    match (old.ty(), old.state(), changes.state()) {
        (
            WireType::List(_) | WireType::Tuple(_),
            WireState::Known(WireData::List(a)),
            WireState::Known(WireData::List(b)),
        ) if a.len() == b.len() => {
            let items = a
                .iter()
                .zip(b)
                .map(|(o, c)| apply_changes(o, c))
                .collect::<Result<Vec<_>>>()?;
            Ok(WireValue::known(old.ty().clone(), WireData::List(items)))
        },
        (
            WireType::Object(_) | WireType::Map(_),
            WireState::Known(WireData::Map(a)),
            WireState::Known(WireData::Map(b)),
        ) => {
            let mut entries = BTreeMap::new();
            for (key, change) in b {
                let value = match a.get(key) {
                    Some(prior) => apply_changes(prior, change)?,
                    None => change.clone(),
                };
                entries.insert(key.clone(), value);
            }
            Ok(WireValue::known(old.ty().clone(), WireData::Map(entries)))
        },
        _ => Ok(changes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(port: f64, cidr: &str) -> WireValue {
        WireValue::object(BTreeMap::from([
            ("port".to_string(), WireValue::number(port)),
            ("cidr".to_string(), WireValue::string(cidr)),
        ]))
    }

    #[test]
    fn test_only_differing_leaves_change() {
        let old = WireValue::object(BTreeMap::from([
            ("name".to_string(), WireValue::string("web")),
            ("rule".to_string(), rule(80.0, "10.0.0.0/8")),
        ]));
        let changes = WireValue::object(BTreeMap::from([
            ("name".to_string(), WireValue::string("web")),
            ("rule".to_string(), rule(443.0, "10.0.0.0/8")),
        ]));
        let result = apply_changes(&old, &changes).unwrap();
        assert_eq!(result, changes);
        let rule = &result.as_map().unwrap()["rule"];
        assert_eq!(rule.as_map().unwrap()["port"].as_number(), Some(443.0));
    }

    #[test]
    fn test_unknown_change_replaces_leaf() {
        let old = WireValue::list(WireType::String, vec![WireValue::string("a")]);
        let changes = WireValue::list(WireType::String, vec![WireValue::unknown(WireType::String)]);
        let result = apply_changes(&old, &changes).unwrap();
        assert!(result.as_list().unwrap()[0].is_unknown());
    }

    #[test]
    fn test_list_length_change_takes_changes() {
        let old = WireValue::list(WireType::Number, vec![WireValue::number(1.0)]);
        let changes = WireValue::list(
            WireType::Number,
            vec![WireValue::number(1.0), WireValue::number(2.0)],
        );
        assert_eq!(apply_changes(&old, &changes).unwrap(), changes);
    }

    #[test]
    fn test_map_keys_follow_changes() {
        let old = WireValue::map(
            WireType::String,
            BTreeMap::from([
                ("a".to_string(), WireValue::string("1")),
                ("b".to_string(), WireValue::string("2")),
            ]),
        );
        let changes = WireValue::map(
            WireType::String,
            BTreeMap::from([("a".to_string(), WireValue::string("1"))]),
        );
        let result = apply_changes(&old, &changes).unwrap();
        assert_eq!(result.as_map().unwrap().len(), 1);
    }

    #[test]
    fn test_type_mismatch_errors() {
        let err = apply_changes(&WireValue::string("a"), &WireValue::number(1.0)).unwrap_err();
        assert!(matches!(err, BridgeError::Diff(_)));
    }
}
