//! Property-based tests for comparator invariants.
//!
//! Values are generated with integer numbers only so that equality is exact.

use proptest::prelude::*;
use respcheck_core::audit::strict_differences;
use respcheck_core::compare::{deep_compare, structure_and_values};
use respcheck_core::json::{Body, canonical_string};
use respcheck_core::pattern::{MatchStrategy, match_pattern};
use respcheck_core::subset::is_subset;
use serde_json::{Map, Value, json};

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z0-9 _-]{0,16}".prop_map(|s| json!(s)),
    ]
}

fn to_object(map: std::collections::BTreeMap<String, Value>) -> Value {
    Value::Object(map.into_iter().collect::<Map<String, Value>>())
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4).prop_map(to_object),
        ]
    })
}

fn json_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z_]{1,8}", json_value(), 0..5).prop_map(to_object)
}

proptest! {
    #[test]
    fn subset_is_reflexive(v in json_value()) {
        prop_assert!(is_subset(&v, &v, true));
        prop_assert!(is_subset(&v, &v, false));
    }

    #[test]
    fn adding_keys_keeps_partial_subset(
        expected in json_object(),
        extra in prop::collection::btree_map("[A-Z]{1,6}", json_value(), 0..4),
    ) {
        let mut actual = expected.clone();
        if let Value::Object(map) = &mut actual {
            for (k, v) in extra {
                map.entry(k).or_insert(v);
            }
        }
        prop_assert!(is_subset(&expected, &actual, true));
    }

    #[test]
    fn self_comparison_is_a_full_match(v in json_value(), ignore_order in any::<bool>()) {
        let result = structure_and_values(&v, &v, ignore_order);
        prop_assert_eq!(result.match_percentage, 100.0);
        prop_assert!(result.differences.is_empty());

        let deep = deep_compare(&v, &v);
        prop_assert_eq!(deep.match_percentage, 100.0);
        prop_assert_eq!(deep.total_comparisons, deep.successful_matches);

        prop_assert!(strict_differences(&v, &v).is_empty());
    }

    #[test]
    fn array_order_is_ignored_when_requested(
        (items, shuffled) in prop::collection::vec(any::<i32>(), 0..8)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let expected = json!({"items": items});
        let actual = json!({"items": shuffled});
        let result = structure_and_values(&expected, &actual, true);
        prop_assert!(result.differences.is_empty());
    }

    #[test]
    fn extra_array_elements_only_add_extras(
        items in prop::collection::vec(any::<i32>(), 1..6),
        extra in prop::collection::vec(any::<i32>(), 0..4),
    ) {
        let mut longer = extra.clone();
        longer.extend(items.iter().copied());
        let result = structure_and_values(&json!({"items": items}), &json!({"items": longer}), true);
        prop_assert_eq!(result.differences.len(), extra.len());
        prop_assert_eq!(result.without_extras().match_percentage, 100.0);
    }

    #[test]
    fn canonical_form_matches_by_substring_alone(v in json_object()) {
        let body = Body::from_text(v.to_string());
        let report = match_pattern(&canonical_string(&v), &body, None);
        prop_assert!(report.matched);
        prop_assert_eq!(report.attempts.len(), 1);
        prop_assert_eq!(report.attempts[0].strategy, MatchStrategy::Substring);
    }
}

#[test]
fn empty_objects_are_a_vacuous_match() {
    assert_eq!(structure_and_values(&json!({}), &json!({}), true).match_percentage, 100.0);
    assert_eq!(structure_and_values(&json!({}), &json!({}), false).match_percentage, 100.0);
    assert_eq!(deep_compare(&json!({}), &json!({})).match_percentage, 100.0);
}
