//! Containment checks: does an expected value appear within an actual value?

use serde_json::Value;

use crate::json::{is_container, values_equal};

/// Whether `expected` is contained in `actual`.
///
/// - `partial = true`: objects may carry extra keys; every expected array
///   element must subset-match some actual element (order irrelevant).
/// - `partial = false`: identical key sets; arrays equal length and matched
///   position by position.
///
/// Mixed types never match. Scalars of the same type compare by equality.
#[must_use]
pub fn is_subset(expected: &Value, actual: &Value, partial: bool) -> bool {
    match (expected, actual) {
        (Value::Null, Value::Null) => true,
        (Value::Object(e), Value::Object(a)) => {
            if !partial && e.len() != a.len() {
                return false;
            }
            e.iter().all(|(key, ev)| {
                a.get(key)
                    .is_some_and(|av| is_subset(ev, av, partial))
            })
        }
        (Value::Array(e), Value::Array(a)) => {
            if partial {
                e.iter()
                    .all(|ev| a.iter().any(|av| is_subset(ev, av, true)))
            } else {
                e.len() == a.len() && e.iter().zip(a).all(|(ev, av)| is_subset(ev, av, false))
            }
        }
        (Value::Bool(_), Value::Bool(_))
        | (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_)) => values_equal(expected, actual),
        _ => false,
    }
}

/// Whether `needle` occurs anywhere inside `container`, at any depth.
#[must_use]
pub fn contains_value(container: &Value, needle: &Value) -> bool {
    if values_equal(container, needle) {
        return true;
    }
    match container {
        Value::Object(map) => map.values().any(|v| contains_value(v, needle)),
        Value::Array(items) => items.iter().any(|v| contains_value(v, needle)),
        _ => false,
    }
}

/// Whether every pattern element occurs somewhere inside `container`.
///
/// Used for flat arrays of primitives that may sit at any depth of a response.
#[must_use]
pub fn deep_array_search(container: &Value, pattern_elements: &[Value]) -> bool {
    pattern_elements
        .iter()
        .all(|element| contains_value(container, element))
}

/// Whether every element of an array is a scalar.
#[must_use]
pub fn all_primitive(items: &[Value]) -> bool {
    items.iter().all(|v| !is_container(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nulls() {
        assert!(is_subset(&Value::Null, &Value::Null, true));
        assert!(!is_subset(&Value::Null, &json!(1), true));
        assert!(!is_subset(&json!({}), &Value::Null, true));
    }

    #[test]
    fn partial_object_ignores_extra_keys() {
        let e = json!({"a": 1});
        let a = json!({"a": 1, "b": 2});
        assert!(is_subset(&e, &a, true));
        assert!(!is_subset(&e, &a, false));
    }

    #[test]
    fn strict_object_requires_same_keys() {
        let e = json!({"a": 1, "b": {"c": [1, 2]}});
        assert!(is_subset(&e, &e.clone(), false));
        assert!(!is_subset(&e, &json!({"a": 1, "b": {"c": [2, 1]}}), false));
    }

    #[test]
    fn missing_key_fails() {
        assert!(!is_subset(&json!({"a": 1, "z": 0}), &json!({"a": 1}), true));
    }

    #[test]
    fn nested_partial() {
        let e = json!({"user": {"name": "n"}});
        let a = json!({"user": {"name": "n", "age": 3}, "meta": {}});
        assert!(is_subset(&e, &a, true));
    }

    #[test]
    fn partial_array_is_order_free_and_many_to_one() {
        assert!(is_subset(&json!([3, 1]), &json!([1, 2, 3]), true));
        assert!(is_subset(&json!([1, 1, 1]), &json!([1]), true));
        assert!(!is_subset(&json!([4]), &json!([1, 2, 3]), true));
    }

    #[test]
    fn partial_array_of_objects() {
        let e = json!([{"id": 2}]);
        let a = json!([{"id": 1, "n": "a"}, {"id": 2, "n": "b"}]);
        assert!(is_subset(&e, &a, true));
    }

    #[test]
    fn strict_array_is_positional() {
        assert!(is_subset(&json!([1, 2]), &json!([1, 2]), false));
        assert!(!is_subset(&json!([1, 2]), &json!([2, 1]), false));
        assert!(!is_subset(&json!([1]), &json!([1, 2]), false));
    }

    #[test]
    fn mixed_types_never_match() {
        assert!(!is_subset(&json!({}), &json!([]), true));
        assert!(!is_subset(&json!([1]), &json!(1), true));
        assert!(!is_subset(&json!(1), &json!("1"), true));
        assert!(!is_subset(&json!(true), &json!(1), true));
    }

    #[test]
    fn scalars_compare_by_equality() {
        assert!(is_subset(&json!("x"), &json!("x"), false));
        assert!(is_subset(&json!(2), &json!(2.0), true));
        assert!(!is_subset(&json!("x"), &json!("xy"), true));
    }

    #[test]
    fn deep_array_search_finds_nested_values() {
        let body = json!({"data": {"rows": [{"imsi": "001"}, {"imsi": "002"}]}, "count": 2});
        assert!(deep_array_search(&body, &[json!("001"), json!("002")]));
        assert!(deep_array_search(&body, &[json!(2)]));
        assert!(!deep_array_search(&body, &[json!("001"), json!("003")]));
    }

    #[test]
    fn deep_array_search_empty_pattern_is_vacuous() {
        assert!(deep_array_search(&json!({}), &[]));
    }

    #[test]
    fn all_primitive_detects_containers() {
        assert!(all_primitive(&[json!(1), json!("a"), Value::Null]));
        assert!(!all_primitive(&[json!(1), json!({})]));
    }
}
