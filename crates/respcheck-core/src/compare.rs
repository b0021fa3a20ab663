//! Structural comparison between expected and actual JSON
//!
//! Four granularities, from a cheap shape check to a fully itemized walk:
//!
//! - [`structure_only`]: path/type tokens, values ignored
//! - [`values_only`]: approximate similarity of the serialized forms
//! - [`structure_and_values`]: flattened `path -> value` maps, unioned
//! - [`deep_compare`]: lock-step recursive walk with type checks
//!
//! Percentages are rounded to two decimals. When there is nothing to compare
//! the result is 100% (vacuous match).

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::{self, canonical_string, join_index, join_key, type_name, values_equal};
use crate::verdict::{Difference, DifferenceKind};

/// Result of [`structure_only`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructureReport {
    pub match_percentage: f64,
    pub total_keys: usize,
    pub matching_keys: usize,
    /// Structure tokens present in expected but not in actual
    pub missing_in_actual: Vec<String>,
    /// Structure tokens present in actual but not in expected
    pub missing_in_expected: Vec<String>,
}

/// Result of [`values_only`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValueReport {
    pub match_percentage: f64,
    pub values_match: bool,
}

/// Result of [`structure_and_values`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchResult {
    pub match_percentage: f64,
    pub total_fields: usize,
    pub matching_fields: usize,
    pub differences: Vec<Difference>,
}

impl MatchResult {
    fn from_counts(total_fields: usize, matching_fields: usize, differences: Vec<Difference>) -> Self {
        Self {
            match_percentage: percentage(matching_fields, total_fields),
            total_fields,
            matching_fields,
            differences,
        }
    }

    /// Re-score with actual-only fields permitted: `extra` differences are
    /// dropped and no longer count toward the total.
    #[must_use]
    pub fn without_extras(self) -> Self {
        let extras = self
            .differences
            .iter()
            .filter(|d| d.kind == DifferenceKind::Extra)
            .count();
        let differences = self
            .differences
            .into_iter()
            .filter(|d| d.kind != DifferenceKind::Extra)
            .collect();
        Self::from_counts(self.total_fields - extras, self.matching_fields, differences)
    }
}

/// Result of [`deep_compare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeepReport {
    pub match_percentage: f64,
    pub total_comparisons: usize,
    pub successful_matches: usize,
    pub differences: Vec<Difference>,
}

/// `matched / total * 100`, rounded to two decimals; 100 when `total` is 0.
#[must_use]
pub fn percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    round2(matched as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── structure only ──

/// Compare shapes only: each value is reduced to a multiset of
/// `path:type` tokens (array indices collapsed to `[]`), scored Jaccard-style.
#[must_use]
pub fn structure_only(expected: &Value, actual: &Value) -> StructureReport {
    let mut exp_tokens = BTreeMap::new();
    let mut act_tokens = BTreeMap::new();
    collect_tokens(expected, "", &mut exp_tokens);
    collect_tokens(actual, "", &mut act_tokens);

    let keys: BTreeSet<&String> = exp_tokens.keys().chain(act_tokens.keys()).collect();
    let mut total = 0;
    let mut matching = 0;
    let mut missing_in_actual = Vec::new();
    let mut missing_in_expected = Vec::new();

    for key in keys {
        let e = exp_tokens.get(key).copied().unwrap_or(0);
        let a = act_tokens.get(key).copied().unwrap_or(0);
        total += e.max(a);
        matching += e.min(a);
        if e > a {
            missing_in_actual.push(key.clone());
        } else if a > e {
            missing_in_expected.push(key.clone());
        }
    }

    StructureReport {
        match_percentage: percentage(matching, total),
        total_keys: total,
        matching_keys: matching,
        missing_in_actual,
        missing_in_expected,
    }
}

fn collect_tokens(value: &Value, path: &str, out: &mut BTreeMap<String, usize>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = join_key(path, key);
                *out.entry(format!("{child_path}:{}", type_name(child))).or_default() += 1;
                collect_tokens(child, &child_path, out);
            }
        }
        Value::Array(items) => {
            let child_path = format!("{path}[]");
            for item in items {
                *out.entry(format!("{child_path}:{}", type_name(item))).or_default() += 1;
                collect_tokens(item, &child_path, out);
            }
        }
        _ if path.is_empty() => {
            *out.entry(format!("{}:{}", json::ROOT_PATH, type_name(value))).or_default() += 1;
        }
        _ => {}
    }
}

// ── values only ──

/// Approximate similarity of the canonical serialized forms.
///
/// Identical forms score 100. Otherwise the score is the share of character
/// positions that agree, over the longer string. This is not an edit distance.
#[must_use]
pub fn values_only(expected: &Value, actual: &Value) -> ValueReport {
    let exp = canonical_string(expected);
    let act = canonical_string(actual);
    if exp == act {
        return ValueReport {
            match_percentage: 100.0,
            values_match: true,
        };
    }

    let exp_chars: Vec<char> = exp.chars().collect();
    let act_chars: Vec<char> = act.chars().collect();
    let longer = exp_chars.len().max(act_chars.len());
    let same = exp_chars
        .iter()
        .zip(&act_chars)
        .filter(|(a, b)| a == b)
        .count();

    ValueReport {
        match_percentage: percentage(same, longer),
        values_match: false,
    }
}

// ── structure and values ──

/// Compare leaf by leaf, the way both sides would flatten to `path -> value`.
///
/// With `ignore_array_order`, each expected element is paired with an unused
/// actual element: equal ones first, then the closest remaining. Paired
/// elements are addressed by their index in the actual response; unpaired
/// ones are reported as missing or extra at their own index.
#[must_use]
pub fn structure_and_values(expected: &Value, actual: &Value, ignore_array_order: bool) -> MatchResult {
    let mut walk = FieldWalk::new(ignore_array_order);
    walk.visit(Some(expected), Some(actual), "");
    MatchResult::from_counts(walk.total, walk.matching, walk.differences)
}

/// Flatten a value into leaf paths. Arrays become `path[i]`; empty nested
/// containers are kept as leaves; a scalar root is recorded at `$`.
#[must_use]
pub fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    match value {
        Value::Object(_) | Value::Array(_) => flatten_into(value, "", &mut out),
        scalar => {
            out.insert(json::ROOT_PATH.to_string(), scalar.clone());
        }
    }
    out
}

fn flatten_into(value: &Value, path: &str, out: &mut BTreeMap<String, Value>) {
    if !expands(value, path) {
        out.insert(path.to_string(), value.clone());
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, &join_key(path, key), out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                flatten_into(child, &join_index(path, idx), out);
            }
        }
        _ => {}
    }
}

/// Containers are descended into unless empty below the root.
fn expands(value: &Value, path: &str) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() || path.is_empty(),
        Value::Array(items) => !items.is_empty() || path.is_empty(),
        _ => false,
    }
}

struct FieldWalk {
    ignore_array_order: bool,
    total: usize,
    matching: usize,
    differences: Vec<Difference>,
}

impl FieldWalk {
    const fn new(ignore_array_order: bool) -> Self {
        Self {
            ignore_array_order,
            total: 0,
            matching: 0,
            differences: Vec::new(),
        }
    }

    fn visit(&mut self, expected: Option<&Value>, actual: Option<&Value>, path: &str) {
        let exp_node = expected.filter(|v| expands(v, path));
        let act_node = actual.filter(|v| expands(v, path));
        match (exp_node, act_node) {
            (Some(Value::Object(e)), Some(Value::Object(a))) => {
                let keys: BTreeSet<&String> = e.keys().chain(a.keys()).collect();
                for key in keys {
                    self.visit(e.get(key), a.get(key), &join_key(path, key));
                }
            }
            (Some(Value::Array(e)), Some(Value::Array(a))) => self.visit_arrays(e, a, path),
            (None, None) => self.leaf(expected, actual, path),
            (exp_node, act_node) => {
                match exp_node {
                    Some(v) => self.one_sided(v, path, DifferenceKind::Missing),
                    None => self.leaf(expected, None, path),
                }
                match act_node {
                    Some(v) => self.one_sided(v, path, DifferenceKind::Extra),
                    None => self.leaf(None, actual, path),
                }
            }
        }
    }

    fn visit_arrays(&mut self, expected: &[Value], actual: &[Value], path: &str) {
        if !self.ignore_array_order {
            for idx in 0..expected.len().max(actual.len()) {
                self.visit(expected.get(idx), actual.get(idx), &join_index(path, idx));
            }
            return;
        }

        let mut used = vec![false; actual.len()];
        let mut partner: Vec<Option<usize>> = vec![None; expected.len()];
        for (idx, item) in expected.iter().enumerate() {
            let exact = (0..actual.len()).find(|&j| !used[j] && self.pair_score(item, &actual[j]).1 == 0);
            if let Some(j) = exact {
                used[j] = true;
                partner[idx] = Some(j);
            }
        }
        for (idx, item) in expected.iter().enumerate() {
            if partner[idx].is_some() {
                continue;
            }
            let closest = (0..actual.len())
                .filter(|&j| !used[j])
                .max_by_key(|&j| {
                    let (matching, differences) = self.pair_score(item, &actual[j]);
                    (matching, std::cmp::Reverse(differences), std::cmp::Reverse(j))
                });
            if let Some(j) = closest {
                used[j] = true;
                partner[idx] = Some(j);
            }
        }

        for (idx, item) in expected.iter().enumerate() {
            match partner[idx] {
                Some(j) => self.visit(Some(item), Some(&actual[j]), &join_index(path, j)),
                None => self.one_sided(item, &join_index(path, idx), DifferenceKind::Missing),
            }
        }
        for (j, item) in actual.iter().enumerate().filter(|(j, _)| !used[*j]) {
            self.one_sided(item, &join_index(path, j), DifferenceKind::Extra);
        }
    }

    /// `(matching leaves, differences)` if `expected` were paired with `actual`.
    fn pair_score(&self, expected: &Value, actual: &Value) -> (usize, usize) {
        // Any non-root path: empty containers must stay leaves
        let mut trial = Self::new(self.ignore_array_order);
        trial.visit(Some(expected), Some(actual), &join_index("", 0));
        (trial.matching, trial.differences.len())
    }

    /// Every leaf under `value` is present on one side only.
    fn one_sided(&mut self, value: &Value, path: &str, kind: DifferenceKind) {
        if !expands(value, path) {
            match kind {
                DifferenceKind::Extra => self.leaf(None, Some(value), path),
                _ => self.leaf(Some(value), None, path),
            }
            return;
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.one_sided(child, &join_key(path, key), kind);
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.one_sided(child, &join_index(path, idx), kind);
                }
            }
            _ => {}
        }
    }

    fn leaf(&mut self, expected: Option<&Value>, actual: Option<&Value>, path: &str) {
        let path = json::display_path(path);
        match (expected, actual) {
            (Some(e), Some(a)) if values_equal(e, a) => self.matching += 1,
            (Some(e), Some(a)) => self.differences.push(Difference::mismatch(path, e, a)),
            (Some(e), None) => self.differences.push(Difference::missing(path, e)),
            (None, Some(a)) => self.differences.push(Difference::extra(path, a)),
            (None, None) => return,
        }
        self.total += 1;
    }
}

// ── deep compare ──

/// Lock-step recursive comparison.
///
/// One comparison unit per leaf, per one-sided field, and per type-mismatch
/// node. A type mismatch is not descended into.
#[must_use]
pub fn deep_compare(expected: &Value, actual: &Value) -> DeepReport {
    let mut walk = DeepWalk::default();
    walk.visit(expected, actual, "");
    DeepReport {
        match_percentage: percentage(walk.matches, walk.total),
        total_comparisons: walk.total,
        successful_matches: walk.matches,
        differences: walk.differences,
    }
}

#[derive(Default)]
struct DeepWalk {
    total: usize,
    matches: usize,
    differences: Vec<Difference>,
}

impl DeepWalk {
    fn visit(&mut self, expected: &Value, actual: &Value, path: &str) {
        match (expected, actual) {
            (Value::Object(e), Value::Object(a)) => {
                let keys: BTreeSet<&String> = e.keys().chain(a.keys()).collect();
                for key in keys {
                    let child = join_key(path, key);
                    match (e.get(key), a.get(key)) {
                        (Some(ev), Some(av)) => self.visit(ev, av, &child),
                        (Some(ev), None) => self.miss(Difference::missing(child, ev)),
                        (None, Some(av)) => self.miss(Difference::extra(child, av)),
                        (None, None) => {}
                    }
                }
            }
            (Value::Array(e), Value::Array(a)) => {
                for idx in 0..e.len().max(a.len()) {
                    let child = join_index(path, idx);
                    match (e.get(idx), a.get(idx)) {
                        (Some(ev), Some(av)) => self.visit(ev, av, &child),
                        (Some(ev), None) => self.miss(Difference::missing(child, ev)),
                        (None, Some(av)) => self.miss(Difference::extra(child, av)),
                        (None, None) => {}
                    }
                }
            }
            (e, a) if std::mem::discriminant(e) != std::mem::discriminant(a) => {
                self.miss(Difference::mismatch(json::display_path(path), e, a));
            }
            (e, a) => {
                if values_equal(e, a) {
                    self.total += 1;
                    self.matches += 1;
                } else {
                    self.miss(Difference::mismatch(json::display_path(path), e, a));
                }
            }
        }
    }

    fn miss(&mut self, difference: Difference) {
        self.total += 1;
        self.differences.push(difference);
    }
}
