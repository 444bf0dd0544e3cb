// src/engine/aggregate.rs
//
// Aggregator: derived ratios, totals, per-context-group averages and the
// suppression flags that keep a group's derived value from rendering more
// than once.

use std::collections::BTreeMap;

use crate::engine::assemble::SemanticRecord;
use crate::engine::spec::{Derived, GroupAverage};
use crate::engine::value::Value;

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// round(num / den * 100, 2) when den > 0; exactly 0.0 otherwise.
pub fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        round2(num / den * 100.0)
    } else {
        0.0
    }
}

fn lookup<'a>(values: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

fn sum_terms(values: &[(String, Value)], terms: &[&str]) -> (f64, bool) {
    let mut sum = 0.0;
    let mut any_float = false;
    for term in terms {
        if let Some(v) = lookup(values, term) {
            sum += v.as_f64_or_zero(); // absent contributes 0
            any_float |= matches!(v, Value::Float(_));
        }
    }
    (sum, any_float)
}

/// Computes a kind's derived fields from its already-normalized values.
/// A ratio whose numerator is itself absent stays absent (blank), never 0;
/// a present numerator over a non-positive denominator is exactly 0.0.
pub fn apply_derived(values: &[(String, Value)], derived: &[Derived]) -> Vec<(String, Value)> {
    let mut out = Vec::with_capacity(derived.len());
    for d in derived {
        match d {
            Derived::Ratio { name, num, den } => {
                let value = match lookup(values, num).and_then(Value::as_f64) {
                    Some(n) => {
                        let d = lookup(values, den).and_then(Value::as_f64).unwrap_or(0.0);
                        Value::Float(ratio(n, d))
                    }
                    None => Value::Absent,
                };
                out.push((name.to_string(), value));
            }
            Derived::RatioOverSum { name, num, den } => {
                let value = match lookup(values, num).and_then(Value::as_f64) {
                    Some(n) => {
                        let (d, _) = sum_terms(values, den);
                        Value::Float(ratio(n, d))
                    }
                    None => Value::Absent,
                };
                out.push((name.to_string(), value));
            }
            Derived::Sum { name, terms } => {
                let (sum, any_float) = sum_terms(values, terms);
                let value = if any_float {
                    Value::Float(round2(sum))
                } else {
                    Value::Int(sum as i64)
                };
                out.push((name.to_string(), value));
            }
        }
    }
    out
}

/// A record plus group-level derived values, each with a suppression flag
/// set when an identical context group already displayed the value.
#[derive(Debug, Clone)]
pub struct AggregatedRow {
    pub record: SemanticRecord,
    pub derived: Vec<DerivedValue>,
}

#[derive(Debug, Clone)]
pub struct DerivedValue {
    pub name: String,
    pub value: Value,
    pub suppressed: bool,
}

/// Wraps assembled records into aggregated rows, attaching the per-context
/// group average when configured. Grouped record sets are sorted by
/// (context ascending, period descending). The average is attached to the
/// first row of each group and suppressed on the rest, where it is hidden
/// rather than recomputed. The suppression flag is set exactly once, here.
pub fn group_rows(
    mut records: Vec<SemanticRecord>,
    group_average: Option<&GroupAverage>,
) -> Vec<AggregatedRow> {
    let Some(ga) = group_average else {
        return records
            .into_iter()
            .map(|record| AggregatedRow {
                record,
                derived: Vec::new(),
            })
            .collect();
    };

    records.sort_by(|a, b| {
        a.context
            .cmp(&b.context)
            .then_with(|| b.period.cmp(&a.period))
    });

    // Mean over the group's present values only.
    let mut means: BTreeMap<Option<String>, (f64, usize)> = BTreeMap::new();
    for record in &records {
        if let Some(v) = record.get(ga.source).and_then(Value::as_f64) {
            let entry = means.entry(record.context.clone()).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    let mut seen: BTreeMap<Option<String>, ()> = BTreeMap::new();
    records
        .into_iter()
        .map(|record| {
            let first = seen.insert(record.context.clone(), ()).is_none();
            let value = means
                .get(&record.context)
                .filter(|(_, n)| *n > 0)
                .map(|(sum, n)| Value::Float(round2(sum / *n as f64)))
                .unwrap_or(Value::Absent);
            AggregatedRow {
                record,
                derived: vec![DerivedValue {
                    name: ga.name.to_string(),
                    value,
                    suppressed: !first,
                }],
            }
        })
        .collect()
}
