use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::domain::{Condition, ConditionOperator, TestLead};

/// Evaluate one predicate against a lead snapshot.
///
/// Missing fields satisfy only `not_exists`; every other operator fails
/// closed, including the negated ones. Coercion failures and bad regex
/// patterns also evaluate to `false` rather than surfacing an error, so one
/// malformed rule cannot break scoring for all leads.
pub fn evaluate(condition: &Condition, lead: &TestLead) -> bool {
    let field_value = lead.lookup(&condition.field);

    match condition.operator {
        ConditionOperator::Exists => field_value.is_some(),
        ConditionOperator::NotExists => field_value.is_none(),
        _ => {
            let Some(actual) = field_value else {
                return false;
            };
            evaluate_present(condition, &actual)
        }
    }
}

fn evaluate_present(condition: &Condition, actual: &Value) -> bool {
    match condition.operator {
        ConditionOperator::Equals => string_eq(actual, &condition.value),
        ConditionOperator::NotEquals => {
            string_pair(actual, &condition.value).is_some_and(|(a, b)| a != b)
        }
        ConditionOperator::Contains => {
            folded_pair(actual, &condition.value).is_some_and(|(a, b)| a.contains(&b))
        }
        ConditionOperator::NotContains => {
            folded_pair(actual, &condition.value).is_some_and(|(a, b)| !a.contains(&b))
        }
        ConditionOperator::StartsWith => {
            folded_pair(actual, &condition.value).is_some_and(|(a, b)| a.starts_with(&b))
        }
        ConditionOperator::EndsWith => {
            folded_pair(actual, &condition.value).is_some_and(|(a, b)| a.ends_with(&b))
        }
        ConditionOperator::Regex => regex_match(actual, &condition.value, &condition.field),
        ConditionOperator::In => set_membership(actual, &condition.value) == Some(true),
        ConditionOperator::NotIn => set_membership(actual, &condition.value) == Some(false),
        ConditionOperator::GreaterThan => {
            numeric_pair(actual, &condition.value).is_some_and(|(a, b)| a > b)
        }
        ConditionOperator::LessThan => {
            numeric_pair(actual, &condition.value).is_some_and(|(a, b)| a < b)
        }
        ConditionOperator::GreaterEqual => {
            numeric_pair(actual, &condition.value).is_some_and(|(a, b)| a >= b)
        }
        ConditionOperator::LessEqual => {
            numeric_pair(actual, &condition.value).is_some_and(|(a, b)| a <= b)
        }
        ConditionOperator::Exists | ConditionOperator::NotExists => unreachable!("handled above"),
    }
}

/// Coerce a scalar JSON value to its string form. Null, arrays, and objects
/// never coerce.
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a scalar JSON value to f64, accepting numeric strings.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_pair(actual: &Value, expected: &Value) -> Option<(String, String)> {
    Some((coerce_string(actual)?, coerce_string(expected)?))
}

fn string_eq(actual: &Value, expected: &Value) -> bool {
    string_pair(actual, expected).is_some_and(|(a, b)| a == b)
}

fn folded_pair(actual: &Value, expected: &Value) -> Option<(String, String)> {
    string_pair(actual, expected).map(|(a, b)| (a.to_lowercase(), b.to_lowercase()))
}

fn numeric_pair(actual: &Value, expected: &Value) -> Option<(f64, f64)> {
    Some((coerce_number(actual)?, coerce_number(expected)?))
}

fn regex_match(actual: &Value, pattern: &Value, field: &str) -> bool {
    let Some(text) = coerce_string(actual) else {
        return false;
    };
    let Some(raw_pattern) = coerce_string(pattern) else {
        warn!(%field, "regex condition has a non-string pattern; treating as non-match");
        return false;
    };

    match Regex::new(&raw_pattern) {
        Ok(regex) => regex.is_match(&text),
        Err(error) => {
            warn!(%field, pattern = %raw_pattern, %error, "regex pattern failed to compile; treating as non-match");
            false
        }
    }
}

/// `in`/`not_in` membership. Returns `None` (fail closed for both operators)
/// when the rule value is not an array or the field value never coerces.
fn set_membership(actual: &Value, expected: &Value) -> Option<bool> {
    let Value::Array(candidates) = expected else {
        return None;
    };
    let needle = coerce_string(actual)?;

    Some(
        candidates
            .iter()
            .filter_map(coerce_string)
            .any(|candidate| candidate == needle),
    )
}
