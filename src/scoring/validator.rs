use regex::Regex;
use serde_json::Value;

use super::domain::{
    ConditionOperator, RuleKind, ScoringBands, ScoringConfig, ScoringRule,
};

/// Itemized outcome of a structural validation pass. Never an error type;
/// callers decide whether a failed report rejects the save.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check the structural invariants of a config before it is accepted.
pub fn validate_config(config: &ScoringConfig) -> ValidationReport {
    let mut errors = Vec::new();

    if config.weights.is_empty() {
        errors.push("weights must contain at least one field".to_string());
    }
    for (field, weight) in &config.weights {
        if !weight.is_finite() || *weight < 0.0 {
            errors.push(format!("weight for '{field}' must be a non-negative number"));
        }
    }

    check_bands(&config.bands, &mut errors);

    for (index, rule) in config.negative.iter().enumerate() {
        if rule.field.trim().is_empty() {
            errors.push(format!("negative rule #{index} is missing a field"));
        }
        if !rule.penalty.is_finite() || rule.penalty < 0.0 {
            errors.push(format!(
                "negative rule #{index} penalty must be a non-negative number"
            ));
        }
        if rule.op == ConditionOperator::Regex {
            check_pattern(&rule.value, &format!("negative rule #{index}"), &mut errors);
        }
    }

    ValidationReport::from_errors(errors)
}

/// Check a business rule before it is stored. Regex patterns are compiled
/// here so catastrophic or malformed patterns are rejected at save time
/// instead of degrading every evaluation.
pub fn validate_rule(rule: &ScoringRule) -> ValidationReport {
    let mut errors = Vec::new();

    if rule.name.trim().is_empty() {
        errors.push("rule name must not be empty".to_string());
    }

    match &rule.kind {
        RuleKind::IfThen { conditions, then } => {
            if conditions.is_empty() {
                errors.push("IF_THEN rule must have at least one condition".to_string());
            }
            for (index, condition) in conditions.iter().enumerate() {
                if condition.field.trim().is_empty() {
                    errors.push(format!("condition #{index} is missing a field"));
                }
                if condition.operator == ConditionOperator::Regex {
                    check_pattern(&condition.value, &format!("condition #{index}"), &mut errors);
                }
            }
            if let Some(factor) = then.multiply {
                if !factor.is_finite() || factor < 0.0 {
                    errors.push("multiply effect must be a non-negative number".to_string());
                }
            }
            if then.add.is_none()
                && then.multiply.is_none()
                && then.tag.is_none()
                && then.route.is_none()
                && then.sla_minutes.is_none()
            {
                errors.push("IF_THEN rule must declare at least one effect".to_string());
            }
        }
        RuleKind::Weight { field, weight } => {
            if field.trim().is_empty() {
                errors.push("WEIGHT rule must name a field".to_string());
            }
            if !weight.is_finite() || *weight < 0.0 {
                errors.push("WEIGHT rule weight must be a non-negative number".to_string());
            }
        }
    }

    ValidationReport::from_errors(errors)
}

fn check_bands(bands: &ScoringBands, errors: &mut Vec<String>) {
    if !(bands.low.min < bands.medium.min && bands.medium.min < bands.high.min) {
        errors.push("band minimums must be strictly ascending (low < medium < high)".to_string());
    }
    // max values are display-only, but inconsistent ones confuse operators.
    if !(bands.low.max < bands.medium.max && bands.medium.max < bands.high.max) {
        errors.push("band maximums must be strictly ascending (low < medium < high)".to_string());
    }
}

fn check_pattern(value: &Value, context: &str, errors: &mut Vec<String>) {
    match value.as_str() {
        Some(pattern) => {
            if let Err(error) = Regex::new(pattern) {
                errors.push(format!("{context} regex does not compile: {error}"));
            }
        }
        None => errors.push(format!("{context} regex pattern must be a string")),
    }
}
