use super::domain::{RuleKind, ScoringRule, ScoringWeights};

/// Merge base weights with enabled WEIGHT-rule overrides.
///
/// Overrides apply in ascending `order`, each replacing the named field's
/// weight; a later rule therefore wins over an earlier one for the same
/// field. Disabled rules are skipped entirely and never traced.
pub fn resolve(base: &ScoringWeights, rules: &[ScoringRule]) -> ScoringWeights {
    let mut overrides: Vec<(&ScoringRule, &str, f64)> = rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter_map(|rule| match &rule.kind {
            RuleKind::Weight { field, weight } => Some((rule, field.as_str(), *weight)),
            RuleKind::IfThen { .. } => None,
        })
        .collect();
    overrides.sort_by_key(|(rule, _, _)| rule.order);

    let mut effective = base.clone();
    for (_, field, weight) in overrides {
        effective.insert(field.to_string(), weight);
    }
    effective
}
