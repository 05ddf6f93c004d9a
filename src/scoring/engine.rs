use serde::{Deserialize, Serialize};

use super::condition;
use super::domain::{
    Condition, RuleEffect, RuleKind, ScoringConfig, ScoringResult, ScoringRule, TestLead,
};
use super::trace::{StepDetails, TraceRecorder};
use super::{bands, weights};

/// Stateless evaluator turning `(lead, config, rules)` into a scored,
/// traced result. Pure and synchronous; safe to call concurrently over the
/// same immutable config snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

/// One entry of a batch evaluation, pairing the input lead with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvaluation {
    pub lead: TestLead,
    pub scoring: ScoringResult,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a single lead against a config snapshot and its rules.
    pub fn evaluate(
        &self,
        lead: &TestLead,
        config: &ScoringConfig,
        rules: &[ScoringRule],
    ) -> ScoringResult {
        let mut trace = TraceRecorder::new();
        let mut tags = Vec::new();
        let mut routing = None;
        let mut sla_minutes = None;

        let effective = weights::resolve(&config.weights, rules);
        let base = base_score(lead, &effective);
        trace.record(
            StepDetails::new("Base Score", "weighted_average", "weighted average of lead fields"),
            base,
        );

        for rule in config.negative.iter().filter(|rule| rule.enabled) {
            let probe = Condition {
                field: rule.field.clone(),
                operator: rule.op,
                value: rule.value.clone(),
            };
            if condition::evaluate(&probe, lead) {
                trace.record(
                    StepDetails::new("Negative Rule", "penalty", &rule.reason)
                        .with_field(&rule.field, Some(&rule.value)),
                    -rule.penalty,
                );
            }
        }

        let mut conditional: Vec<&ScoringRule> = rules
            .iter()
            .filter(|rule| rule.enabled && matches!(rule.kind, RuleKind::IfThen { .. }))
            .collect();
        conditional.sort_by_key(|rule| rule.order);

        for rule in conditional {
            let RuleKind::IfThen { conditions, then } = &rule.kind else {
                continue;
            };
            if !conditions
                .iter()
                .all(|condition| condition::evaluate(condition, lead))
            {
                continue;
            }
            apply_effect(
                rule,
                then,
                &mut trace,
                &mut tags,
                &mut routing,
                &mut sla_minutes,
            );
        }

        let clamped = trace.total().clamp(0.0, 100.0);
        if clamped != trace.total() {
            trace.settle(
                StepDetails::new("Clamp", "clamp", "score clamped to the 0-100 range"),
                clamped,
            );
        }

        let band = bands::classify(clamped, &config.bands);

        ScoringResult {
            score: clamped,
            band,
            trace: trace.into_steps(),
            tags,
            routing,
            sla_minutes,
        }
    }

    /// Evaluate each lead independently, preserving input order.
    pub fn batch_evaluate(
        &self,
        leads: &[TestLead],
        config: &ScoringConfig,
        rules: &[ScoringRule],
    ) -> Vec<BatchEvaluation> {
        leads
            .iter()
            .map(|lead| BatchEvaluation {
                lead: lead.clone(),
                scoring: self.evaluate(lead, config, rules),
            })
            .collect()
    }
}

/// Weighted average of the lead's field values, scaled to 0-100 by the weight
/// sum. Missing or non-numeric fields contribute zero; an all-zero weight
/// table yields zero rather than NaN.
fn base_score(lead: &TestLead, weights: &super::domain::ScoringWeights) -> f64 {
    let weight_sum: f64 = weights.values().sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }

    let weighted_sum: f64 = weights
        .iter()
        .map(|(field, weight)| {
            let value = lead
                .lookup(field)
                .as_ref()
                .and_then(condition::coerce_number)
                .unwrap_or(0.0);
            value * weight
        })
        .sum();

    weighted_sum / weight_sum
}

fn apply_effect(
    rule: &ScoringRule,
    effect: &RuleEffect,
    trace: &mut TraceRecorder,
    tags: &mut Vec<String>,
    routing: &mut Option<String>,
    sla_minutes: &mut Option<u32>,
) {
    if let Some(points) = effect.add {
        trace.record(
            StepDetails::new("Rule Effect", "add", &rule.name).with_rule(&rule.id),
            points,
        );
    }
    if let Some(factor) = effect.multiply {
        trace.record_multiply(
            StepDetails::new("Rule Effect", "multiply", &rule.name).with_rule(&rule.id),
            factor,
        );
    }
    if let Some(tag) = &effect.tag {
        tags.push(tag.clone());
        trace.note(StepDetails::new("Rule Effect", "tag", tag).with_rule(&rule.id));
    }
    if let Some(route) = &effect.route {
        // Later-ordered matches override earlier ones.
        *routing = Some(route.clone());
        trace.note(StepDetails::new("Rule Effect", "route", route).with_rule(&rule.id));
    }
    if let Some(minutes) = effect.sla_minutes {
        *sla_minutes = Some(minutes);
        trace.note(
            StepDetails::new("Rule Effect", "sla", &format!("respond within {minutes} minutes"))
                .with_rule(&rule.id),
        );
    }
}
