use serde_json::{json, Value};

use crate::scoring::domain::{
    Condition, ConditionOperator, NegativeRule, RuleEffect, RuleKind, ScoringConfig, ScoringRule,
    TestLead,
};

pub(super) fn lead_with_fields(pairs: &[(&str, Value)]) -> TestLead {
    let mut lead = TestLead::default();
    for (field, value) in pairs {
        lead.fields.insert(field.to_string(), value.clone());
    }
    lead
}

pub(super) fn full_marks_lead() -> TestLead {
    lead_with_fields(&[
        ("urgency", json!(100)),
        ("engagement", json!(100)),
        ("jobRole", json!(100)),
    ])
}

pub(super) fn zero_lead() -> TestLead {
    lead_with_fields(&[
        ("urgency", json!(0)),
        ("engagement", json!(0)),
        ("jobRole", json!(0)),
    ])
}

pub(super) fn condition(field: &str, operator: ConditionOperator, value: Value) -> Condition {
    Condition {
        field: field.to_string(),
        operator,
        value,
    }
}

pub(super) fn spam_penalty(penalty: f64) -> NegativeRule {
    NegativeRule {
        field: "source".to_string(),
        op: ConditionOperator::Equals,
        value: json!("spam"),
        penalty,
        reason: "lead arrived from a known spam source".to_string(),
        enabled: true,
    }
}

pub(super) fn if_then_rule(
    id: &str,
    order: i32,
    conditions: Vec<Condition>,
    then: RuleEffect,
) -> ScoringRule {
    ScoringRule {
        id: id.to_string(),
        name: format!("rule {id}"),
        enabled: true,
        order,
        kind: RuleKind::IfThen { conditions, then },
    }
}

pub(super) fn weight_rule(id: &str, order: i32, field: &str, weight: f64) -> ScoringRule {
    ScoringRule {
        id: id.to_string(),
        name: format!("weight override {field}"),
        enabled: true,
        order,
        kind: RuleKind::Weight {
            field: field.to_string(),
            weight,
        },
    }
}

pub(super) fn add_effect(points: f64) -> RuleEffect {
    RuleEffect {
        add: Some(points),
        ..RuleEffect::default()
    }
}

pub(super) fn baseline() -> ScoringConfig {
    ScoringConfig::baseline()
}
