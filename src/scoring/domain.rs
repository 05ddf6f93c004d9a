use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One lead's attribute values as supplied by the caller. Read-only to the
/// engine; nested `fields`/`utm` maps hold form answers and campaign data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestLead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub utm: BTreeMap<String, Value>,
}

impl TestLead {
    /// Resolve a rule/weight field name against the snapshot.
    ///
    /// `fields.x` and `utm.x` address the nested maps explicitly; a bare name
    /// checks the top-level attributes, then `fields`, then `utm`.
    pub fn lookup(&self, field: &str) -> Option<Value> {
        if let Some(key) = field.strip_prefix("fields.") {
            return self.fields.get(key).cloned();
        }
        if let Some(key) = field.strip_prefix("utm.") {
            return self.utm.get(key).cloned();
        }

        let top_level = match field {
            "email" => self.email.as_deref(),
            "name" => self.name.as_deref(),
            "phone" => self.phone.as_deref(),
            "company" => self.company.as_deref(),
            "domain" => self.domain.as_deref(),
            "source" => self.source.as_deref(),
            _ => None,
        };
        if let Some(value) = top_level {
            return Some(Value::String(value.to_string()));
        }

        self.fields
            .get(field)
            .or_else(|| self.utm.get(field))
            .cloned()
    }
}

/// Per-field multipliers for the base weighted score.
pub type ScoringWeights = BTreeMap<String, f64>;

/// Inclusive score range for one band. `max` is informational only; band
/// classification reads `min` thresholds exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub min: f64,
    pub max: f64,
}

/// Ascending threshold ranges for LOW/MEDIUM/HIGH classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringBands {
    pub low: BandRange,
    pub medium: BandRange,
    pub high: BandRange,
}

/// Classification outcome for a clamped score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

impl Band {
    pub fn label(&self) -> &'static str {
        match self {
            Band::Low => "LOW",
            Band::Medium => "MEDIUM",
            Band::High => "HIGH",
        }
    }
}

/// Supported predicate operators, closed so evaluators stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    In,
    NotIn,
    Exists,
    NotExists,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
}

/// Single predicate evaluated against a lead snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

/// Subtractive rule: when the predicate matches, `penalty` points are removed
/// and `reason` lands in the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeRule {
    pub field: String,
    pub op: ConditionOperator,
    #[serde(default)]
    pub value: Value,
    pub penalty: f64,
    pub reason: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Effect bundle applied when all conditions of an IF_THEN rule match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_minutes: Option<u32>,
}

/// Rule payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleKind {
    #[serde(rename = "IF_THEN")]
    IfThen {
        conditions: Vec<Condition>,
        then: RuleEffect,
    },
    #[serde(rename = "WEIGHT")]
    Weight { field: String, weight: f64 },
}

/// A stored business rule. `order` controls evaluation order across both
/// WEIGHT overrides and IF_THEN rules; disabled rules are skipped entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub id: String,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(flatten)]
    pub kind: RuleKind,
}

/// Caller-supplied partial update for an existing rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(flatten)]
    pub kind: Option<RuleKind>,
}

/// The mutable, versioned configuration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub bands: ScoringBands,
    #[serde(default)]
    pub negative: Vec<NegativeRule>,
    #[serde(default)]
    pub enrichment: BTreeMap<String, Value>,
}

impl ScoringConfig {
    /// Documented bootstrap default used when a tenant has no config yet.
    pub fn baseline() -> Self {
        let mut weights = ScoringWeights::new();
        weights.insert("urgency".to_string(), 30.0);
        weights.insert("engagement".to_string(), 40.0);
        weights.insert("jobRole".to_string(), 30.0);

        Self {
            weights,
            bands: ScoringBands {
                low: BandRange { min: 0.0, max: 44.0 },
                medium: BandRange {
                    min: 45.0,
                    max: 74.0,
                },
                high: BandRange {
                    min: 75.0,
                    max: 100.0,
                },
            },
            negative: Vec::new(),
            enrichment: BTreeMap::new(),
        }
    }
}

/// One itemized entry in the evaluation audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub operation: String,
    pub points: f64,
    pub total: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// Evaluation output: derived, never persisted, always recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub score: f64,
    pub band: Band,
    pub trace: Vec<TraceStep>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_minutes: Option<u32>,
}

/// One immutable snapshot in the append-only configuration history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub id: String,
    pub config: ScoringConfig,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
