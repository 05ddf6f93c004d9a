use serde_json::Value;

use super::domain::TraceStep;

/// Append-only accumulator for the evaluation audit trail.
///
/// Owns the running total so every recorded step carries the score as it
/// stood after that step, keeping the trace arithmetic self-checking.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    steps: Vec<TraceStep>,
    total: f64,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Record a step that moves the running score by `points`.
    pub fn record(&mut self, step: StepDetails<'_>, points: f64) {
        self.total += points;
        self.push(step, points);
    }

    /// Record a step that multiplies the running score.
    pub fn record_multiply(&mut self, step: StepDetails<'_>, factor: f64) {
        let before = self.total;
        self.total *= factor;
        self.push(step, self.total - before);
    }

    /// Record a non-scoring step (tag, routing, SLA assignment).
    pub fn note(&mut self, step: StepDetails<'_>) {
        self.push(step, 0.0);
    }

    /// Force the running total to `value`, recording the adjustment. Used for
    /// the final clamp.
    pub fn settle(&mut self, step: StepDetails<'_>, value: f64) {
        let points = value - self.total;
        self.total = value;
        self.push(step, points);
    }

    pub fn into_steps(self) -> Vec<TraceStep> {
        self.steps
    }

    fn push(&mut self, step: StepDetails<'_>, points: f64) {
        self.steps.push(TraceStep {
            step: step.step.to_string(),
            field: step.field.map(str::to_string),
            value: step.value.cloned(),
            operation: step.operation.to_string(),
            points,
            total: self.total,
            reason: step.reason.to_string(),
            rule: step.rule.map(str::to_string),
        });
    }
}

/// Borrowed description of one trace entry.
#[derive(Debug, Clone, Copy)]
pub struct StepDetails<'a> {
    pub step: &'a str,
    pub field: Option<&'a str>,
    pub value: Option<&'a Value>,
    pub operation: &'a str,
    pub reason: &'a str,
    pub rule: Option<&'a str>,
}

impl<'a> StepDetails<'a> {
    pub fn new(step: &'a str, operation: &'a str, reason: &'a str) -> Self {
        Self {
            step,
            field: None,
            value: None,
            operation,
            reason,
            rule: None,
        }
    }

    pub fn with_field(mut self, field: &'a str, value: Option<&'a Value>) -> Self {
        self.field = Some(field);
        self.value = value;
        self
    }

    pub fn with_rule(mut self, rule: &'a str) -> Self {
        self.rule = Some(rule);
        self
    }
}
