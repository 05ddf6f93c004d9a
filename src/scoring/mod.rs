//! Lead scoring and rule evaluation.
//!
//! The engine is a pure function over an immutable config snapshot: it
//! resolves effective weights, computes the weighted base score, applies
//! negative and conditional rules, clamps, classifies, and returns the
//! result together with an itemized trace. Configuration changes flow
//! through [`ScoringService`], which validates before persisting and keeps
//! an append-only version history with rollback-by-duplication.

pub mod bands;
pub mod condition;
pub mod domain;
pub mod engine;
pub mod trace;
pub mod validator;
pub mod versioning;
pub mod weights;

#[cfg(test)]
mod tests;

pub use domain::{
    Band, BandRange, Condition, ConditionOperator, ConfigVersion, NegativeRule, RuleEffect,
    RuleKind, RulePatch, ScoringBands, ScoringConfig, ScoringResult, ScoringRule, ScoringWeights,
    TestLead, TraceStep,
};
pub use engine::{BatchEvaluation, ScoringEngine};
pub use validator::ValidationReport;
pub use versioning::{ConfigStore, RuleDraft, ScoringService, ScoringServiceError, StoreError};
