use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::domain::{
    ConfigVersion, RuleKind, RulePatch, ScoringConfig, ScoringResult, ScoringRule, TestLead,
};
use super::engine::{BatchEvaluation, ScoringEngine};
use super::validator;

/// Storage abstraction for the versioned config history and the rule list,
/// so the service can be exercised against in-memory fakes in tests.
///
/// Implementations must serialize writes (single-writer discipline); the
/// service never mutates state itself and assumes append-only history.
pub trait ConfigStore: Send + Sync {
    fn append_version(&self, version: ConfigVersion) -> Result<(), StoreError>;
    fn current_version(&self) -> Result<Option<ConfigVersion>, StoreError>;
    fn find_version(&self, id: &str) -> Result<Option<ConfigVersion>, StoreError>;
    /// Most-recent-first, bounded by `limit`.
    fn history(&self, limit: usize) -> Result<Vec<ConfigVersion>, StoreError>;
    fn rules(&self) -> Result<Vec<ScoringRule>, StoreError>;
    fn replace_rules(&self, rules: Vec<ScoringRule>) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Caller-supplied payload for a new rule; the service assigns the id.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    #[serde(default = "RuleDraft::enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl RuleDraft {
    fn enabled_default() -> bool {
        true
    }
}

static VERSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_version_id() -> String {
    let id = VERSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("cfg-{id:06}")
}

fn next_rule_id() -> String {
    let id = RULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("rule-{id:06}")
}

/// Service composing the config store, validator, and scoring engine.
pub struct ScoringService<S> {
    store: Arc<S>,
    engine: ScoringEngine,
}

impl<S> ScoringService<S>
where
    S: ConfigStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            engine: ScoringEngine::new(),
        }
    }

    /// Current config plus rules, bootstrapping and persisting the baseline
    /// when no version exists yet. A missing config is not an error state.
    pub fn current_snapshot(
        &self,
    ) -> Result<(ScoringConfig, Vec<ScoringRule>), ScoringServiceError> {
        let config = match self.store.current_version()? {
            Some(version) => version.config,
            None => {
                let bootstrap = ConfigVersion {
                    id: next_version_id(),
                    config: ScoringConfig::baseline(),
                    created_at: Utc::now(),
                    created_by: "bootstrap".to_string(),
                };
                info!(version = %bootstrap.id, "no scoring config found; bootstrapping baseline");
                self.store.append_version(bootstrap.clone())?;
                bootstrap.config
            }
        };
        Ok((config, self.store.rules()?))
    }

    /// Validate and persist a new config version. On validation failure the
    /// itemized errors come back and nothing is written.
    pub fn save_config(
        &self,
        config: ScoringConfig,
        created_by: &str,
    ) -> Result<ConfigVersion, ScoringServiceError> {
        let report = validator::validate_config(&config);
        if !report.valid {
            return Err(ScoringServiceError::Validation(report.errors));
        }

        let version = ConfigVersion {
            id: next_version_id(),
            config,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
        };
        self.store.append_version(version.clone())?;
        info!(version = %version.id, %created_by, "scoring config saved");
        Ok(version)
    }

    /// Duplicate an older snapshot as the new current version. History is
    /// never rewritten; an unknown id mutates nothing.
    pub fn rollback(
        &self,
        version_id: &str,
        created_by: &str,
    ) -> Result<ConfigVersion, ScoringServiceError> {
        let snapshot = self
            .store
            .find_version(version_id)?
            .ok_or(StoreError::NotFound)?;

        let version = ConfigVersion {
            id: next_version_id(),
            config: snapshot.config,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
        };
        self.store.append_version(version.clone())?;
        info!(restored = %version_id, version = %version.id, "scoring config rolled back");
        Ok(version)
    }

    pub fn history(&self, limit: usize) -> Result<Vec<ConfigVersion>, ScoringServiceError> {
        Ok(self.store.history(limit)?)
    }

    pub fn create_rule(&self, draft: RuleDraft) -> Result<ScoringRule, ScoringServiceError> {
        let rule = ScoringRule {
            id: next_rule_id(),
            name: draft.name,
            enabled: draft.enabled,
            order: draft.order,
            kind: draft.kind,
        };

        let report = validator::validate_rule(&rule);
        if !report.valid {
            return Err(ScoringServiceError::Validation(report.errors));
        }

        let mut rules = self.store.rules()?;
        rules.push(rule.clone());
        self.store.replace_rules(rules)?;
        Ok(rule)
    }

    pub fn update_rule(
        &self,
        rule_id: &str,
        patch: RulePatch,
    ) -> Result<ScoringRule, ScoringServiceError> {
        let mut rules = self.store.rules()?;
        let slot = rules
            .iter_mut()
            .find(|rule| rule.id == rule_id)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = patch.name {
            slot.name = name;
        }
        if let Some(enabled) = patch.enabled {
            slot.enabled = enabled;
        }
        if let Some(order) = patch.order {
            slot.order = order;
        }
        if let Some(kind) = patch.kind {
            slot.kind = kind;
        }

        let report = validator::validate_rule(slot);
        if !report.valid {
            return Err(ScoringServiceError::Validation(report.errors));
        }

        let updated = slot.clone();
        self.store.replace_rules(rules)?;
        Ok(updated)
    }

    pub fn delete_rule(&self, rule_id: &str) -> Result<(), ScoringServiceError> {
        let mut rules = self.store.rules()?;
        let before = rules.len();
        rules.retain(|rule| rule.id != rule_id);
        if rules.len() == before {
            return Err(StoreError::NotFound.into());
        }
        self.store.replace_rules(rules)?;
        Ok(())
    }

    /// Reassign `order` by position. The id list must name every stored rule
    /// exactly once; anything else leaves the stored order untouched. An id
    /// that names no stored rule is `NotFound`; a wrong-length or duplicated
    /// list is a validation failure.
    pub fn reorder_rules(&self, ids: &[String]) -> Result<Vec<ScoringRule>, ScoringServiceError> {
        let rules = self.store.rules()?;
        if ids.len() != rules.len() {
            return Err(ScoringServiceError::Validation(vec![format!(
                "reorder must list all {} rule ids, got {}",
                rules.len(),
                ids.len()
            )]));
        }
        if ids
            .iter()
            .any(|id| !rules.iter().any(|rule| &rule.id == id))
        {
            return Err(StoreError::NotFound.into());
        }

        let mut remaining = rules;
        let mut reordered = Vec::with_capacity(remaining.len());
        for (position, id) in ids.iter().enumerate() {
            let index = remaining
                .iter()
                .position(|rule| &rule.id == id)
                .ok_or_else(|| {
                    ScoringServiceError::Validation(vec![format!(
                        "reorder lists rule id '{id}' more than once"
                    )])
                })?;
            let mut rule = remaining.remove(index);
            rule.order = position as i32;
            reordered.push(rule);
        }

        self.store.replace_rules(reordered.clone())?;
        Ok(reordered)
    }

    /// Score one lead against the current (possibly bootstrapped) snapshot.
    pub fn test_lead(&self, lead: &TestLead) -> Result<ScoringResult, ScoringServiceError> {
        let (config, rules) = self.current_snapshot()?;
        Ok(self.engine.evaluate(lead, &config, &rules))
    }

    /// Score a batch of leads, preserving input order.
    pub fn batch_test(
        &self,
        leads: &[TestLead],
    ) -> Result<Vec<BatchEvaluation>, ScoringServiceError> {
        let (config, rules) = self.current_snapshot()?;
        Ok(self.engine.batch_evaluate(leads, &config, &rules))
    }
}
