use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use crate::scoring::{ConfigStore, ConfigVersion, ScoringRule, StoreError};

/// Shared operational state for the readiness and metrics endpoints.
#[derive(Clone)]
pub struct AppState {
    pub readiness: Arc<AtomicBool>,
    pub metrics: Arc<PrometheusHandle>,
    pub history_limit: usize,
}

#[derive(Default)]
struct StoreState {
    versions: Vec<ConfigVersion>,
    rules: Vec<ScoringRule>,
}

/// Mutex-guarded in-memory store. The single lock serializes every write,
/// which upholds the single-writer discipline the append-only history
/// assumes.
#[derive(Default, Clone)]
pub struct InMemoryConfigStore {
    state: Arc<Mutex<StoreState>>,
}

impl ConfigStore for InMemoryConfigStore {
    fn append_version(&self, version: ConfigVersion) -> Result<(), StoreError> {
        let mut guard = self.state.lock().expect("config store mutex poisoned");
        guard.versions.push(version);
        Ok(())
    }

    fn current_version(&self) -> Result<Option<ConfigVersion>, StoreError> {
        let guard = self.state.lock().expect("config store mutex poisoned");
        Ok(guard.versions.last().cloned())
    }

    fn find_version(&self, id: &str) -> Result<Option<ConfigVersion>, StoreError> {
        let guard = self.state.lock().expect("config store mutex poisoned");
        Ok(guard.versions.iter().find(|version| version.id == id).cloned())
    }

    fn history(&self, limit: usize) -> Result<Vec<ConfigVersion>, StoreError> {
        let guard = self.state.lock().expect("config store mutex poisoned");
        Ok(guard.versions.iter().rev().take(limit).cloned().collect())
    }

    fn rules(&self) -> Result<Vec<ScoringRule>, StoreError> {
        let guard = self.state.lock().expect("config store mutex poisoned");
        Ok(guard.rules.clone())
    }

    fn replace_rules(&self, rules: Vec<ScoringRule>) -> Result<(), StoreError> {
        let mut guard = self.state.lock().expect("config store mutex poisoned");
        guard.rules = rules;
        Ok(())
    }
}
