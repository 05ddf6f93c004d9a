use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::infra::InMemoryConfigStore;
use crate::scoring::domain::{RuleKind, RulePatch};
use crate::scoring::versioning::{RuleDraft, ScoringService, ScoringServiceError, StoreError};

fn service() -> ScoringService<InMemoryConfigStore> {
    ScoringService::new(Arc::new(InMemoryConfigStore::default()))
}

fn draft(name: &str, order: i32) -> RuleDraft {
    RuleDraft {
        name: name.to_string(),
        enabled: true,
        order,
        kind: RuleKind::Weight {
            field: "urgency".to_string(),
            weight: 50.0,
        },
    }
}

#[test]
fn missing_config_bootstraps_and_persists_the_baseline() {
    let service = service();

    let (config, rules) = service.current_snapshot().expect("bootstrap succeeds");

    assert_eq!(config, baseline());
    assert!(rules.is_empty());

    let history = service.history(10).expect("history readable");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].created_by, "bootstrap");
}

#[test]
fn save_round_trips_through_current_snapshot() {
    let service = service();
    let mut config = baseline();
    config.weights.insert("budget".to_string(), 10.0);
    config.enrichment.insert("provider".to_string(), json!("clearbit"));

    let version = service
        .save_config(config.clone(), "admin")
        .expect("valid config saves");

    let (current, _) = service.current_snapshot().expect("snapshot readable");
    assert_eq!(current, config);
    assert_eq!(version.created_by, "admin");
}

#[test]
fn invalid_config_saves_nothing_and_itemizes_errors() {
    let service = service();
    let mut config = baseline();
    config.weights.clear();
    config.bands.high.min = 0.0;

    match service.save_config(config, "admin") {
        Err(ScoringServiceError::Validation(errors)) => {
            assert!(errors.len() >= 2, "expected itemized errors, got {errors:?}");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    let history = service.history(10).expect("history readable");
    assert!(history.is_empty(), "no version may be written on failure");
}

#[test]
fn rollback_duplicates_the_snapshot_and_keeps_history_intact() {
    let service = service();
    let first = service
        .save_config(baseline(), "admin")
        .expect("first save");

    let mut second_config = baseline();
    second_config.weights.insert("budget".to_string(), 25.0);
    let second = service
        .save_config(second_config.clone(), "admin")
        .expect("second save");

    let restored = service
        .rollback(&first.id, "admin")
        .expect("rollback succeeds");

    assert_eq!(restored.config, first.config);
    assert_ne!(restored.id, first.id, "rollback appends a new version");

    let (current, _) = service.current_snapshot().expect("snapshot readable");
    assert_eq!(current, first.config);

    let history = service.history(10).expect("history readable");
    assert_eq!(history.len(), 3, "history is append-only");
    assert_eq!(history[0].id, restored.id);
    assert_eq!(history[1].id, second.id);
    assert_eq!(history[1].config, second_config);
    assert_eq!(history[2].id, first.id);
}

#[test]
fn rollback_to_unknown_version_mutates_nothing() {
    let service = service();
    service.save_config(baseline(), "admin").expect("save");

    match service.rollback("cfg-nope", "admin") {
        Err(ScoringServiceError::Store(StoreError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let history = service.history(10).expect("history readable");
    assert_eq!(history.len(), 1);
}

#[test]
fn history_limit_bounds_the_page_most_recent_first() {
    let service = service();
    for _ in 0..5 {
        service.save_config(baseline(), "admin").expect("save");
    }

    let history = service.history(2).expect("history readable");
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at >= history[1].created_at);
}

#[test]
fn rule_crud_assigns_ids_and_round_trips() {
    let service = service();

    let created = service.create_rule(draft("boost urgency", 3)).expect("create");
    assert!(created.id.starts_with("rule-"));

    let updated = service
        .update_rule(
            &created.id,
            RulePatch {
                enabled: Some(false),
                order: Some(7),
                ..RulePatch::default()
            },
        )
        .expect("update");
    assert!(!updated.enabled);
    assert_eq!(updated.order, 7);
    assert_eq!(updated.name, "boost urgency");

    service.delete_rule(&created.id).expect("delete");
    match service.delete_rule(&created.id) {
        Err(ScoringServiceError::Store(StoreError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn invalid_rule_drafts_are_rejected() {
    let service = service();
    let mut bad = draft("negative weight", 0);
    bad.kind = RuleKind::Weight {
        field: "urgency".to_string(),
        weight: -4.0,
    };

    match service.create_rule(bad) {
        Err(ScoringServiceError::Validation(errors)) => {
            assert!(errors.iter().any(|error| error.contains("non-negative")));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(service.current_snapshot().expect("snapshot").1.is_empty());
}

#[test]
fn reorder_reassigns_order_by_position() {
    let service = service();
    let first = service.create_rule(draft("first", 0)).expect("create");
    let second = service.create_rule(draft("second", 1)).expect("create");

    let reordered = service
        .reorder_rules(&[second.id.clone(), first.id.clone()])
        .expect("reorder");

    assert_eq!(reordered[0].id, second.id);
    assert_eq!(reordered[0].order, 0);
    assert_eq!(reordered[1].id, first.id);
    assert_eq!(reordered[1].order, 1);
}

#[test]
fn reorder_with_unknown_id_is_not_found_and_mutates_nothing() {
    let service = service();
    let rule = service.create_rule(draft("only", 0)).expect("create");

    match service.reorder_rules(&["rule-bogus".to_string()]) {
        Err(ScoringServiceError::Store(StoreError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let (_, rules) = service.current_snapshot().expect("snapshot");
    assert_eq!(rules[0].id, rule.id);
    assert_eq!(rules[0].order, 0, "failed reorder leaves order untouched");
}

#[test]
fn reorder_rejects_incomplete_or_duplicated_id_lists() {
    let service = service();
    let first = service.create_rule(draft("first", 0)).expect("create");
    let second = service.create_rule(draft("second", 1)).expect("create");

    match service.reorder_rules(&[]) {
        Err(ScoringServiceError::Validation(_)) => {}
        other => panic!("expected validation failure, got {other:?}"),
    }
    match service.reorder_rules(&[first.id.clone(), first.id.clone()]) {
        Err(ScoringServiceError::Validation(errors)) => {
            assert!(errors.iter().any(|error| error.contains("more than once")));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    let (_, rules) = service.current_snapshot().expect("snapshot");
    assert_eq!(rules[0].order, 0);
    assert_eq!(rules[1].id, second.id);
    assert_eq!(rules[1].order, 1);
}
