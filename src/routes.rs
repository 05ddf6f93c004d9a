use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::infra::AppState;
use crate::scoring::versioning::RuleDraft;
use crate::scoring::{
    BatchEvaluation, ConfigStore, ConfigVersion, RulePatch, ScoringConfig, ScoringResult,
    ScoringService, TestLead,
};

/// Actor recorded on API-driven config writes until authentication exists.
const API_ACTOR: &str = "api";

/// Shared handler state: the service plus route-level defaults.
pub struct RouterState<S> {
    pub service: Arc<ScoringService<S>>,
    pub history_limit: usize,
}

impl<S> Clone for RouterState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            history_limit: self.history_limit,
        }
    }
}

/// JSON body extractor whose rejection is the standard error envelope, so a
/// malformed request body is answered the same way every other failure is.
pub(crate) struct ApiJson<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Router exposing the scoring engine's HTTP operations.
pub fn scoring_router<S>(service: Arc<ScoringService<S>>, history_limit: usize) -> Router
where
    S: ConfigStore + 'static,
{
    let state = RouterState {
        service,
        history_limit,
    };

    Router::new()
        .route(
            "/api/v1/scoring/config",
            get(get_config_handler::<S>).post(save_config_handler::<S>),
        )
        .route(
            "/api/v1/scoring/config/history",
            get(history_handler::<S>),
        )
        .route(
            "/api/v1/scoring/config/rollback/:version_id",
            post(rollback_handler::<S>),
        )
        .route("/api/v1/scoring/rules", post(create_rule_handler::<S>))
        .route(
            "/api/v1/scoring/rules/reorder",
            post(reorder_rules_handler::<S>),
        )
        .route(
            "/api/v1/scoring/rules/:rule_id",
            put(update_rule_handler::<S>).delete(delete_rule_handler::<S>),
        )
        .route("/api/v1/scoring/test", post(test_handler::<S>))
        .route("/api/v1/scoring/test/batch", post(batch_test_handler::<S>))
        .with_state(state)
}

/// Attach the operational trio alongside the scoring routes.
pub fn with_scoring_routes<S>(service: Arc<ScoringService<S>>, history_limit: usize) -> Router
where
    S: ConfigStore + 'static,
{
    scoring_router(service, history_limit)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn get_config_handler<S>(
    State(state): State<RouterState<S>>,
) -> Result<Json<Value>, AppError>
where
    S: ConfigStore + 'static,
{
    let (config, rules) = state.service.current_snapshot()?;
    Ok(Json(json!({ "config": config, "rules": rules })))
}

pub(crate) async fn save_config_handler<S>(
    State(state): State<RouterState<S>>,
    ApiJson(config): ApiJson<ScoringConfig>,
) -> Result<Json<Value>, AppError>
where
    S: ConfigStore + 'static,
{
    let version = state.service.save_config(config, API_ACTOR)?;
    Ok(Json(json!({
        "config": version.config,
        "message": format!("configuration saved as version {}", version.id),
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    limit: Option<usize>,
}

pub(crate) async fn history_handler<S>(
    State(state): State<RouterState<S>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ConfigVersion>>, AppError>
where
    S: ConfigStore + 'static,
{
    let limit = query.limit.unwrap_or(state.history_limit);
    Ok(Json(state.service.history(limit)?))
}

pub(crate) async fn rollback_handler<S>(
    State(state): State<RouterState<S>>,
    Path(version_id): Path<String>,
) -> Result<Json<Value>, AppError>
where
    S: ConfigStore + 'static,
{
    let version = state.service.rollback(&version_id, API_ACTOR)?;
    Ok(Json(json!({
        "config": version.config,
        "message": format!("rolled back to {version_id} as version {}", version.id),
    })))
}

pub(crate) async fn create_rule_handler<S>(
    State(state): State<RouterState<S>>,
    ApiJson(draft): ApiJson<RuleDraft>,
) -> Result<impl IntoResponse, AppError>
where
    S: ConfigStore + 'static,
{
    let rule = state.service.create_rule(draft)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub(crate) async fn update_rule_handler<S>(
    State(state): State<RouterState<S>>,
    Path(rule_id): Path<String>,
    ApiJson(patch): ApiJson<RulePatch>,
) -> Result<Json<crate::scoring::ScoringRule>, AppError>
where
    S: ConfigStore + 'static,
{
    Ok(Json(state.service.update_rule(&rule_id, patch)?))
}

pub(crate) async fn delete_rule_handler<S>(
    State(state): State<RouterState<S>>,
    Path(rule_id): Path<String>,
) -> Result<Json<Value>, AppError>
where
    S: ConfigStore + 'static,
{
    state.service.delete_rule(&rule_id)?;
    Ok(Json(json!({ "message": format!("rule {rule_id} deleted") })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    ids: Vec<String>,
}

pub(crate) async fn reorder_rules_handler<S>(
    State(state): State<RouterState<S>>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<crate::scoring::ScoringRule>>, AppError>
where
    S: ConfigStore + 'static,
{
    Ok(Json(state.service.reorder_rules(&request.ids)?))
}

pub(crate) async fn test_handler<S>(
    State(state): State<RouterState<S>>,
    ApiJson(lead): ApiJson<TestLead>,
) -> Result<Json<ScoringResult>, AppError>
where
    S: ConfigStore + 'static,
{
    Ok(Json(state.service.test_lead(&lead)?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchTestRequest {
    leads: Vec<TestLead>,
}

pub(crate) async fn batch_test_handler<S>(
    State(state): State<RouterState<S>>,
    ApiJson(request): ApiJson<BatchTestRequest>,
) -> Result<Json<Vec<BatchEvaluation>>, AppError>
where
    S: ConfigStore + 'static,
{
    Ok(Json(state.service.batch_test(&request.leads)?))
}
