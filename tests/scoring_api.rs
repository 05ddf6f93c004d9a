use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use leadscore::infra::InMemoryConfigStore;
use leadscore::routes::scoring_router;
use leadscore::scoring::ScoringService;

fn app() -> Router {
    let store = Arc::new(InMemoryConfigStore::default());
    let service = Arc::new(ScoringService::new(store));
    scoring_router(service, 20)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[tokio::test]
async fn get_config_bootstraps_the_documented_default() {
    let app = app();

    let response = app
        .oneshot(get_request("/api/v1/scoring/config"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["config"]["weights"]["urgency"], json!(30.0));
    assert_eq!(body["config"]["bands"]["high"]["min"], json!(75.0));
    assert_eq!(body["rules"], json!([]));
}

#[tokio::test]
async fn saving_an_invalid_config_returns_the_error_envelope() {
    let app = app();
    let payload = json!({
        "weights": {},
        "bands": {
            "low": { "min": 0, "max": 44 },
            "medium": { "min": 45, "max": 74 },
            "high": { "min": 75, "max": 100 }
        }
    });

    let response = app
        .oneshot(json_request("POST", "/api/v1/scoring/config", payload))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_FAILED"));
    assert!(body["error"]["details"]
        .as_array()
        .expect("itemized details")
        .iter()
        .any(|detail| detail.as_str().unwrap_or_default().contains("weights")));
}

#[tokio::test]
async fn save_then_get_round_trips_the_config() {
    let app = app();
    let payload = json!({
        "weights": { "urgency": 20, "engagement": 50, "jobRole": 30 },
        "bands": {
            "low": { "min": 0, "max": 39 },
            "medium": { "min": 40, "max": 69 },
            "high": { "min": 70, "max": 100 }
        },
        "negative": [],
        "enrichment": {}
    });

    let save = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/scoring/config", payload.clone()))
        .await
        .expect("router responds");
    assert_eq!(save.status(), StatusCode::OK);

    let get = app
        .oneshot(get_request("/api/v1/scoring/config"))
        .await
        .expect("router responds");
    let body = read_json(get).await;
    assert_eq!(body["config"]["weights"]["engagement"], json!(50.0));
    assert_eq!(body["config"]["bands"]["high"]["min"], json!(70.0));
}

#[tokio::test]
async fn test_endpoint_scores_a_lead_with_trace_and_band() {
    let app = app();
    let payload = json!({
        "email": "casey@example.com",
        "source": "webinar",
        "fields": { "urgency": 100, "engagement": 100, "jobRole": 100 }
    });

    let response = app
        .oneshot(json_request("POST", "/api/v1/scoring/test", payload))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["score"], json!(100.0));
    assert_eq!(body["band"], json!("HIGH"));
    assert_eq!(body["trace"][0]["step"], json!("Base Score"));
}

#[tokio::test]
async fn malformed_request_bodies_get_the_error_envelope() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/scoring/test")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .expect("request builds");

    let response = app.oneshot(request).await.expect("router responds");

    assert!(response.status().is_client_error());
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("BAD_PAYLOAD"));
    assert!(body["error"]["message"]
        .as_str()
        .expect("message present")
        .contains("invalid request body"));
}

#[tokio::test]
async fn batch_endpoint_returns_one_result_per_lead_in_order() {
    let app = app();
    let payload = json!({
        "leads": [
            { "fields": { "urgency": 100, "engagement": 100, "jobRole": 100 } },
            { "fields": { "urgency": 0, "engagement": 0, "jobRole": 0 } },
            { "fields": { "urgency": 50, "engagement": 50, "jobRole": 50 } }
        ]
    });

    let response = app
        .oneshot(json_request("POST", "/api/v1/scoring/test/batch", payload))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let results = body.as_array().expect("array of results");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["scoring"]["score"], json!(100.0));
    assert_eq!(results[1]["scoring"]["score"], json!(0.0));
    assert_eq!(results[2]["scoring"]["score"], json!(50.0));
}

#[tokio::test]
async fn rule_lifecycle_create_update_reorder_delete() {
    let app = app();

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/scoring/rules",
            json!({
                "name": "big budget boost",
                "order": 0,
                "type": "IF_THEN",
                "conditions": [
                    { "field": "fields.budget", "operator": "greater_than", "value": 10000 }
                ],
                "then": { "add": 15 }
            }),
        ))
        .await
        .expect("router responds");
    assert_eq!(created.status(), StatusCode::CREATED);
    let rule = read_json(created).await;
    let rule_id = rule["id"].as_str().expect("rule id").to_string();

    let updated = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/scoring/rules/{rule_id}"),
            json!({ "enabled": false }),
        ))
        .await
        .expect("router responds");
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(read_json(updated).await["enabled"], json!(false));

    let reordered = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/scoring/rules/reorder",
            json!({ "ids": [rule_id] }),
        ))
        .await
        .expect("router responds");
    assert_eq!(reordered.status(), StatusCode::OK);

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/scoring/rules/{rule_id}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(deleted.status(), StatusCode::OK);

    let missing = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/scoring/rules/{rule_id}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = read_json(missing).await;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn rollback_restores_an_earlier_version_and_appends_history() {
    let app = app();

    // bootstrap the baseline as the first version
    app.clone()
        .oneshot(get_request("/api/v1/scoring/config"))
        .await
        .expect("router responds");

    let history = read_json(
        app.clone()
            .oneshot(get_request("/api/v1/scoring/config/history?limit=10"))
            .await
            .expect("router responds"),
    )
    .await;
    let first_id = history[0]["id"].as_str().expect("version id").to_string();

    let changed = json!({
        "weights": { "urgency": 100 },
        "bands": {
            "low": { "min": 0, "max": 44 },
            "medium": { "min": 45, "max": 74 },
            "high": { "min": 75, "max": 100 }
        }
    });
    app.clone()
        .oneshot(json_request("POST", "/api/v1/scoring/config", changed))
        .await
        .expect("router responds");

    let rollback = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/scoring/config/rollback/{first_id}"),
            json!({}),
        ))
        .await
        .expect("router responds");
    assert_eq!(rollback.status(), StatusCode::OK);
    let body = read_json(rollback).await;
    assert_eq!(body["config"]["weights"]["engagement"], json!(40.0));

    let history = read_json(
        app.clone()
            .oneshot(get_request("/api/v1/scoring/config/history?limit=10"))
            .await
            .expect("router responds"),
    )
    .await;
    assert_eq!(history.as_array().expect("history array").len(), 3);

    let missing = app
        .oneshot(json_request(
            "POST",
            "/api/v1/scoring/config/rollback/cfg-missing",
            json!({}),
        ))
        .await
        .expect("router responds");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
