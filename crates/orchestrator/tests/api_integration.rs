//! Integration tests for the orchestrator HTTP surface.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::ServicePattern;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::Standalone;
use orchestrator::config::Config;
use rpc::RemoteError;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn test_config() -> Config {
    Config {
        rpc_retry_delay: Duration::from_millis(1),
        ..Config::default()
    }
}

fn setup() -> (axum::Router, Standalone) {
    let (orchestrator, standalone) = orchestrator::create_default_state(&test_config());
    let app = orchestrator::create_app(orchestrator, get_metrics_handle());
    (app, standalone)
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn new_doctor(email: &str) -> Value {
    json!({
        "idempotencyKey": "idem-1",
        "account": {
            "email": email,
            "password": "s3cret",
            "fullName": "Diana Prado"
        },
        "profile": {
            "degree": "MD",
            "specialtyIds": ["sp-cardiology"]
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["cache"]["status"], "up");
    assert_eq!(json["transport"]["status"], "up");
}

#[tokio::test]
async fn test_health_reports_cache_outage() {
    let (app, standalone) = setup();
    standalone.cache.set_unavailable(true).await;

    let (status, json) = post(&app, "/rpc/orchestrator.health.status", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["cache"]["status"], "down");
}

#[tokio::test]
async fn test_ping() {
    let (app, _) = setup();

    let (status, json) = post(&app, "/rpc/orchestrator.health.ping", Value::Null).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, "pong");
}

#[tokio::test]
async fn test_unknown_pattern_is_404() {
    let (app, _) = setup();

    let (status, json) = post(&app, "/rpc/orchestrator.doctor.delete", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["statusCode"], 404);
    assert_eq!(json["error"], "Not Found");
}

#[tokio::test]
async fn test_doctor_composite_then_cache_hit() {
    let (app, standalone) = setup();

    let (status, first) = post(
        &app,
        "/rpc/orchestrator.doctor.getComposite",
        json!({ "id": "d-ana" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], "d-ana");
    assert_eq!(first["account"]["fullName"], "Ana Lima");
    assert_eq!(first["specialties"][0]["name"], "Cardiology");
    assert!(standalone.cache.contains_key("doctors:d-ana").await);

    let calls_before = standalone.transport.total_calls();
    let (_, second) = post(
        &app,
        "/rpc/orchestrator.doctor.getComposite",
        json!({ "id": "d-ana" }),
    )
    .await;

    assert_eq!(second, first);
    assert_eq!(standalone.transport.total_calls(), calls_before);
}

#[tokio::test]
async fn test_missing_doctor_is_404() {
    let (app, standalone) = setup();

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.doctor.getComposite",
        json!({ "id": "d-nobody" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["statusCode"], 404);
    assert!(standalone.cache.is_empty().await);
}

#[tokio::test]
async fn test_doctor_list_composite_paginates() {
    let (app, _) = setup();

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.doctor.listComposite",
        json!({ "page": 1, "limit": 1 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert!(json["data"][0]["account"].is_object());
    assert_eq!(json["meta"]["total"], 2);
    assert_eq!(json["meta"]["totalPages"], 2);
    assert_eq!(json["meta"]["hasNext"], true);
    assert_eq!(json["meta"]["hasPrev"], false);
}

#[tokio::test]
async fn test_blog_list_composite_with_empty_body() {
    let (app, _) = setup();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/rpc/orchestrator.blog.listComposite")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let (status, json) = read(response).await;

    assert_eq!(status, StatusCode::OK);
    let posts = json["data"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p["author"].is_object()));
}

#[tokio::test]
async fn test_create_doctor_runs_saga_and_announces_it() {
    let (app, standalone) = setup();

    // Warm a doctor list page so the announcement has something to clear
    post(&app, "/rpc/orchestrator.doctor.listComposite", json!({})).await;
    assert!(!standalone.cache.is_empty().await);

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.doctor.create",
        new_doctor("diana@clinic.test"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["account"]["role"], "DOCTOR");
    assert_eq!(json["profile"]["staffAccountId"], json["accountId"]);
    assert_eq!(json["saga"]["state"], "COMPLETED");
    assert_eq!(json["saga"]["idempotencyKey"], "idem-1");
    assert_eq!(
        json["saga"]["executedSteps"],
        json!(["createAccount", "createProfile"])
    );

    let emitted = standalone.transport.emitted();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].0, "doctor.created");
    assert_eq!(emitted[0].1["id"], json["profileId"]);

    // The list page was invalidated locally
    assert!(standalone.cache.is_empty().await);
    assert_eq!(standalone.services.doctor_count(), 3);
}

#[tokio::test]
async fn test_create_doctor_failure_compensates_and_reports_saga_error() {
    let (app, standalone) = setup();

    // Unknown specialty makes the profile step fail after the account exists
    let mut command = new_doctor("eve@clinic.test");
    command["profile"]["specialtyIds"] = json!(["sp-unknown"]);

    let (status, json) = post(&app, "/rpc/orchestrator.doctor.create", command).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["statusCode"], 422);
    let details = &json["details"];
    assert_eq!(details["sagaError"], true);
    assert_eq!(details["step"], "createProfile");
    assert_eq!(details["executedSteps"], json!(["createAccount"]));
    assert_eq!(details["compensatedSteps"], json!(["createAccount"]));
    assert!(details["sagaId"].is_string());
    assert!(details["durationMs"].is_u64());
    assert_eq!(details["originalError"]["statusCode"], 422);

    // The account created by the first step was removed again
    assert_eq!(standalone.services.account_count(), 3);
    assert_eq!(
        standalone
            .transport
            .call_count(ServicePattern::StaffDelete),
        1
    );
    assert!(standalone.transport.emitted().is_empty());
}

#[tokio::test]
async fn test_create_doctor_with_taken_email_needs_no_compensation() {
    let (app, standalone) = setup();

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.doctor.create",
        new_doctor("ana@clinic.test"),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["details"]["step"], "createAccount");
    assert_eq!(json["details"]["executedSteps"], json!([]));
    assert_eq!(json["details"]["compensatedSteps"], json!([]));
    assert_eq!(
        standalone
            .transport
            .call_count(ServicePattern::StaffDelete),
        0
    );
}

#[tokio::test]
async fn test_invalid_create_payload_is_400() {
    let (app, standalone) = setup();

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.doctor.create",
        json!({ "account": { "email": "x@clinic.test" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["statusCode"], 400);
    assert_eq!(standalone.transport.total_calls(), 0);
}

#[tokio::test]
async fn test_enveloped_event_invalidates_composite() {
    let (app, standalone) = setup();
    post(
        &app,
        "/rpc/orchestrator.doctor.getComposite",
        json!({ "id": "d-ana" }),
    )
    .await;
    assert!(standalone.cache.contains_key("doctors:d-ana").await);

    let (status, json) = post(
        &app,
        "/events/doctor.updated",
        json!({ "timestamp": "2026-03-01T10:00:00Z", "data": { "id": "d-ana" } }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["event"], "doctor.updated");
    assert_eq!(json["removed"], 1);
    assert!(!standalone.cache.contains_key("doctors:d-ana").await);
}

#[tokio::test]
async fn test_bulk_asset_event_reports_targets() {
    let (app, _) = setup();

    let (status, json) = post(
        &app,
        "/events/assets.bulk.deleted",
        json!({ "assetIds": ["a1", "a2"], "entityType": "DOCTOR", "entityId": "d1" }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        json["invalidated"],
        json!([
            "assets:a1",
            "assets:a2",
            "assets:entity:DOCTOR:d1",
            "assets:list:*"
        ])
    );
}

#[tokio::test]
async fn test_event_with_cache_down_is_still_accepted() {
    let (app, standalone) = setup();
    standalone.cache.set_unavailable(true).await;

    let (status, json) = post(&app, "/events/staff.deleted", json!({ "id": "s-ana" })).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["removed"], 0);
    assert!(!json["failed"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_or_malformed_events_are_400() {
    let (app, _) = setup();

    let (status, _) = post(&app, "/events/invoice.paid", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = post(
        &app,
        "/events/assets.bulk.deleted",
        json!({ "assetIds": "a1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["statusCode"], 400);
}

#[tokio::test]
async fn test_manual_cache_invalidation() {
    let (app, standalone) = setup();
    post(&app, "/rpc/orchestrator.blog.listComposite", json!({})).await;
    post(&app, "/rpc/orchestrator.doctor.listComposite", json!({})).await;

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.cache.invalidate",
        json!({ "patterns": ["blogs:list:*"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);
    let keys = standalone.cache.keys().await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("doctors:list:"));
}

#[tokio::test]
async fn test_standalone_transport_journal_is_bounded() {
    let config = Config {
        journal_capacity: 2,
        ..test_config()
    };
    let (orchestrator, standalone) = orchestrator::create_default_state(&config);
    let app = orchestrator::create_app(orchestrator, get_metrics_handle());

    for _ in 0..5 {
        let (status, _) = post(
            &app,
            "/rpc/orchestrator.doctor.getComposite",
            json!({ "id": "d-ana" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        standalone.cache.clear().await;
    }

    assert_eq!(standalone.transport.total_calls(), 2);
}

#[tokio::test]
async fn test_malformed_invalidation_pattern_is_400() {
    let (app, standalone) = setup();
    post(&app, "/rpc/orchestrator.blog.listComposite", json!({})).await;

    let (status, json) = post(
        &app,
        "/rpc/orchestrator.cache.invalidate",
        json!({ "patterns": ["blogs:list:["] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["statusCode"], 400);
    assert_eq!(standalone.cache.keys().await.len(), 1);
}

#[tokio::test]
async fn test_upstream_outage_surfaces_as_503() {
    let (app, standalone) = setup();
    standalone
        .transport
        .register(ServicePattern::BlogList, |_| {
            Err(RemoteError::unavailable("content.blog.list", "content down"))
        });

    let (status, json) = post(&app, "/rpc/orchestrator.blog.listComposite", json!({})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["statusCode"], 503);
    // Three attempts before giving up
    assert_eq!(standalone.transport.call_count(ServicePattern::BlogList), 3);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    post(&app, "/rpc/orchestrator.health.ping", json!({})).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orchestrator_commands_total"));
}
