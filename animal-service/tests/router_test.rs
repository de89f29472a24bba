//! In-process router tests. None of these need a running MongoDB: the client
//! points at an unreachable address and the readiness signal is driven by hand.

use animal_service::config::{AnimalConfig, MongoConfig};
use animal_service::services::AnimalDb;
use animal_service::startup::{build_router, AppState, HEALTH_PATH, METRICS_PATH};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use service_core::middleware::readiness::ConnectionState;
use service_core::middleware::tracing::REQUEST_ID_HEADER;
use std::time::Duration;
use tower::util::ServiceExt;

const UNREACHABLE_MONGO: &str = "mongodb://127.0.0.1:1/animals?serverSelectionTimeoutMS=100";

async fn state(breeds_enabled: bool) -> AppState {
    let config = AnimalConfig {
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
            otel_exporter_otlp_endpoint: None,
        },
        mongodb: MongoConfig {
            url: Secret::new(UNREACHABLE_MONGO.to_string()),
            database: None,
            probe_interval: Duration::from_secs(5),
        },
        breeds_enabled,
    };
    let db = AnimalDb::connect(&config.mongodb)
        .await
        .expect("Failed to build MongoDB client");
    AppState::new(config, db)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn every_api_route_is_unavailable_until_connected() {
    let state = state(true).await;
    assert_eq!(state.db.readiness().state(), ConnectionState::Connecting);
    let app = build_router(state);

    for uri in ["/", "/Sixten", "/animals/cats", "/NonexistentName", "/a/b/c"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(body, serde_json::json!({ "error": "Service unavailable" }), "{uri}");
    }
}

#[tokio::test]
async fn disconnected_database_is_also_unavailable() {
    let state = state(false).await;
    state.db.readiness().set(ConnectionState::Disconnected);
    let (status, body) = get(build_router(state), "/").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service unavailable");
}

#[tokio::test]
async fn health_is_served_while_database_is_down() {
    let app = build_router(state(false).await);
    let (status, body) = get(app, HEALTH_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "animal-service");
    assert_eq!(body["database"], "connecting");
}

#[tokio::test]
async fn metrics_are_served_while_database_is_down() {
    let app = build_router(state(false).await);
    let response = app
        .oneshot(Request::builder().uri(METRICS_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_metrics_names_are_ordinary_animal_lookups() {
    let state = state(false).await;
    let app = build_router(state.clone());

    for uri in ["/health", "/metrics"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(body, serde_json::json!({ "error": "Service unavailable" }), "{uri}");
    }

    // Once connected they reach the name lookup, which fails on the dead database.
    state.db.readiness().set(ConnectionState::Connected);
    for uri in ["/health", "/metrics"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, serde_json::json!({ "error": "Database error" }), "{uri}");
    }
}

#[tokio::test]
async fn undecodable_names_are_rejected_before_touching_the_database() {
    let state = state(false).await;
    state.db.readiness().set(ConnectionState::Connected);
    let (status, body) = get(build_router(state), "/%FF%FE").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "Invalid animal name" }));
}

#[tokio::test]
async fn unusual_names_still_go_to_the_lookup() {
    let state = state(false).await;
    state.db.readiness().set(ConnectionState::Connected);
    let app = build_router(state);

    let long_name = format!("/{}", "a".repeat(101));
    for uri in [long_name.as_str(), "/%20%20", "/Six%0Aten"] {
        let (status, body) = get(app.clone(), uri).await;
        // The lookup runs (and fails on the dead database) instead of a 400.
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, serde_json::json!({ "error": "Database error" }), "{uri}");
    }
}

#[tokio::test]
async fn database_failures_are_server_errors_not_bad_requests() {
    let state = state(false).await;
    state.db.readiness().set(ConnectionState::Connected);
    let (status, body) = get(build_router(state), "/Sixten").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "Database error" }));
}

#[tokio::test]
async fn cats_route_only_exists_with_breeds_enabled() {
    let without = state(false).await;
    without.db.readiness().set(ConnectionState::Connected);
    let (status, body) = get(build_router(without), "/animals/cats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "error": "Not found" }));

    // With breeds on, the literal route is reached (and fails on the dead database).
    let with = state(true).await;
    with.db.readiness().set(ConnectionState::Connected);
    let (status, body) = get(build_router(with), "/animals/cats").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn responses_carry_request_id_and_cors_headers() {
    let app = build_router(state(false).await);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
