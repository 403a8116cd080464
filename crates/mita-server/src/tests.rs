//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use mita_core::{
    test_utils::MockBackendServer, DataClient, DataSnapshot, EngineConfig, MockDataSource,
};
use tower::ServiceExt;

fn engine() -> RecommendationEngine {
    RecommendationEngine::new(EngineConfig::embedded().unwrap())
}

fn setup_test_app() -> Router {
    create_router(engine(), ServerConfig::default())
}

fn setup_app_with_source(source: DataClient) -> Router {
    create_router(engine().with_source(source), ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn middle_budget() -> serde_json::Value {
    serde_json::json!({
        "housing": 900.0,
        "food": 450.0,
        "transportation": 300.0,
        "entertainment": 300.0,
        "savings": 600.0,
        "other": 450.0
    })
}

fn mid_month_spent() -> serde_json::Value {
    serde_json::json!({
        "housing": 450.0,
        "food": 400.0,
        "transportation": 150.0,
        "entertainment": 30.0,
        "savings": 300.0,
        "other": 225.0
    })
}

// ========== Health API Tests ==========

#[tokio::test]
async fn test_health_without_collaborator() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["collaborator"].is_null());
}

#[tokio::test]
async fn test_health_reports_unreachable_collaborator() {
    let app = setup_app_with_source(DataClient::Mock(MockDataSource::unavailable()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Degraded collaborator never makes the engine unhealthy
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["collaborator"]["available"], false);
}

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store");
}

// ========== Allocation API Tests ==========

#[tokio::test]
async fn test_allocate_middle_income() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/allocate",
            serde_json::json!({"monthly_income": 3000.0, "tier": "middle"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["tier"], "middle");
    assert_eq!(json["allocation"]["housing"], 900.0);
    assert_eq!(json["allocation"]["savings"], 600.0);
    assert!((json["total"].as_f64().unwrap() - 3000.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_allocate_classifies_income_when_tier_omitted() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/allocate",
            serde_json::json!({"monthly_income": 2500.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["tier"], "low");
}

#[tokio::test]
async fn test_allocate_rejects_non_positive_income() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/allocate",
            serde_json::json!({"monthly_income": 0.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Invalid input"));
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/allocate",
            serde_json::json!({"income": "lots"}),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// ========== Recommendation API Tests ==========

#[tokio::test]
async fn test_recommend_without_collaborator_data() {
    let app = setup_app_with_source(DataClient::Mock(MockDataSource::unavailable()));

    let response = app
        .oneshot(post_json(
            "/api/budget/recommend",
            serde_json::json!({"monthly_income": 2500.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["income_tier"], "low");
    assert_eq!(json["confidence"], 0.5);
    assert!((json["total_allocated"].as_f64().unwrap() - 2500.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_recommend_through_http_backend() {
    let data = DataSnapshot {
        profile: Some(mita_core::UserProfile {
            location: Some("Seattle, WA".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let server = MockBackendServer::start(data).await;
    let app = setup_app_with_source(DataClient::http(&server.url(), None));

    let response = app
        .oneshot(post_json(
            "/api/budget/recommend",
            serde_json::json!({"monthly_income": 6000.0, "goals": ["emergency_fund"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    // Only the profile is served
    assert!((json["confidence"].as_f64().unwrap() - 0.6).abs() < 1e-9);
    assert!((json["total_allocated"].as_f64().unwrap() - 6000.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_recommend_rejects_negative_income() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/recommend",
            serde_json::json!({"monthly_income": -100.0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Velocity API Tests ==========

#[tokio::test]
async fn test_velocity_on_track() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/velocity",
            serde_json::json!({
                "budget": {"entertainment": 300.0},
                "spent": {"entertainment": 150.0},
                "remaining_days": 15
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let record = &json["entertainment"];
    assert_eq!(record["velocity"], 1.0);
    assert_eq!(record["needs_adjustment"], false);
    assert_eq!(record["reason"], "on_track");
    assert_eq!(record["urgency"], "low");
}

#[tokio::test]
async fn test_velocity_uses_calendar_month_for_as_of() {
    let app = setup_test_app();

    // February 2024 has 29 days; 10 days in, 290 spent projects 841
    let response = app
        .oneshot(post_json(
            "/api/budget/velocity",
            serde_json::json!({
                "budget": {"food": 290.0},
                "spent": {"food": 290.0},
                "as_of": "2024-02-10"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let record = &json["food"];
    assert!((record["velocity"].as_f64().unwrap() - 2.9).abs() < 1e-9);
    assert_eq!(record["reason"], "significantly_over_budget");
    assert_eq!(record["urgency"], "high");
}

#[tokio::test]
async fn test_velocity_requires_period() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/velocity",
            serde_json::json!({"budget": {"food": 300.0}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_velocity_rejects_remaining_beyond_period() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/velocity",
            serde_json::json!({"budget": {"food": 300.0}, "remaining_days": 45}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("30"));
}

#[tokio::test]
async fn test_velocity_rejects_negative_spending() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/velocity",
            serde_json::json!({
                "budget": {"food": 300.0},
                "spent": {"food": -1.0},
                "remaining_days": 10
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Redistribution API Tests ==========

#[tokio::test]
async fn test_redistribute_mid_month() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/redistribute",
            serde_json::json!({
                "monthly_income": 3000.0,
                "budget": middle_budget(),
                "spent": mid_month_spent(),
                "remaining_days": 15
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["velocity"].as_object().unwrap().len(), 6);

    let plan = &json["plan"];
    let flagged: Vec<&str> = plan["adjustments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["category"].as_str().unwrap())
        .collect();
    assert_eq!(flagged, vec!["entertainment", "food"]);
    assert_eq!(plan["implementation_steps"].as_array().unwrap().len(), 5);

    let transfers = plan["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0]["from"], "entertainment");
    assert_eq!(transfers[0]["to"], "food");
    assert!((transfers[0]["amount"].as_f64().unwrap() - 117.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_redistribute_start_of_month_is_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/redistribute",
            serde_json::json!({
                "monthly_income": 3000.0,
                "budget": middle_budget(),
                "remaining_days": 30
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let plan = &json["plan"];
    assert!(plan["adjustments"].as_array().unwrap().is_empty());
    assert!(plan["implementation_steps"].as_array().unwrap().is_empty());
    assert_eq!(plan["confidence"], 0.0);
}

#[tokio::test]
async fn test_redistribute_rejects_invalid_income() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/redistribute",
            serde_json::json!({
                "monthly_income": 0.0,
                "budget": middle_budget(),
                "remaining_days": 15
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Daily Calendar API Tests ==========

#[tokio::test]
async fn test_daily_calendar_for_month() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/daily",
            serde_json::json!({"budget": middle_budget(), "year": 2024, "month": 6}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let days = json["days"].as_array().unwrap();
    assert_eq!(days.len(), 30);
    assert_eq!(days[0]["date"], "2024-06-01");
    assert!((days[0]["total"].as_f64().unwrap() - 100.0).abs() < 1e-9);
    assert!(json.get("remaining").is_none());
}

#[tokio::test]
async fn test_daily_remaining_budget() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/daily",
            serde_json::json!({
                "budget": middle_budget(),
                "as_of": "2024-06-21",
                "spent": {"food": 350.0}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    // 100 left over 10 days including today
    let food = json["remaining"]["categories"]["food"].as_f64().unwrap();
    assert!((food - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_daily_rejects_invalid_month() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/budget/daily",
            serde_json::json!({"budget": middle_budget(), "year": 2024, "month": 13}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_limit_comes_from_config() {
    let config = ServerConfig {
        max_categories: 2,
        ..ServerConfig::default()
    };
    let app = create_router(engine(), config);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/budget/velocity",
            serde_json::json!({"budget": middle_budget(), "remaining_days": 15}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("at most 2"));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/budget/daily",
            serde_json::json!({"budget": middle_budget(), "year": 2024, "month": 6}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/budget/daily",
            serde_json::json!({"budget": {"food": 300.0}, "year": 2024, "month": 6}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
