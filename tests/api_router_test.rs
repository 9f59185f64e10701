mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use campus_rental_api::app_router;

use common::{seed_item, setup_state};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let state = setup_state().await;
    let app = app_router(state, CorsLayer::permissive());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn public_catalog_and_application_flow() {
    let state = setup_state().await;
    let item = seed_item(&state, "projector", 10, dec!(12.50)).await;
    let app = app_router(state, CorsLayer::permissive());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/items")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["name"], "projector");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            json!({
                "applicant_name": "Ada",
                "student_id": "2024-001",
                "phone": "555-0100",
                "rental_date": "2024-06-01",
                "return_date": "2024-06-08",
                "items": [{ "item_id": item.id, "quantity": 4 }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "pending");
    // the store may normalize decimal scale, so compare values not strings
    let total_amount: rust_decimal::Decimal = created["total_amount"]
        .as_str()
        .expect("total_amount is serialized as a string")
        .parse()
        .unwrap();
    assert_eq!(total_amount, dec!(80));

    // the reservation is visible through the public catalog
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/items/{}", item.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let fetched = body_json(response).await;
    assert_eq!(fetched["current_stock"], 6);
}

#[tokio::test]
async fn validation_failure_maps_to_bad_request() {
    let state = setup_state().await;
    let app = app_router(state, CorsLayer::permissive());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/applications",
            json!({
                "applicant_name": "",
                "student_id": "2024-001",
                "phone": "555-0100",
                "rental_date": "2024-06-01",
                "return_date": "2024-06-08",
                "items": []
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn admin_surface_requires_a_token() {
    let state = setup_state().await;
    let app = app_router(state, CorsLayer::permissive());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/applications")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_browse_the_admin_queue() {
    let state = setup_state().await;
    let app = app_router(state, CorsLayer::permissive());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "admin_id": "admin", "admin_secret": "admin-secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let token = login["access_token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/applications")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let queue = body_json(response).await;
    assert_eq!(queue["total"], 0);
}

#[tokio::test]
async fn wrong_admin_credentials_are_rejected() {
    let state = setup_state().await;
    let app = app_router(state, CorsLayer::permissive());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "admin_id": "admin", "admin_secret": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
