//! 可观测性集成测试
//!
//! 通过真实的 axum Router 验证请求 ID 与追踪中间件的行为，
//! 并确认在未安装 recorder 时记录指标是安全的。

use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
};
use tower::ServiceExt;

use pods_shared::observability::{
    metrics::{
        record_http_request, record_order_created, record_reconciliation_required,
        record_status_transition,
    },
    middleware::{REQUEST_ID_HEADER, RequestId, http_tracing, request_id},
};

async fn echo_request_id(Extension(id): Extension<RequestId>) -> String {
    id.as_str().to_string()
}

fn app() -> Router {
    Router::new()
        .route("/echo", get(echo_request_id))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .layer(middleware::from_fn(http_tracing))
        .layer(middleware::from_fn(request_id))
}

// ==================== 请求 ID ====================

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header(REQUEST_ID_HEADER, "req-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-abc");

    let body = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    assert_eq!(&body[..], b"req-abc");
}

#[tokio::test]
async fn test_request_id_is_generated_when_missing() {
    let response = app()
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&header).is_ok());
}

// ==================== 追踪中间件 ====================

#[tokio::test]
async fn test_tracing_keeps_response_status() {
    pods_shared::observability::tracing::init_for_tests();

    let response = app()
        .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

// ==================== 指标 ====================

#[test]
fn test_order_metrics_without_recorder() {
    record_http_request("POST", "/api/orders", 201, 0.03);
    record_http_request("PUT", "/api/orders/order-1/status", 400, 0.01);
    record_order_created("success", 0.03);
    record_order_created("rejected", 0.002);
    record_status_transition("pending", "cancelled", "restore");
    record_status_transition("cancelled", "pending", "reserve");
    record_reconciliation_required("customer_upsert");
}
