use crate::e2e::helpers;

use capacity_access::app::AppComponents;
use helpers::{failing_store::FailingProfileStore, TestContext};
use hyper::StatusCode;
use std::sync::Arc;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Health endpoint returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ready_status(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("status"), Some("ready"));
    assert_eq!(response.str_field("database"), Some("connected"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_health_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/health/ready").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_handle_concurrent_health_checks(ctx: &TestContext) {
    let mut futures = Vec::new();
    for _ in 0..10 {
        let client = ctx.client.clone();
        futures.push(async move { client.get("/health").await });
    }

    let results = futures::future::join_all(futures).await;

    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
    }
}

#[tokio::test]
async fn it_should_report_not_ready_when_store_is_unreachable() {
    let components = AppComponents::new(
        helpers::test_config(),
        Arc::new(FailingProfileStore::new()),
        Arc::new(capacity_access::infrastructure::repositories::InMemoryEmailQueue::new()),
        Arc::new(helpers::FakePaymentGateway::default()),
        Arc::new(capacity_access::infrastructure::clock::ManualClock::new(helpers::t0())),
    );
    let base_url = helpers::spawn_app(components.router(helpers::content_routes())).await;
    let client = helpers::api_client::TestClient::new(&base_url);

    let response = client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.str_field("database"), Some("disconnected"));

    // Liveness does not touch the store
    client.get("/health").await.unwrap().assert_status(StatusCode::OK);
}
