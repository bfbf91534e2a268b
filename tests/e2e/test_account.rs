use crate::e2e::helpers;

use capacity_access::{
    app::AppComponents,
    infrastructure::{clock::ManualClock, repositories::{InMemoryEmailQueue, InMemoryProfileStore}},
};
use chrono::Duration;
use helpers::{
    api_client::TestClient,
    assertions::{assert_access_summary, trial_remaining_seconds},
    TestContext,
};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use test_context::test_context;
use uuid::Uuid;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_auth_for_account_summary(ctx: &TestContext) {
    let response = ctx.client.get("/accounts/account/").await.unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_error_message("Authentication required");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_summarize_an_unused_trial(ctx: &TestContext) {
    let profile = ctx.fixtures.create_trial_user("trial@example.com").await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    let response = ctx
        .client
        .get_with_auth("/accounts/account/", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_access_summary(body, "trial");
    assert_eq!(trial_remaining_seconds(body), Duration::hours(168).num_seconds());
    assert!(body.get("message").unwrap().is_null());
    assert!(body.get("subscription_type").unwrap().is_null());

    // Viewing the account page does not start the trial clock
    let stored = ctx.fixtures.profile(profile.user_id).await;
    assert!(stored.trial_first_use.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_summarize_paid_access(ctx: &TestContext) {
    let expiry = ctx.now() + Duration::days(200);
    let profile = ctx.fixtures.create_paid_user("paid@example.com", Some(expiry)).await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    let response = ctx
        .client
        .get_with_auth("/api/me/access", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_access_summary(body, "full");
    assert_eq!(body.get("can_view_map"), Some(&json!(true)));
    assert_eq!(response.str_field("payment_amount"), Some("5.00"));
    assert_eq!(response.str_field("subscription_type"), Some("yearly subscription"));
    assert_eq!(response.str_field("email"), Some("paid@example.com"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_point_expired_trials_at_the_offer(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx
        .fixtures
        .create_used_trial_user("trial@example.com", t0, t0)
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);
    ctx.clock.set(t0 + Duration::days(7) + Duration::seconds(1));

    let response = ctx
        .client
        .get_with_auth("/accounts/account/", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_access_summary(body, "trial_expired");
    assert_eq!(trial_remaining_seconds(body), 0);
    let message = body.get("message").unwrap();
    assert_eq!(
        message.get("url").and_then(|v| v.as_str()),
        Some("/accounts/payment-selection/")
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_describe_the_payment_offer(ctx: &TestContext) {
    let response = ctx.client.get("/accounts/payment-selection/").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("price_id"), Some(helpers::PRICE_ID));
    assert_eq!(
        response.str_field("initiate_url"),
        Some("/accounts/initiate-payment/")
    );
    assert_eq!(response.str_field("subscription_type"), Some("yearly subscription"));
    assert!(response.body.as_ref().unwrap().get("state").unwrap().is_null());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_tailor_the_offer_to_test_identities(ctx: &TestContext) {
    let profile = ctx.fixtures.create_trial_user(helpers::TEST_IDENTITY).await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    let response = ctx
        .client
        .get_with_auth("/accounts/payment-required/", &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.str_field("subscription_type"),
        Some("5-minute testing subscription")
    );
    assert_eq!(response.str_field("state"), Some("trial"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_open_a_checkout_session(ctx: &TestContext) {
    let profile = ctx.fixtures.create_trial_user("buyer@example.com").await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    let response = ctx
        .client
        .post_with_auth("/accounts/initiate-payment/", &json!({}), &token)
        .await
        .unwrap();

    response.assert_redirect(StatusCode::SEE_OTHER, helpers::CHECKOUT_URL);

    let checkouts = ctx.gateway.checkouts.lock().clone();
    assert_eq!(checkouts.len(), 1);
    let request = &checkouts[0];
    assert_eq!(request.price_id, helpers::PRICE_ID);
    assert_eq!(request.user_id, profile.user_id);
    assert_eq!(request.access_level, "full");
    assert_eq!(request.customer_email, "buyer@example.com");
    assert_eq!(
        request.success_url,
        "https://capacity.test/accounts/account/?payment=success"
    );
    assert_eq!(
        request.cancel_url,
        "https://capacity.test/accounts/payment-selection/"
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_send_get_requests_back_to_the_offer(ctx: &TestContext) {
    ctx.client
        .get("/accounts/initiate-payment/")
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, "/accounts/payment-selection/");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_auth_to_start_checkout(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/accounts/initiate-payment/", &json!({}))
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(ctx.gateway.checkouts.lock().is_empty());
}

#[tokio::test]
async fn it_should_fail_checkout_without_a_configured_price() {
    let mut config = helpers::test_config();
    config.stripe_yearly_price_id = None;
    let gateway = Arc::new(helpers::FakePaymentGateway::default());
    let components = AppComponents::new(
        config,
        Arc::new(InMemoryProfileStore::new()),
        Arc::new(InMemoryEmailQueue::new()),
        gateway.clone(),
        Arc::new(ManualClock::new(helpers::t0())),
    );
    let client = TestClient::new(
        &helpers::spawn_app(components.router(helpers::content_routes())).await,
    );

    let token = components
        .jwt_manager
        .generate_token(Uuid::new_v4(), "buyer@example.com", false)
        .unwrap();
    let response = client
        .post_with_auth("/accounts/initiate-payment/", &json!({}), &token)
        .await
        .unwrap();

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(gateway.checkouts.lock().is_empty());
}
