use crate::e2e::helpers;

use capacity_access::app::AppComponents;
use chrono::Duration;
use helpers::{
    api_client::TestClient,
    assertions::{assert_payment_required, trial_remaining_seconds},
    failing_store::FailingProfileStore,
    TestContext,
};
use hyper::StatusCode;
use std::sync::Arc;
use test_context::test_context;
use uuid::Uuid;

const PAYMENT_REQUIRED: &str = "/accounts/payment-required/";
const PAYMENT_SELECTION: &str = "/accounts/payment-selection/";
const ACCOUNT: &str = "/accounts/account/";

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_let_anonymous_visitors_browse(ctx: &TestContext) {
    let response = ctx.client.get("/search").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert!(body.get("state").unwrap().is_null());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pass_perpetual_paid_users(ctx: &TestContext) {
    let profile = ctx.fixtures.create_paid_user("owner@example.com", None).await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.clock.advance(Duration::days(900));
    let response = ctx.client.get_with_auth("/search", &token).await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("full"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pass_staff_without_payment(ctx: &TestContext) {
    let profile = ctx
        .fixtures
        .create_used_trial_user("staff@example.com", ctx.now(), ctx.now())
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, true);

    ctx.clock.advance(Duration::days(10));
    let response = ctx.client.get_with_auth("/search", &token).await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("full"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_start_the_trial_on_first_gated_request(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx.fixtures.create_trial_user("trial@example.com").await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.clock.set(t0 + Duration::hours(1));
    let response = ctx.client.get_with_auth("/search", &token).await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("trial"));

    let stored = ctx.fixtures.profile(profile.user_id).await;
    assert_eq!(stored.trial_first_use, Some(t0 + Duration::hours(1)));

    ctx.clock.set(t0 + Duration::hours(2));
    let response = ctx
        .client
        .get_with_auth("/api/me/access", &token)
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("trial"));
    assert_eq!(
        trial_remaining_seconds(response.body.as_ref().unwrap()),
        Duration::hours(167).num_seconds()
    );

    // The first-use stamp is not moved by later requests
    let stored = ctx.fixtures.profile(profile.user_id).await;
    assert_eq!(stored.trial_first_use, Some(t0 + Duration::hours(1)));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_create_a_profile_for_unknown_users(ctx: &TestContext) {
    let user_id = Uuid::new_v4();
    let token = ctx.token_for(user_id, "new@example.com", false);

    let response = ctx.client.get_with_auth("/search", &token).await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("trial"));
    let stored = ctx.fixtures.profile(user_id).await;
    assert_eq!(stored.trial_window_start, Some(ctx.now()));
    assert_eq!(stored.trial_first_use, Some(ctx.now()));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_gate_a_second_identity_sharing_an_email(ctx: &TestContext) {
    let t0 = ctx.now();
    ctx.fixtures.create_trial_user("shared@example.com").await;
    let user_id = Uuid::new_v4();
    let token = ctx.token_for(user_id, "Shared@example.com", false);

    let response = ctx.client.get_with_auth("/search", &token).await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("trial"));
    let stored = ctx.fixtures.profile(user_id).await;
    assert_eq!(stored.trial_first_use, Some(t0));

    ctx.clock.set(t0 + Duration::hours(168) + Duration::seconds(1));
    ctx.client
        .get_with_auth("/search", &token)
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, PAYMENT_REQUIRED);

    let response = ctx.client.get_with_auth(ACCOUNT, &token).await.unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("trial_expired"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_redirect_expired_trials_to_payment_required(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx
        .fixtures
        .create_used_trial_user("trial@example.com", t0, t0 + Duration::hours(1))
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.clock
        .set(t0 + Duration::hours(1) + Duration::hours(168) + Duration::seconds(1));

    ctx.client
        .get_with_auth("/search", &token)
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, PAYMENT_REQUIRED);

    let response = ctx.client.get_with_auth("/api/search", &token).await.unwrap();
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    assert_payment_required(response.body.as_ref().unwrap(), PAYMENT_SELECTION);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_restore_the_trial_after_window_rollover(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx
        .fixtures
        .create_used_trial_user("trial@example.com", t0, t0 + Duration::hours(1))
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    let rollover = t0 + Duration::days(30) + Duration::seconds(1);
    ctx.clock.set(rollover);
    let response = ctx
        .client
        .get_with_auth("/api/me/access", &token)
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.str_field("state"), Some("trial"));
    assert_eq!(
        trial_remaining_seconds(response.body.as_ref().unwrap()),
        Duration::hours(168).num_seconds()
    );

    let stored = ctx.fixtures.profile(profile.user_id).await;
    assert_eq!(stored.trial_window_start, Some(rollover));
    assert_eq!(stored.trial_first_use, Some(rollover));

    ctx.clock.set(t0 + Duration::days(30) + Duration::hours(2));
    let response = ctx
        .client
        .get_with_auth("/api/me/access", &token)
        .await
        .unwrap();
    assert_eq!(
        trial_remaining_seconds(response.body.as_ref().unwrap()),
        (Duration::hours(168) - (Duration::hours(2) - Duration::seconds(1))).num_seconds()
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_send_lapsed_subscribers_to_the_account_page(ctx: &TestContext) {
    let profile = ctx
        .fixtures
        .create_paid_user("lapsed@example.com", Some(ctx.now() - Duration::seconds(1)))
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.client
        .get_with_auth("/search", &token)
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, ACCOUNT);

    // Public content is blocked too
    ctx.client
        .get_with_auth("/trades/", &token)
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, ACCOUNT);

    let response = ctx.client.get_with_auth("/api/search", &token).await.unwrap();
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    assert_payment_required(response.body.as_ref().unwrap(), ACCOUNT);

    // No trial is started for someone who has paid before
    let stored = ctx.fixtures.profile(profile.user_id).await;
    assert!(stored.trial_first_use.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_renewal_pages_open_for_lapsed_subscribers(ctx: &TestContext) {
    let profile = ctx
        .fixtures
        .create_paid_user("lapsed@example.com", Some(ctx.now() - Duration::days(3)))
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    for path in [ACCOUNT, PAYMENT_REQUIRED, PAYMENT_SELECTION] {
        ctx.client
            .get_with_auth(path, &token)
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_gate_public_pages_for_expired_trials(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx
        .fixtures
        .create_used_trial_user("trial@example.com", t0, t0)
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);
    ctx.clock.set(t0 + Duration::days(8));

    for path in ["/trades/", ACCOUNT, PAYMENT_REQUIRED, "/health"] {
        ctx.client
            .get_with_auth(path, &token)
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_gate_paths_that_only_share_a_public_name(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx
        .fixtures
        .create_used_trial_user("lookalike@example.com", t0, t0)
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.clock.set(t0 + Duration::hours(169));
    ctx.client
        .get_with_auth("/healthz-admin", &token)
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, PAYMENT_REQUIRED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_start_the_trial_on_public_pages(ctx: &TestContext) {
    let profile = ctx.fixtures.create_trial_user("browser@example.com").await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.client
        .get_with_auth("/trades/", &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let stored = ctx.fixtures.profile(profile.user_id).await;
    assert!(stored.trial_first_use.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_give_test_identities_the_short_trial(ctx: &TestContext) {
    let t0 = ctx.now();
    let profile = ctx
        .fixtures
        .create_used_trial_user(helpers::TEST_IDENTITY, t0, t0)
        .await;
    let token = ctx.token_for(profile.user_id, &profile.email, false);

    ctx.clock.set(t0 + Duration::minutes(4));
    ctx.client
        .get_with_auth("/search", &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    ctx.clock.set(t0 + Duration::minutes(5));
    ctx.client
        .get_with_auth("/search", &token)
        .await
        .unwrap()
        .assert_redirect(StatusCode::FOUND, PAYMENT_REQUIRED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_tokens(ctx: &TestContext) {
    let response = ctx
        .client
        .get_with_auth("/search", "not-a-jwt")
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_echo_the_request_id(ctx: &TestContext) {
    let response = ctx.client.get("/search").await.unwrap();

    response.assert_header_exists("x-request-id");
    let id = response.header("x-request-id").unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

async fn client_with_store(store: FailingProfileStore) -> TestClient {
    let components = AppComponents::new(
        helpers::test_config(),
        Arc::new(store),
        Arc::new(capacity_access::infrastructure::repositories::InMemoryEmailQueue::new()),
        Arc::new(helpers::FakePaymentGateway::default()),
        Arc::new(capacity_access::infrastructure::clock::ManualClock::new(helpers::t0())),
    );
    let base_url = helpers::spawn_app(components.router(helpers::content_routes())).await;
    TestClient::new(&base_url)
}

fn token(user_id: Uuid) -> String {
    capacity_access::domain::auth::JwtManager::new(helpers::JWT_SECRET.to_string(), 1)
        .generate_token(user_id, "someone@example.com", false)
        .unwrap()
}

#[tokio::test]
async fn it_should_fail_open_when_the_store_errors() {
    let client = client_with_store(FailingProfileStore::new()).await;
    let token = token(Uuid::new_v4());

    client
        .get_with_auth("/search", &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
    client
        .get_with_auth("/api/search", &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn it_should_fail_open_when_evaluation_exceeds_the_deadline() {
    let client = client_with_store(FailingProfileStore::slow(std::time::Duration::from_secs(10))).await;
    let token = token(Uuid::new_v4());

    let start = std::time::Instant::now();
    let response = client.get_with_auth("/search", &token).await.unwrap();

    response.assert_status(StatusCode::OK);
    assert!(start.elapsed() < std::time::Duration::from_secs(8));
}
