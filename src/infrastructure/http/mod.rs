pub mod routes;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    app::AppComponents,
    controllers::{
        account::AccountController, health, payment::PaymentController,
        webhook::WebhookController,
    },
    infrastructure::auth::{access_gate_middleware, auth_middleware, request_id_middleware},
};

/// Builds the full router. `content` carries the gated pages served next to
/// the access core; every route goes through identity extraction and the
/// access gate.
pub fn build_router(components: &AppComponents, content: Router) -> Router {
    // Health routes
    let health_routes = Router::new()
        .route(routes::HEALTH_PATH, get(health::health))
        .route(routes::HEALTH_READY_PATH, get(health::health_ready))
        .with_state(components.store.clone());

    // Account and payment offer routes
    let account_routes = Router::new()
        .route(routes::ACCOUNT_PATH, get(AccountController::get_account))
        .route(routes::ACCESS_STATUS_PATH, get(AccountController::get_access))
        .route(
            routes::PAYMENT_REQUIRED_PATH,
            get(AccountController::payment_required),
        )
        .route(
            routes::PAYMENT_SELECTION_PATH,
            get(AccountController::payment_selection),
        )
        .with_state(components.account_controller.clone());

    // Checkout initiation
    let payment_routes = Router::new()
        .route(
            routes::INITIATE_PAYMENT_PATH,
            post(PaymentController::initiate).get(PaymentController::initiate_get),
        )
        .with_state(components.payment_controller.clone());

    // Payment processor webhooks (public, signed)
    let webhook_routes = Router::new()
        .route(routes::WEBHOOK_PATH, post(WebhookController::receive))
        .route(routes::WEBHOOK_LEGACY_PATH, post(WebhookController::receive))
        .with_state(components.webhook_controller.clone());

    Router::new()
        .merge(health_routes)
        .merge(account_routes)
        .merge(payment_routes)
        .merge(webhook_routes)
        .merge(content)
        // Outermost first
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    components.jwt_manager.clone(),
                    auth_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    components.access_gate.clone(),
                    access_gate_middleware,
                )),
        )
}

/// Start the HTTP server on the configured address
pub async fn start_http_server(
    app: Router,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
