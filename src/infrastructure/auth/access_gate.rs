use axum::{
    extract::{Request, State},
    http::{header::LOCATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::access::{AccessError, AccessService, AccessSnapshot, AccessState};
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::http::routes;

/// 402 body for denied API requests.
#[derive(Debug, Serialize)]
pub struct PaymentRequiredResponse {
    pub error: String,
    pub message: String,
    pub payment_url: String,
}

pub struct AccessGate {
    access_service: Arc<AccessService>,
    deadline: Duration,
}

enum Decision {
    Pass(Option<AccessSnapshot>),
    Deny(Response),
}

impl AccessGate {
    pub fn new(access_service: Arc<AccessService>, deadline: Duration) -> Self {
        Self {
            access_service,
            deadline,
        }
    }

    async fn decide(&self, user: &AuthUser, path: &str) -> Decision {
        if routes::is_public(path) {
            if routes::is_expired_allowed(path) {
                return Decision::Pass(None);
            }
            return match self.evaluate(user, path, false).await {
                Some(snapshot) if snapshot.state == AccessState::SubscriptionExpired => {
                    tracing::info!(
                        user_id = %user.user_id,
                        path,
                        "Subscription expired, redirecting public page to account"
                    );
                    Decision::Deny(found(routes::ACCOUNT_PATH))
                }
                snapshot => Decision::Pass(snapshot),
            };
        }

        let Some(snapshot) = self.evaluate(user, path, true).await else {
            return Decision::Pass(None);
        };

        match snapshot.state {
            AccessState::Full | AccessState::Trial | AccessState::Unauthenticated => {
                Decision::Pass(Some(snapshot))
            }
            state @ (AccessState::TrialExpired | AccessState::SubscriptionExpired) => {
                tracing::info!(user_id = %user.user_id, path, state = %state, "Access denied");
                Decision::Deny(deny(path, state))
            }
        }
    }

    /// `None` means evaluation failed and the request should pass.
    async fn evaluate(&self, user: &AuthUser, path: &str, admit: bool) -> Option<AccessSnapshot> {
        let work = async {
            if admit {
                self.access_service.admit(user).await
            } else {
                self.access_service.inspect(user).await
            }
        };

        let result = match tokio::time::timeout(self.deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(AccessError::Timeout),
        };

        match result {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::error!(
                    user_id = %user.user_id,
                    path,
                    error = %e,
                    "Access evaluation failed, allowing request"
                );
                None
            }
        }
    }
}

/// Gates authenticated requests by access state. Anonymous requests and any
/// evaluation failure pass through unchanged.
pub async fn access_gate_middleware(
    State(gate): State<Arc<AccessGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthUser>().cloned() else {
        return next.run(request).await;
    };
    let path = request.uri().path().to_string();

    match gate.decide(&user, &path).await {
        Decision::Pass(snapshot) => {
            if let Some(snapshot) = snapshot {
                request.extensions_mut().insert(snapshot);
            }
            next.run(request).await
        }
        Decision::Deny(response) => response,
    }
}

fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

fn deny(path: &str, state: AccessState) -> Response {
    let (error, message, payment_url, redirect_to) = match state {
        AccessState::TrialExpired => (
            "Trial expired",
            "Your weekly trial has expired. Please upgrade to continue.",
            routes::PAYMENT_SELECTION_PATH,
            routes::PAYMENT_REQUIRED_PATH,
        ),
        _ => (
            "Subscription expired",
            "Your yearly subscription has expired. Please renew to continue. No trial available.",
            routes::ACCOUNT_PATH,
            routes::ACCOUNT_PATH,
        ),
    };

    if routes::is_api(path) {
        let body = PaymentRequiredResponse {
            error: error.to_string(),
            message: message.to_string(),
            payment_url: payment_url.to_string(),
        };
        (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response()
    } else {
        found(redirect_to)
    }
}
