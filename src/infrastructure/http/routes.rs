//! Path layout shared by the router, the access gate and outbound links.

pub const API_PREFIX: &str = "/api/";

pub const ACCOUNT_PATH: &str = "/accounts/account/";
pub const REGISTER_PATH: &str = "/accounts/register/";
pub const LOGOUT_PATH: &str = "/accounts/logout/";
pub const PAYMENT_REQUIRED_PATH: &str = "/accounts/payment-required/";
pub const PAYMENT_SELECTION_PATH: &str = "/accounts/payment-selection/";
pub const INITIATE_PAYMENT_PATH: &str = "/accounts/initiate-payment/";
pub const WEBHOOK_PATH: &str = "/accounts/stripe/webhook/";
pub const WEBHOOK_LEGACY_PATH: &str = "/accounts/stripe-webhook/";
pub const ACCESS_STATUS_PATH: &str = "/api/me/access";
pub const HEALTH_PATH: &str = "/health";
pub const HEALTH_READY_PATH: &str = "/health/ready";

/// Paths served without gating. Entries ending in `/` cover everything below
/// them; the rest match exactly. Authenticated users with an expired
/// subscription are still sent to the account page from most of these.
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/admin/",
    "/accounts/login/",
    LOGOUT_PATH,
    "/accounts/password_reset/",
    "/accounts/password_change/",
    "/accounts/password-reset/",
    "/accounts/password-reset-done/",
    "/accounts/password-reset-confirm/",
    "/accounts/password-reset-complete/",
    "/login/",
    "/logout/",
    ACCOUNT_PATH,
    REGISTER_PATH,
    "/accounts/activate/",
    "/accounts/registration-pending/",
    "/accounts/activation-failed/",
    PAYMENT_REQUIRED_PATH,
    PAYMENT_SELECTION_PATH,
    INITIATE_PAYMENT_PATH,
    WEBHOOK_PATH,
    WEBHOOK_LEGACY_PATH,
    "/trades/",
    "/location/",
    "/component/",
    "/locations/",
    "/components/",
    "/seo/",
    "/static/",
    "/favicon.ico",
    "/sitemap.xml",
    "/robots.txt",
    HEALTH_PATH,
    HEALTH_READY_PATH,
];

/// Public prefixes an expired subscriber may still reach: the pages that let
/// them renew, plus logout.
pub const EXPIRED_ALLOWED_PREFIXES: &[&str] = &[
    ACCOUNT_PATH,
    PAYMENT_REQUIRED_PATH,
    PAYMENT_SELECTION_PATH,
    INITIATE_PAYMENT_PATH,
    WEBHOOK_PATH,
    WEBHOOK_LEGACY_PATH,
    LOGOUT_PATH,
    "/logout/",
];

fn matches_entry(path: &str, entry: &str) -> bool {
    if entry.ends_with('/') {
        path.starts_with(entry)
    } else {
        path == entry
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|entry| matches_entry(path, entry))
}

pub fn is_expired_allowed(path: &str) -> bool {
    EXPIRED_ALLOWED_PREFIXES
        .iter()
        .any(|entry| matches_entry(path, entry))
}

pub fn is_api(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}
