use crate::domain::notification::SiteSettings;
use crate::domain::reminder::ReminderSettings;
use crate::domain::shared::parse_interval;
use crate::domain::subscription::{PerpetualRenewal, PolicySettings, PolicyTier};
use crate::domain::webhook::WebhookSettings;
use crate::infrastructure::payments::stripe::DEFAULT_STRIPE_API_BASE;
use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::env;
use std::error::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Payment processor
    pub stripe_webhook_secret: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_yearly_price_id: Option<String>,
    pub stripe_api_base: String,
    // Subscription policy
    pub test_identities: Vec<String>,
    pub subscription_duration: Duration,
    pub reminder_offsets: Vec<Duration>,
    pub test_subscription_duration: Duration,
    pub test_reminder_offsets: Vec<Duration>,
    pub trial_window: Duration,
    pub trial_budget: Duration,
    pub test_trial_budget: Duration,
    pub trial_reminder_threshold: Duration,
    pub test_trial_reminder_threshold: Duration,
    pub perpetual_renewal: PerpetualRenewal,
    pub default_subscription_amount: Decimal,
    // Emails
    pub site_scheme: String,
    pub site_domain: String,
    pub default_from_email: String,
    // Scheduler
    pub reminder_interval: Duration,
    pub reminder_tolerance: Duration,
    pub reminder_dry_run: bool,
    pub scheduler_enabled: bool,
    pub request_deadline: Duration,
    pub processed_event_retention: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

type ConfigResult<T> = Result<T, Box<dyn Error>>;

/// Reads raw values by name; `None` means unset.
struct Vars<F: Fn(&str) -> Option<String>>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).map(|v| v.trim().to_string())
    }

    fn required(&self, name: &str) -> ConfigResult<String> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("{} must be set", name).into())
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, name: &str, default: bool) -> bool {
        self.optional(name)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(default)
    }

    fn interval(&self, name: &str, default: &str) -> ConfigResult<Duration> {
        parse_interval(&self.or(name, default)).map_err(|e| format!("{}: {}", name, e).into())
    }

    /// Like [`Vars::interval`] but rejects zero.
    fn positive_interval(&self, name: &str, default: &str) -> ConfigResult<Duration> {
        let interval = self.interval(name, default)?;
        if interval <= Duration::zero() {
            return Err(format!("{} must be greater than zero", name).into());
        }
        Ok(interval)
    }

    fn positive_intervals(&self, name: &str, default: &str) -> ConfigResult<Vec<Duration>> {
        let intervals = self.intervals(name, default)?;
        if intervals.iter().any(|interval| *interval <= Duration::zero()) {
            return Err(format!("{} must only hold intervals greater than zero", name).into());
        }
        Ok(intervals)
    }

    fn intervals(&self, name: &str, default: &str) -> ConfigResult<Vec<Duration>> {
        self.or(name, default)
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| -> ConfigResult<Duration> {
                parse_interval(part).map_err(|e| format!("{}: {}", name, e).into())
            })
            .collect()
    }
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from explicit values, falling back to defaults
    /// for anything missing.
    pub fn from_map(values: &HashMap<String, String>) -> ConfigResult<Self> {
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> ConfigResult<Self> {
        let vars = Vars(lookup);

        let reminder_interval = vars.positive_interval("REMINDER_INTERVAL", "5m")?;
        let reminder_tolerance = match vars.optional("REMINDER_TOLERANCE") {
            Some(raw) => parse_interval(&raw).map_err(|e| format!("REMINDER_TOLERANCE: {}", e))?,
            None => reminder_interval,
        };
        if reminder_tolerance < reminder_interval {
            return Err("REMINDER_TOLERANCE must be at least REMINDER_INTERVAL".into());
        }

        let perpetual_renewal = match vars.or("PERPETUAL_RENEWAL", "keep").to_lowercase().as_str() {
            "keep" => PerpetualRenewal::Keep,
            "bounded" => PerpetualRenewal::Bounded,
            other => return Err(format!("PERPETUAL_RENEWAL: unknown value '{}'", other).into()),
        };

        let default_subscription_amount: Decimal = vars
            .or("DEFAULT_SUBSCRIPTION_AMOUNT", "5.00")
            .parse()
            .map_err(|e| format!("DEFAULT_SUBSCRIPTION_AMOUNT: {}", e))?;

        let site_domain = vars.or("SITE_DOMAIN", "localhost:8080");
        let environment = match vars.or("ENVIRONMENT", "development").as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };

        let config = Config {
            database_url: vars.required("DATABASE_URL")?,
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.or("PORT", "8080").parse()?,
            jwt_secret: vars.required("JWT_SECRET")?,
            jwt_expiration_hours: vars.or("JWT_EXPIRATION_HOURS", "1").parse()?,
            log_format: match vars.optional("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                Some(_) => LogFormat::Pretty,
                None if environment == Environment::Production => LogFormat::Json,
                None => LogFormat::Pretty,
            },
            environment,
            stripe_webhook_secret: vars.optional("STRIPE_WEBHOOK_SECRET"),
            stripe_secret_key: vars.optional("STRIPE_SECRET_KEY"),
            stripe_yearly_price_id: vars.optional("STRIPE_YEARLY_PRICE_ID"),
            stripe_api_base: vars.or("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
            test_identities: vars
                .or("TEST_IDENTITIES", "")
                .split(',')
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty())
                .collect(),
            subscription_duration: vars.positive_interval("SUBSCRIPTION_DURATION", "365d")?,
            reminder_offsets: vars.positive_intervals("REMINDER_OFFSETS", "30d,7d")?,
            test_subscription_duration: vars.positive_interval("TEST_SUBSCRIPTION_DURATION", "5m")?,
            test_reminder_offsets: vars.positive_intervals("TEST_REMINDER_OFFSETS", "2m")?,
            trial_window: vars.positive_interval("TRIAL_WINDOW", "30d")?,
            trial_budget: vars.positive_interval("TRIAL_BUDGET", "168h")?,
            test_trial_budget: vars.positive_interval("TEST_TRIAL_BUDGET", "5m")?,
            trial_reminder_threshold: vars.interval("TRIAL_REMINDER_THRESHOLD", "24h")?,
            test_trial_reminder_threshold: vars.interval("TEST_TRIAL_REMINDER_THRESHOLD", "2m")?,
            perpetual_renewal,
            default_subscription_amount,
            site_scheme: vars.or("SITE_SCHEME", "https"),
            default_from_email: vars.or("DEFAULT_FROM_EMAIL", &format!("noreply@{}", site_domain)),
            site_domain,
            reminder_interval,
            reminder_tolerance,
            reminder_dry_run: vars.flag("REMINDER_DRY_RUN", false),
            scheduler_enabled: vars.flag("SCHEDULER_ENABLED", true),
            request_deadline: vars.positive_interval("REQUEST_DEADLINE", "3s")?,
            processed_event_retention: vars.positive_interval("PROCESSED_EVENT_RETENTION", "30d")?,
        };

        Ok(config)
    }

    pub fn policy_settings(&self) -> PolicySettings {
        PolicySettings {
            production: PolicyTier {
                subscription_duration: self.subscription_duration,
                reminder_offsets: self.reminder_offsets.clone(),
                trial_budget: self.trial_budget,
                trial_reminder_threshold: self.trial_reminder_threshold,
            },
            testing: PolicyTier {
                subscription_duration: self.test_subscription_duration,
                reminder_offsets: self.test_reminder_offsets.clone(),
                trial_budget: self.test_trial_budget,
                trial_reminder_threshold: self.test_trial_reminder_threshold,
            },
            test_identities: self.test_identities.clone(),
            trial_window: self.trial_window,
            perpetual_renewal: self.perpetual_renewal,
        }
    }

    pub fn site_settings(&self) -> SiteSettings {
        SiteSettings {
            scheme: self.site_scheme.clone(),
            domain: self.site_domain.clone(),
            from_email: self.default_from_email.clone(),
        }
    }

    pub fn webhook_settings(&self) -> WebhookSettings {
        WebhookSettings {
            secret: self.stripe_webhook_secret.clone(),
            default_amount: self.default_subscription_amount,
            deadline: self.request_deadline_std(),
        }
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            tolerance: self.reminder_tolerance,
            retention: self.processed_event_retention,
        }
    }

    pub fn request_deadline_std(&self) -> std::time::Duration {
        self.request_deadline
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(3))
    }
}
