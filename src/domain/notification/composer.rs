use super::{EmailKind, OutboundEmail};
use crate::domain::profile::{Profile, ReminderKind};
use crate::domain::shared::format_interval;
use crate::domain::subscription::SubscriptionPolicy;
use crate::infrastructure::http::routes;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const BRAND: &str = "Capacity Market Search";

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub scheme: String,
    pub domain: String,
    pub from_email: String,
}

impl SiteSettings {
    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.domain, path)
    }
}

/// Renders the transactional emails sent by the access core.
pub struct EmailComposer {
    site: SiteSettings,
    policy: Arc<SubscriptionPolicy>,
}

impl EmailComposer {
    pub fn new(site: SiteSettings, policy: Arc<SubscriptionPolicy>) -> Self {
        Self { site, policy }
    }

    pub fn payment_confirmation(&self, profile: &Profile) -> OutboundEmail {
        let expiry = expiry_label(profile.paid_access_expiry);
        let amount = profile
            .payment_amount
            .map(|amount| format!("£{:.2}", amount))
            .unwrap_or_else(|| "-".to_string());
        let subscription = self.policy.subscription_type_display(&profile.email);
        let home = self.site.url("/");
        let account = self.site.url(routes::ACCOUNT_PATH);

        let body_text = format!(
            "Hello,\n\n\
             Thank you for your payment. Your {subscription} is active and your account has full access.\n\n\
             Amount: {amount}\n\
             Access expires: {expiry}\n\n\
             Start exploring: {home}\n\n\
             If the full features do not show up, log out and back in.\n\n\
             {BRAND} Team\n\
             Need help? Visit {account}\n"
        );
        let body_html = html_page(
            "Payment Confirmed",
            &format!(
                "<p>Thank you for your payment. Your <strong>{subscription}</strong> is active \
                 and your account has full access.</p>\
                 <ul><li>Amount: {amount}</li><li>Access expires: {expiry}</li></ul>\
                 <p><a href=\"{home}\">Start exploring</a></p>\
                 <p>Need help? Visit <a href=\"{account}\">your account</a>.</p>"
            ),
        );

        self.email(
            profile,
            format!("Payment Confirmed - Full Access Activated | {BRAND}"),
            body_text,
            body_html,
            EmailKind::PaymentConfirmation,
        )
    }

    /// `remaining` is the trial time left or the time until expiry, depending
    /// on the reminder kind.
    pub fn reminder(&self, profile: &Profile, kind: ReminderKind, remaining: Duration) -> OutboundEmail {
        let testing = self.policy.is_test_identity(&profile.email);
        let (subject, heading, paragraph, action_path) = match kind {
            ReminderKind::TrialEnding => {
                let trial = if testing {
                    "testing trial"
                } else {
                    "free trial"
                };
                (
                    format!("Your {} Expires Soon! | {BRAND}", title_case(trial)),
                    "Trial Expiry Reminder".to_string(),
                    format!(
                        "Your {trial} expires in {}. Subscribe now to keep unlimited access.",
                        describe_remaining(remaining)
                    ),
                    routes::PAYMENT_SELECTION_PATH,
                )
            }
            ReminderKind::TrialExpiredNotice => (
                format!("Your Free Access to {BRAND} Has Expired"),
                "Trial Expired".to_string(),
                if testing {
                    "Your testing trial is used up. It resets when the testing window rolls over."
                        .to_string()
                } else {
                    "Your free week of access is used up. Subscribe for unlimited access or wait for next month's reset."
                        .to_string()
                },
                routes::PAYMENT_SELECTION_PATH,
            ),
            ReminderKind::SubscriptionExpiring { .. } => {
                let subscription = self.policy.subscription_type_display(&profile.email);
                (
                    format!("Your Subscription Expires Soon! | {BRAND}"),
                    "Subscription Expiry Reminder".to_string(),
                    format!(
                        "Your {subscription} expires in {} (on {}). Renew to keep unlimited access.",
                        describe_remaining(remaining),
                        expiry_label(profile.paid_access_expiry)
                    ),
                    routes::ACCOUNT_PATH,
                )
            }
        };

        let action_url = self.site.url(action_path);
        let body_text = format!("Hello,\n\n{paragraph}\n\n{action_url}\n\n{BRAND} Team\n");
        let body_html = html_page(
            &heading,
            &format!("<p>{paragraph}</p><p><a href=\"{action_url}\">Continue</a></p>"),
        );

        self.email(profile, subject, body_text, body_html, EmailKind::Reminder(kind))
    }

    fn email(
        &self,
        profile: &Profile,
        subject: String,
        body_text: String,
        body_html: String,
        kind: EmailKind,
    ) -> OutboundEmail {
        OutboundEmail {
            to: profile.email.clone(),
            from: self.site.from_email.clone(),
            subject,
            body_text,
            body_html,
            kind,
        }
    }
}

fn expiry_label(expiry: Option<DateTime<Utc>>) -> String {
    expiry
        .map(|at| at.format("%B %d, %Y %H:%M UTC").to_string())
        .unwrap_or_else(|| "No expiry".to_string())
}

fn describe_remaining(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        "less than a minute".to_string()
    } else if remaining < Duration::minutes(1) {
        format!("{} seconds", remaining.num_seconds())
    } else {
        format_interval(Duration::minutes(remaining.num_minutes()))
    }
}

fn title_case(words: &str) -> String {
    words
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn html_page(heading: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
         <h1>{heading}</h1>{content}<p>{BRAND} Team</p></body></html>"
    )
}
