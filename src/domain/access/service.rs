use super::dto::{AccessMessage, AccessSummary};
use super::trial::{trial_remaining, TrialTimer};
use super::{evaluate, AccessError, AccessState, IdentityTags};
use crate::domain::profile::Profile;
use crate::domain::subscription::SubscriptionPolicy;
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::http::routes;
use crate::infrastructure::repositories::ProfileStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Result of classifying one request, shared with handlers through request
/// extensions so the profile is read once.
#[derive(Debug, Clone)]
pub struct AccessSnapshot {
    pub state: AccessState,
    pub profile: Option<Profile>,
    pub tags: IdentityTags,
    pub evaluated_at: DateTime<Utc>,
    pub trial_remaining: Option<Duration>,
}

pub struct AccessService {
    store: Arc<dyn ProfileStore>,
    policy: Arc<SubscriptionPolicy>,
    clock: Arc<dyn Clock>,
    trial_timer: TrialTimer,
}

impl AccessService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        policy: Arc<SubscriptionPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let trial_timer = TrialTimer::new(store.clone(), policy.trial_window());
        Self {
            store,
            policy,
            clock,
            trial_timer,
        }
    }

    pub fn policy(&self) -> &SubscriptionPolicy {
        &self.policy
    }

    pub fn anonymous(&self) -> AccessSnapshot {
        AccessSnapshot {
            state: AccessState::Unauthenticated,
            profile: None,
            tags: IdentityTags::default(),
            evaluated_at: self.clock.now(),
            trial_remaining: None,
        }
    }

    /// Classifies the user without starting their trial clock.
    pub async fn inspect(&self, user: &AuthUser) -> Result<AccessSnapshot, AccessError> {
        self.load(user, false).await
    }

    /// Classifies the user and starts the trial clock if they are in trial.
    pub async fn admit(&self, user: &AuthUser) -> Result<AccessSnapshot, AccessError> {
        self.load(user, true).await
    }

    async fn load(&self, user: &AuthUser, start_trial: bool) -> Result<AccessSnapshot, AccessError> {
        let now = self.clock.now();
        let tags = self.policy.identity_tags(&user.email, user.is_staff);

        let mut profile = self
            .store
            .find_or_create(user.user_id, &user.email, now)
            .await?;
        self.trial_timer.refresh_window(&mut profile, now).await?;

        let mut state = evaluate(Some(&profile), now, tags, &self.policy);
        if start_trial
            && state == AccessState::Trial
            && self.trial_timer.touch(&mut profile, now).await?
        {
            state = evaluate(Some(&profile), now, tags, &self.policy);
        }

        let remaining = (!profile.has_paid_access).then(|| {
            trial_remaining(
                &profile,
                now,
                self.policy.trial_window(),
                self.policy.tier_for_tags(tags).trial_budget,
            )
        });

        Ok(AccessSnapshot {
            state,
            profile: Some(profile),
            tags,
            evaluated_at: now,
            trial_remaining: remaining,
        })
    }

    pub fn summary(&self, snapshot: &AccessSnapshot) -> AccessSummary {
        let profile = snapshot.profile.as_ref();
        AccessSummary {
            user_id: profile.map(|p| p.user_id),
            email: profile.map(|p| p.email.clone()),
            state: snapshot.state,
            can_view_lists: snapshot.state.can_view_lists(),
            can_view_map: snapshot.state.can_view_map(),
            trial_remaining_seconds: snapshot.trial_remaining.map(|d| d.num_seconds()),
            trial_window_resets_at: profile
                .filter(|p| !p.has_paid_access)
                .and_then(|p| p.trial_window_start)
                .map(|start| start + self.policy.trial_window()),
            paid_access_expiry: profile.and_then(|p| p.paid_access_expiry),
            payment_amount: profile.and_then(|p| p.payment_amount),
            subscription_type: profile
                .filter(|p| p.has_paid_access)
                .map(|p| self.policy.subscription_type_display(&p.email)),
            message: access_message(snapshot.state),
        }
    }
}

fn access_message(state: AccessState) -> Option<AccessMessage> {
    let (title, message, action, url) = match state {
        AccessState::Unauthenticated => (
            "Registration Required",
            "Register for 1 week free access per month to all features.",
            "Register Now",
            routes::REGISTER_PATH,
        ),
        AccessState::TrialExpired => (
            "Trial Expired - Upgrade Now",
            "Your 1 week monthly trial is used up. Get unlimited access with a yearly subscription or wait for the monthly reset.",
            "Get Full Access",
            routes::PAYMENT_SELECTION_PATH,
        ),
        AccessState::SubscriptionExpired => (
            "Subscription Expired - Renew Required",
            "Your yearly subscription has expired. Renew now to restore unlimited access. No trial available.",
            "Renew Subscription",
            routes::PAYMENT_REQUIRED_PATH,
        ),
        AccessState::Full | AccessState::Trial => return None,
    };

    Some(AccessMessage {
        title: title.to_string(),
        message: message.to_string(),
        action: action.to_string(),
        url: url.to_string(),
    })
}
