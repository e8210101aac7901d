//! AI naming quota.
//!
//! WebP conversion is free; only AI-named conversions count against a
//! plan's monthly allowance. `QuotaService` is the contract the batch driver
//! talks to, and `InMemoryQuota` is a self-contained implementation of it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days in one usage period.
pub const PERIOD_DAYS: i64 = 30;

/// Default number of entries returned by `InMemoryQuota::history`.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Subscription plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Starter,
    Pro,
    Agency,
}

impl Plan {
    pub fn display_name(self) -> &'static str {
        match self {
            Plan::Starter => "Starter",
            Plan::Pro => "Pro",
            Plan::Agency => "Agency",
        }
    }

    /// Monthly price in US dollars.
    pub fn price_usd(self) -> u32 {
        match self {
            Plan::Starter => 0,
            Plan::Pro => 7,
            Plan::Agency => 24,
        }
    }

    /// AI-named conversions allowed per period.
    pub fn ai_conversions_limit(self) -> u32 {
        match self {
            Plan::Starter => 50,
            Plan::Pro => 3000,
            Plan::Agency => 20_000,
        }
    }

    /// Largest batch one request may submit.
    pub fn max_batch_size(self) -> u32 {
        match self {
            Plan::Starter => 5,
            Plan::Pro => 50,
            Plan::Agency => 100,
        }
    }
}

/// Answer to a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaCheck {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    pub used: u32,
    pub max_batch_size: u32,
    pub plan: Plan,
}

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Quota service unavailable: {0}")]
    Unavailable(String),

    #[error("No usage profile for user {0}")]
    ProfileMissing(String),
}

/// Usage-quota persistence, as seen by the batch driver.
#[allow(async_fn_in_trait)]
pub trait QuotaService {
    /// Whether `image_count` images may be converted now.
    async fn check_quota(
        &self,
        user_id: &str,
        image_count: u32,
        ai_requested: bool,
    ) -> Result<QuotaCheck, QuotaError>;

    /// Record a finished batch. Only AI-named images consume quota.
    async fn record_usage(
        &self,
        user_id: &str,
        image_count: u32,
        ai_used: bool,
    ) -> Result<(), QuotaError>;
}

/// Per-user usage counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub plan: Plan,
    pub ai_conversions_used: u32,
    pub ai_conversions_limit: u32,
    pub max_batch_size: u32,
    pub period_start: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh profile on `plan` whose period starts at `now`.
    pub fn new(user_id: impl Into<String>, plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            plan,
            ai_conversions_used: 0,
            ai_conversions_limit: plan.ai_conversions_limit(),
            max_batch_size: plan.max_batch_size(),
            period_start: now,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.ai_conversions_limit
            .saturating_sub(self.ai_conversions_used)
    }

    fn roll_period(&mut self, now: DateTime<Utc>) {
        if now - self.period_start >= Duration::days(PERIOD_DAYS) {
            log::info!("usage period reset for {}", self.user_id);
            self.ai_conversions_used = 0;
            self.period_start = now;
        }
    }
}

/// One recorded batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionLog {
    pub user_id: String,
    pub file_count: u32,
    pub ai_used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct QuotaState {
    profiles: HashMap<String, UserProfile>,
    logs: Vec<ConversionLog>,
}

impl QuotaState {
    fn profile_mut(&mut self, user_id: &str, now: DateTime<Utc>) -> &mut UserProfile {
        self.profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id, Plan::Starter, now))
    }
}

/// In-memory `QuotaService`.
///
/// Unknown users get a Starter profile on first contact. Safe to share
/// between tasks.
#[derive(Debug, Default)]
pub struct InMemoryQuota {
    state: Mutex<QuotaState>,
}

impl InMemoryQuota {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a profile.
    pub fn insert_profile(&self, profile: UserProfile) {
        self.lock()
            .profiles
            .insert(profile.user_id.clone(), profile);
    }

    /// Move a user to `plan`, keeping the current period's usage.
    pub fn set_plan(&self, user_id: &str, plan: Plan) {
        let mut state = self.lock();
        let profile = state.profile_mut(user_id, Utc::now());
        profile.plan = plan;
        profile.ai_conversions_limit = plan.ai_conversions_limit();
        profile.max_batch_size = plan.max_batch_size();
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.lock().profiles.get(user_id).cloned()
    }

    /// Most recent batches for `user_id`, newest first.
    pub fn history(&self, user_id: &str, limit: usize) -> Vec<ConversionLog> {
        self.lock()
            .logs
            .iter()
            .rev()
            .filter(|log| log.user_id == user_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// `check_quota` against an explicit clock.
    pub fn check_at(
        &self,
        user_id: &str,
        image_count: u32,
        ai_requested: bool,
        now: DateTime<Utc>,
    ) -> QuotaCheck {
        let mut state = self.lock();
        let profile = state.profile_mut(user_id, now);
        profile.roll_period(now);

        let remaining = profile.remaining();
        QuotaCheck {
            allowed: !ai_requested || remaining >= image_count,
            remaining,
            limit: profile.ai_conversions_limit,
            used: profile.ai_conversions_used,
            max_batch_size: profile.max_batch_size,
            plan: profile.plan,
        }
    }

    /// `record_usage` against an explicit clock.
    pub fn record_at(&self, user_id: &str, image_count: u32, ai_used: bool, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.logs.push(ConversionLog {
            user_id: user_id.to_string(),
            file_count: image_count,
            ai_used,
            created_at: now,
        });

        if ai_used {
            let profile = state.profile_mut(user_id, now);
            profile.ai_conversions_used = profile.ai_conversions_used.saturating_add(image_count);
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuotaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QuotaService for InMemoryQuota {
    async fn check_quota(
        &self,
        user_id: &str,
        image_count: u32,
        ai_requested: bool,
    ) -> Result<QuotaCheck, QuotaError> {
        Ok(self.check_at(user_id, image_count, ai_requested, Utc::now()))
    }

    async fn record_usage(
        &self,
        user_id: &str,
        image_count: u32,
        ai_used: bool,
    ) -> Result<(), QuotaError> {
        self.record_at(user_id, image_count, ai_used, Utc::now());
        Ok(())
    }
}
