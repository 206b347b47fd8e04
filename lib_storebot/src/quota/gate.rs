//! # Quota Gate
//!
//! Daily counters keyed `limit:{action}:{YYYY-MM-DD}:{user}`, VIP flags keyed
//! `vip:{user}`, and the two-tier (global, then per-action) check.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::connections::{KeyValueStore, StoreError};
use crate::errors::StoreBotError;

/// Action name of the per-user cap shared by every action.
pub const GLOBAL_SCOPE: &str = "global";

const VIP_PREFIX: &str = "vip";

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum QuotaDecision {
    Allowed,
    Denied { limit: u32, reset_at: DateTime<Utc> },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed)
    }

    /// `Ok(())` when allowed, `QuotaExceeded` otherwise.
    pub fn into_result(self) -> Result<(), StoreBotError> {
        match self {
            QuotaDecision::Allowed => Ok(()),
            QuotaDecision::Denied { limit, reset_at } => Err(StoreBotError::QuotaExceeded { limit, reset_at }),
        }
    }
}

/// Start of the next UTC day after `now`.
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Per-user daily quota over the shared key-value store.
///
/// Admins and VIP users are never counted; a store failure allows the request.
#[derive(Clone)]
pub struct QuotaGate {
    store: Arc<dyn KeyValueStore>,
    admin_ids: HashSet<String>,
    counter_ttl: Duration,
}

impl QuotaGate {
    /// `admin_ids` bypass quotas and may manage VIPs; `counter_ttl` is the
    /// storage expiry of each day's counter.
    pub fn new<I, S>(store: Arc<dyn KeyValueStore>, admin_ids: I, counter_ttl: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            admin_ids: admin_ids
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.trim().is_empty())
                .collect(),
            counter_ttl,
        }
    }

    /// True for configured administrators.
    pub fn is_admin(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.admin_ids.contains(user_id)
    }

    /// VIP lookup; a store failure reads as "not VIP" and counting proceeds
    /// (which itself fails open).
    pub async fn is_vip(&self, user_id: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        match self.store.get(&vip_key(user_id)).await {
            Ok(flag) => flag.is_some_and(|v| v == "1"),
            Err(e) => {
                warn!(user = user_id, error = %e, "vip lookup failed");
                false
            }
        }
    }

    /// Grants or revokes VIP status. Only administrators may do this, and
    /// unlike the other store paths a failure here is reported.
    pub async fn set_vip(&self, admin_id: &str, user_id: &str, enabled: bool) -> Result<(), StoreBotError> {
        if !self.is_admin(admin_id) {
            return Err(StoreBotError::Unauthorized(admin_id.to_string()));
        }
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(StoreBotError::InvalidInput("empty user id".to_string()));
        }
        let key = vip_key(user_id);
        if enabled {
            self.store.set(&key, "1", None).await?;
        } else {
            self.store.delete(&key).await?;
        }
        info!(admin = admin_id, user = user_id, enabled, "vip flag changed");
        Ok(())
    }

    /// Allows and counts the request unless `user_id` already used
    /// `daily_limit` requests for `action` today (UTC).
    pub async fn check_and_consume(&self, user_id: &str, action: &str, daily_limit: u32) -> QuotaDecision {
        self.check_and_consume_at(user_id, action, daily_limit, Utc::now()).await
    }

    /// As [`check_and_consume`](Self::check_and_consume) with an explicit clock.
    pub async fn check_and_consume_at(
        &self,
        user_id: &str,
        action: &str,
        daily_limit: u32,
        now: DateTime<Utc>,
    ) -> QuotaDecision {
        if user_id.is_empty() || self.is_admin(user_id) || self.is_vip(user_id).await {
            return QuotaDecision::Allowed;
        }

        let key = counter_key(action, user_id, now);
        match self.consume(&key, daily_limit).await {
            Ok(true) => QuotaDecision::Allowed,
            Ok(false) => {
                debug!(user = user_id, action, limit = daily_limit, "quota exhausted");
                QuotaDecision::Denied {
                    limit: daily_limit,
                    reset_at: next_reset(now),
                }
            }
            Err(e) => {
                warn!(user = user_id, action, error = %e, "quota store unavailable, allowing");
                QuotaDecision::Allowed
            }
        }
    }

    /// Global cap first, then the per-action cap. A global denial does not
    /// consume the per-action counter.
    pub async fn check_two_tier(
        &self,
        user_id: &str,
        global_limit: u32,
        action: &str,
        action_limit: u32,
    ) -> QuotaDecision {
        match self.check_and_consume(user_id, GLOBAL_SCOPE, global_limit).await {
            QuotaDecision::Allowed => self.check_and_consume(user_id, action, action_limit).await,
            denied => denied,
        }
    }

    async fn consume(&self, key: &str, daily_limit: u32) -> Result<bool, StoreError> {
        let current = match self.store.get(key).await? {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })?,
            None => 0,
        };
        if current >= i64::from(daily_limit) {
            return Ok(false);
        }
        self.store.increment(key).await?;
        self.store.set_expiry(key, self.counter_ttl).await?;
        Ok(true)
    }
}

fn counter_key(action: &str, user_id: &str, now: DateTime<Utc>) -> String {
    format!("limit:{}:{}:{}", action, now.format("%Y-%m-%d"), user_id)
}

fn vip_key(user_id: &str) -> String {
    format!("{VIP_PREFIX}:{user_id}")
}
