//! crates/caption_genius_core/src/usage.rs
//!
//! The usage limiter: a rolling 24-hour quota on caption generations plus a
//! credit gate for metered plans. Both checks run before any provider call.
//!
//! The count is read here and the matching usage row is written much later by the
//! pipeline, so two concurrent requests from one user can both pass the last free
//! slot. That race is accepted.

use crate::domain::{Profile, UsageSummary, CAPTION_GENERATION_ACTION};
use crate::error::PipelineError;
use crate::ports::{DatabaseService, PortResult};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_DAILY_QUOTA: i64 = 30;

/// Static limits, loaded from configuration at startup.
#[derive(Debug, Clone, Copy)]
pub struct UsagePolicy {
    pub daily_quota: i64,
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self {
            daily_quota: DEFAULT_DAILY_QUOTA,
        }
    }
}

/// Start of the quota window ending at `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(24)
}

/// What the limiter learned while admitting a request.
#[derive(Debug, Clone)]
pub struct UsageCheck {
    pub used: i64,
    pub profile: Option<Profile>,
}

/// Admits or rejects a generation for `user_id`.
///
/// Store failures are hard failures: the limiter never fails open.
pub async fn check_usage(
    db: &dyn DatabaseService,
    policy: UsagePolicy,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<UsageCheck, PipelineError> {
    let used = db
        .count_usage_since(user_id, CAPTION_GENERATION_ACTION, window_start(now))
        .await
        .map_err(PipelineError::Store)?;

    if used >= policy.daily_quota {
        warn!(%user_id, used, limit = policy.daily_quota, "Daily caption quota exceeded");
        return Err(PipelineError::QuotaExceeded {
            used,
            limit: policy.daily_quota,
        });
    }

    let profile = db.get_profile(user_id).await.map_err(PipelineError::Store)?;
    if let Some(p) = &profile {
        if p.is_metered() && p.credits_remaining <= 0 {
            warn!(%user_id, "Metered user has no credits left");
            return Err(PipelineError::InsufficientCredits);
        }
    }

    debug!(%user_id, used, "Usage check passed");
    Ok(UsageCheck { used, profile })
}

/// Reports quota and credit state without enforcing anything.
pub async fn usage_summary(
    db: &dyn DatabaseService,
    policy: UsagePolicy,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> PortResult<UsageSummary> {
    let used_today = db
        .count_usage_since(user_id, CAPTION_GENERATION_ACTION, window_start(now))
        .await?;
    let profile = db.get_profile(user_id).await?;

    Ok(UsageSummary {
        used_today,
        daily_quota: policy.daily_quota,
        remaining_today: (policy.daily_quota - used_today).max(0),
        metered: profile.as_ref().map_or(false, Profile::is_metered),
        credits_remaining: profile.map(|p| p.credits_remaining),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UsageDetails, UsageLogEntry};
    use crate::memory::InMemoryDatabase;
    use crate::ports::DatabaseService;

    async fn log_usage(db: &InMemoryDatabase, user_id: Uuid, at: DateTime<Utc>) {
        db.insert_usage_log(UsageLogEntry {
            user_id,
            action_type: CAPTION_GENERATION_ACTION.to_string(),
            credits_used: 1,
            details: UsageDetails {
                niche: "Yoga Studio".to_string(),
                model: "test-model".to_string(),
            },
            created_at: at,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn rejects_when_window_count_reaches_quota() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        for _ in 0..3 {
            log_usage(&db, user, now - Duration::hours(1)).await;
        }

        let err = check_usage(&db, UsagePolicy { daily_quota: 3 }, user, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::QuotaExceeded { used: 3, limit: 3 }));
    }

    #[tokio::test]
    async fn entries_older_than_a_day_do_not_count() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        log_usage(&db, user, now - Duration::hours(25)).await;
        log_usage(&db, user, now - Duration::hours(2)).await;

        let check = check_usage(&db, UsagePolicy { daily_quota: 2 }, user, now)
            .await
            .unwrap();
        assert_eq!(check.used, 1);
    }

    #[tokio::test]
    async fn entry_exactly_at_window_start_counts() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        log_usage(&db, user, window_start(now)).await;

        let err = check_usage(&db, UsagePolicy { daily_quota: 1 }, user, now)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::QuotaExceeded { used: 1, limit: 1 }));
    }

    #[tokio::test]
    async fn metered_user_without_credits_is_rejected() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        db.put_profile(Profile {
            id: user,
            subscription_plan_id: Some("pro".to_string()),
            credits_remaining: 0,
        });

        let err = check_usage(&db, UsagePolicy::default(), user, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientCredits));
    }

    #[tokio::test]
    async fn unmetered_user_with_zero_balance_is_admitted() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        db.put_profile(Profile {
            id: user,
            subscription_plan_id: None,
            credits_remaining: 0,
        });

        assert!(check_usage(&db, UsagePolicy::default(), user, Utc::now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn store_failure_does_not_fail_open() {
        let db = InMemoryDatabase::new();
        db.fail_usage_reads(true);

        let err = check_usage(&db, UsagePolicy::default(), Uuid::new_v4(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)));
    }

    #[tokio::test]
    async fn summary_reports_remaining_quota_and_credits() {
        let db = InMemoryDatabase::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        db.put_profile(Profile {
            id: user,
            subscription_plan_id: Some("starter".to_string()),
            credits_remaining: 7,
        });
        log_usage(&db, user, now).await;

        let summary = usage_summary(&db, UsagePolicy { daily_quota: 5 }, user, now)
            .await
            .unwrap();
        assert_eq!(summary.used_today, 1);
        assert_eq!(summary.remaining_today, 4);
        assert!(summary.metered);
        assert_eq!(summary.credits_remaining, Some(7));
    }
}
