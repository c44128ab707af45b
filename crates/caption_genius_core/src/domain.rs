//! crates/caption_genius_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The action type recorded for every successful caption generation.
pub const CAPTION_GENERATION_ACTION: &str = "caption_generation";

/// A caption generation request. Lives only for the duration of one HTTP call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub niche: String,
    pub input: String,
    pub caller_id: Uuid,
}

/// A business/content category used to steer captions.
#[derive(Debug, Clone)]
pub struct Niche {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
}

/// A user's "voice" settings. At most one per user is active.
#[derive(Debug, Clone)]
pub struct AiConfiguration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub tone: String,
    pub preferences: String,
    pub additional_traits: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for the "customize" flow. Saving one makes it the active configuration.
#[derive(Debug, Clone)]
pub struct NewAiConfiguration {
    pub purpose: String,
    pub tone: String,
    pub preferences: String,
    pub additional_traits: Option<String>,
}

/// A stored caption.
#[derive(Debug, Clone)]
pub struct Caption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub niche_id: Uuid,
    pub niche_name: String,
    pub prompt: String,
    pub generated_caption: String,
    pub is_favorite: bool,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

/// The fields the pipeline supplies when persisting a caption.
#[derive(Debug, Clone)]
pub struct NewCaption {
    pub user_id: Uuid,
    pub niche_id: Uuid,
    pub prompt: String,
    pub generated_caption: String,
}

/// Filter and range pagination for caption history.
#[derive(Debug, Clone, Default)]
pub struct CaptionQuery {
    pub niche: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Details stored alongside a usage log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageDetails {
    pub niche: String,
    pub model: String,
}

/// An append-only accounting record.
#[derive(Debug, Clone)]
pub struct UsageLogEntry {
    pub user_id: Uuid,
    pub action_type: String,
    pub credits_used: i32,
    pub details: UsageDetails,
    pub created_at: DateTime<Utc>,
}

/// The subset of a user's profile the pipeline cares about.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub subscription_plan_id: Option<String>,
    pub credits_remaining: i32,
}

impl Profile {
    /// Metered users pay one credit per generation.
    pub fn is_metered(&self) -> bool {
        self.subscription_plan_id.is_some()
    }
}

/// Quota and credit state reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSummary {
    pub used_today: i64,
    pub daily_quota: i64,
    pub remaining_today: i64,
    pub metered: bool,
    pub credits_remaining: Option<i32>,
}

//=========================================================================================
// Scheduling
//=========================================================================================

/// Raised when a stored enum column holds an unknown value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostStatus {
    Scheduled,
    Published,
    Failed,
    Cancelled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
            PostStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(PostStatus::Scheduled),
            "published" => Ok(PostStatus::Published),
            "failed" => Ok(PostStatus::Failed),
            "cancelled" => Ok(PostStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "post status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Promotional,
    Educational,
    Entertaining,
    Engagement,
}

impl ContentType {
    /// Every content type, in the order the content mix reports them.
    pub const ALL: [ContentType; 4] = [
        ContentType::Promotional,
        ContentType::Educational,
        ContentType::Entertaining,
        ContentType::Engagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Promotional => "promotional",
            ContentType::Educational => "educational",
            ContentType::Entertaining => "entertaining",
            ContentType::Engagement => "engagement",
        }
    }
}

impl FromStr for ContentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promotional" => Ok(ContentType::Promotional),
            "educational" => Ok(ContentType::Educational),
            "entertaining" => Ok(ContentType::Entertaining),
            "engagement" => Ok(ContentType::Engagement),
            other => Err(UnknownVariant {
                kind: "content type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caption placed on the user's posting calendar.
#[derive(Debug, Clone)]
pub struct ScheduledPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub platform: String,
    pub status: PostStatus,
    pub content_type: ContentType,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Only populated by calendar listings.
    pub caption_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewScheduledPost {
    pub caption_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub platform: String,
    pub content_type: ContentType,
}

/// Partial update for a scheduled post; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ScheduledPostUpdate {
    pub scheduled_time: Option<DateTime<Utc>>,
    pub platform: Option<String>,
    pub content_type: Option<ContentType>,
    pub status: Option<PostStatus>,
}

/// Half-open `[from, to)` window for calendar queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ScheduleRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at < to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn post_status_parses_its_own_names() {
        for status in [
            PostStatus::Scheduled,
            PostStatus::Published,
            PostStatus::Failed,
            PostStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<PostStatus>(), Ok(status));
        }
        assert!("draft".parse::<PostStatus>().is_err());
    }

    #[test]
    fn unknown_content_type_names_the_kind() {
        let err = "viral".parse::<ContentType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown content type: 'viral'");
    }

    #[test]
    fn schedule_range_is_half_open() {
        let from = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let range = ScheduleRange {
            from: Some(from),
            to: Some(to),
        };
        assert!(range.contains(from));
        assert!(!range.contains(to));
        assert!(ScheduleRange::default().contains(to));
    }

    #[test]
    fn profile_without_plan_is_unmetered() {
        let profile = Profile {
            id: Uuid::new_v4(),
            subscription_plan_id: None,
            credits_remaining: 0,
        };
        assert!(!profile.is_metered());
    }
}
