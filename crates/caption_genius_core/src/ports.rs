//! crates/caption_genius_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the Postgres store and the completion provider.

use crate::domain::{
    AiConfiguration, Caption, CaptionQuery, NewAiConfiguration, NewCaption, NewScheduledPost,
    Niche, Profile, ScheduleRange, ScheduledPost, ScheduledPostUpdate, UsageLogEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    /// The external service rejected our credentials.
    #[error("Unauthorized")]
    Unauthorized,
    /// The external service answered but produced nothing usable.
    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth ---
    /// Resolves an unexpired session id to its user.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    // --- Niches ---
    async fn list_active_niches(&self) -> PortResult<Vec<Niche>>;

    async fn find_niche_by_name(&self, name: &str) -> PortResult<Option<Niche>>;

    // --- AI Configuration ---
    async fn get_active_configuration(&self, user_id: Uuid) -> PortResult<Option<AiConfiguration>>;

    /// Deactivates any active configuration for the user and stores `config` as the active one.
    async fn save_configuration(
        &self,
        user_id: Uuid,
        config: NewAiConfiguration,
    ) -> PortResult<AiConfiguration>;

    // --- Profiles and Usage Accounting ---
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>>;

    /// Decrements the balance by one if it is positive. Returns the new balance,
    /// or `None` when no row was changed.
    async fn decrement_credits(&self, user_id: Uuid) -> PortResult<Option<i32>>;

    async fn count_usage_since(
        &self,
        user_id: Uuid,
        action_type: &str,
        since: DateTime<Utc>,
    ) -> PortResult<i64>;

    async fn insert_usage_log(&self, entry: UsageLogEntry) -> PortResult<()>;

    // --- Captions ---
    async fn insert_caption(&self, caption: NewCaption) -> PortResult<Caption>;

    /// Newest first.
    async fn list_captions(&self, user_id: Uuid, query: &CaptionQuery) -> PortResult<Vec<Caption>>;

    async fn get_caption(&self, user_id: Uuid, caption_id: Uuid) -> PortResult<Caption>;

    async fn set_caption_favorite(
        &self,
        user_id: Uuid,
        caption_id: Uuid,
        is_favorite: bool,
    ) -> PortResult<Caption>;

    async fn delete_caption(&self, user_id: Uuid, caption_id: Uuid) -> PortResult<()>;

    // --- Scheduled Posts ---
    async fn create_scheduled_post(
        &self,
        user_id: Uuid,
        post: NewScheduledPost,
    ) -> PortResult<ScheduledPost>;

    /// Ascending by scheduled time.
    async fn list_scheduled_posts(
        &self,
        user_id: Uuid,
        range: ScheduleRange,
    ) -> PortResult<Vec<ScheduledPost>>;

    async fn update_scheduled_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        update: ScheduledPostUpdate,
    ) -> PortResult<ScheduledPost>;

    async fn delete_scheduled_post(&self, user_id: Uuid, post_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait CaptionGenerationService: Send + Sync {
    /// The model identifier, recorded in usage logs.
    fn model(&self) -> &str;

    /// Sends one billed completion request and returns the trimmed caption text.
    async fn generate_caption(&self, prompt: &str) -> PortResult<String>;
}
