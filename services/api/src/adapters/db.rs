//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use caption_genius_core::domain::{
    AiConfiguration, Caption, CaptionQuery, NewAiConfiguration, NewCaption, NewScheduledPost,
    Niche, Profile, ScheduleRange, ScheduledPost, ScheduledPostUpdate, UsageLogEntry,
};
use caption_genius_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct NicheRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    is_active: bool,
}
impl NicheRecord {
    fn to_domain(self) -> Niche {
        Niche {
            id: self.id,
            name: self.name,
            description: self.description,
            icon: self.icon,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct AiConfigurationRecord {
    id: Uuid,
    user_id: Uuid,
    purpose: String,
    tone: String,
    preferences: String,
    additional_traits: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}
impl AiConfigurationRecord {
    fn to_domain(self) -> AiConfiguration {
        AiConfiguration {
            id: self.id,
            user_id: self.user_id,
            purpose: self.purpose,
            tone: self.tone,
            preferences: self.preferences,
            additional_traits: self.additional_traits,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    subscription_plan_id: Option<String>,
    credits_remaining: i32,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            id: self.id,
            subscription_plan_id: self.subscription_plan_id,
            credits_remaining: self.credits_remaining,
        }
    }
}

#[derive(FromRow)]
struct CaptionRecord {
    id: Uuid,
    user_id: Uuid,
    niche_id: Uuid,
    niche_name: String,
    prompt: String,
    generated_caption: String,
    is_favorite: bool,
    usage_count: i32,
    created_at: DateTime<Utc>,
}
impl CaptionRecord {
    fn to_domain(self) -> Caption {
        Caption {
            id: self.id,
            user_id: self.user_id,
            niche_id: self.niche_id,
            niche_name: self.niche_name,
            prompt: self.prompt,
            generated_caption: self.generated_caption,
            is_favorite: self.is_favorite,
            usage_count: self.usage_count,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ScheduledPostRecord {
    id: Uuid,
    user_id: Uuid,
    caption_id: Uuid,
    scheduled_time: DateTime<Utc>,
    platform: String,
    status: String,
    content_type: String,
    error_message: Option<String>,
    retry_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    caption_text: Option<String>,
}
impl ScheduledPostRecord {
    fn to_domain(self) -> PortResult<ScheduledPost> {
        Ok(ScheduledPost {
            id: self.id,
            user_id: self.user_id,
            caption_id: self.caption_id,
            scheduled_time: self.scheduled_time,
            platform: self.platform,
            status: self
                .status
                .parse()
                .map_err(|e| PortError::Unexpected(format!("{}", e)))?,
            content_type: self
                .content_type
                .parse()
                .map_err(|e| PortError::Unexpected(format!("{}", e)))?,
            error_message: self.error_message,
            retry_count: self.retry_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            caption_text: self.caption_text,
        })
    }
}

const CAPTION_COLUMNS: &str = "c.id, c.user_id, c.niche_id, n.name AS niche_name, c.prompt, \
     c.generated_caption, c.is_favorite, c.usage_count, c.created_at";

const POST_COLUMNS: &str = "id, user_id, caption_id, scheduled_time, platform, status, \
     content_type, error_message, retry_count, created_at, updated_at";

const CONFIG_COLUMNS: &str =
    "id, user_id, purpose, tone, preferences, additional_traits, is_active, created_at";

fn caption_not_found(caption_id: Uuid) -> PortError {
    PortError::NotFound(format!("Caption {} not found", caption_id))
}

fn post_not_found(post_id: Uuid) -> PortError {
    PortError::NotFound(format!("Scheduled post {} not found", post_id))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .ok_or(PortError::Unauthorized)
    }

    async fn list_active_niches(&self) -> PortResult<Vec<Niche>> {
        let records = sqlx::query_as::<_, NicheRecord>(
            "SELECT id, name, description, icon, is_active FROM niches WHERE is_active ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_niche_by_name(&self, name: &str) -> PortResult<Option<Niche>> {
        let record = sqlx::query_as::<_, NicheRecord>(
            "SELECT id, name, description, icon, is_active FROM niches WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn get_active_configuration(&self, user_id: Uuid) -> PortResult<Option<AiConfiguration>> {
        let record = sqlx::query_as::<_, AiConfigurationRecord>(&format!(
            "SELECT {} FROM ai_configurations WHERE user_id = $1 AND is_active",
            CONFIG_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn save_configuration(
        &self,
        user_id: Uuid,
        config: NewAiConfiguration,
    ) -> PortResult<AiConfiguration> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query(
            "UPDATE ai_configurations SET is_active = FALSE, updated_at = NOW() \
             WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, AiConfigurationRecord>(&format!(
            "INSERT INTO ai_configurations (user_id, purpose, tone, preferences, additional_traits, is_active) \
             VALUES ($1, $2, $3, $4, $5, TRUE) RETURNING {}",
            CONFIG_COLUMNS
        ))
        .bind(user_id)
        .bind(&config.purpose)
        .bind(&config.tone)
        .bind(&config.preferences)
        .bind(&config.additional_traits)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT id, subscription_plan_id, credits_remaining FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn decrement_credits(&self, user_id: Uuid) -> PortResult<Option<i32>> {
        // Single conditional update: the balance never drops below zero.
        sqlx::query_scalar::<_, i32>(
            "UPDATE profiles SET credits_remaining = credits_remaining - 1, updated_at = NOW() \
             WHERE id = $1 AND credits_remaining > 0 RETURNING credits_remaining",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn count_usage_since(
        &self,
        user_id: Uuid,
        action_type: &str,
        since: DateTime<Utc>,
    ) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM usage_logs WHERE user_id = $1 AND action_type = $2 AND created_at >= $3",
        )
        .bind(user_id)
        .bind(action_type)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn insert_usage_log(&self, entry: UsageLogEntry) -> PortResult<()> {
        let details = json!({
            "niche": entry.details.niche,
            "model": entry.details.model,
        });
        sqlx::query(
            "INSERT INTO usage_logs (user_id, action_type, credits_used, details, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.user_id)
        .bind(&entry.action_type)
        .bind(entry.credits_used)
        .bind(details)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn insert_caption(&self, caption: NewCaption) -> PortResult<Caption> {
        let record = sqlx::query_as::<_, CaptionRecord>(&format!(
            "WITH c AS (\
                INSERT INTO captions (user_id, niche_id, prompt, generated_caption) \
                VALUES ($1, $2, $3, $4) RETURNING *\
             ) SELECT {} FROM c JOIN niches n ON n.id = c.niche_id",
            CAPTION_COLUMNS
        ))
        .bind(caption.user_id)
        .bind(caption.niche_id)
        .bind(&caption.prompt)
        .bind(&caption.generated_caption)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn list_captions(&self, user_id: Uuid, query: &CaptionQuery) -> PortResult<Vec<Caption>> {
        let records = sqlx::query_as::<_, CaptionRecord>(&format!(
            "SELECT {} FROM captions c JOIN niches n ON n.id = c.niche_id \
             WHERE c.user_id = $1 AND ($2::text IS NULL OR n.name = $2) \
             ORDER BY c.created_at DESC LIMIT $3 OFFSET $4",
            CAPTION_COLUMNS
        ))
        .bind(user_id)
        .bind(&query.niche)
        .bind(query.limit)
        .bind(query.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let captions = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(captions)
    }

    async fn get_caption(&self, user_id: Uuid, caption_id: Uuid) -> PortResult<Caption> {
        let record = sqlx::query_as::<_, CaptionRecord>(&format!(
            "SELECT {} FROM captions c JOIN niches n ON n.id = c.niche_id \
             WHERE c.id = $1 AND c.user_id = $2",
            CAPTION_COLUMNS
        ))
        .bind(caption_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => caption_not_found(caption_id),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn set_caption_favorite(
        &self,
        user_id: Uuid,
        caption_id: Uuid,
        is_favorite: bool,
    ) -> PortResult<Caption> {
        let record = sqlx::query_as::<_, CaptionRecord>(&format!(
            "WITH c AS (\
                UPDATE captions SET is_favorite = $3, updated_at = NOW() \
                WHERE id = $1 AND user_id = $2 RETURNING *\
             ) SELECT {} FROM c JOIN niches n ON n.id = c.niche_id",
            CAPTION_COLUMNS
        ))
        .bind(caption_id)
        .bind(user_id)
        .bind(is_favorite)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => caption_not_found(caption_id),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_caption(&self, user_id: Uuid, caption_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM captions WHERE id = $1 AND user_id = $2")
            .bind(caption_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(caption_not_found(caption_id));
        }
        Ok(())
    }

    async fn create_scheduled_post(
        &self,
        user_id: Uuid,
        post: NewScheduledPost,
    ) -> PortResult<ScheduledPost> {
        let record = sqlx::query_as::<_, ScheduledPostRecord>(&format!(
            "INSERT INTO scheduled_posts (user_id, caption_id, scheduled_time, platform, content_type) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}, NULL::text AS caption_text",
            POST_COLUMNS
        ))
        .bind(user_id)
        .bind(post.caption_id)
        .bind(post.scheduled_time)
        .bind(&post.platform)
        .bind(post.content_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn list_scheduled_posts(
        &self,
        user_id: Uuid,
        range: ScheduleRange,
    ) -> PortResult<Vec<ScheduledPost>> {
        let records = sqlx::query_as::<_, ScheduledPostRecord>(
            "SELECT p.id, p.user_id, p.caption_id, p.scheduled_time, p.platform, p.status, \
                    p.content_type, p.error_message, p.retry_count, p.created_at, p.updated_at, \
                    c.generated_caption AS caption_text \
             FROM scheduled_posts p LEFT JOIN captions c ON c.id = p.caption_id \
             WHERE p.user_id = $1 \
               AND ($2::timestamptz IS NULL OR p.scheduled_time >= $2) \
               AND ($3::timestamptz IS NULL OR p.scheduled_time < $3) \
             ORDER BY p.scheduled_time ASC",
        )
        .bind(user_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_scheduled_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        update: ScheduledPostUpdate,
    ) -> PortResult<ScheduledPost> {
        let record = sqlx::query_as::<_, ScheduledPostRecord>(&format!(
            "UPDATE scheduled_posts SET \
                scheduled_time = COALESCE($3, scheduled_time), \
                platform = COALESCE($4, platform), \
                content_type = COALESCE($5, content_type), \
                status = COALESCE($6, status), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}, NULL::text AS caption_text",
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(user_id)
        .bind(update.scheduled_time)
        .bind(update.platform)
        .bind(update.content_type.map(|c| c.as_str()))
        .bind(update.status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => post_not_found(post_id),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn delete_scheduled_post(&self, user_id: Uuid, post_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM scheduled_posts WHERE id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(post_not_found(post_id));
        }
        Ok(())
    }
}
