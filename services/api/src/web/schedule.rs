//! services/api/src/web/schedule.rs
//!
//! Content calendar handlers: scheduling captions, rescheduling, cancelling and the
//! content mix breakdown for a date range.

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::state::{AppState, SessionContext};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use caption_genius_core::{
    schedule::{self, ContentMixEntry},
    ContentType, NewScheduledPost, PostStatus, ScheduleRange, ScheduledPost, ScheduledPostUpdate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Wire Enums
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentTypeParam {
    Promotional,
    Educational,
    Entertaining,
    Engagement,
}

impl From<ContentTypeParam> for ContentType {
    fn from(p: ContentTypeParam) -> Self {
        match p {
            ContentTypeParam::Promotional => ContentType::Promotional,
            ContentTypeParam::Educational => ContentType::Educational,
            ContentTypeParam::Entertaining => ContentType::Entertaining,
            ContentTypeParam::Engagement => ContentType::Engagement,
        }
    }
}

impl From<ContentType> for ContentTypeParam {
    fn from(c: ContentType) -> Self {
        match c {
            ContentType::Promotional => ContentTypeParam::Promotional,
            ContentType::Educational => ContentTypeParam::Educational,
            ContentType::Entertaining => ContentTypeParam::Entertaining,
            ContentType::Engagement => ContentTypeParam::Engagement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatusParam {
    Scheduled,
    Published,
    Failed,
    Cancelled,
}

impl From<PostStatusParam> for PostStatus {
    fn from(p: PostStatusParam) -> Self {
        match p {
            PostStatusParam::Scheduled => PostStatus::Scheduled,
            PostStatusParam::Published => PostStatus::Published,
            PostStatusParam::Failed => PostStatus::Failed,
            PostStatusParam::Cancelled => PostStatus::Cancelled,
        }
    }
}

impl From<PostStatus> for PostStatusParam {
    fn from(s: PostStatus) -> Self {
        match s {
            PostStatus::Scheduled => PostStatusParam::Scheduled,
            PostStatus::Published => PostStatusParam::Published,
            PostStatus::Failed => PostStatusParam::Failed,
            PostStatus::Cancelled => PostStatusParam::Cancelled,
        }
    }
}

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub caption_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub platform: String,
    pub content_type: ContentTypeParam,
}

/// Omitted fields keep their current value.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdatePostRequest {
    pub scheduled_time: Option<DateTime<Utc>>,
    pub platform: Option<String>,
    pub content_type: Option<ContentTypeParam>,
    pub status: Option<PostStatusParam>,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduledPostResponse {
    pub id: Uuid,
    pub caption_id: Uuid,
    pub caption: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub platform: String,
    pub status: PostStatusParam,
    pub content_type: ContentTypeParam,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ScheduledPost> for ScheduledPostResponse {
    fn from(p: ScheduledPost) -> Self {
        Self {
            id: p.id,
            caption_id: p.caption_id,
            caption: p.caption_text,
            scheduled_time: p.scheduled_time,
            platform: p.platform,
            status: p.status.into(),
            content_type: p.content_type.into(),
            error_message: p.error_message,
            retry_count: p.retry_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleListResponse {
    pub posts: Vec<ScheduledPostResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct ContentMixEntryResponse {
    pub content_type: ContentTypeParam,
    pub count: usize,
    pub percentage: f64,
}

impl From<ContentMixEntry> for ContentMixEntryResponse {
    fn from(e: ContentMixEntry) -> Self {
        Self {
            content_type: e.content_type.into(),
            count: e.count,
            percentage: e.percentage,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ContentMixResponse {
    pub total: usize,
    pub entries: Vec<ContentMixEntryResponse>,
}

/// Half-open range `[from, to)`. Either bound may be omitted.
#[derive(Deserialize, IntoParams, Default)]
pub struct ScheduleParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl From<ScheduleParams> for ScheduleRange {
    fn from(p: ScheduleParams) -> Self {
        ScheduleRange {
            from: p.from,
            to: p.to,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/schedule",
    params(ScheduleParams),
    responses(
        (status = 200, description = "Scheduled posts in time order", body = ScheduleListResponse),
        (status = 400, description = "Range start is not before its end")
    )
)]
pub async fn list_posts_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<ScheduleListResponse>, ApiError> {
    let posts = schedule::list_schedule(app_state.db.as_ref(), session.user_id, params.into()).await?;
    Ok(Json(ScheduleListResponse {
        posts: posts.into_iter().map(ScheduledPostResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/schedule",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post scheduled", body = ScheduledPostResponse),
        (status = 400, description = "Blank platform"),
        (status = 404, description = "No such caption")
    )
)]
pub async fn create_post_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = schedule::schedule_caption(
        app_state.db.as_ref(),
        session.user_id,
        NewScheduledPost {
            caption_id: req.caption_id,
            scheduled_time: req.scheduled_time,
            platform: req.platform,
            content_type: req.content_type.into(),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ScheduledPostResponse::from(post))))
}

#[utoipa::path(
    put,
    path = "/api/schedule/{id}",
    request_body = UpdatePostRequest,
    params(("id" = Uuid, Path, description = "Scheduled post id")),
    responses(
        (status = 200, description = "Updated post", body = ScheduledPostResponse),
        (status = 400, description = "Blank platform"),
        (status = 404, description = "No such post")
    )
)]
pub async fn update_post_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(post_id): Path<Uuid>,
    JsonBody(req): JsonBody<UpdatePostRequest>,
) -> Result<Json<ScheduledPostResponse>, ApiError> {
    let update = ScheduledPostUpdate {
        scheduled_time: req.scheduled_time,
        platform: req.platform,
        content_type: req.content_type.map(Into::into),
        status: req.status.map(Into::into),
    };
    let post = schedule::update_schedule(app_state.db.as_ref(), session.user_id, post_id, update).await?;
    Ok(Json(post.into()))
}

#[utoipa::path(
    delete,
    path = "/api/schedule/{id}",
    params(("id" = Uuid, Path, description = "Scheduled post id")),
    responses(
        (status = 204, description = "Post removed from the calendar"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .db
        .delete_scheduled_post(session.user_id, post_id)
        .await?;
    info!(user_id = %session.user_id, %post_id, "Scheduled post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Share of each content type among posts scheduled in the range.
#[utoipa::path(
    get,
    path = "/api/schedule/content-mix",
    params(ScheduleParams),
    responses(
        (status = 200, description = "Count and percentage per content type", body = ContentMixResponse),
        (status = 400, description = "Range start is not before its end")
    )
)]
pub async fn content_mix_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<ContentMixResponse>, ApiError> {
    let posts = schedule::list_schedule(app_state.db.as_ref(), session.user_id, params.into()).await?;
    Ok(Json(ContentMixResponse {
        total: posts.len(),
        entries: schedule::content_mix(&posts)
            .into_iter()
            .map(ContentMixEntryResponse::from)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_enums_use_lowercase_names() {
        let json = serde_json::to_string(&ContentTypeParam::Entertaining).unwrap();
        assert_eq!(json, "\"entertaining\"");
        let status: PostStatusParam = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(PostStatus::from(status), PostStatus::Cancelled);
    }

    #[test]
    fn wire_names_match_stored_names() {
        for content_type in ContentType::ALL {
            let json = serde_json::to_string(&ContentTypeParam::from(content_type)).unwrap();
            assert_eq!(json, format!("\"{}\"", content_type.as_str()));
        }
    }
}
