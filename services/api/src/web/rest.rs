//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for caption generation, caption history, niches and
//! usage, plus the master definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::customize::{AiConfigurationResponse, SaveConfigurationRequest};
use crate::web::schedule::{
    ContentMixEntryResponse, ContentMixResponse, ContentTypeParam, CreatePostRequest,
    PostStatusParam, ScheduleListResponse, ScheduledPostResponse, UpdatePostRequest,
};
use crate::web::extract::JsonBody;
use crate::web::state::{AppState, SessionContext};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use caption_genius_core::{usage, Caption, CaptionQuery, GenerationRequest, Niche};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

const RECENT_CAPTIONS: i64 = 5;
const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_caption_handler,
        list_captions_handler,
        recent_captions_handler,
        set_favorite_handler,
        delete_caption_handler,
        list_niches_handler,
        usage_handler,
        crate::web::customize::get_configuration_handler,
        crate::web::customize::save_configuration_handler,
        crate::web::schedule::list_posts_handler,
        crate::web::schedule::create_post_handler,
        crate::web::schedule::update_post_handler,
        crate::web::schedule::delete_post_handler,
        crate::web::schedule::content_mix_handler,
    ),
    components(
        schemas(
            GenerateCaptionRequest, GenerateCaptionResponse, CaptionResponse,
            CaptionListResponse, FavoriteRequest, NicheResponse, UsageResponse,
            AiConfigurationResponse, SaveConfigurationRequest, ScheduledPostResponse,
            ScheduleListResponse, CreatePostRequest, UpdatePostRequest, ContentMixResponse,
            ContentMixEntryResponse, ContentTypeParam, PostStatusParam,
        )
    ),
    tags(
        (name = "Caption Genius API", description = "AI caption generation, history, voice settings and scheduling.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Missing fields deserialize as empty strings so they fail validation with a 400.
#[derive(Deserialize, ToSchema)]
pub struct GenerateCaptionRequest {
    #[serde(default)]
    pub niche: String,
    #[serde(default)]
    pub input: String,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateCaptionResponse {
    pub caption: String,
    pub caption_id: Uuid,
    /// Auxiliary bookkeeping that did not complete. The caption is still saved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CaptionResponse {
    pub id: Uuid,
    pub caption: String,
    pub prompt: String,
    pub niche: String,
    pub is_favorite: bool,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Caption> for CaptionResponse {
    fn from(c: Caption) -> Self {
        Self {
            id: c.id,
            caption: c.generated_caption,
            prompt: c.prompt,
            niche: c.niche_name,
            is_favorite: c.is_favorite,
            usage_count: c.usage_count,
            created_at: c.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CaptionListResponse {
    pub captions: Vec<CaptionResponse>,
}

#[derive(Deserialize, IntoParams)]
pub struct CaptionListParams {
    /// Only captions for this niche name.
    pub niche: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct FavoriteRequest {
    pub is_favorite: bool,
}

#[derive(Serialize, ToSchema)]
pub struct NicheResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl From<Niche> for NicheResponse {
    fn from(n: Niche) -> Self {
        Self {
            id: n.id,
            name: n.name,
            description: n.description,
            icon: n.icon,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UsageResponse {
    pub used_today: i64,
    pub daily_quota: i64,
    pub remaining_today: i64,
    pub metered: bool,
    pub credits_remaining: Option<i32>,
}

//=========================================================================================
// Caption Generation
//=========================================================================================

/// Generate a caption for a niche from a short post description.
#[utoipa::path(
    post,
    path = "/api/captions/generate",
    request_body = GenerateCaptionRequest,
    responses(
        (status = 200, description = "Caption generated and saved", body = GenerateCaptionResponse),
        (status = 400, description = "Invalid input or unknown niche"),
        (status = 401, description = "Not signed in, or the provider rejected our credentials"),
        (status = 402, description = "No credits remaining"),
        (status = 429, description = "Daily caption limit reached"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_caption_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    JsonBody(req): JsonBody<GenerateCaptionRequest>,
) -> Result<Json<GenerateCaptionResponse>, ApiError> {
    let outcome = app_state
        .pipeline
        .generate(GenerationRequest {
            niche: req.niche,
            input: req.input,
            caller_id: session.user_id,
        })
        .await?;

    Ok(Json(GenerateCaptionResponse {
        caption: outcome.caption.generated_caption,
        caption_id: outcome.caption.id,
        warnings: outcome
            .warnings
            .iter()
            .map(|w| w.message().to_string())
            .collect(),
    }))
}

//=========================================================================================
// Caption History
//=========================================================================================

/// List the caller's captions, newest first.
#[utoipa::path(
    get,
    path = "/api/captions",
    params(CaptionListParams),
    responses(
        (status = 200, description = "Caption history", body = CaptionListResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_captions_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<CaptionListParams>,
) -> Result<Json<CaptionListResponse>, ApiError> {
    let query = CaptionQuery {
        niche: params.niche.filter(|n| !n.trim().is_empty()),
        limit: Some(
            params
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        ),
        offset: Some(params.offset.unwrap_or(0).max(0)),
    };
    let captions = app_state.db.list_captions(session.user_id, &query).await?;
    Ok(Json(CaptionListResponse {
        captions: captions.into_iter().map(CaptionResponse::from).collect(),
    }))
}

/// The caller's five most recent captions.
#[utoipa::path(
    get,
    path = "/api/captions/recent",
    responses(
        (status = 200, description = "Recent captions", body = CaptionListResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn recent_captions_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<CaptionListResponse>, ApiError> {
    let query = CaptionQuery {
        limit: Some(RECENT_CAPTIONS),
        ..Default::default()
    };
    let captions = app_state.db.list_captions(session.user_id, &query).await?;
    Ok(Json(CaptionListResponse {
        captions: captions.into_iter().map(CaptionResponse::from).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/captions/{id}/favorite",
    request_body = FavoriteRequest,
    params(("id" = Uuid, Path, description = "Caption id")),
    responses(
        (status = 200, description = "Updated caption", body = CaptionResponse),
        (status = 404, description = "No such caption")
    )
)]
pub async fn set_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(caption_id): Path<Uuid>,
    JsonBody(req): JsonBody<FavoriteRequest>,
) -> Result<Json<CaptionResponse>, ApiError> {
    let caption = app_state
        .db
        .set_caption_favorite(session.user_id, caption_id, req.is_favorite)
        .await?;
    Ok(Json(caption.into()))
}

#[utoipa::path(
    delete,
    path = "/api/captions/{id}",
    params(("id" = Uuid, Path, description = "Caption id")),
    responses(
        (status = 204, description = "Caption deleted"),
        (status = 404, description = "No such caption")
    )
)]
pub async fn delete_caption_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(caption_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.db.delete_caption(session.user_id, caption_id).await?;
    info!(user_id = %session.user_id, %caption_id, "Caption deleted");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Niches and Usage
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/niches",
    responses((status = 200, description = "Active niches", body = [NicheResponse]))
)]
pub async fn list_niches_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<NicheResponse>>, ApiError> {
    let niches = app_state.db.list_active_niches().await?;
    Ok(Json(niches.into_iter().map(NicheResponse::from).collect()))
}

/// Quota and credit state for the caller.
#[utoipa::path(
    get,
    path = "/api/usage",
    responses((status = 200, description = "Usage summary", body = UsageResponse))
)]
pub async fn usage_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<UsageResponse>, ApiError> {
    let summary = usage::usage_summary(
        app_state.db.as_ref(),
        app_state.pipeline.policy(),
        session.user_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(UsageResponse {
        used_today: summary.used_today,
        daily_quota: summary.daily_quota,
        remaining_today: summary.remaining_today,
        metered: summary.metered,
        credits_remaining: summary.credits_remaining,
    }))
}
