//! services/api/src/web/customize.rs
//!
//! Handlers for the caller's AI voice configuration.

use crate::error::ApiError;
use crate::web::extract::JsonBody;
use crate::web::state::{AppState, SessionContext};
use axum::{extract::State, response::Json, Extension};
use caption_genius_core::{validation::validate_configuration, AiConfiguration, NewAiConfiguration};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct SaveConfigurationRequest {
    pub purpose: String,
    pub tone: String,
    pub preferences: String,
    pub additional_traits: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AiConfigurationResponse {
    pub id: Uuid,
    pub purpose: String,
    pub tone: String,
    pub preferences: String,
    pub additional_traits: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AiConfiguration> for AiConfigurationResponse {
    fn from(c: AiConfiguration) -> Self {
        Self {
            id: c.id,
            purpose: c.purpose,
            tone: c.tone,
            preferences: c.preferences,
            additional_traits: c.additional_traits,
            created_at: c.created_at,
        }
    }
}

/// The active configuration, or `null` when the caller has none.
#[utoipa::path(
    get,
    path = "/api/ai-configuration",
    responses(
        (status = 200, description = "Active configuration or null", body = AiConfigurationResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_configuration_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Option<AiConfigurationResponse>>, ApiError> {
    let config = app_state.db.get_active_configuration(session.user_id).await?;
    Ok(Json(config.map(AiConfigurationResponse::from)))
}

/// Save a configuration and make it the only active one.
#[utoipa::path(
    put,
    path = "/api/ai-configuration",
    request_body = SaveConfigurationRequest,
    responses(
        (status = 200, description = "Saved configuration", body = AiConfigurationResponse),
        (status = 400, description = "A required field is blank"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn save_configuration_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    JsonBody(req): JsonBody<SaveConfigurationRequest>,
) -> Result<Json<AiConfigurationResponse>, ApiError> {
    let config = validate_configuration(NewAiConfiguration {
        purpose: req.purpose,
        tone: req.tone,
        preferences: req.preferences,
        additional_traits: req.additional_traits,
    })?;

    let saved = app_state.db.save_configuration(session.user_id, config).await?;
    info!(user_id = %session.user_id, config_id = %saved.id, "AI configuration activated");
    Ok(Json(saved.into()))
}
