//! crates/caption_genius_core/src/pipeline.rs
//!
//! The caption generation pipeline:
//! validate -> rate-limit -> resolve preferences -> call the provider -> persist.
//!
//! Every step awaits the previous one. Validation and quota failures return before the
//! provider is called. Once a caption is stored, failures writing the usage log or
//! decrementing credits are reported as warnings instead of errors.

use crate::domain::{
    Caption, GenerationRequest, NewCaption, UsageDetails, UsageLogEntry,
    CAPTION_GENERATION_ACTION,
};
use crate::error::{PipelineError, PipelineWarning};
use crate::ports::{CaptionGenerationService, DatabaseService, PortError};
use crate::prompt::build_prompt;
use crate::usage::{check_usage, UsagePolicy};
use crate::validation::validate_generation_request;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// A stored caption plus any auxiliary writes that did not go through.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub caption: Caption,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Clone)]
pub struct CaptionPipeline {
    db: Arc<dyn DatabaseService>,
    generator: Arc<dyn CaptionGenerationService>,
    policy: UsagePolicy,
}

impl CaptionPipeline {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        generator: Arc<dyn CaptionGenerationService>,
        policy: UsagePolicy,
    ) -> Self {
        Self {
            db,
            generator,
            policy,
        }
    }

    pub fn policy(&self) -> UsagePolicy {
        self.policy
    }

    /// Runs the whole pipeline for one request. Not idempotent: every successful
    /// call stores a new caption.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, PipelineError> {
        self.generate_at(request, Utc::now()).await
    }

    pub async fn generate_at(
        &self,
        request: GenerationRequest,
        now: DateTime<Utc>,
    ) -> Result<GenerationOutcome, PipelineError> {
        let start_time = Instant::now();
        let user_id = request.caller_id;

        validate_generation_request(&request)?;
        let usage = check_usage(self.db.as_ref(), self.policy, user_id, now).await?;

        let config = self
            .db
            .get_active_configuration(user_id)
            .await
            .map_err(PipelineError::Store)?;
        let prompt = build_prompt(&request.niche, &request.input, config.as_ref());

        let generated = self
            .generator
            .generate_caption(&prompt)
            .await
            .map_err(|e| match e {
                PortError::Unauthorized => PipelineError::Unauthorized,
                PortError::EmptyResponse(_) => PipelineError::GenerationFailed,
                other => PipelineError::Provider(other),
            })?;
        let generated = generated.trim();
        if generated.is_empty() {
            return Err(PipelineError::GenerationFailed);
        }

        // --- Persistence: the caption row is the one write that must succeed ---
        let niche = self
            .db
            .find_niche_by_name(&request.niche)
            .await
            .map_err(PipelineError::Store)?
            .ok_or_else(|| PipelineError::InvalidNiche(request.niche.clone()))?;

        let caption = self
            .db
            .insert_caption(NewCaption {
                user_id,
                niche_id: niche.id,
                prompt: request.input.clone(),
                generated_caption: generated.to_string(),
            })
            .await
            .map_err(|e| {
                error!(%user_id, "Failed to save caption: {:?}", e);
                PipelineError::Store(e)
            })?;

        let mut warnings = Vec::new();

        let entry = UsageLogEntry {
            user_id,
            action_type: CAPTION_GENERATION_ACTION.to_string(),
            credits_used: 1,
            details: UsageDetails {
                niche: niche.name.clone(),
                model: self.generator.model().to_string(),
            },
            created_at: now,
        };
        if let Err(e) = self.db.insert_usage_log(entry).await {
            warn!(%user_id, caption_id = %caption.id, "Failed to record usage: {:?}", e);
            warnings.push(PipelineWarning::UsageLogNotRecorded(e.to_string()));
        }

        if usage.profile.as_ref().map_or(false, |p| p.is_metered()) {
            match self.db.decrement_credits(user_id).await {
                Ok(Some(balance)) => info!(%user_id, balance, "Credit used"),
                Ok(None) => {
                    warn!(%user_id, "Credit balance was already exhausted");
                    warnings.push(PipelineWarning::CreditsNotDecremented(
                        "balance already at zero".to_string(),
                    ));
                }
                Err(e) => {
                    warn!(%user_id, "Failed to decrement credits: {:?}", e);
                    warnings.push(PipelineWarning::CreditsNotDecremented(e.to_string()));
                }
            }
        }

        info!(
            %user_id,
            caption_id = %caption.id,
            niche = %niche.name,
            "⏱️ Caption generated in {:?}",
            start_time.elapsed()
        );
        Ok(GenerationOutcome { caption, warnings })
    }
}
