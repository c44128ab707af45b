//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request session context.

use caption_genius_core::{
    CaptionGenerationService, CaptionPipeline, DatabaseService, UsagePolicy,
};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// It holds no per-user mutable data.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub pipeline: CaptionPipeline,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        generator: Arc<dyn CaptionGenerationService>,
        policy: UsagePolicy,
    ) -> Self {
        let pipeline = CaptionPipeline::new(db.clone(), generator, policy);
        Self { db, pipeline }
    }
}

//=========================================================================================
// SessionContext (Specific to One Authenticated Request)
//=========================================================================================

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    pub user_id: Uuid,
}
