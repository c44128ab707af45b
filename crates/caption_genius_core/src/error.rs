//! crates/caption_genius_core/src/error.rs
//!
//! The error taxonomy of the caption generation pipeline, and the non-fatal
//! warnings it can report alongside a successful caption.

use crate::ports::PortError;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Daily caption limit reached ({used}/{limit} in the last 24 hours)")]
    QuotaExceeded { used: i64, limit: i64 },

    #[error("No credits remaining on your plan")]
    InsufficientCredits,

    #[error("Unknown niche: '{0}'")]
    InvalidNiche(String),

    /// The completion provider rejected our credentials.
    #[error("Invalid completion provider credentials")]
    Unauthorized,

    #[error("The completion provider returned no caption")]
    GenerationFailed,

    #[error("Data store error: {0}")]
    Store(PortError),

    #[error("Completion provider error: {0}")]
    Provider(PortError),
}

/// A best-effort write that failed after the caption was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    UsageLogNotRecorded(String),
    CreditsNotDecremented(String),
}

impl PipelineWarning {
    /// A short, caller-safe description.
    pub fn message(&self) -> &'static str {
        match self {
            PipelineWarning::UsageLogNotRecorded(_) => "usage was not recorded",
            PipelineWarning::CreditsNotDecremented(_) => "credit balance was not updated",
        }
    }
}
