pub mod domain;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod pipeline;
pub mod ports;
pub mod prompt;
pub mod schedule;
pub mod usage;
pub mod validation;

pub use domain::{
    AiConfiguration, Caption, CaptionQuery, ContentType, GenerationRequest, NewAiConfiguration,
    NewCaption, NewScheduledPost, Niche, PostStatus, Profile, ScheduleRange, ScheduledPost,
    ScheduledPostUpdate, UsageDetails, UsageLogEntry, UsageSummary,
};
pub use error::{PipelineError, PipelineWarning};
pub use pipeline::{CaptionPipeline, GenerationOutcome};
pub use ports::{CaptionGenerationService, DatabaseService, PortError, PortResult};
pub use usage::UsagePolicy;
pub use validation::ValidationError;
