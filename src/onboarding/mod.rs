//! Employee onboarding pipeline.
//!
//! A new-hire record is mapped to an initial [`OnboardingState`], then
//! threaded through three LLM-backed stages by [`OnboardingPipeline`]. Each
//! stage returns a fresh snapshot; the final one is turned into an
//! [`OnboardingResult`] for persistence.

pub mod extract;
pub mod model;
pub mod pipeline;
pub mod preferences;
pub mod prompts;
pub mod result;
pub mod stages;
pub mod state;

pub use extract::{Extracted, ExtractionSource, extract_list};
pub use model::{Employee, OnboardingRecord, OnboardingStatus};
pub use pipeline::{OnboardingPipeline, PipelineOutcome};
pub use preferences::{RequirementLists, map_preferences};
pub use result::{FailureResult, OnboardingResult, SuccessResult};
pub use stages::Stage;
pub use state::{ConversationEntry, OnboardingState, PipelinePhase};
