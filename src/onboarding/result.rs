//! External JSON shape of a pipeline run.

use serde::{Deserialize, Serialize};

use super::model::Employee;
use super::state::OnboardingState;

/// `{success: true, ...}` on completion, `{success: false, error, stage}`
/// otherwise. The message log itself is not exposed, only its length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OnboardingResult {
    Success(SuccessResult),
    Failure(FailureResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResult {
    pub success: bool,
    pub employee: Employee,
    pub hr_notes: Vec<String>,
    pub it_notes: Vec<String>,
    pub message_count: usize,
    pub completed_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResult {
    pub success: bool,
    pub error: String,
    pub stage: String,
}

impl OnboardingResult {
    pub fn success(state: &OnboardingState) -> Self {
        Self::Success(SuccessResult {
            success: true,
            employee: state.employee().clone(),
            hr_notes: state.hr_notes().to_vec(),
            it_notes: state.it_notes().to_vec(),
            message_count: state.message_count(),
            completed_steps: state.completed_steps().to_vec(),
        })
    }

    pub fn failure(stage: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure(FailureResult {
            success: false,
            error: error.into(),
            stage: stage.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
