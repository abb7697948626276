//! Persistence layer for pipeline results.

pub mod workflows;

pub use workflows::WorkflowStore;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::onboarding::OnboardingResult;

/// Anything that can durably keep a finished result.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist `result` for `employee_id`, returning where it landed.
    async fn save(&self, result: &OnboardingResult, employee_id: &str)
    -> Result<PathBuf, StoreError>;
}
