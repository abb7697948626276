//! The three onboarding stages.
//!
//! Each stage borrows the incoming snapshot, makes exactly one gateway call
//! and returns a new snapshot. A gateway error aborts the stage. A malformed
//! answer does not; the extractor fills in a default instead.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::StageError;
use crate::llm::LlmGateway;

use super::extract::extract_list;
use super::prompts::{
    ACCESS_KEY, EQUIPMENT_ACCESS_SCHEMA, EQUIPMENT_KEY, TRAINING_KEY, TRAINING_SCHEMA,
    equipment_access_prompt, info_validation_prompt, render_prompt, training_plan_prompt,
};
use super::state::{OnboardingState, PipelinePhase};

pub const INFO_VALIDATION: &str = "Info Validation";
pub const EQUIPMENT_ACCESS: &str = "Equipment/Access Determination";
pub const TRAINING_PLAN: &str = "Training Plan Generation";

/// One step of the onboarding pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Human-readable stage name, reported on failure.
    fn name(&self) -> &'static str;

    /// Consume a snapshot by reference and produce the next one.
    async fn run(
        &self,
        state: &OnboardingState,
        gateway: &LlmGateway,
    ) -> Result<OnboardingState, StageError>;
}

/// Asks the model to sanity-check the basic record. Advisory only.
pub struct InfoValidation;

#[async_trait]
impl Stage for InfoValidation {
    fn name(&self) -> &'static str {
        INFO_VALIDATION
    }

    async fn run(
        &self,
        state: &OnboardingState,
        gateway: &LlmGateway,
    ) -> Result<OnboardingState, StageError> {
        let transition = state.begin(PipelinePhase::InfoValidated)?;
        let prompt = info_validation_prompt(transition.employee());
        let answer = gateway.invoke(&prompt).await?;

        let note = format!("Employee information validated for {}", transition.employee().name);
        Ok(transition
            .record_exchange(render_prompt(&prompt), answer)
            .hr_note(note)
            .finish())
    }
}

/// Asks the model for equipment and system access.
///
/// The model's lists replace whatever the submission's preference flags
/// produced. If a list can't be parsed, the current one is kept.
pub struct EquipmentAccess;

#[async_trait]
impl Stage for EquipmentAccess {
    fn name(&self) -> &'static str {
        EQUIPMENT_ACCESS
    }

    async fn run(
        &self,
        state: &OnboardingState,
        gateway: &LlmGateway,
    ) -> Result<OnboardingState, StageError> {
        let transition = state.begin(PipelinePhase::AccessDetermined)?;
        let prompt = equipment_access_prompt(transition.employee());
        let answer = gateway
            .invoke_structured(&prompt, EQUIPMENT_ACCESS_SCHEMA)
            .await?;

        let employee = transition.employee();
        let equipment = extract_list(&answer, EQUIPMENT_KEY, &employee.equipment_needs);
        let access = extract_list(&answer, ACCESS_KEY, &employee.system_access);
        if equipment.is_default_filled() || access.is_default_filled() {
            warn!(
                employee = %employee.name,
                equipment = %equipment.source,
                access = %access.source,
                "Kept submitted preferences for unparseable fields"
            );
        }

        let note = format!("Equipment and access determined for {}", employee.name);
        Ok(transition
            .equipment_needs(EQUIPMENT_KEY, equipment)
            .system_access(ACCESS_KEY, access)
            .record_exchange(render_prompt(&prompt), answer)
            .it_note(note)
            .finish())
    }
}

/// Asks the model for a training plan, using recent conversation as context.
pub struct TrainingPlan {
    context_window: usize,
    default_training: Vec<String>,
}

impl TrainingPlan {
    pub fn new(context_window: usize, default_training: Vec<String>) -> Self {
        Self {
            context_window,
            default_training,
        }
    }
}

#[async_trait]
impl Stage for TrainingPlan {
    fn name(&self) -> &'static str {
        TRAINING_PLAN
    }

    async fn run(
        &self,
        state: &OnboardingState,
        gateway: &LlmGateway,
    ) -> Result<OnboardingState, StageError> {
        let context = state.context_summary(self.context_window);
        let transition = state.begin(PipelinePhase::TrainingPlanned)?;
        let prompt = training_plan_prompt(transition.employee(), &context);
        let answer = gateway.invoke_structured(&prompt, TRAINING_SCHEMA).await?;

        let training = extract_list(&answer, TRAINING_KEY, &self.default_training);
        info!(
            employee = %transition.employee().name,
            items = training.value.len(),
            source = %training.source,
            "Training plan extracted"
        );

        let note = format!("Training plan created for {}", transition.employee().name);
        Ok(transition
            .training_plan(TRAINING_KEY, training)
            .record_exchange(render_prompt(&prompt), answer)
            .hr_note(note)
            .finish())
    }
}
