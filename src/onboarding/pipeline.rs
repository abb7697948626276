//! Pipeline orchestrator. Runs the stages in order and owns the failure
//! boundary.
//!
//! Flow:
//! 1. Validate the record (rejected records never start a run)
//! 2. Build the initial state from the record's preference flags
//! 3. Info Validation → Equipment/Access Determination → Training Plan
//! 4. Stop at the first stage error; no retries

use tracing::{Instrument, error, info, info_span};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, RecordError, StageError};
use crate::llm::LlmGateway;

use super::model::OnboardingRecord;
use super::result::OnboardingResult;
use super::stages::{EquipmentAccess, InfoValidation, Stage, TrainingPlan};
use super::state::OnboardingState;

/// How a run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every stage ran. The state is the authoritative final snapshot.
    Completed(OnboardingState),
    /// A stage failed. `state` is the last good snapshot, stamped failed.
    Failed {
        stage: &'static str,
        error: StageError,
        state: OnboardingState,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The final (or last good) snapshot, for persisting or diagnostics.
    pub fn state(&self) -> &OnboardingState {
        match self {
            Self::Completed(state) => state,
            Self::Failed { state, .. } => state,
        }
    }

    /// External result shape.
    pub fn to_result(&self) -> OnboardingResult {
        match self {
            Self::Completed(state) => OnboardingResult::success(state),
            Self::Failed { stage, error, .. } => OnboardingResult::failure(*stage, error.to_string()),
        }
    }

    /// The completed state, or the failure as an error.
    pub fn into_result(self) -> Result<OnboardingState, PipelineError> {
        match self {
            Self::Completed(state) => Ok(state),
            Self::Failed { stage, error, .. } => Err(PipelineError::StageFailed {
                stage,
                source: error,
            }),
        }
    }
}

/// Sequential onboarding workflow.
///
/// Holds no per-run state, so one pipeline can serve concurrent runs.
pub struct OnboardingPipeline {
    gateway: LlmGateway,
    stages: Vec<Box<dyn Stage>>,
}

impl OnboardingPipeline {
    pub fn new(gateway: LlmGateway, config: PipelineConfig) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(InfoValidation),
            Box::new(EquipmentAccess),
            Box::new(TrainingPlan::new(
                config.context_window,
                config.default_training,
            )),
        ];
        Self { gateway, stages }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Validate `record` and run it through every stage.
    pub async fn run(&self, record: &OnboardingRecord) -> Result<PipelineOutcome, RecordError> {
        record.validate()?;
        Ok(self.run_state(OnboardingState::new(record)).await)
    }

    /// Run an already-built initial state through every stage.
    pub async fn run_state(&self, initial: OnboardingState) -> PipelineOutcome {
        let span = info_span!(
            "onboarding",
            employee = %initial.employee().name,
            model = self.gateway.model_name()
        );
        self.run_stages(initial).instrument(span).await
    }

    async fn run_stages(&self, initial: OnboardingState) -> PipelineOutcome {
        info!("Starting onboarding pipeline");
        let mut current = initial;

        for stage in &self.stages {
            match stage.run(&current, &self.gateway).await {
                Ok(next) => {
                    info!(
                        stage = stage.name(),
                        phase = %next.phase(),
                        messages = next.message_count(),
                        "Stage completed"
                    );
                    current = next;
                }
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "Stage failed; aborting pipeline");
                    return PipelineOutcome::Failed {
                        stage: stage.name(),
                        error: e,
                        state: current.into_failed(),
                    };
                }
            }
        }

        info!(
            equipment = current.employee().equipment_needs.len(),
            access = current.employee().system_access.len(),
            training = current.employee().training_requirements.len(),
            "Onboarding pipeline completed"
        );
        PipelineOutcome::Completed(current)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
    use crate::onboarding::extract::ExtractionSource;
    use crate::onboarding::model::OnboardingStatus;
    use crate::onboarding::state::PipelinePhase;

    /// Mock LLM that replays a script of answers, one per call.
    struct ScriptedLlm {
        answers: Vec<Result<String, String>>,
        calls: AtomicUsize,
    }

    impl ScriptedLlm {
        fn new(answers: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                answers: answers
                    .into_iter()
                    .map(|a| a.map(String::from).map_err(String::from))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        fn model_name(&self) -> &str {
            "mock-scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.get(i) {
                Some(Ok(content)) => Ok(CompletionResponse {
                    content: content.clone(),
                    input_tokens: 10,
                    output_tokens: 10,
                    finish_reason: FinishReason::Stop,
                }),
                Some(Err(reason)) => Err(LlmError::RequestFailed {
                    provider: "mock".into(),
                    reason: reason.clone(),
                }),
                None => Err(LlmError::InvalidResponse {
                    provider: "mock".into(),
                    reason: "script exhausted".into(),
                }),
            }
        }
    }

    fn pipeline(llm: Arc<ScriptedLlm>) -> OnboardingPipeline {
        OnboardingPipeline::new(
            LlmGateway::new(llm, GatewayConfig::default()),
            PipelineConfig::default(),
        )
    }

    fn record() -> OnboardingRecord {
        OnboardingRecord::new("Jane Smith", "Marketing Manager", "Marketing", "2023-06-15")
    }

    #[test]
    fn stages_run_in_fixed_order() {
        let p = pipeline(ScriptedLlm::new(vec![]));
        assert_eq!(
            p.stage_names(),
            vec![
                "Info Validation",
                "Equipment/Access Determination",
                "Training Plan Generation"
            ]
        );
    }

    #[tokio::test]
    async fn invalid_record_never_calls_llm() {
        let llm = ScriptedLlm::new(vec![]);
        let p = pipeline(llm.clone());
        let mut bad = record();
        bad.position = String::new();

        let err = p.run(&bad).await.unwrap_err();
        assert_eq!(err, RecordError::MissingField("position"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn first_stage_failure_stops_everything() {
        let llm = ScriptedLlm::new(vec![Err("connection refused")]);
        let p = pipeline(llm.clone());

        let outcome = p.run(&record()).await.unwrap();
        match &outcome {
            PipelineOutcome::Failed { stage, state, .. } => {
                assert_eq!(*stage, "Info Validation");
                assert_eq!(state.phase(), PipelinePhase::Failed);
                assert_eq!(state.message_count(), 0);
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unparseable_equipment_keeps_submitted_preferences() {
        let llm = ScriptedLlm::new(vec![
            Ok("Looks fine."),
            Ok("Give them whatever they asked for."),
            Ok(r#"{"training_requirements": ["Brand Guidelines"]}"#),
        ]);
        let mut rec = record();
        rec.equipment.insert("monitor".into(), true);

        let outcome = pipeline(llm).run(&rec).await.unwrap();
        let state = outcome.state();
        assert!(outcome.is_success());
        assert_eq!(state.employee().equipment_needs, vec!["Monitor"]);
        assert_eq!(state.employee().system_access, vec!["Email"]);
        assert_eq!(
            state.extractions().get("equipment_needs"),
            Some(&ExtractionSource::Default)
        );
        assert_eq!(
            state.extractions().get("training_requirements"),
            Some(&ExtractionSource::Model)
        );
    }

    #[tokio::test]
    async fn model_lists_override_submitted_preferences() {
        let llm = ScriptedLlm::new(vec![
            Ok("ok"),
            Ok(r#"{"equipment_needs": ["Laptop", "Phone"], "system_access": ["CRM"]}"#),
            Ok(r#"{"training_requirements": ["CRM Basics"]}"#),
        ]);
        let mut rec = record();
        rec.equipment.insert("headset".into(), true);
        rec.access.insert("github".into(), true);

        let state = pipeline(llm).run(&rec).await.unwrap().into_result().unwrap();
        assert_eq!(state.employee().equipment_needs, vec!["Laptop", "Phone"]);
        assert_eq!(state.employee().system_access, vec!["CRM"]);
        assert_eq!(state.employee().status, OnboardingStatus::Completed);
    }

    #[tokio::test]
    async fn training_stage_failure_stamps_snapshot_failed() {
        let llm = ScriptedLlm::new(vec![
            Ok("ok"),
            Ok(r#"{"equipment_needs": ["Laptop"], "system_access": ["Email"]}"#),
            Err("connection reset"),
        ]);
        let outcome = pipeline(llm.clone()).run(&record()).await.unwrap();

        let PipelineOutcome::Failed { stage, state, .. } = &outcome else {
            panic!("Expected Failed, got {:?}", outcome);
        };
        assert_eq!(*stage, "Training Plan Generation");
        assert_eq!(state.phase(), PipelinePhase::Failed);
        assert_eq!(state.employee().status, OnboardingStatus::Failed);
        assert!(state.employee().training_requirements.is_empty());
        assert_eq!(state.hr_notes().len(), 1);
        assert_eq!(state.it_notes().len(), 1);
        assert_eq!(state.completed_steps(), ["employee_info", "equipment_access"]);
        assert_eq!(state.message_count(), 4);
        assert!(!outcome.to_result().is_success());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn into_result_wraps_stage_failure() {
        let llm = ScriptedLlm::new(vec![Ok("ok"), Ok("{}"), Err("401 unauthorized")]);
        let err = pipeline(llm).run(&record()).await.unwrap().into_result().unwrap_err();
        let PipelineError::StageFailed { stage, .. } = &err;
        assert_eq!(*stage, "Training Plan Generation");
        assert!(err.to_string().contains("401 unauthorized"));
    }
}
