//! Onboarding state: the snapshot threaded through the pipeline stages.
//!
//! Stages never mutate a state in place. They call
//! [`OnboardingState::begin`] to get a [`Transition`] over a copy, append to
//! it, and [`finish`](Transition::finish) into a new snapshot. Conversation
//! entries are immutable and shared through `Arc`, so copying a snapshot
//! copies pointers, not message text.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StageError;
use crate::llm::Role;

use super::extract::{ExtractionSource, Extracted};
use super::model::{Employee, OnboardingRecord, OnboardingStatus};
use super::preferences::map_preferences;

/// Position of a run in the stage sequence.
///
/// Progresses linearly: NotStarted → InfoValidated → AccessDetermined →
/// TrainingPlanned. `Failed` is reachable from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    #[default]
    NotStarted,
    InfoValidated,
    AccessDetermined,
    TrainingPlanned,
    Failed,
}

impl PipelinePhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: PipelinePhase) -> bool {
        use PipelinePhase::*;
        match (self, target) {
            (NotStarted, InfoValidated)
            | (InfoValidated, AccessDetermined)
            | (AccessDetermined, TrainingPlanned) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Whether the run is over (completed or failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TrainingPlanned | Self::Failed)
    }

    /// The next phase on the success path, if any.
    pub fn next(&self) -> Option<PipelinePhase> {
        use PipelinePhase::*;
        match self {
            NotStarted => Some(InfoValidated),
            InfoValidated => Some(AccessDetermined),
            AccessDetermined => Some(TrainingPlanned),
            TrainingPlanned | Failed => None,
        }
    }

    /// Step label recorded in `completedSteps` when this phase is reached.
    pub fn step_label(&self) -> Option<&'static str> {
        match self {
            Self::InfoValidated => Some("employee_info"),
            Self::AccessDetermined => Some("equipment_access"),
            Self::TrainingPlanned => Some("training_plan"),
            Self::NotStarted | Self::Failed => None,
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InfoValidated => "info_validated",
            Self::AccessDetermined => "access_determined",
            Self::TrainingPlanned => "training_planned",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One prompt or answer in the run's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

/// Snapshot of one onboarding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingState {
    employee: Employee,
    hr_notes: Vec<String>,
    it_notes: Vec<String>,
    messages: Vec<Arc<ConversationEntry>>,
    phase: PipelinePhase,
    completed_steps: Vec<String>,
    extractions: BTreeMap<String, ExtractionSource>,
}

impl OnboardingState {
    /// Initial state for a record. Equipment and access start from the
    /// record's preference flags.
    pub fn new(record: &OnboardingRecord) -> Self {
        let lists = map_preferences(record);
        Self {
            employee: Employee {
                name: record.name.trim().to_string(),
                position: record.position.trim().to_string(),
                department: record.department.trim().to_string(),
                start_date: record.start_date.trim().to_string(),
                equipment_needs: lists.equipment_needs,
                system_access: lists.system_access,
                training_requirements: Vec::new(),
                status: OnboardingStatus::Pending,
            },
            hr_notes: Vec::new(),
            it_notes: Vec::new(),
            messages: Vec::new(),
            phase: PipelinePhase::NotStarted,
            completed_steps: Vec::new(),
            extractions: BTreeMap::new(),
        }
    }

    pub fn employee(&self) -> &Employee {
        &self.employee
    }

    pub fn hr_notes(&self) -> &[String] {
        &self.hr_notes
    }

    pub fn it_notes(&self) -> &[String] {
        &self.it_notes
    }

    pub fn messages(&self) -> &[Arc<ConversationEntry>] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Which tier produced each structured field, keyed by JSON key.
    pub fn extractions(&self) -> &BTreeMap<String, ExtractionSource> {
        &self.extractions
    }

    /// The last `window` conversation entries as `role: content` lines.
    pub fn context_summary(&self, window: usize) -> String {
        let skip = self.messages.len().saturating_sub(window);
        self.messages
            .iter()
            .skip(skip)
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Start a transition towards `target` on a copy of this state.
    pub fn begin(&self, target: PipelinePhase) -> Result<Transition, StageError> {
        if target == PipelinePhase::Failed || !self.phase.can_transition_to(target) {
            return Err(StageError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        Ok(Transition {
            next: self.clone(),
            target,
        })
    }

    /// Stamp this snapshot as failed. Terminal snapshots are returned unchanged.
    pub fn into_failed(mut self) -> Self {
        if self.phase.can_transition_to(PipelinePhase::Failed) {
            self.phase = PipelinePhase::Failed;
        }
        if self.employee.status.can_transition_to(OnboardingStatus::Failed) {
            self.employee.status = OnboardingStatus::Failed;
        }
        self
    }
}

/// A pending stage transition. Only appends and overwrites allowed by the
/// stage contract are exposed.
#[derive(Debug)]
pub struct Transition {
    next: OnboardingState,
    target: PipelinePhase,
}

impl Transition {
    /// Read access to the state being built.
    pub fn employee(&self) -> &Employee {
        &self.next.employee
    }

    /// Log a prompt and the raw answer it produced.
    pub fn record_exchange(mut self, prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        self.next.messages.push(Arc::new(ConversationEntry {
            role: Role::User,
            content: prompt.into(),
        }));
        self.next.messages.push(Arc::new(ConversationEntry {
            role: Role::Assistant,
            content: answer.into(),
        }));
        self
    }

    pub fn hr_note(mut self, note: impl Into<String>) -> Self {
        self.next.hr_notes.push(note.into());
        self
    }

    pub fn it_note(mut self, note: impl Into<String>) -> Self {
        self.next.it_notes.push(note.into());
        self
    }

    pub fn equipment_needs(mut self, key: &str, extracted: Extracted) -> Self {
        self.next.extractions.insert(key.to_string(), extracted.source);
        self.next.employee.equipment_needs = extracted.value;
        self
    }

    pub fn system_access(mut self, key: &str, extracted: Extracted) -> Self {
        self.next.extractions.insert(key.to_string(), extracted.source);
        self.next.employee.system_access = extracted.value;
        self
    }

    /// Set the training plan and mark the employee completed.
    pub fn training_plan(mut self, key: &str, extracted: Extracted) -> Self {
        self.next.extractions.insert(key.to_string(), extracted.source);
        self.next.employee.training_requirements = extracted.value;
        if self.next.employee.status.can_transition_to(OnboardingStatus::Completed) {
            self.next.employee.status = OnboardingStatus::Completed;
        }
        self
    }

    /// Produce the new snapshot.
    pub fn finish(mut self) -> OnboardingState {
        self.next.phase = self.target;
        if let Some(label) = self.target.step_label() {
            self.next.completed_steps.push(label.to_string());
        }
        self.next
    }
}
