//! Engine error type.

use waypoint_core::{StepId, TrainingId, UserId};
use waypoint_storage::StorageError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Fatal failures of a single request.
///
/// Expected terminal states (blocked, no next step, ...) are decisions, not
/// errors. These variants mean the request cannot be answered at all.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Training does not exist
    #[error("Training not found: {0}")]
    UnknownTraining(TrainingId),

    /// Learner does not exist
    #[error("Learner not found: {0}")]
    UnknownLearner(UserId),

    /// Step is not part of the training
    #[error("Step {step} is not part of training {training}")]
    UnknownStep {
        /// Training searched
        training: TrainingId,
        /// Missing step
        step: StepId,
    },

    /// Live session referenced by a step does not exist
    #[error("Session for step {0} not found")]
    UnknownSession(StepId),

    /// Results reference content absent from the training
    #[error("Result recorded for step {step} which is not part of training {training}")]
    InconsistentResults {
        /// Training
        training: TrainingId,
        /// Orphan step
        step: StepId,
    },

    /// Course nested inside another course
    #[error("Course {0} is nested inside another course")]
    NestedCourse(StepId),

    /// Training has no steps
    #[error("No first step assigned")]
    NoFirstStep,

    /// Resolved step has no navigable target
    #[error("No URL for step {0}")]
    NoStepUrl(StepId),

    /// Collaborator failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::UnknownTraining(_) => "unknown_training",
            EngineError::UnknownLearner(_) => "unknown_learner",
            EngineError::UnknownStep { .. } => "unknown_step",
            EngineError::UnknownSession(_) => "unknown_session",
            EngineError::InconsistentResults { .. } => "inconsistent_results",
            EngineError::NestedCourse(_) => "nested_course",
            EngineError::NoFirstStep => "no_first_step",
            EngineError::NoStepUrl(_) => "no_step_url",
            EngineError::Storage(_) => "storage",
        }
    }

    /// Text safe to show to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::NoFirstStep => "No first step assigned.",
            EngineError::NoStepUrl(_) => "No URL for the first step.",
            _ => "This content is currently unavailable.",
        }
    }
}
