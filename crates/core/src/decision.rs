//! Decisions returned to callers of the progression engine.

use serde::{Deserialize, Serialize};
use crate::step::Target;

/// Outcome of a Start, Next or Finish request.
///
/// Every variant is an expected terminal state. Lookup failures are
/// reported through the engine's error type instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Send the learner to a step
    Redirect(Target),

    /// The learner cannot go further yet
    Blocked {
        /// Why
        reason: BlockReason,
        /// Where to try again
        retry: Option<Target>,
    },

    /// The learner reached the last content of the training
    NoNextStep,

    /// The training changed since it was completed; achievements must be
    /// reset before resuming
    RequiresStructureResetConfirmation,

    /// The outcome was recorded
    Completed {
        /// Whether the learner passed
        has_passed: bool,
    },
}

impl Decision {
    /// Blocked decision.
    pub fn blocked(reason: BlockReason, retry: Option<Target>) -> Self {
        Decision::Blocked { reason, retry }
    }

    /// Step the caller should remember as the learner's current position.
    pub fn current_step(&self) -> Option<crate::StepId> {
        match self {
            Decision::Redirect(target) => target.step,
            Decision::Blocked { retry: Some(target), .. } => target.step,
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Redirect(_) => "redirect",
            Decision::Blocked { .. } => "blocked",
            Decision::NoNextStep => "no_next_step",
            Decision::RequiresStructureResetConfirmation => "requires_structure_reset_confirmation",
            Decision::Completed { .. } => "completed",
        }
    }
}

/// Why a step blocks the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// Mandatory step never attempted
    RequiredStep {
        /// Step name
        name: String,
    },

    /// Required score not reached
    MinimumScore {
        /// Step name
        name: String,
        /// Required score
        required: u32,
        /// Current-attempt score
        current: Option<u32>,
    },

    /// Attempted but not completed
    StepInProgress {
        /// Step name
        name: String,
    },

    /// Activities wait for manual grading
    PendingGrading {
        /// Module name
        name: String,
        /// Required score
        required: u32,
    },

    /// Live meeting must be attended
    MustBeVisited {
        /// Meeting name
        name: String,
    },

    /// The step just left has no score
    NoScore {
        /// Step name
        name: String,
    },
}

impl BlockReason {
    /// Name of the step that blocks.
    pub fn step_name(&self) -> &str {
        match self {
            BlockReason::RequiredStep { name }
            | BlockReason::MinimumScore { name, .. }
            | BlockReason::StepInProgress { name }
            | BlockReason::PendingGrading { name, .. }
            | BlockReason::MustBeVisited { name }
            | BlockReason::NoScore { name } => name,
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::RequiredStep { name } => {
                write!(f, "A required step: {} should be done first.", name)
            }
            BlockReason::MinimumScore { name, required, .. } => write!(
                f,
                "You should first get a minimum score of {} to the step {} before going further.",
                required, name
            ),
            BlockReason::StepInProgress { name } => {
                write!(f, "The step {} has been started but is not completed yet.", name)
            }
            BlockReason::PendingGrading { name, required } => write!(
                f,
                "One or several activities in module {} require a manual grading. \
                 You will be allowed to continue the training as soon as these activities \
                 have been graded and if you reach the minimum score {}.",
                name, required
            ),
            BlockReason::MustBeVisited { name } => {
                write!(f, "The live meeting {} must be attended before going further.", name)
            }
            BlockReason::NoScore { name } => {
                write!(f, "No score provided for the step {}.", name)
            }
        }
    }
}
