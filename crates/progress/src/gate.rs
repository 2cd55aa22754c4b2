//! Mandatory gate evaluation.

use std::borrow::Cow;
use waypoint_core::{
    training_home, BlockReason, Decision, ModuleAttempt, RouteTemplates, Step, Target, TrainingId,
    Typology,
};
use crate::selection::AttemptSelection;

/// Facts about the learner needed to gate one step.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    /// Training being navigated
    pub training: TrainingId,

    /// Learner owns the training
    pub is_owner: bool,

    /// Session membership, for meetings and ILTs
    pub is_member: Option<bool>,

    /// Skills subsystem installed
    pub skills_system: bool,

    /// Raw attempts at the module, oldest first
    pub module_attempts: &'a [ModuleAttempt],

    /// URL templates for retry targets
    pub routes: &'a RouteTemplates,
}

/// Result of gating one step.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Requirements satisfied
    Pass,
    /// The step does not apply to this learner
    Skip,
    /// The learner must satisfy the step first
    Blocked {
        /// Why
        reason: BlockReason,
        /// Where to try again
        retry: Option<Target>,
    },
}

impl GateOutcome {
    /// Whether the outcome blocks.
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateOutcome::Blocked { .. })
    }

    /// Blocked decision, if blocked.
    pub fn into_decision(self) -> Option<Decision> {
        match self {
            GateOutcome::Blocked { reason, retry } => Some(Decision::blocked(reason, retry)),
            GateOutcome::Pass | GateOutcome::Skip => None,
        }
    }
}

/// Decides whether a step lets the learner through.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateEvaluator;

impl GateEvaluator {
    /// Create a new evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the gate of `step`.
    ///
    /// Rules, first match wins:
    /// 1. a live session the learner is not invited to is skipped;
    /// 2. optional steps pass;
    /// 3. a module waiting for manual grading blocks;
    /// 4. a must-be-visited meeting blocks non-owners who did not attend;
    /// 5. a score below the required minimum blocks;
    /// 6. an unattempted step blocks;
    /// 7. an attempted but uncompleted step blocks.
    pub fn evaluate(&self, step: &Step, ctx: &GateContext<'_>) -> GateOutcome {
        if step.typology.is_live_session() && ctx.is_member == Some(false) {
            return GateOutcome::Skip;
        }
        if !step.mandatory {
            return GateOutcome::Pass;
        }

        let mut step = Cow::Borrowed(step);
        if step.typology == Typology::Module && step.skills_active && ctx.skills_system {
            let best = step.best_score;
            step.to_mut().current_attempt_score = best;
        }

        if step.typology == Typology::Module
            && AttemptSelection::from(step.keep_results).pending_grading(ctx.module_attempts)
        {
            return GateOutcome::Blocked {
                reason: BlockReason::PendingGrading {
                    name: step.name.clone(),
                    required: step.required_score.unwrap_or(0),
                },
                retry: training_home(ctx.training, ctx.routes),
            };
        }

        match requirement_unmet(&step, ctx.is_owner) {
            Some(reason) => GateOutcome::Blocked {
                reason,
                retry: step.start_target(ctx.training, ctx.routes),
            },
            None => GateOutcome::Pass,
        }
    }

    /// Evaluate the requirement of a course enclosing the step just left.
    ///
    /// Only the score and attendance rules apply; a blocked course retries
    /// at its first child.
    pub fn evaluate_course(&self, course: &Step, ctx: &GateContext<'_>) -> GateOutcome {
        if !course.mandatory {
            return GateOutcome::Pass;
        }
        let reason = match course.required_score {
            Some(required) if course.best_score.unwrap_or(0) < required => Some(BlockReason::MinimumScore {
                name: course.name.clone(),
                required,
                current: course.current_attempt_score,
            }),
            Some(_) => None,
            None if course.attempts == 0 => Some(BlockReason::RequiredStep { name: course.name.clone() }),
            None => None,
        };
        match reason {
            Some(reason) => GateOutcome::Blocked {
                reason,
                retry: course.start_target(ctx.training, ctx.routes),
            },
            None => GateOutcome::Pass,
        }
    }
}

fn requirement_unmet(step: &Step, is_owner: bool) -> Option<BlockReason> {
    let name = || step.name.clone();
    let is_meeting = step.typology == Typology::Meeting;

    if is_meeting && step.must_be_visited && !is_owner && step.attempts == 0 {
        return Some(BlockReason::MustBeVisited { name: name() });
    }

    if step.required_score.is_some() || (is_meeting && !is_owner) {
        let required = step.required_score.unwrap_or(0);
        if step.best_score.unwrap_or(0) < required {
            return Some(BlockReason::MinimumScore {
                name: name(),
                required,
                current: step.current_attempt_score,
            });
        }
    }

    if step.attempts == 0 {
        return Some(BlockReason::RequiredStep { name: name() });
    }
    if step.completed_on.is_none() {
        return Some(BlockReason::StepInProgress { name: name() });
    }
    None
}
