//! Learner results - recorded outcomes per content item.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::id::{ActivityId, StepId, TrainingId, UserId};
use crate::Time;

/// Everything a learner has recorded against one training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerResults {
    /// Training the results belong to
    pub training: TrainingId,

    /// Learner
    pub user: UserId,

    /// Result per managed content entry
    #[serde(default)]
    pub entries: BTreeMap<StepId, ContentResult>,
}

impl LearnerResults {
    /// Empty results for a learner.
    pub fn new(training: TrainingId, user: UserId) -> Self {
        Self {
            training,
            user,
            entries: BTreeMap::new(),
        }
    }

    /// Record a result for a step.
    pub fn with_entry(mut self, step: StepId, result: ContentResult) -> Self {
        self.entries.insert(step, result);
        self
    }

    /// Result for a step, if any.
    pub fn get(&self, step: StepId) -> Option<&ContentResult> {
        self.entries.get(&step)
    }
}

/// Aggregated result for one content item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentResult {
    /// Best score over all attempts
    #[serde(default)]
    pub best_score: Option<u32>,

    /// Score of the attempt in progress or most recently finished
    #[serde(default)]
    pub current_attempt_score: Option<u32>,

    /// Number of attempts
    #[serde(default)]
    pub attempts: u32,

    /// When the item was completed
    #[serde(default)]
    pub completed_on: Option<Time>,

    /// Raw module attempts, oldest first
    #[serde(default)]
    pub module_attempts: Vec<ModuleAttempt>,
}

impl ContentResult {
    /// Completed result with a score.
    pub fn scored(score: u32, attempts: u32, completed_on: Time) -> Self {
        Self {
            best_score: Some(score),
            current_attempt_score: Some(score),
            attempts,
            completed_on: Some(completed_on),
            module_attempts: Vec::new(),
        }
    }

    /// Attach raw module attempts.
    pub fn with_module_attempts(mut self, attempts: Vec<ModuleAttempt>) -> Self {
        self.module_attempts = attempts;
        self
    }
}

/// One raw attempt at a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleAttempt {
    /// Attempt number within the module
    pub id: u64,

    /// Score obtained
    #[serde(default)]
    pub score: Option<u32>,

    /// When it started
    pub started_at: Time,

    /// Per-activity answers
    #[serde(default)]
    pub answers: Vec<ActivityAnswer>,
}

impl ModuleAttempt {
    /// Whether an answer still waits for a manual grader.
    pub fn has_ungraded_manual_answer(&self) -> bool {
        self.answers
            .iter()
            .any(|a| a.requires_manual_grading && !a.evaluated)
    }
}

/// A learner's answer to one activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAnswer {
    /// Activity answered
    pub activity: ActivityId,

    /// Activity uses manual evaluation
    #[serde(default)]
    pub requires_manual_grading: bool,

    /// Answer has been graded
    #[serde(default)]
    pub evaluated: bool,
}
