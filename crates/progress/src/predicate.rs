//! Pass/fail judgement for a whole training.

use async_trait::async_trait;
use waypoint_core::{Step, Training, Typology, UserId};
use crate::error::Result;

/// Decides whether a learner's aggregate result counts as passed.
#[async_trait]
pub trait PassPredicate: Send + Sync {
    /// Judge `user` on `training`, given the full guided sequence.
    async fn user_has_passed(&self, training: &Training, user: UserId, steps: &[Step]) -> Result<bool>;
}

/// Passed when every mandatory module and course was attempted and reached
/// its required score. Live sessions are not judged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredScoresMet;

#[async_trait]
impl PassPredicate for RequiredScoresMet {
    async fn user_has_passed(&self, _training: &Training, _user: UserId, steps: &[Step]) -> Result<bool> {
        Ok(steps
            .iter()
            .filter(|s| s.mandatory && matches!(s.typology, Typology::Module | Typology::Course))
            .all(|s| s.attempts > 0 && s.best_score.unwrap_or(0) >= s.required_score.unwrap_or(0)))
    }
}

/// Fixed answer, for callers that judge elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub bool);

#[async_trait]
impl PassPredicate for FixedOutcome {
    async fn user_has_passed(&self, _training: &Training, _user: UserId, _steps: &[Step]) -> Result<bool> {
        Ok(self.0)
    }
}
