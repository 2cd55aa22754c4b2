//! Completion recording - the only writer of attempts and achievements.

use std::sync::Arc;
use waypoint_core::{Achievement, Attempt, Step, Time, TrainingId, UserId};
use waypoint_storage::{AttemptStore, SnapshotStore};
use crate::error::Result;

/// Persists training outcomes and completion snapshots.
pub struct CompletionRecorder<S> {
    storage: Arc<S>,
}

impl<S> Clone for CompletionRecorder<S> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage) }
    }
}

impl<S: AttemptStore + SnapshotStore> CompletionRecorder<S> {
    /// Create a recorder over `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Ensure an attempt exists for the pair, creating an open one if absent.
    pub async fn ensure_started(&self, training: TrainingId, user: UserId, now: Time) -> Result<Attempt> {
        let attempt = self
            .storage
            .insert_attempt_if_absent(&Attempt::start(training, user, now))
            .await?;
        Ok(attempt)
    }

    /// Record the outcome on the pair's attempt, updating it in place or
    /// creating it. Repeating the call leaves one attempt with the latest
    /// values.
    pub async fn record_outcome(
        &self,
        training: TrainingId,
        user: UserId,
        has_passed: bool,
        finished_at: Time,
    ) -> Result<Attempt> {
        let attempt = match self.storage.load_attempt(training, user).await? {
            Some(mut existing) => {
                existing.has_passed = Some(has_passed);
                existing.finished_at = Some(finished_at);
                existing
            }
            None => Attempt {
                has_passed: Some(has_passed),
                finished_at: Some(finished_at),
                ..Attempt::start(training, user, finished_at)
            },
        };
        self.storage.upsert_attempt(&attempt).await?;
        tracing::info!(
            "Recorded {} for user {} on training {}",
            if has_passed { "pass" } else { "fail" },
            user,
            training
        );
        Ok(attempt)
    }

    /// Write the completion snapshot unless the training is already
    /// completed. Returns whether a snapshot was written.
    pub async fn record_achievement(
        &self,
        training: TrainingId,
        user: UserId,
        at: Time,
        steps: &[Step],
    ) -> Result<bool> {
        if let Some(existing) = self.storage.load_achievement(training, user).await? {
            if existing.is_completed() {
                return Ok(false);
            }
        }
        let achievement = Achievement::completed(training, user, at, steps);
        self.storage.save_achievement(&achievement).await?;
        tracing::debug!(
            "Stored completion snapshot of {} steps for user {} on training {}",
            achievement.steps.len(),
            user,
            training
        );
        Ok(true)
    }

    /// Drop achievements and reopen the attempt.
    pub async fn reset(&self, training: TrainingId, user: UserId) -> Result<()> {
        self.storage.delete_achievement(training, user).await?;
        if let Some(mut attempt) = self.storage.load_attempt(training, user).await? {
            attempt.has_passed = None;
            attempt.finished_at = None;
            self.storage.upsert_attempt(&attempt).await?;
        }
        tracing::info!("Reset achievements for user {} on training {}", user, training);
        Ok(())
    }
}
