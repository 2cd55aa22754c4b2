//! In-memory storage, used by tests and embedders that already hold the data.

use std::collections::{HashMap, HashSet};
use async_trait::async_trait;
use tokio::sync::Mutex;
use waypoint_core::{
    Achievement, Attempt, ContentId, Learner, LearnerResults, Training, TrainingId, UserId,
};
use super::{
    AttemptStore, LearnerDirectory, MembershipOracle, Result, ResultStore, SessionKind,
    SnapshotStore, StorageError, TrainingProvider,
};

#[derive(Default)]
struct State {
    trainings: HashMap<TrainingId, Training>,
    learners: HashMap<UserId, Learner>,
    results: HashMap<(TrainingId, UserId), LearnerResults>,
    sessions: HashMap<(SessionKind, ContentId), HashSet<UserId>>,
    attempts: HashMap<(TrainingId, UserId), Attempt>,
    achievements: HashMap<(TrainingId, UserId), Achievement>,
}

/// Storage backend keeping everything in process memory.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a training.
    pub fn with_training(mut self, training: Training) -> Self {
        self.state.get_mut().trainings.insert(training.id, training);
        self
    }

    /// Add a learner.
    pub fn with_learner(mut self, learner: Learner) -> Self {
        self.state.get_mut().learners.insert(learner.id, learner);
        self
    }

    /// Set a learner's results.
    pub fn with_results(mut self, results: LearnerResults) -> Self {
        self.state
            .get_mut()
            .results
            .insert((results.training, results.user), results);
        self
    }

    /// Register a session and its participants.
    pub fn with_session(
        mut self,
        kind: SessionKind,
        session: ContentId,
        members: impl IntoIterator<Item = UserId>,
    ) -> Self {
        self.state
            .get_mut()
            .sessions
            .insert((kind, session), members.into_iter().collect());
        self
    }

    /// Seed an attempt.
    pub fn with_attempt(mut self, attempt: Attempt) -> Self {
        self.state
            .get_mut()
            .attempts
            .insert((attempt.training, attempt.user), attempt);
        self
    }

    /// Seed an achievement.
    pub fn with_achievement(mut self, achievement: Achievement) -> Self {
        self.state
            .get_mut()
            .achievements
            .insert((achievement.training, achievement.user), achievement);
        self
    }

    /// Replace a learner's results.
    pub async fn set_results(&self, results: LearnerResults) {
        self.state
            .lock()
            .await
            .results
            .insert((results.training, results.user), results);
    }

    /// Replace a training.
    pub async fn set_training(&self, training: Training) {
        self.state.lock().await.trainings.insert(training.id, training);
    }

    /// Number of attempts stored, across all pairs.
    pub async fn attempt_count(&self) -> usize {
        self.state.lock().await.attempts.len()
    }
}

#[async_trait]
impl TrainingProvider for MemoryStorage {
    async fn load_training(&self, id: TrainingId) -> Result<Option<Training>> {
        Ok(self.state.lock().await.trainings.get(&id).cloned())
    }
}

#[async_trait]
impl LearnerDirectory for MemoryStorage {
    async fn load_learner(&self, id: UserId) -> Result<Option<Learner>> {
        Ok(self.state.lock().await.learners.get(&id).cloned())
    }
}

#[async_trait]
impl ResultStore for MemoryStorage {
    async fn load_results(&self, training: TrainingId, user: UserId) -> Result<LearnerResults> {
        Ok(self
            .state
            .lock()
            .await
            .results
            .get(&(training, user))
            .cloned()
            .unwrap_or_else(|| LearnerResults::new(training, user)))
    }
}

#[async_trait]
impl MembershipOracle for MemoryStorage {
    async fn is_member(&self, kind: SessionKind, session: ContentId, user: UserId) -> Result<bool> {
        let state = self.state.lock().await;
        let members = state.sessions.get(&(kind, session)).ok_or_else(|| {
            StorageError::NotFound(format!("{} session {}", kind.as_str(), session))
        })?;
        Ok(members.contains(&user))
    }
}

#[async_trait]
impl AttemptStore for MemoryStorage {
    async fn load_attempt(&self, training: TrainingId, user: UserId) -> Result<Option<Attempt>> {
        Ok(self.state.lock().await.attempts.get(&(training, user)).cloned())
    }

    async fn upsert_attempt(&self, attempt: &Attempt) -> Result<()> {
        self.state
            .lock()
            .await
            .attempts
            .insert((attempt.training, attempt.user), attempt.clone());
        Ok(())
    }

    async fn insert_attempt_if_absent(&self, attempt: &Attempt) -> Result<Attempt> {
        let mut state = self.state.lock().await;
        let stored = state
            .attempts
            .entry((attempt.training, attempt.user))
            .or_insert_with(|| attempt.clone());
        Ok(stored.clone())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStorage {
    async fn load_achievement(&self, training: TrainingId, user: UserId) -> Result<Option<Achievement>> {
        Ok(self.state.lock().await.achievements.get(&(training, user)).cloned())
    }

    async fn save_achievement(&self, achievement: &Achievement) -> Result<()> {
        self.state
            .lock()
            .await
            .achievements
            .insert((achievement.training, achievement.user), achievement.clone());
        Ok(())
    }

    async fn delete_achievement(&self, training: TrainingId, user: UserId) -> Result<()> {
        self.state.lock().await.achievements.remove(&(training, user));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first() {
        let storage = MemoryStorage::new();
        let first = Attempt::start(TrainingId(1), UserId(1), Utc::now());
        let second = Attempt::start(TrainingId(1), UserId(1), Utc::now());

        let stored = storage.insert_attempt_if_absent(&first).await.unwrap();
        assert_eq!(stored.id, first.id);
        let stored = storage.insert_attempt_if_absent(&second).await.unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(storage.attempt_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let storage = MemoryStorage::new();
        let err = storage
            .is_member(SessionKind::Meeting, ContentId(3), UserId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_membership_lookup() {
        let storage = MemoryStorage::new()
            .with_session(SessionKind::InstructorLed, ContentId(4), [UserId(1)]);
        assert!(storage.is_member(SessionKind::InstructorLed, ContentId(4), UserId(1)).await.unwrap());
        assert!(!storage.is_member(SessionKind::InstructorLed, ContentId(4), UserId(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_results_are_empty() {
        let storage = MemoryStorage::new();
        let results = storage.load_results(TrainingId(1), UserId(2)).await.unwrap();
        assert!(results.entries.is_empty());
        assert_eq!(results.user, UserId(2));
    }
}
