//! Collaborator contracts consumed by the progression engine.

use async_trait::async_trait;
use waypoint_core::{
    Achievement, Attempt, ContentId, Learner, LearnerResults, Training, TrainingId, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Kind of live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Live meeting
    Meeting,
    /// Instructor-led training
    InstructorLed,
}

impl SessionKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Meeting => "meeting",
            SessionKind::InstructorLed => "ilt",
        }
    }
}

/// Provides the authored training hierarchy.
#[async_trait]
pub trait TrainingProvider: Send + Sync {
    /// Load a training by ID.
    async fn load_training(&self, id: TrainingId) -> Result<Option<Training>>;
}

/// Provides learner accounts.
#[async_trait]
pub trait LearnerDirectory: Send + Sync {
    /// Load a learner by ID.
    async fn load_learner(&self, id: UserId) -> Result<Option<Learner>>;
}

/// Read-only access to recorded learner results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Results of `user` across the content of `training`.
    async fn load_results(&self, training: TrainingId, user: UserId) -> Result<LearnerResults>;
}

/// Answers session membership questions for meetings and ILTs.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Whether `user` is a registered participant of the session.
    ///
    /// An unknown session is reported as [`StorageError::NotFound`].
    async fn is_member(&self, kind: SessionKind, session: ContentId, user: UserId) -> Result<bool>;
}

/// Attempt records keyed by `(training, user)`.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Load the attempt of `user` for `training`.
    async fn load_attempt(&self, training: TrainingId, user: UserId) -> Result<Option<Attempt>>;

    /// Insert or replace the attempt for its `(training, user)` pair.
    ///
    /// Implementations must make this atomic per pair.
    async fn upsert_attempt(&self, attempt: &Attempt) -> Result<()>;

    /// Insert `attempt` unless one already exists for its pair.
    ///
    /// Returns the stored attempt.
    async fn insert_attempt_if_absent(&self, attempt: &Attempt) -> Result<Attempt>;
}

/// Achievement snapshots keyed by `(training, user)`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the achievement of `user` for `training`.
    async fn load_achievement(&self, training: TrainingId, user: UserId) -> Result<Option<Achievement>>;

    /// Insert or replace the achievement.
    async fn save_achievement(&self, achievement: &Achievement) -> Result<()>;

    /// Delete the achievement; missing entries are not an error.
    async fn delete_achievement(&self, training: TrainingId, user: UserId) -> Result<()>;
}

/// Every collaborator the engine needs, behind one handle.
pub trait Storage:
    TrainingProvider + LearnerDirectory + ResultStore + MembershipOracle + AttemptStore + SnapshotStore
{
}

impl<T> Storage for T where
    T: TrainingProvider
        + LearnerDirectory
        + ResultStore
        + MembershipOracle
        + AttemptStore
        + SnapshotStore
{
}
