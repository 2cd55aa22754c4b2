//! JSON file storage implementation.
//!
//! Reads the training structure, learners, results and session rosters from
//! a data directory and keeps attempts and achievements next to them:
//!
//! ```text
//! trainings/<training>.json
//! learners/<user>.json
//! results/<training>/<user>.json
//! sessions/<meeting|ilt>/<content>.json
//! attempts/<training>-<user>.json
//! achievements/<training>-<user>.json
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use waypoint_core::{
    Achievement, Attempt, ContentId, Learner, LearnerResults, Training, TrainingId, UserId,
};
use super::{
    AttemptStore, LearnerDirectory, MembershipOracle, Result, ResultStore, SessionKind,
    SnapshotStore, StorageError, TrainingProvider,
};

/// Participants of a live session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRoster {
    /// Registered participants
    pub members: HashSet<UserId>,
}

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Open storage rooted at `root`, creating the writable subdirectories.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("trainings")).await?;
        fs::create_dir_all(root.join("learners")).await?;
        fs::create_dir_all(root.join("results")).await?;
        fs::create_dir_all(root.join("sessions").join(SessionKind::Meeting.as_str())).await?;
        fs::create_dir_all(root.join("sessions").join(SessionKind::InstructorLed.as_str())).await?;
        fs::create_dir_all(root.join("attempts")).await?;
        fs::create_dir_all(root.join("achievements")).await?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn training_path(&self, id: TrainingId) -> PathBuf {
        self.root.join("trainings").join(format!("{}.json", id))
    }
    fn learner_path(&self, id: UserId) -> PathBuf {
        self.root.join("learners").join(format!("{}.json", id))
    }
    fn results_path(&self, training: TrainingId, user: UserId) -> PathBuf {
        self.root
            .join("results")
            .join(training.to_string())
            .join(format!("{}.json", user))
    }
    fn session_path(&self, kind: SessionKind, session: ContentId) -> PathBuf {
        self.root
            .join("sessions")
            .join(kind.as_str())
            .join(format!("{}.json", session))
    }
    fn attempt_path(&self, training: TrainingId, user: UserId) -> PathBuf {
        self.root.join("attempts").join(format!("{}-{}.json", training, user))
    }
    fn achievement_path(&self, training: TrainingId, user: UserId) -> PathBuf {
        self.root
            .join("achievements")
            .join(format!("{}-{}.json", training, user))
    }

    /// Write a training file.
    pub async fn save_training(&self, training: &Training) -> Result<()> {
        write_json(&self.training_path(training.id), training).await
    }

    /// Write a learner file.
    pub async fn save_learner(&self, learner: &Learner) -> Result<()> {
        write_json(&self.learner_path(learner.id), learner).await
    }

    /// Write a learner's results.
    pub async fn save_results(&self, results: &LearnerResults) -> Result<()> {
        let path = self.results_path(results.training, results.user);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        write_json(&path, results).await
    }

    /// Write a session roster.
    pub async fn save_session(&self, kind: SessionKind, session: ContentId, roster: &SessionRoster) -> Result<()> {
        write_json(&self.session_path(kind, session), roster).await
    }
}

#[async_trait::async_trait]
impl TrainingProvider for JsonStorage {
    async fn load_training(&self, id: TrainingId) -> Result<Option<Training>> {
        read_json(&self.training_path(id)).await
    }
}

#[async_trait::async_trait]
impl LearnerDirectory for JsonStorage {
    async fn load_learner(&self, id: UserId) -> Result<Option<Learner>> {
        read_json(&self.learner_path(id)).await
    }
}

#[async_trait::async_trait]
impl ResultStore for JsonStorage {
    async fn load_results(&self, training: TrainingId, user: UserId) -> Result<LearnerResults> {
        let results: Option<LearnerResults> = read_json(&self.results_path(training, user)).await?;
        match results {
            Some(results) if results.training != training || results.user != user => {
                Err(StorageError::Other(format!(
                    "results file for training {} / user {} names training {} / user {}",
                    training, user, results.training, results.user
                )))
            }
            Some(results) => Ok(results),
            None => Ok(LearnerResults::new(training, user)),
        }
    }
}

#[async_trait::async_trait]
impl MembershipOracle for JsonStorage {
    async fn is_member(&self, kind: SessionKind, session: ContentId, user: UserId) -> Result<bool> {
        let roster: Option<SessionRoster> = read_json(&self.session_path(kind, session)).await?;
        let roster = roster.ok_or_else(|| {
            StorageError::NotFound(format!("{} session {}", kind.as_str(), session))
        })?;
        Ok(roster.members.contains(&user))
    }
}

#[async_trait::async_trait]
impl AttemptStore for JsonStorage {
    async fn load_attempt(&self, training: TrainingId, user: UserId) -> Result<Option<Attempt>> {
        read_json(&self.attempt_path(training, user)).await
    }

    async fn upsert_attempt(&self, attempt: &Attempt) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.attempt_path(attempt.training, attempt.user), attempt).await
    }

    async fn insert_attempt_if_absent(&self, attempt: &Attempt) -> Result<Attempt> {
        let _guard = self.write_lock.lock().await;
        let path = self.attempt_path(attempt.training, attempt.user);
        if let Some(existing) = read_json::<Attempt>(&path).await? {
            return Ok(existing);
        }
        write_json(&path, attempt).await?;
        tracing::debug!("Created attempt {} at {}", attempt.id, path.display());
        Ok(attempt.clone())
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonStorage {
    async fn load_achievement(&self, training: TrainingId, user: UserId) -> Result<Option<Achievement>> {
        read_json(&self.achievement_path(training, user)).await
    }

    async fn save_achievement(&self, achievement: &Achievement) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.achievement_path(achievement.training, achievement.user), achievement).await
    }

    async fn delete_achievement(&self, training: TrainingId, user: UserId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        fs::remove_file(self.achievement_path(training, user)).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
        })?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write through a temporary file so readers never see a partial record.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
