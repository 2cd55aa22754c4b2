//! Attempt and achievement records persisted by the surrounding system.

use serde::{Deserialize, Serialize};
use crate::id::{AttemptId, ContentId, StepId, TrainingId, UserId};
use crate::step::{Step, Typology};
use crate::Time;

/// One learner's overall pass/fail record for a training.
///
/// Keyed by `(training, user)`; at most one exists per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Unique identifier
    pub id: AttemptId,

    /// Training
    pub training: TrainingId,

    /// Learner
    pub user: UserId,

    /// Outcome, unknown until finished
    pub has_passed: Option<bool>,

    /// When the learner first started
    pub started_at: Time,

    /// When the outcome was recorded
    pub finished_at: Option<Time>,
}

impl Attempt {
    /// A freshly started attempt.
    pub fn start(training: TrainingId, user: UserId, now: Time) -> Self {
        Self {
            id: AttemptId::new(),
            training,
            user,
            has_passed: None,
            started_at: now,
            finished_at: None,
        }
    }
}

/// Achievement status for a training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStatus {
    /// Not completed yet
    Pending,
    /// Completed, with a structure snapshot
    Completed,
}

/// Cached achievement with the structure recorded at completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    /// Training
    pub training: TrainingId,

    /// Learner
    pub user: UserId,

    /// Status
    pub status: AchievementStatus,

    /// When the training was completed
    pub completed_at: Option<Time>,

    /// Structure snapshot
    #[serde(default)]
    pub steps: Vec<SnapshotRow>,
}

impl Achievement {
    /// Completed achievement capturing `steps`.
    pub fn completed(training: TrainingId, user: UserId, at: Time, steps: &[Step]) -> Self {
        Self {
            training,
            user,
            status: AchievementStatus::Completed,
            completed_at: Some(at),
            steps: steps.iter().map(SnapshotRow::from_step).collect(),
        }
    }

    /// Whether the training counts as completed.
    pub fn is_completed(&self) -> bool {
        self.status == AchievementStatus::Completed
    }
}

/// One cached step of an achievement snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Row identifier (the step's managed content id)
    pub id: StepId,

    /// Typology
    pub typology: Typology,

    /// Entity identifier
    pub entity_id: ContentId,

    /// Row id of the enclosing course
    #[serde(default)]
    pub parent_id: Option<StepId>,

    /// Ordinal at completion time
    pub position: usize,

    /// Step was mandatory at completion time
    #[serde(default)]
    pub mandatory: bool,
}

impl SnapshotRow {
    /// Capture a step.
    pub fn from_step(step: &Step) -> Self {
        Self {
            id: step.id,
            typology: step.typology,
            entity_id: step.content_id,
            parent_id: step.parent.as_ref().map(|p| p.id),
            position: step.position,
            mandatory: step.mandatory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_attempt_start_is_open() {
        let now = Utc::now();
        let attempt = Attempt::start(TrainingId(1), UserId(2), now);
        assert_eq!(attempt.has_passed, None);
        assert_eq!(attempt.finished_at, None);
        assert_eq!(attempt.started_at, now);
    }

    #[test]
    fn test_snapshot_row_deserializes_without_optional_fields() {
        let row: SnapshotRow = serde_json::from_str(
            r#"{"id": 1, "typology": "Module", "entity_id": 5, "position": 0}"#,
        )
        .unwrap();
        assert_eq!(row.parent_id, None);
        assert!(!row.mandatory);
    }
}
