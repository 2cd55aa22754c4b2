//! Module attempt selection.

use waypoint_core::{KeepResults, ModuleAttempt};

/// Strategy for picking the attempt whose results count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptSelection {
    /// The most recent attempt
    Newest,
    /// The highest-scoring attempt; the earliest wins ties
    BestScore,
}

impl From<KeepResults> for AttemptSelection {
    fn from(policy: KeepResults) -> Self {
        match policy {
            KeepResults::Newest => AttemptSelection::Newest,
            KeepResults::BestScore => AttemptSelection::BestScore,
        }
    }
}

impl AttemptSelection {
    /// Select from attempts ordered oldest first.
    pub fn select<'a>(&self, attempts: &'a [ModuleAttempt]) -> Option<&'a ModuleAttempt> {
        match self {
            AttemptSelection::Newest => attempts.last(),
            AttemptSelection::BestScore => attempts.iter().fold(None, |best, attempt| match best {
                Some(current) if score(current) >= score(attempt) => Some(current),
                _ => Some(attempt),
            }),
        }
    }

    /// Whether the selected attempt still waits for manual grading.
    pub fn pending_grading(&self, attempts: &[ModuleAttempt]) -> bool {
        self.select(attempts)
            .map(ModuleAttempt::has_ungraded_manual_answer)
            .unwrap_or(false)
    }
}

fn score(attempt: &ModuleAttempt) -> i64 {
    attempt.score.map(i64::from).unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waypoint_core::{ActivityAnswer, ActivityId};

    fn attempt(id: u64, score: Option<u32>, ungraded: bool) -> ModuleAttempt {
        ModuleAttempt {
            id,
            score,
            started_at: Utc::now(),
            answers: vec![ActivityAnswer {
                activity: ActivityId(1),
                requires_manual_grading: ungraded,
                evaluated: false,
            }],
        }
    }

    #[test]
    fn test_newest_picks_last() {
        let attempts = vec![attempt(1, Some(90), false), attempt(2, Some(40), false)];
        assert_eq!(AttemptSelection::Newest.select(&attempts).map(|a| a.id), Some(2));
    }

    #[test]
    fn test_best_score_picks_highest_earliest_on_tie() {
        let attempts = vec![
            attempt(1, Some(70), false),
            attempt(2, Some(90), false),
            attempt(3, Some(90), false),
            attempt(4, None, false),
        ];
        assert_eq!(AttemptSelection::BestScore.select(&attempts).map(|a| a.id), Some(2));
    }

    #[test]
    fn test_empty_attempts_select_nothing() {
        assert!(AttemptSelection::Newest.select(&[]).is_none());
        assert!(AttemptSelection::BestScore.select(&[]).is_none());
        assert!(!AttemptSelection::BestScore.pending_grading(&[]));
    }

    #[test]
    fn test_pending_grading_follows_policy() {
        let attempts = vec![attempt(1, Some(95), true), attempt(2, Some(50), false)];
        assert!(AttemptSelection::BestScore.pending_grading(&attempts));
        assert!(!AttemptSelection::Newest.pending_grading(&attempts));
    }

    #[test]
    fn test_policy_conversion() {
        assert_eq!(AttemptSelection::from(KeepResults::Newest), AttemptSelection::Newest);
        assert_eq!(AttemptSelection::from(KeepResults::BestScore), AttemptSelection::BestScore);
    }
}
