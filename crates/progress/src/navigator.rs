//! Navigation resolver - Start, Next and Finish over the flattened sequence.

use std::sync::Arc;
use chrono::Utc;
use waypoint_core::{
    BlockReason, Decision, EngineConfig, Learner, LearnerResults, NavigationMode, Step, StepId,
    Training, TrainingId, Typology, UserId, Visibility,
};
use waypoint_storage::{
    LearnerDirectory, MembershipOracle, ResultStore, SessionKind, SnapshotStore, Storage,
    StorageError, TrainingProvider,
};
use crate::drift::detect_drift;
use crate::error::{EngineError, Result};
use crate::gate::{GateContext, GateEvaluator, GateOutcome};
use crate::predicate::PassPredicate;
use crate::recorder::CompletionRecorder;
use crate::sequencer::Sequencer;

/// Resolves where a learner goes next inside a training.
///
/// Stateless between calls: everything is read from the collaborators on
/// each request, and the only writes go through the completion recorder.
pub struct Navigator<S: Storage> {
    storage: Arc<S>,
    recorder: CompletionRecorder<S>,
    config: EngineConfig,
    sequencer: Sequencer,
    gate: GateEvaluator,
}

impl<S: Storage> Navigator<S> {
    /// Create a navigator with the default configuration.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            recorder: CompletionRecorder::new(Arc::clone(&storage)),
            storage,
            config: EngineConfig::default(),
            sequencer: Sequencer::new(),
            gate: GateEvaluator::new(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Enter a training.
    pub async fn start(&self, training: TrainingId, user: UserId) -> Result<Decision> {
        let result = self.resolve_start(training, user).await;
        log_outcome("start", training, user, &result);
        result
    }

    /// Move on from `from`, the step the learner just left.
    pub async fn next(&self, training: TrainingId, user: UserId, from: StepId) -> Result<Decision> {
        let result = self.resolve_next(training, user, from).await;
        log_outcome("next", training, user, &result);
        result
    }

    /// Judge the learner and record the outcome.
    pub async fn finish(
        &self,
        training: TrainingId,
        user: UserId,
        predicate: &dyn PassPredicate,
    ) -> Result<Decision> {
        let result = self.resolve_finish(training, user, predicate).await;
        log_outcome("finish", training, user, &result);
        result
    }

    /// Full sequence of the training with the learner's results.
    pub async fn steps(&self, training: TrainingId, user: UserId) -> Result<Vec<Step>> {
        let result = async {
            let (training, _) = self.load_pair(training, user).await?;
            let results = self.storage.load_results(training.id, user).await?;
            self.sequencer
                .sequence(&training, &results, training.navigation_mode(), false)
        }
        .await;
        if let Err(err) = &result {
            tracing::warn!(kind = err.kind(), "Listing steps failed: {}", err);
        }
        result
    }

    /// Delete the learner's achievements and reopen the attempt.
    ///
    /// This is the confirmation step after
    /// [`Decision::RequiresStructureResetConfirmation`].
    pub async fn reset_achievements(&self, training: TrainingId, user: UserId) -> Result<()> {
        let result = async {
            self.load_pair(training, user).await?;
            self.recorder.reset(training, user).await
        }
        .await;
        if let Err(err) = &result {
            tracing::warn!(kind = err.kind(), "Resetting achievements failed: {}", err);
        }
        result
    }

    async fn resolve_start(&self, training_id: TrainingId, user: UserId) -> Result<Decision> {
        let (training, learner) = self.load_pair(training_id, user).await?;
        self.recorder.ensure_started(training.id, user, Utc::now()).await?;

        let results = self.storage.load_results(training.id, user).await?;
        let mode = training.navigation_mode();
        let steps = self.sequencer.sequence(&training, &results, mode, false)?;

        for step in &steps {
            if step.typology == Typology::Course {
                continue;
            }
            if !step.typology.is_live_session() {
                break;
            }
            if let Some(blocked) = self.gate_step(&training, user, &results, step).await?.into_decision() {
                return Ok(blocked);
            }
        }

        if let Some(achievement) = self.storage.load_achievement(training.id, user).await? {
            if achievement.is_completed()
                && !achievement.steps.is_empty()
                && detect_drift(&steps, &achievement.steps)
            {
                return Ok(Decision::RequiresStructureResetConfirmation);
            }
        }

        if mode == NavigationMode::Free {
            for step in steps.iter().filter(|s| s.typology != Typology::Course) {
                if !self.is_skipped(step, user).await? {
                    return self.redirect(&training, step);
                }
            }
        } else if self.may_resume(&training, &learner) {
            if let Some(step) = resume_point(&steps) {
                return self.redirect(&training, step);
            }
        }

        let first = steps.first().ok_or(EngineError::NoFirstStep)?;
        self.redirect(&training, first)
    }

    async fn resolve_next(&self, training_id: TrainingId, user: UserId, from: StepId) -> Result<Decision> {
        let (training, _) = self.load_pair(training_id, user).await?;
        let results = self.storage.load_results(training.id, user).await?;
        let mode = training.navigation_mode();

        let full = self.sequencer.sequence(&training, &results, mode, false)?;
        let left = full
            .iter()
            .find(|s| s.id == from)
            .ok_or(EngineError::UnknownStep { training: training.id, step: from })?;

        if left.mandatory && left.user_score().is_none() && !self.is_skipped(left, user).await? {
            return Ok(Decision::blocked(
                BlockReason::NoScore { name: left.name.clone() },
                left.start_target(training.id, &self.config.routes),
            ));
        }

        let steps = match mode {
            NavigationMode::Free => self.sequencer.sequence(&training, &results, mode, true)?,
            NavigationMode::Guided => full.clone(),
        };

        let mut current = None;
        for (index, step) in steps.iter().enumerate() {
            if step.id == from {
                current = Some(index);
                break;
            }
            if mode == NavigationMode::Guided
                && step.typology != Typology::Course
                && step.mandatory
                && step.score_unmet()
                && !self.is_skipped(step, user).await?
            {
                current = Some(index);
                break;
            }
        }

        let walk_from = match current {
            Some(index) => {
                let step = &steps[index];
                if mode == NavigationMode::Guided {
                    if let Some(blocked) = self.gate_step(&training, user, &results, step).await?.into_decision() {
                        return Ok(blocked);
                    }
                }
                if step.is_last_child {
                    if let Some(course) = &step.parent {
                        let ctx = self.context(&training, user, &results, course, None);
                        if let Some(blocked) = self.gate.evaluate_course(course, &ctx).into_decision() {
                            return Ok(blocked);
                        }
                    }
                }
                index + 1
            }
            None => steps
                .iter()
                .position(|s| s.position > left.position)
                .unwrap_or(steps.len()),
        };

        for step in &steps[walk_from..] {
            if step.typology == Typology::Course || self.is_skipped(step, user).await? {
                continue;
            }
            return self.redirect(&training, step);
        }
        Ok(Decision::NoNextStep)
    }

    async fn resolve_finish(
        &self,
        training_id: TrainingId,
        user: UserId,
        predicate: &dyn PassPredicate,
    ) -> Result<Decision> {
        let (training, _) = self.load_pair(training_id, user).await?;
        let results = self.storage.load_results(training.id, user).await?;
        let steps = self
            .sequencer
            .sequence(&training, &results, training.navigation_mode(), false)?;

        let has_passed = predicate.user_has_passed(&training, user, &steps).await?;
        let attempt = self.recorder.record_outcome(training.id, user, has_passed, Utc::now()).await?;
        if has_passed {
            let finished_at = attempt.finished_at.unwrap_or_else(Utc::now);
            self.recorder.record_achievement(training.id, user, finished_at, &steps).await?;
        }
        Ok(Decision::Completed { has_passed })
    }

    async fn load_pair(&self, training: TrainingId, user: UserId) -> Result<(Training, Learner)> {
        let training = self
            .storage
            .load_training(training)
            .await?
            .ok_or(EngineError::UnknownTraining(training))?;
        let learner = self
            .storage
            .load_learner(user)
            .await?
            .ok_or(EngineError::UnknownLearner(user))?;
        Ok((training, learner))
    }

    fn may_resume(&self, training: &Training, learner: &Learner) -> bool {
        !(training.settings.visibility == Visibility::Public
            && learner.anonymous
            && !self.config.resume_anonymous_public)
    }

    async fn membership(&self, step: &Step, user: UserId) -> Result<Option<bool>> {
        let kind = match step.typology {
            Typology::Meeting => SessionKind::Meeting,
            Typology::InstructorLedTraining => SessionKind::InstructorLed,
            Typology::Course | Typology::Module => return Ok(None),
        };
        match self.storage.is_member(kind, step.content_id, user).await {
            Ok(member) => Ok(Some(member)),
            Err(StorageError::NotFound(_)) => Err(EngineError::UnknownSession(step.id)),
            Err(err) => Err(err.into()),
        }
    }

    async fn is_skipped(&self, step: &Step, user: UserId) -> Result<bool> {
        Ok(self.membership(step, user).await? == Some(false))
    }

    fn context<'a>(
        &'a self,
        training: &Training,
        user: UserId,
        results: &'a LearnerResults,
        step: &Step,
        is_member: Option<bool>,
    ) -> GateContext<'a> {
        GateContext {
            training: training.id,
            is_owner: training.is_owner(user),
            is_member,
            skills_system: self.config.skills_system,
            module_attempts: results
                .get(step.id)
                .map(|r| r.module_attempts.as_slice())
                .unwrap_or(&[]),
            routes: &self.config.routes,
        }
    }

    async fn gate_step(
        &self,
        training: &Training,
        user: UserId,
        results: &LearnerResults,
        step: &Step,
    ) -> Result<GateOutcome> {
        let is_member = self.membership(step, user).await?;
        let ctx = self.context(training, user, results, step, is_member);
        Ok(self.gate.evaluate(step, &ctx))
    }

    fn redirect(&self, training: &Training, step: &Step) -> Result<Decision> {
        step.start_target(training.id, &self.config.routes)
            .map(Decision::Redirect)
            .ok_or(EngineError::NoStepUrl(step.id))
    }
}

/// First unfinished step; a live session defers to the step after it.
fn resume_point(steps: &[Step]) -> Option<&Step> {
    let mut contents = steps.iter().filter(|s| s.typology != Typology::Course);
    let pending = contents.find(|s| s.attempts == 0 || s.score_unmet())?;
    if pending.typology.is_live_session() {
        contents.next()
    } else {
        Some(pending)
    }
}

fn log_outcome(operation: &str, training: TrainingId, user: UserId, result: &Result<Decision>) {
    match result {
        Ok(decision) => tracing::debug!(
            decision = decision.as_str(),
            "{} for user {} on training {}: {:?}",
            operation,
            user,
            training,
            decision
        ),
        Err(err) => tracing::warn!(
            kind = err.kind(),
            "{} for user {} on training {} failed: {}",
            operation,
            user,
            training,
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::{
        Achievement, ActivityAnswer, Attempt, ActivityId, ContentId, ContentNode, ContentResult,
        ModuleAttempt, RouteTemplates, Target,
    };
    use waypoint_storage::{AttemptStore, MemoryStorage};
    use crate::predicate::{FixedOutcome, RequiredScoresMet};

    const T: TrainingId = TrainingId(1);
    const U: UserId = UserId(7);
    const OWNER: UserId = UserId(100);

    fn storage(training: Training) -> MemoryStorage {
        MemoryStorage::new()
            .with_training(training)
            .with_learner(Learner::new(U, "Ada"))
            .with_learner(Learner::new(OWNER, "Owner"))
    }

    fn navigator(storage: MemoryStorage) -> (Navigator<MemoryStorage>, Arc<MemoryStorage>) {
        let storage = Arc::new(storage);
        (Navigator::new(Arc::clone(&storage)), storage)
    }

    fn results() -> LearnerResults {
        LearnerResults::new(T, U)
    }

    fn passed(score: u32) -> ContentResult {
        ContentResult::scored(score, 1, Utc::now())
    }

    fn redirect(step: u64, url: &str) -> Decision {
        Decision::Redirect(Target { step: Some(StepId(step)), url: url.to_string() })
    }

    fn two_modules() -> Training {
        Training::new(T, "Safety path", OWNER)
            .with_node(ContentNode::module(1, 10, "Basics").mandatory().with_required_score(80))
            .with_node(ContentNode::module(2, 20, "Advanced"))
    }

    #[tokio::test]
    async fn test_next_blocks_below_minimum_score() {
        let store = storage(two_modules()).with_results(results().with_entry(StepId(1), passed(60)));
        let (nav, _) = navigator(store);

        match nav.next(T, U, StepId(1)).await.unwrap() {
            Decision::Blocked { reason, retry } => {
                assert!(reason.to_string().contains("minimum score of 80"));
                assert_eq!(retry, Some(Target { step: Some(StepId(1)), url: "/group/1/module/10".to_string() }));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_next_redirects_once_score_is_reached() {
        let store = storage(two_modules())
            .with_results(results().with_entry(StepId(1), passed(85)).with_entry(StepId(2), passed(10)));
        let (nav, _) = navigator(store);

        assert_eq!(nav.next(T, U, StepId(1)).await.unwrap(), redirect(2, "/group/1/module/20"));
        assert_eq!(nav.next(T, U, StepId(2)).await.unwrap(), Decision::NoNextStep);
    }

    #[tokio::test]
    async fn test_uninvited_session_never_halts() {
        let training = Training::new(T, "Path", OWNER)
            .with_node(ContentNode::meeting(1, 10, "Kickoff").mandatory())
            .with_node(ContentNode::module(2, 20, "Basics").mandatory())
            .with_node(ContentNode::meeting(3, 30, "Review").mandatory())
            .with_node(ContentNode::module(4, 40, "Final"));
        let store = storage(training)
            .with_session(SessionKind::Meeting, ContentId(10), vec![OWNER])
            .with_session(SessionKind::Meeting, ContentId(30), vec![])
            .with_results(results().with_entry(StepId(2), passed(100)));
        let (nav, _) = navigator(store);

        assert_eq!(nav.start(T, U).await.unwrap(), redirect(2, "/group/1/module/20"));
        assert_eq!(nav.next(T, U, StepId(2)).await.unwrap(), redirect(4, "/group/1/module/40"));
    }

    #[tokio::test]
    async fn test_start_blocks_on_leading_session() {
        let training = Training::new(T, "Path", OWNER)
            .with_node(ContentNode::meeting(1, 10, "Kickoff").mandatory())
            .with_node(ContentNode::module(2, 20, "Basics"));
        let store = storage(training).with_session(SessionKind::Meeting, ContentId(10), vec![U]);
        let (nav, store) = navigator(store);

        match nav.start(T, U).await.unwrap() {
            Decision::Blocked { reason, retry } => {
                assert!(matches!(reason, BlockReason::RequiredStep { .. }));
                assert_eq!(retry.map(|t| t.url), Some("/meeting/10".to_string()));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
        assert_eq!(store.attempt_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_fatal() {
        let training = Training::new(T, "Path", OWNER)
            .with_node(ContentNode::instructor_led(1, 10, "Workshop").mandatory());
        let (nav, _) = navigator(storage(training));

        let err = nav.start(T, U).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownSession(StepId(1))));
        assert_eq!(err.user_message(), "This content is currently unavailable.");
    }

    #[tokio::test]
    async fn test_structure_change_requires_reset() {
        let original = Training::new(T, "Path", OWNER)
            .with_node(ContentNode::module(1, 10, "One").mandatory())
            .with_node(ContentNode::module(2, 20, "Two").mandatory())
            .with_node(ContentNode::module(3, 30, "Three").mandatory());
        let snapshot_steps = Sequencer::new()
            .sequence(&original, &results(), NavigationMode::Guided, false)
            .unwrap();

        let mut changed = original.clone();
        changed.content.remove(1);
        let store = storage(original)
            .with_results(results().with_entry(StepId(1), passed(100)).with_entry(StepId(3), passed(100)))
            .with_achievement(Achievement::completed(T, U, Utc::now(), &snapshot_steps));
        let (nav, store) = navigator(store);

        assert_eq!(nav.start(T, U).await.unwrap(), redirect(2, "/group/1/module/20"));
        store.set_training(changed).await;

        assert_eq!(nav.start(T, U).await.unwrap(), Decision::RequiresStructureResetConfirmation);
        assert_eq!(nav.start(T, U).await.unwrap(), Decision::RequiresStructureResetConfirmation);

        nav.reset_achievements(T, U).await.unwrap();
        assert!(store.load_achievement(T, U).await.unwrap().is_none());
        assert_eq!(nav.start(T, U).await.unwrap(), redirect(1, "/group/1/module/10"));
    }

    #[tokio::test]
    async fn test_unchanged_structure_resumes() {
        let training = two_modules();
        let steps = Sequencer::new()
            .sequence(&training, &results(), NavigationMode::Guided, false)
            .unwrap();
        let store = storage(training)
            .with_results(results().with_entry(StepId(1), passed(90)))
            .with_achievement(Achievement::completed(T, U, Utc::now(), &steps));
        let (nav, _) = navigator(store);

        assert_eq!(nav.start(T, U).await.unwrap(), redirect(2, "/group/1/module/20"));
    }

    #[tokio::test]
    async fn test_pending_grading_blocks_despite_score() {
        let attempt = ModuleAttempt {
            id: 1,
            score: Some(90),
            started_at: Utc::now(),
            answers: vec![ActivityAnswer {
                activity: ActivityId(5),
                requires_manual_grading: true,
                evaluated: false,
            }],
        };
        let store = storage(two_modules())
            .with_results(results().with_entry(StepId(1), passed(90).with_module_attempts(vec![attempt])));
        let (nav, _) = navigator(store);

        match nav.next(T, U, StepId(1)).await.unwrap() {
            Decision::Blocked { reason, retry } => {
                assert!(reason.to_string().starts_with("One or several activities in module Basics"));
                assert_eq!(retry.map(|t| t.url), Some("/group/1".to_string()));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_next_without_score_is_blocked() {
        let (nav, _) = navigator(storage(two_modules()));
        match nav.next(T, U, StepId(1)).await.unwrap() {
            Decision::Blocked { reason, .. } => {
                assert_eq!(reason, BlockReason::NoScore { name: "Basics".to_string() });
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_next_stops_at_earlier_unmet_step() {
        let training = Training::new(T, "Path", OWNER)
            .with_node(ContentNode::module(1, 10, "One").mandatory().with_required_score(50))
            .with_node(ContentNode::module(2, 20, "Two"))
            .with_node(ContentNode::module(3, 30, "Three"));
        let store = storage(training)
            .with_results(results().with_entry(StepId(1), passed(20)).with_entry(StepId(2), passed(100)));
        let (nav, _) = navigator(store);

        match nav.next(T, U, StepId(2)).await.unwrap() {
            Decision::Blocked { retry, .. } => assert_eq!(retry.and_then(|t| t.step), Some(StepId(1))),
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_last_child_checks_course_requirement() {
        let training = Training::new(T, "Path", OWNER)
            .with_node(
                ContentNode::course(1, 10, "Course", vec![
                    ContentNode::module(2, 20, "Lesson A"),
                    ContentNode::module(3, 30, "Lesson B"),
                ])
                .mandatory()
                .with_required_score(70),
            )
            .with_node(ContentNode::module(4, 40, "After"));
        let store = storage(training).with_results(
            results()
                .with_entry(StepId(1), passed(50))
                .with_entry(StepId(2), passed(100))
                .with_entry(StepId(3), passed(100)),
        );
        let (nav, store) = navigator(store);

        assert_eq!(nav.next(T, U, StepId(2)).await.unwrap(), redirect(3, "/group/1/module/30"));
        match nav.next(T, U, StepId(3)).await.unwrap() {
            Decision::Blocked { reason, retry } => {
                assert!(matches!(reason, BlockReason::MinimumScore { required: 70, .. }));
                assert_eq!(retry.and_then(|t| t.step), Some(StepId(2)));
            }
            other => panic!("expected blocked, got {:?}", other),
        }

        store
            .set_results(
                results()
                    .with_entry(StepId(1), passed(75))
                    .with_entry(StepId(2), passed(100))
                    .with_entry(StepId(3), passed(100)),
            )
            .await;
        assert_eq!(nav.next(T, U, StepId(3)).await.unwrap(), redirect(4, "/group/1/module/40"));
    }

    #[tokio::test]
    async fn test_free_navigation_start_blocks_on_leading_session() {
        let training = Training::new(T, "Path", OWNER)
            .with_guided_navigation(false)
            .with_node(ContentNode::meeting(1, 10, "Kickoff").mandatory())
            .with_node(ContentNode::module(2, 20, "Basics"));
        let store = storage(training).with_session(SessionKind::Meeting, ContentId(10), vec![U]);
        let (nav, _) = navigator(store);

        match nav.start(T, U).await.unwrap() {
            Decision::Blocked { reason, retry } => {
                assert!(matches!(reason, BlockReason::RequiredStep { .. }));
                assert_eq!(retry.map(|t| t.url), Some("/meeting/10".to_string()));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_free_navigation_checks_course_requirement() {
        let training = Training::new(T, "Path", OWNER)
            .with_guided_navigation(false)
            .with_node(
                ContentNode::course(1, 10, "Course", vec![
                    ContentNode::module(2, 20, "Lesson").mandatory().with_required_score(80),
                ])
                .mandatory()
                .with_required_score(70),
            )
            .with_node(ContentNode::module(3, 30, "Exam").mandatory());
        let store = storage(training)
            .with_results(results().with_entry(StepId(1), passed(50)).with_entry(StepId(2), passed(60)));
        let (nav, _) = navigator(store);

        match nav.next(T, U, StepId(2)).await.unwrap() {
            Decision::Blocked { reason, retry } => {
                assert!(matches!(reason, BlockReason::MinimumScore { required: 70, .. }));
                assert_eq!(retry.and_then(|t| t.step), Some(StepId(2)));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_keeps_existing_attempt() {
        let started_at = Utc::now() - chrono::Duration::days(3);
        let existing = Attempt::start(T, U, started_at);
        let store = storage(two_modules()).with_attempt(existing.clone());
        let (nav, store) = navigator(store);

        nav.start(T, U).await.unwrap();

        assert_eq!(store.attempt_count().await, 1);
        let attempt = store.load_attempt(T, U).await.unwrap().unwrap();
        assert_eq!(attempt.id, existing.id);
        assert_eq!(attempt.started_at, started_at);
    }

    #[tokio::test]
    async fn test_free_navigation_jumps_to_unmet_obligations() {
        let training = Training::new(T, "Path", OWNER)
            .with_guided_navigation(false)
            .with_node(ContentNode::course(1, 10, "Course", vec![
                ContentNode::module(2, 20, "Lesson").mandatory().with_required_score(80),
            ]))
            .with_node(ContentNode::module(3, 30, "Optional"))
            .with_node(ContentNode::module(4, 40, "Exam").mandatory());
        let store = storage(training).with_results(results().with_entry(StepId(2), passed(50)));
        let (nav, _) = navigator(store);

        assert_eq!(nav.start(T, U).await.unwrap(), redirect(2, "/group/1/module/20"));
        assert_eq!(nav.next(T, U, StepId(2)).await.unwrap(), redirect(4, "/group/1/module/40"));
    }

    #[tokio::test]
    async fn test_free_navigation_from_step_outside_filter() {
        let training = Training::new(T, "Path", OWNER)
            .with_guided_navigation(false)
            .with_node(ContentNode::module(1, 10, "Done").mandatory())
            .with_node(ContentNode::module(2, 20, "Todo").mandatory())
            .with_node(ContentNode::module(3, 30, "Also done").mandatory());
        let store = storage(training)
            .with_results(results().with_entry(StepId(1), passed(100)).with_entry(StepId(3), passed(100)));
        let (nav, _) = navigator(store);

        assert_eq!(nav.next(T, U, StepId(1)).await.unwrap(), redirect(2, "/group/1/module/20"));
        assert_eq!(nav.next(T, U, StepId(3)).await.unwrap(), Decision::NoNextStep);
    }

    #[tokio::test]
    async fn test_start_resumes_at_first_unfinished_step() {
        let training = two_modules().with_node(ContentNode::module(3, 30, "Extra"));
        let store = storage(training).with_results(results().with_entry(StepId(1), passed(90)));
        let (nav, _) = navigator(store);

        assert_eq!(nav.start(T, U).await.unwrap(), redirect(2, "/group/1/module/20"));
    }

    #[tokio::test]
    async fn test_resume_skips_past_live_session() {
        let training = Training::new(T, "Path", OWNER)
            .with_node(ContentNode::module(1, 10, "One"))
            .with_node(ContentNode::instructor_led(2, 20, "Workshop"))
            .with_node(ContentNode::module(3, 30, "Three"));
        let store = storage(training).with_results(results().with_entry(StepId(1), passed(100)));
        let (nav, _) = navigator(store);

        assert_eq!(nav.start(T, U).await.unwrap(), redirect(3, "/group/1/module/30"));
    }

    #[tokio::test]
    async fn test_public_training_does_not_resume_anonymous_learner() {
        let training = two_modules().with_visibility(Visibility::Public);
        let visitor = Learner { anonymous: true, ..Learner::new(U, "Visitor") };
        let store = MemoryStorage::new()
            .with_training(training)
            .with_learner(visitor)
            .with_results(results().with_entry(StepId(1), passed(90)));
        let storage = Arc::new(store);

        let nav = Navigator::new(Arc::clone(&storage));
        assert_eq!(nav.start(T, U).await.unwrap(), redirect(1, "/group/1/module/10"));

        let config = EngineConfig { resume_anonymous_public: true, ..EngineConfig::default() };
        let nav = Navigator::new(storage).with_config(config);
        assert!(nav.config().resume_anonymous_public);
        assert_eq!(nav.start(T, U).await.unwrap(), redirect(2, "/group/1/module/20"));
    }

    #[tokio::test]
    async fn test_empty_training_has_no_first_step() {
        let (nav, _) = navigator(storage(Training::new(T, "Empty", OWNER)));
        let err = nav.start(T, U).await.unwrap_err();
        assert!(matches!(err, EngineError::NoFirstStep));
        assert_eq!(err.user_message(), "No first step assigned.");
    }

    #[tokio::test]
    async fn test_missing_route_is_no_step_url() {
        let config = EngineConfig {
            routes: RouteTemplates { module: String::new(), ..RouteTemplates::default() },
            ..EngineConfig::default()
        };
        let (nav, _) = navigator(storage(two_modules()));
        let nav = nav.with_config(config);
        assert!(matches!(nav.start(T, U).await.unwrap_err(), EngineError::NoStepUrl(StepId(1))));
    }

    #[tokio::test]
    async fn test_lookup_failures_are_fatal() {
        let (nav, _) = navigator(storage(two_modules()));
        assert!(matches!(
            nav.start(T, UserId(999)).await.unwrap_err(),
            EngineError::UnknownLearner(UserId(999))
        ));
        assert!(matches!(
            nav.start(TrainingId(999), U).await.unwrap_err(),
            EngineError::UnknownTraining(TrainingId(999))
        ));
        assert!(matches!(
            nav.next(T, U, StepId(42)).await.unwrap_err(),
            EngineError::UnknownStep { step: StepId(42), .. }
        ));
    }

    #[tokio::test]
    async fn test_inconsistent_results_are_fatal() {
        let store = storage(two_modules()).with_results(results().with_entry(StepId(77), passed(10)));
        let (nav, _) = navigator(store);
        assert!(matches!(
            nav.start(T, U).await.unwrap_err(),
            EngineError::InconsistentResults { step: StepId(77), .. }
        ));
    }

    #[tokio::test]
    async fn test_finish_records_outcome_and_snapshot() {
        let store = storage(two_modules()).with_results(results().with_entry(StepId(1), passed(80)));
        let (nav, store) = navigator(store);

        nav.start(T, U).await.unwrap();
        assert_eq!(
            nav.finish(T, U, &RequiredScoresMet).await.unwrap(),
            Decision::Completed { has_passed: true }
        );
        assert_eq!(
            nav.finish(T, U, &RequiredScoresMet).await.unwrap(),
            Decision::Completed { has_passed: true }
        );

        assert_eq!(store.attempt_count().await, 1);
        let attempt = store.load_attempt(T, U).await.unwrap().unwrap();
        assert_eq!(attempt.has_passed, Some(true));
        let achievement = store.load_achievement(T, U).await.unwrap().unwrap();
        assert!(achievement.is_completed());
        assert_eq!(achievement.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_finish_writes_no_snapshot() {
        let (nav, store) = navigator(storage(two_modules()));
        assert_eq!(
            nav.finish(T, U, &FixedOutcome(false)).await.unwrap(),
            Decision::Completed { has_passed: false }
        );
        assert_eq!(store.load_attempt(T, U).await.unwrap().unwrap().has_passed, Some(false));
        assert!(store.load_achievement(T, U).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_steps_lists_full_sequence() {
        let store = storage(two_modules()).with_results(results().with_entry(StepId(1), passed(60)));
        let (nav, _) = navigator(store);
        let steps = nav.steps(T, U).await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].best_score, Some(60));
        assert_eq!(steps[1].attempts, 0);
    }
}
