//! Step sequencing - flattens a training into an ordered list of steps.

use std::collections::HashSet;
use waypoint_core::{
    ContentNode, KeepResults, LearnerResults, NavigationMode, NodeKind, Step, StepRef, Training,
    Typology,
};
use crate::error::{EngineError, Result};

/// Builds the ordered step sequence for a (training, learner) pair.
///
/// The hierarchy is flattened depth-first: a course appears right before
/// its nested modules and sessions, siblings keep their authoring order.
/// Sequencing has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequencer;

impl Sequencer {
    /// Create a new sequencer.
    pub fn new() -> Self {
        Self
    }

    /// Build the sequence.
    ///
    /// With `mandatory_only` in free navigation, only mandatory steps that are
    /// unattempted or below their required score are kept. Positions always
    /// refer to the full sequence.
    pub fn sequence(
        &self,
        training: &Training,
        results: &LearnerResults,
        mode: NavigationMode,
        mandatory_only: bool,
    ) -> Result<Vec<Step>> {
        let mut steps = Vec::new();
        let mut known = HashSet::new();

        for node in &training.content {
            known.insert(node.id);
            match &node.kind {
                NodeKind::Course { children } => {
                    let mut course = build_step(node, results, steps.len());
                    course.first_child = match children.first() {
                        Some(child) => Some(child_ref(child)?),
                        None => None,
                    };
                    let parent = Box::new(course.clone());
                    steps.push(course);

                    for (index, child) in children.iter().enumerate() {
                        if matches!(child.kind, NodeKind::Course { .. }) {
                            return Err(EngineError::NestedCourse(child.id));
                        }
                        known.insert(child.id);
                        let mut step = build_step(child, results, steps.len());
                        step.parent = Some(parent.clone());
                        step.is_last_child = index + 1 == children.len();
                        steps.push(step);
                    }
                }
                _ => steps.push(build_step(node, results, steps.len())),
            }
        }

        if let Some(orphan) = results.entries.keys().find(|id| !known.contains(id)) {
            return Err(EngineError::InconsistentResults {
                training: training.id,
                step: *orphan,
            });
        }

        if mandatory_only {
            if mode == NavigationMode::Free {
                steps.retain(Step::is_unmet_obligation);
            } else {
                tracing::debug!(
                    "Ignoring mandatory-only filter for guided training {}",
                    training.id
                );
            }
        }

        Ok(steps)
    }
}

fn typology_of(node: &ContentNode) -> Typology {
    match node.kind {
        NodeKind::Course { .. } => Typology::Course,
        NodeKind::Module { .. } => Typology::Module,
        NodeKind::Meeting { .. } => Typology::Meeting,
        NodeKind::InstructorLed => Typology::InstructorLedTraining,
    }
}

fn child_ref(child: &ContentNode) -> Result<StepRef> {
    if matches!(child.kind, NodeKind::Course { .. }) {
        return Err(EngineError::NestedCourse(child.id));
    }
    Ok(StepRef {
        id: child.id,
        content_id: child.content_id,
        typology: typology_of(child),
    })
}

fn build_step(node: &ContentNode, results: &LearnerResults, position: usize) -> Step {
    let result = results.get(node.id);
    let (skills_active, keep_results, must_be_visited) = match node.kind {
        NodeKind::Module { skills_active, keep_results } => (skills_active, keep_results, false),
        NodeKind::Meeting { must_be_visited } => (false, KeepResults::default(), must_be_visited),
        NodeKind::Course { .. } | NodeKind::InstructorLed => (false, KeepResults::default(), false),
    };

    Step {
        id: node.id,
        content_id: node.content_id,
        name: node.name.clone(),
        typology: typology_of(node),
        mandatory: node.mandatory,
        required_score: node.required_score,
        best_score: result.and_then(|r| r.best_score),
        current_attempt_score: result.and_then(|r| r.current_attempt_score),
        attempts: result.map(|r| r.attempts).unwrap_or(0),
        completed_on: result.and_then(|r| r.completed_on),
        parent: None,
        is_last_child: false,
        position,
        first_child: None,
        skills_active,
        keep_results,
        must_be_visited,
    }
}
