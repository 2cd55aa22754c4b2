//! Step model - one flattened, orderable unit of a training.
//!
//! Steps are rebuilt for every decision from the training structure and the
//! learner's results. They are never persisted directly.

use serde::{Deserialize, Serialize};
use crate::config::RouteTemplates;
use crate::id::{ContentId, StepId, TrainingId};
use crate::training::KeepResults;
use crate::Time;

/// Closed set of step typologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Typology {
    /// Container of modules and sessions
    Course,
    /// Self-paced module
    Module,
    /// Live meeting
    Meeting,
    /// Instructor-led training
    InstructorLedTraining,
}

impl Typology {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Typology::Course => "Course",
            Typology::Module => "Module",
            Typology::Meeting => "Meeting",
            Typology::InstructorLedTraining => "ILT",
        }
    }

    /// Meetings and instructor-led sessions.
    pub fn is_live_session(&self) -> bool {
        matches!(self, Typology::Meeting | Typology::InstructorLedTraining)
    }
}

impl std::fmt::Display for Typology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight reference to another step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRef {
    /// Managed content identifier
    pub id: StepId,

    /// Entity identifier
    pub content_id: ContentId,

    /// Typology
    pub typology: Typology,
}

/// Where a learner should be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Resolved step, absent for the training home page
    pub step: Option<StepId>,

    /// Navigable URL
    pub url: String,
}

/// Per-request view of one flattened step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Managed content identifier
    pub id: StepId,

    /// Entity identifier
    pub content_id: ContentId,

    /// Display name
    pub name: String,

    /// Typology
    pub typology: Typology,

    /// Whether the step gates progress
    pub mandatory: bool,

    /// Minimum score; absent means attendance only
    pub required_score: Option<u32>,

    /// Best score over all attempts
    pub best_score: Option<u32>,

    /// Score of the current attempt
    pub current_attempt_score: Option<u32>,

    /// Number of attempts
    pub attempts: u32,

    /// Completion timestamp
    pub completed_on: Option<Time>,

    /// Enclosing course, for nested steps
    pub parent: Option<Box<Step>>,

    /// Final step under its parent course
    pub is_last_child: bool,

    /// Ordinal within the full flattened sequence
    pub position: usize,

    /// First nested step, for courses
    pub first_child: Option<StepRef>,

    /// Module scored through the skills subsystem
    pub skills_active: bool,

    /// Module attempt selection policy
    pub keep_results: KeepResults,

    /// Meeting must be attended by non-owners
    pub must_be_visited: bool,
}

impl Step {
    /// Required score is set and not reached.
    pub fn score_unmet(&self) -> bool {
        match self.required_score {
            Some(required) => self.best_score.unwrap_or(0) < required,
            None => false,
        }
    }

    /// Mandatory and either unattempted or below the required score.
    pub fn is_unmet_obligation(&self) -> bool {
        self.mandatory && (self.attempts == 0 || self.score_unmet())
    }

    /// Score the learner holds for this step, per typology.
    ///
    /// Live sessions count as fully scored once attended.
    pub fn user_score(&self) -> Option<u32> {
        match self.typology {
            Typology::Course | Typology::Module => self.best_score,
            Typology::Meeting | Typology::InstructorLedTraining => {
                if self.attempts > 0 {
                    Some(100)
                } else {
                    self.best_score
                }
            }
        }
    }

    /// Where the learner starts this step, per typology.
    ///
    /// A course starts at its first child. `None` when no URL exists.
    pub fn start_target(&self, training: TrainingId, routes: &RouteTemplates) -> Option<Target> {
        let (step, content, typology) = match self.typology {
            Typology::Course => {
                let child = self.first_child?;
                (child.id, child.content_id, child.typology)
            }
            Typology::Module | Typology::Meeting | Typology::InstructorLedTraining => {
                (self.id, self.content_id, self.typology)
            }
        };
        ref_target(step, content, typology, training, routes)
    }
}

impl StepRef {
    /// Where the learner starts the referenced step.
    pub fn start_target(&self, training: TrainingId, routes: &RouteTemplates) -> Option<Target> {
        ref_target(self.id, self.content_id, self.typology, training, routes)
    }
}

fn ref_target(
    step: StepId,
    content: ContentId,
    typology: Typology,
    training: TrainingId,
    routes: &RouteTemplates,
) -> Option<Target> {
    let template = match typology {
        Typology::Module => &routes.module,
        Typology::Meeting => &routes.meeting,
        Typology::InstructorLedTraining => &routes.instructor_led,
        // Courses are never nested, so a child reference is not a course.
        Typology::Course => return None,
    };
    RouteTemplates::render(template, training, content).map(|url| Target {
        step: Some(step),
        url,
    })
}

/// Target of the training home page.
pub fn training_home(training: TrainingId, routes: &RouteTemplates) -> Option<Target> {
    RouteTemplates::render(&routes.training_home, training, "").map(|url| Target { step: None, url })
}
