//! Training structure - the authored hierarchy a learner progresses through.

use serde::{Deserialize, Serialize};
use crate::id::{ContentId, StepId, TrainingId, UserId};

/// A training is an ordered hierarchy of courses, modules and live sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Training {
    /// Unique identifier
    pub id: TrainingId,

    /// Display name
    pub name: String,

    /// Account that owns (authored) the training
    pub owner: UserId,

    /// Per-training settings
    #[serde(default)]
    pub settings: TrainingSettings,

    /// Top-level content, in authoring order
    pub content: Vec<ContentNode>,
}

impl Training {
    /// Create an empty training with default settings.
    pub fn new(id: TrainingId, name: impl Into<String>, owner: UserId) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            settings: TrainingSettings::default(),
            content: Vec::new(),
        }
    }

    /// Append a top-level node.
    pub fn with_node(mut self, node: ContentNode) -> Self {
        self.content.push(node);
        self
    }

    /// Set guided navigation.
    pub fn with_guided_navigation(mut self, guided: bool) -> Self {
        self.settings.guided_navigation = guided;
        self
    }

    /// Set visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.settings.visibility = visibility;
        self
    }

    /// Navigation mode derived from the settings.
    pub fn navigation_mode(&self) -> NavigationMode {
        if self.settings.guided_navigation {
            NavigationMode::Guided
        } else {
            NavigationMode::Free
        }
    }

    /// Whether `user` owns this training.
    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner == user
    }
}

/// Per-training settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Steps must be completed in sequence
    pub guided_navigation: bool,

    /// Who may see the training
    pub visibility: Visibility,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            guided_navigation: true,
            visibility: Visibility::Private,
        }
    }
}

/// Training visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Open to anyone, including anonymous visitors
    Public,
    /// Listed, membership on request
    SemiPrivate,
    /// Members only
    Private,
}

/// How the learner moves through the steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationMode {
    /// Linear: one gate per step before the next is reachable
    Guided,
    /// Jumps allowed; only unmet obligations are sequenced
    Free,
}

/// One node of the training hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentNode {
    /// Managed content identifier
    pub id: StepId,

    /// Identifier of the underlying entity
    pub content_id: ContentId,

    /// Display name
    pub name: String,

    /// Whether the node gates progress
    #[serde(default)]
    pub mandatory: bool,

    /// Minimum score; absent means attendance only
    #[serde(default)]
    pub required_score: Option<u32>,

    /// Typology-specific data
    pub kind: NodeKind,
}

/// Typology-specific authoring data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Container of modules and live sessions
    Course {
        /// Nested nodes in authoring order
        children: Vec<ContentNode>,
    },
    /// Self-paced module made of activities
    Module {
        /// Module is scored through the skills subsystem
        #[serde(default)]
        skills_active: bool,
        /// Which attempt counts
        #[serde(default)]
        keep_results: KeepResults,
    },
    /// Live meeting
    Meeting {
        /// Non-owners must attend before going further
        #[serde(default)]
        must_be_visited: bool,
    },
    /// Instructor-led training session
    InstructorLed,
}

/// Module policy deciding which attempt's results are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepResults {
    /// Most recent attempt
    Newest,
    /// Highest-scoring attempt
    #[default]
    BestScore,
}

impl ContentNode {
    fn new(id: u64, content_id: u64, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: StepId(id),
            content_id: ContentId(content_id),
            name: name.into(),
            mandatory: false,
            required_score: None,
            kind,
        }
    }

    /// Module node with default policy.
    pub fn module(id: u64, content_id: u64, name: impl Into<String>) -> Self {
        Self::new(id, content_id, name, NodeKind::Module {
            skills_active: false,
            keep_results: KeepResults::default(),
        })
    }

    /// Meeting node.
    pub fn meeting(id: u64, content_id: u64, name: impl Into<String>) -> Self {
        Self::new(id, content_id, name, NodeKind::Meeting { must_be_visited: false })
    }

    /// Instructor-led training node.
    pub fn instructor_led(id: u64, content_id: u64, name: impl Into<String>) -> Self {
        Self::new(id, content_id, name, NodeKind::InstructorLed)
    }

    /// Course node holding `children`.
    pub fn course(
        id: u64,
        content_id: u64,
        name: impl Into<String>,
        children: Vec<ContentNode>,
    ) -> Self {
        Self::new(id, content_id, name, NodeKind::Course { children })
    }

    /// Mark as mandatory.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Set the required score.
    pub fn with_required_score(mut self, score: u32) -> Self {
        self.required_score = Some(score);
        self
    }
}

/// A learner account as seen by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    /// Unique identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Anonymous visitor
    #[serde(default)]
    pub anonymous: bool,
}

impl Learner {
    /// Create a registered learner.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            anonymous: false,
        }
    }
}
