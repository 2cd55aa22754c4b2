//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the progression engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether the skills subsystem is installed
    pub skills_system: bool,

    /// Allow anonymous learners to resume public trainings
    pub resume_anonymous_public: bool,

    /// URL templates for step targets
    pub routes: RouteTemplates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skills_system: false,
            resume_anonymous_public: false,
            routes: RouteTemplates::default(),
        }
    }
}

/// URL templates with `{training}` and `{content}` placeholders.
///
/// An empty template means the typology exposes no navigable target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTemplates {
    /// Module start page
    pub module: String,

    /// Live meeting page
    pub meeting: String,

    /// Instructor-led training page
    pub instructor_led: String,

    /// Training home page
    pub training_home: String,
}

impl Default for RouteTemplates {
    fn default() -> Self {
        Self {
            module: "/group/{training}/module/{content}".to_string(),
            meeting: "/meeting/{content}".to_string(),
            instructor_led: "/ilt/{content}".to_string(),
            training_home: "/group/{training}".to_string(),
        }
    }
}

impl RouteTemplates {
    /// Expand a template; `None` when the template is empty.
    pub fn render(template: &str, training: impl std::fmt::Display, content: impl std::fmt::Display) -> Option<String> {
        if template.trim().is_empty() {
            return None;
        }
        Some(
            template
                .replace("{training}", &training.to_string())
                .replace("{content}", &content.to_string()),
        )
    }
}
