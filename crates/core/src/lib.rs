//! Waypoint core data models.
//!
//! This crate defines the data structures the progression engine reasons
//! about: the authored training structure, the learner's recorded results,
//! the per-request step model and the decisions handed back to callers.

#![warn(missing_docs)]

// Core identities
mod id;

// Authoring and results
mod training;
mod result;

// Per-request model
mod step;
mod decision;

// Persistent records
mod attempt;

// Configuration
mod config;

// Re-exports
pub use id::*;

pub use training::{
    Training, TrainingSettings, Visibility, NavigationMode, ContentNode, NodeKind, KeepResults,
    Learner,
};
pub use result::{LearnerResults, ContentResult, ModuleAttempt, ActivityAnswer};
pub use step::{Step, StepRef, Target, Typology, training_home};
pub use decision::{Decision, BlockReason};
pub use attempt::{Attempt, Achievement, AchievementStatus, SnapshotRow};
pub use config::{EngineConfig, RouteTemplates};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
