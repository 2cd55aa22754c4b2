//! Storage abstraction and implementations for Waypoint.
//!
//! This crate defines the collaborator contracts the progression engine
//! consumes, with an in-memory and a JSON file implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;

pub use trait_::{
    Storage, StorageError, Result, SessionKind, TrainingProvider, LearnerDirectory, ResultStore,
    MembershipOracle, AttemptStore, SnapshotStore,
};
pub use memory::MemoryStorage;
pub use json_storage::{JsonStorage, SessionRoster};
