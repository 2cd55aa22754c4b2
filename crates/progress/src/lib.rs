//! Training-path progression engine.
//!
//! Flattens a training into steps, gates mandatory steps, resolves where a
//! learner goes on Start/Next, and records completion on Finish.

#![warn(missing_docs)]

pub mod error;
pub mod sequencer;
pub mod selection;
pub mod gate;
pub mod drift;
pub mod predicate;
pub mod recorder;
pub mod navigator;

pub use error::{EngineError, Result};
pub use sequencer::Sequencer;
pub use selection::AttemptSelection;
pub use gate::{GateContext, GateEvaluator, GateOutcome};
pub use drift::detect_drift;
pub use predicate::{FixedOutcome, PassPredicate, RequiredScoresMet};
pub use recorder::CompletionRecorder;
pub use navigator::Navigator;
