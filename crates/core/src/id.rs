//! Identifiers for Waypoint entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

numeric_id!(
    /// Identifier of a training (the learning path group).
    TrainingId
);

numeric_id!(
    /// Identifier of a learner account.
    UserId
);

numeric_id!(
    /// Identifier of a managed content entry, i.e. one node of the training
    /// hierarchy. Unique within a training and stable across requests.
    StepId
);

numeric_id!(
    /// Identifier of the entity behind a step (module, course, meeting, ILT).
    ContentId
);

numeric_id!(
    /// Identifier of an activity inside a module.
    ActivityId
);

/// Unique identifier for an Attempt record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(Ulid);

impl AttemptId {
    /// Generate a new AttemptId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for AttemptId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
