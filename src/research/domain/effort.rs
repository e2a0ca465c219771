//! Validated progress and worker-effort parameters.

use super::ResearchDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion percentage of a running research task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    /// Progress of a task that has not started.
    pub const ZERO: Self = Self(0);

    /// Largest valid progress value.
    const MAX_PERCENT: u8 = 100;

    /// Creates a validated progress value.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::InvalidProgress`] when the value
    /// exceeds 100.
    pub const fn new(value: u8) -> Result<Self, ResearchDomainError> {
        if value > Self::MAX_PERCENT {
            return Err(ResearchDomainError::InvalidProgress(value));
        }
        Ok(Self(value))
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Breadth and depth parameters controlling worker research effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffortProfile {
    breadth: u32,
    depth: u32,
}

impl EffortProfile {
    /// Default research breadth.
    pub const DEFAULT_BREADTH: u32 = 4;

    /// Default research depth.
    pub const DEFAULT_DEPTH: u32 = 2;

    /// Largest effort value representable in the persistence schema.
    const MAX_PERSISTED_VALUE: u32 = i32::MAX as u32;

    /// Creates a validated effort profile.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::InvalidEffort`] when either parameter
    /// is zero or exceeds the schema-backed maximum (`i32::MAX`).
    pub const fn new(breadth: u32, depth: u32) -> Result<Self, ResearchDomainError> {
        if breadth == 0 || breadth > Self::MAX_PERSISTED_VALUE {
            return Err(ResearchDomainError::InvalidEffort {
                field: "breadth",
                value: breadth,
            });
        }
        if depth == 0 || depth > Self::MAX_PERSISTED_VALUE {
            return Err(ResearchDomainError::InvalidEffort {
                field: "depth",
                value: depth,
            });
        }
        Ok(Self { breadth, depth })
    }

    /// Returns the research breadth.
    #[must_use]
    pub const fn breadth(self) -> u32 {
        self.breadth
    }

    /// Returns the research depth.
    #[must_use]
    pub const fn depth(self) -> u32 {
        self.depth
    }
}

impl Default for EffortProfile {
    fn default() -> Self {
        Self {
            breadth: Self::DEFAULT_BREADTH,
            depth: Self::DEFAULT_DEPTH,
        }
    }
}
