//! Task lifecycle status and the transition rules between statuses.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Research task lifecycle status.
///
/// `Queued` is the initial status; `Completed`, `Failed`, and `Stopped` are
/// terminal. The default update path trusts the worker and accepts any
/// status it reports; [`TaskStatus::can_transition_to`] expresses the
/// canonical state machine for the opt-in strict validation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created and awaits worker pickup.
    Queued,
    /// Task has been delegated and the worker is executing it.
    Running,
    /// Worker finished the research successfully.
    Completed,
    /// Delegation or research failed.
    Failed,
    /// Task was stopped on request.
    Stopped,
}

impl TaskStatus {
    /// Returns the canonical storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }

    /// Returns `true` when the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    /// Returns `true` when a stop request is permitted in this status.
    #[must_use]
    pub const fn is_stoppable(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Returns `true` when the state machine permits moving to `next`.
    ///
    /// Self-transitions are not transitions and return `false`; terminal
    /// statuses permit nothing.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Queued => matches!(next, Self::Running | Self::Failed | Self::Stopped),
            Self::Running => matches!(next, Self::Completed | Self::Failed | Self::Stopped),
            Self::Completed | Self::Failed | Self::Stopped => false,
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "stopped" => Ok(Self::Stopped),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
