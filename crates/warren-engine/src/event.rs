//! Events emitted by the scheduling actor.

use serde::Serialize;
use warren_env::Frame;

/// One notification to consumers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// A snapshot after a tick, reset or reconfiguration.
    State {
        /// Deep-copied environment state.
        frame: Box<Frame>,
        /// Whether a policy is driving the agents.
        #[serde(rename = "policyReady")]
        policy_ready: bool,
    },
    /// Outcome of a policy load.
    Policy {
        /// Whether the policy can now run.
        ready: bool,
        /// Human-readable status.
        message: String,
    },
    /// A recoverable failure.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl Event {
    /// The frame, for state events.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Self::State { frame, .. } => Some(&**frame),
            _ => None,
        }
    }

    /// Whether this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
