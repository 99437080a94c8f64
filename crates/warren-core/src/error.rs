//! Error types for the Warren simulation engine.
//!
//! One enum per concern: configuration (levels, grid worlds, simulation
//! parameters), policy loading, batched inference, and observation
//! payload conversion. None of them is fatal to the scheduling actor.

use std::error::Error;
use std::fmt;

use crate::geom::Cell;

// ── ConfigError ────────────────────────────────────────────────────

/// Invalid level, grid-world or simulation parameters.
///
/// Returned by the `validate()` methods and by environment
/// construction, which fails fast instead of clamping bad input.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The grid has zero side length.
    ZeroGrid,
    /// The level defines no agent start positions.
    NoStarts,
    /// The level defines no goal cells.
    NoGoals,
    /// A configured cell lies outside the grid.
    OutOfBounds {
        /// Which list the cell came from (`"start"`, `"goal"`, ...).
        what: &'static str,
        /// The offending cell.
        cell: Cell,
        /// Grid side length.
        grid_size: u32,
    },
    /// An agent starts on a static obstacle.
    StartOnObstacle {
        /// The offending start cell.
        cell: Cell,
    },
    /// A moving obstacle has no waypoints.
    EmptyPath {
        /// The obstacle's id.
        id: String,
    },
    /// A moving obstacle has a non-finite speed or phase.
    InvalidObstacleMotion {
        /// The obstacle's id.
        id: String,
    },
    /// A reward weight is NaN or infinite.
    InvalidReward {
        /// Weight name (`goal`, `step`, `collision`).
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// A time limit of zero ticks.
    ZeroTimeLimit,
    /// A difficulty scalar outside `[0, 1]`.
    InvalidDifficulty {
        /// The rejected value.
        value: f32,
    },
    /// A generated grid world cannot fit the requested entities.
    Overcrowded {
        /// Cells needed for starts, pickups and obstacles.
        needed: usize,
        /// Cells available.
        available: usize,
    },
    /// Scheduler timing parameters are out of range.
    InvalidTiming {
        /// Human-readable description.
        reason: String,
    },
    /// Level JSON failed to parse.
    Json {
        /// The parser's message.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGrid => write!(f, "grid size must be at least 1"),
            Self::NoStarts => write!(f, "level has no start positions"),
            Self::NoGoals => write!(f, "level has no goal positions"),
            Self::OutOfBounds {
                what,
                cell,
                grid_size,
            } => write!(f, "{what} cell {cell} outside {grid_size}x{grid_size} grid"),
            Self::StartOnObstacle { cell } => {
                write!(f, "start cell {cell} is a static obstacle")
            }
            Self::EmptyPath { id } => write!(f, "moving obstacle '{id}' has an empty path"),
            Self::InvalidObstacleMotion { id } => {
                write!(f, "moving obstacle '{id}' has non-finite speed or phase")
            }
            Self::InvalidReward { name, value } => {
                write!(f, "reward weight '{name}' must be finite, got {value}")
            }
            Self::ZeroTimeLimit => write!(f, "time limit must be at least one tick"),
            Self::InvalidDifficulty { value } => {
                write!(f, "difficulty must be within [0, 1], got {value}")
            }
            Self::Overcrowded { needed, available } => {
                write!(f, "grid world needs {needed} free cells, only {available} available")
            }
            Self::InvalidTiming { reason } => write!(f, "invalid timing: {reason}"),
            Self::Json { reason } => write!(f, "invalid level json: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── LoadError ──────────────────────────────────────────────────────

/// Errors from loading a policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The bytes were recognised but are not a valid model.
    Malformed {
        /// Human-readable description.
        reason: String,
    },
    /// A local locator could not be read.
    Unreadable {
        /// The locator as given.
        locator: String,
        /// The I/O error message.
        reason: String,
    },
    /// A locator names a remote scheme that cannot be fetched.
    Unreachable {
        /// The locator as given.
        locator: String,
    },
    /// The backend cannot honour a requested execution provider.
    UnsupportedProvider {
        /// The rejected provider name.
        provider: String,
    },
    /// No available backend understands the model format.
    Unsupported {
        /// Human-readable description.
        reason: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed model: {reason}"),
            Self::Unreadable { locator, reason } => {
                write!(f, "cannot read '{locator}': {reason}")
            }
            Self::Unreachable { locator } => write!(f, "cannot fetch remote locator '{locator}'"),
            Self::UnsupportedProvider { provider } => {
                write!(f, "execution provider '{provider}' is not supported")
            }
            Self::Unsupported { reason } => write!(f, "unsupported model: {reason}"),
        }
    }
}

impl Error for LoadError {}

// ── InferenceError ─────────────────────────────────────────────────

/// Errors from a batched forward pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// No policy is loaded.
    NotReady,
    /// The model produced no outputs.
    NoOutput,
    /// The first output is not numeric tensor data.
    NotATensor {
        /// What was found instead.
        found: String,
    },
    /// Observation vectors in one batch have differing lengths.
    RaggedBatch {
        /// Length of the first vector.
        expected: usize,
        /// Index of the first vector that differs.
        index: usize,
        /// Its length.
        found: usize,
    },
    /// The output cannot be split into one score row per agent.
    ShapeMismatch {
        /// Agents in the batch.
        batch: usize,
        /// Output elements received.
        elements: usize,
    },
    /// The backend failed while running the model.
    Backend {
        /// The backend's message.
        reason: String,
    },
    /// An observation payload could not be converted to features.
    Format(UnsupportedFormatError),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "no policy loaded"),
            Self::NoOutput => write!(f, "model produced no output"),
            Self::NotATensor { found } => write!(f, "model output is not a tensor: {found}"),
            Self::RaggedBatch {
                expected,
                index,
                found,
            } => write!(
                f,
                "observation {index} has length {found}, expected {expected}"
            ),
            Self::ShapeMismatch { batch, elements } => {
                write!(f, "{elements} output values cannot be split into {batch} rows")
            }
            Self::Backend { reason } => write!(f, "backend error: {reason}"),
            Self::Format(e) => write!(f, "{e}"),
        }
    }
}

impl Error for InferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnsupportedFormatError> for InferenceError {
    fn from(e: UnsupportedFormatError) -> Self {
        Self::Format(e)
    }
}

// ── UnsupportedFormatError ─────────────────────────────────────────

/// An observation payload that cannot be converted to `f32` features.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsupportedFormatError {
    /// Human-readable description of the rejected payload.
    pub reason: String,
}

impl UnsupportedFormatError {
    /// Create an error with the given description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for UnsupportedFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported observation format: {}", self.reason)
    }
}

impl Error for UnsupportedFormatError {}
