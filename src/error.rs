//! Error types for the maze session.
//!
//! Only construction can fail fatally. Generation problems are reported
//! through [`GenerationError`] and end up as an overlay status, never as a
//! rendering failure.

use std::error::Error;
use std::fmt;

/// Errors raised while building a session, before anything is drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Width or height is zero or larger than the supported maximum.
    InvalidDimensions { width: usize, height: usize },
    /// Entry or exit does not name a cell of the grid.
    OutOfBounds {
        name: &'static str,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },
    /// A configuration value is unusable.
    InvalidConfig { reason: String },
    /// The background executor could not be started.
    Executor { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid maze dimensions {width}x{height}")
            }
            Self::OutOfBounds {
                name,
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "{name} ({x}, {y}) is outside the {width}x{height} maze"
            ),
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
            Self::Executor { reason } => write!(f, "cannot start generation executor: {reason}"),
        }
    }
}

impl Error for SessionError {}

/// Why a generation run stopped without completing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationError {
    /// The session's cancellation token fired.
    Cancelled,
    /// The generator gave up.
    Failed { reason: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "generation cancelled"),
            Self::Failed { reason } => write!(f, "generation failed: {reason}"),
        }
    }
}

impl Error for GenerationError {}
