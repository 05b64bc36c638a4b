//! Batch error types.

use std::fmt;
use std::io;

use crate::batch::BatchState;

/// Errors that can occur while building, uploading, or persisting a batch.
///
/// A truncated *optional* trailing section during a load is deliberately not
/// represented here: it is a recognized, tolerated condition that disables
/// the affected attribute rather than failing the load.
#[derive(Debug)]
pub enum BatchError {
    /// `add_triangle` would exceed the index capacity fixed by `begin_mesh`.
    /// The batch is left unchanged.
    CapacityExceeded {
        /// The index capacity the batch was created with.
        capacity: u32,
    },
    /// An operation was invoked in the wrong lifecycle phase.
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the batch was in.
        state: BatchState,
    },
    /// A stream or file operation on a mandatory field failed, or a
    /// mandatory field held structurally invalid data.
    Io(io::Error),
    /// The GPU backend rejected a resource or a submission.
    Backend(String),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { capacity } => {
                write!(f, "index capacity {capacity} exceeded")
            }
            Self::InvalidState { operation, state } => {
                write!(f, "{operation} called on a batch in the {state:?} state")
            }
            Self::Io(e) => write!(f, "mesh stream error: {e}"),
            Self::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BatchError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
