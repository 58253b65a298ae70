//! Errors reported by the layout engine.

use crate::DatasetKey;

use std::error::Error;
use std::fmt::Display;

//-----------------------------------------------------------------------------

/// An error from validating, laying out, or retrieving a dataset.
///
/// Errors are local to a single dataset.
/// A failed layout never leaves a partial entry in an [`crate::ElementCache`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// The input refers to a node that does not exist or is otherwise inconsistent.
    DataIntegrity(String),

    /// The consensus tree contains a cycle, a node with multiple parents, or the root as a child.
    CyclicTree(String),

    /// The cache does not contain a layout for the key.
    ///
    /// The caller should lay out the dataset again.
    CacheMiss(DatasetKey),

    /// The session is not bound to any dataset.
    UnknownSession(String),

    /// A lock guarding shared state was poisoned by a panicking thread.
    Lock(String),

    /// Layout parameters are outside their valid range.
    InvalidParameters(String),
}

impl LayoutError {
    /// Returns `true` if this is a [`LayoutError::CacheMiss`].
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, LayoutError::CacheMiss(_))
    }
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::DataIntegrity(message) => write!(f, "Data integrity error: {}", message),
            LayoutError::CyclicTree(message) => write!(f, "Invalid consensus tree: {}", message),
            LayoutError::CacheMiss(key) => write!(f, "No cached layout for dataset {}", key),
            LayoutError::UnknownSession(session) => write!(f, "Session {} has no dataset", session),
            LayoutError::Lock(message) => write!(f, "Poisoned lock: {}", message),
            LayoutError::InvalidParameters(message) => write!(f, "Invalid layout parameters: {}", message),
        }
    }
}

impl Error for LayoutError {}

impl From<LayoutError> for String {
    fn from(error: LayoutError) -> Self {
        error.to_string()
    }
}

//-----------------------------------------------------------------------------
