//! Identity types for cubetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a solve.
///
/// Generated locally as a UUID v4 string. Identifiers received from the
/// remote store are kept verbatim, so any string is accepted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveId(String);

impl SolveId {
    /// Create a new random SolveId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix used in listings.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl Default for SolveId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SolveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SolveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolveId({})", self.short())
    }
}

impl From<&str> for SolveId {
    fn from(id: &str) -> Self {
        Self::from_string(id)
    }
}
