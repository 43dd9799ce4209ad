//! Error types for the topkit library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when the rank index's retract/reinsert
//!   protocol observes an impossible state (e.g. a composite key missing
//!   from an index that must contain it).
//!
//! ## Example Usage
//!
//! ```
//! use topkit::error::InvariantError;
//! use topkit::rank::{RankIndex, Timestamp};
//!
//! // Public operations surface invariant violations instead of panicking
//! // the process; in correct operation they never occur.
//! let index = RankIndex::new();
//! let result: Result<(), InvariantError> =
//!     index.increment("GET /health", Timestamp::from_secs(1));
//! assert!(result.is_ok());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal index invariants are violated.
///
/// Produced when retracting a composite key that is absent from the by-count
/// or by-recency index. This signals a defect in the retract/reinsert
/// protocol itself; callers decide whether to abort or log and continue, but
/// the affected operation never silently continues with a desynchronized
/// index. Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
