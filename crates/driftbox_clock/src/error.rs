//! Error types for clock parsing.

use thiserror::Error;

/// Result type for clock operations.
pub type ClockResult<T> = Result<T, ClockError>;

/// Errors that can occur when parsing a serialized clock.
///
/// Parse errors are always surfaced to the caller; a malformed clock is
/// never silently replaced with a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// The input does not have the `replica:wall_ms:counter` shape.
    #[error("malformed clock string: {input:?}")]
    ParseShape {
        /// The rejected input.
        input: String,
    },

    /// A numeric component could not be parsed.
    #[error("invalid {field} in clock string: {value:?}")]
    ParseNumber {
        /// Which component failed (`wall_ms` or `counter`).
        field: &'static str,
        /// The rejected component text.
        value: String,
    },
}
