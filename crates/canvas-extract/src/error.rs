//! Extraction error types.

use thiserror::Error;

/// An error that stops extraction before any field is looked at.
///
/// Unmatched fields are never errors; they come back as `None` and are
/// filled in later by the fallback policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The input was empty or contained only whitespace.
    #[error("input is empty: paste a component or a markup document first")]
    EmptyInput,
}
