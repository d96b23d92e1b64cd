//! Defines common error types for the Unigate core library.

use crate::types::PolicyId;
use thiserror::Error;

/// The primary error type for Unigate policy operations.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// A stored condition expression is not valid JSON or does not match the
    /// condition grammar. Recovered locally during evaluation: the offending
    /// policy is treated as not applicable and reported for repair.
    #[error("Malformed condition on policy {policy_id}: {message}")]
    MalformedCondition {
        /// The policy carrying the unparseable condition.
        policy_id: PolicyId,
        /// What the parser rejected.
        message: String,
    },

    /// The backing policy store could not be read. Callers must treat this
    /// as a deny, never as an implicit allow.
    #[error("Policy store unavailable: {0}")]
    StoreUnavailable(String),

    /// Error during serialization or deserialization (e.g., JSON parsing).
    #[error("Serialization/Deserialization Error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Represents an unexpected internal error.
    #[error("Internal Error: {0}")]
    InternalError(String),
}
