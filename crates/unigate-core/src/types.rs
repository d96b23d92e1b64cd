//! Common type definitions used throughout Unigate.

/// Unique identifier for a Policy. Auto-assigned by the store on insertion.
pub type PolicyId = i64;

/// Sentinel subject meaning "applies to any role".
///
/// A policy whose `subject` equals this value matches every subject role
/// during lookup. Only the subject position supports the wildcard; actions
/// and resources are always matched by exact, case-sensitive equality.
pub const ANY_SUBJECT: &str = "*";
