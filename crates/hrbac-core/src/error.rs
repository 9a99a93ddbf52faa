//! Error types for the resolution core
//!
//! This module defines the structural errors raised when importing
//! serialized hierarchy or permission data. Rule evaluation itself is
//! infallible: an unmatched query resolves to deny, never to an error.

use thiserror::Error;

/// Errors raised by the HRBAC resolution core.
///
/// All variants are structural: they signal malformed serialized input and
/// name the offending entry. Imports are best-effort, not transactional —
/// entries consumed before the failure stay imported.
#[derive(Debug, Error)]
pub enum HrbacError {
    /// Serialized hierarchy data did not match the expected
    /// `[id, [parents...]]` pair shape
    #[error("invalid serialized hierarchy entry: {0}")]
    InvalidHierarchy(String),

    /// A serialized rule was missing its type or carried a malformed
    /// privilege list
    #[error("invalid serialized rule: {0}")]
    InvalidRule(String),

    /// A serialized permission entry did not match the expected
    /// `[role, resource, rule]` triple shape
    #[error("invalid serialized permission entry: {0}")]
    InvalidPermission(String),
}

/// Result type for core operations.
pub type HrbacResult<T> = Result<T, HrbacError>;
