//! Error types for the service layer
//!
//! Loading can fail in two ways: the loader backend itself (I/O, network,
//! storage) or the structural validation of the payload it returned. Both
//! propagate to the caller; a load failure is never converted into an
//! authorization decision.

use hrbac_core::HrbacError;
use thiserror::Error;

/// Errors raised while loading and resolving through the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A loader payload failed structural validation on import
    #[error(transparent)]
    Import(#[from] HrbacError),

    /// The loader backend failed
    #[error("loader error: {0}")]
    Loader(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
