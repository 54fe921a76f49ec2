//! Plugin error types.

use std::ffi::c_int;

use thiserror::Error;

/// Errors a policy hook reports back to the host as a negated errno.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// No mapping exists for the given identity
    #[error("Not found: {0}")]
    NotFound(String),

    /// The input identity is malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller-supplied buffer is smaller than the encoded output
    #[error("Buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// The caller is not allowed to be mapped
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The hook panicked; the panic was stopped at the boundary
    #[error("Policy hook panicked")]
    Panicked,

    /// Raw OS error code
    #[error("OS error {0}")]
    Os(c_int),
}

impl PolicyError {
    /// The positive errno this error maps to.
    pub fn errno(&self) -> c_int {
        match self {
            PolicyError::NotFound(_) => libc::ENOENT,
            PolicyError::InvalidInput(_) => libc::EINVAL,
            PolicyError::BufferTooSmall { .. } => libc::ERANGE,
            PolicyError::PermissionDenied(_) => libc::EACCES,
            PolicyError::Panicked => libc::EIO,
            PolicyError::Os(code) => *code,
        }
    }

    /// The value a hook returns for this error.
    pub fn to_status(&self) -> c_int {
        -self.errno().abs()
    }
}

/// Policy result type
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Collapse a hook result into the status returned across the ABI.
pub fn status_of(result: PolicyResult<()>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => e.to_status(),
    }
}
