//! Error types for identity resolution and policy loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the policy registry and the credential resolver.
///
/// Loading errors (`PluginOpen`, `SymbolNotFound`) are absorbed by the
/// registry and only logged. Everything else reaches the caller.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to open policy plugin {path}: {source}")]
    PluginOpen {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Symbol {symbol} not found in {path}")]
    SymbolNotFound { path: PathBuf, symbol: &'static str },

    #[error("Policy hook {hook} failed with error code {code}")]
    HookExecution { hook: &'static str, code: i32 },

    #[error("Policy hook {hook} returned malformed output: {reason}")]
    MalformedOutput { hook: &'static str, reason: String },

    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not determine the identity of the calling process")]
    HostIdentityUnavailable,

    #[error("Identity lookup for {what} failed: {source}")]
    Lookup {
        what: String,
        #[source]
        source: std::io::Error,
    },
}

impl PolicyError {
    /// errno-style code for hosts that must answer with one (e.g. FUSE).
    pub fn os_code(&self) -> i32 {
        match self {
            PolicyError::HookExecution { code, .. } => *code,
            PolicyError::Lookup { source, .. } => source.raw_os_error().unwrap_or(errno::EIO),
            PolicyError::InvalidInput(_) => errno::EINVAL,
            PolicyError::SymbolNotFound { .. } => errno::ENOENT,
            PolicyError::CredentialNotFound(_) | PolicyError::HostIdentityUnavailable => {
                errno::EACCES
            }
            PolicyError::PluginOpen { .. } | PolicyError::MalformedOutput { .. } => errno::EIO,
        }
    }

    /// True for errors produced while resolving a credential.
    pub fn is_resolution_error(&self) -> bool {
        !matches!(
            self,
            PolicyError::PluginOpen { .. } | PolicyError::SymbolNotFound { .. }
        )
    }
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

#[cfg(unix)]
mod errno {
    pub use libc::{EACCES, EINVAL, EIO, ENOENT};
}

#[cfg(not(unix))]
mod errno {
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const EACCES: i32 = 13;
    pub const EINVAL: i32 = 22;
}
