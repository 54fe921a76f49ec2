//! Credential resolver.
//!
//! Entry point for identity mapping. Each direction goes through the active
//! plugin hook when one is installed and through the native database
//! otherwise. A failing hook is final; there is no fallback to the database
//! for that request.

use std::sync::Arc;

use crate::error::{PolicyError, Result};
use crate::host::{HostIdentitySource, NoHostIdentity, ProcessIdentity};
use crate::native::{IdentityDatabase, SystemIdentityDatabase};
use crate::registry::PolicyRegistry;
use crate::types::{NumericCredential, TextualCredential};

/// Maps between numeric and textual credentials.
///
/// Cheap to clone and safe to share between threads; every call uses its own
/// buffers.
#[derive(Clone)]
pub struct CredentialResolver {
    registry: Arc<PolicyRegistry>,
    database: Arc<dyn IdentityDatabase>,
    host: Arc<dyn HostIdentitySource>,
}

impl CredentialResolver {
    /// Resolver over `registry`, the system database and no host source.
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self {
            registry,
            database: Arc::new(SystemIdentityDatabase::new()),
            host: Arc::new(NoHostIdentity),
        }
    }

    /// Resolver over the process-wide registry.
    pub fn global() -> Self {
        Self::new(PolicyRegistry::global())
    }

    /// Use a different native database.
    pub fn with_database(mut self, database: impl IdentityDatabase + 'static) -> Self {
        self.database = Arc::new(database);
        self
    }

    /// Use a host integration layer to identify the caller.
    pub fn with_host_source(mut self, host: impl HostIdentitySource + 'static) -> Self {
        self.host = Arc::new(host);
        self
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Numeric identity of the caller: the host's ids, with any missing id
    /// taken from this process's effective ids.
    pub fn current_numeric(&self) -> Result<NumericCredential> {
        let identity = self
            .host
            .caller_identity()
            .or(ProcessIdentity.caller_identity());
        match (identity.user_id, identity.group_id) {
            (Some(uid), Some(gid)) => Ok(NumericCredential::new(uid, gid)),
            _ => Err(PolicyError::HostIdentityUnavailable),
        }
    }

    /// Textual credential of the caller.
    pub fn resolve_current_user(&self) -> Result<TextualCredential> {
        let credential = self.current_numeric()?;
        self.resolve_numeric_to_textual(credential)
    }

    /// Map a numeric credential to a textual one.
    pub fn resolve_numeric_to_textual(
        &self,
        credential: NumericCredential,
    ) -> Result<TextualCredential> {
        match self.registry.hooks().numeric_to_textual() {
            Some(hook) => hook.resolve(credential).inspect_err(|e| {
                tracing::debug!("Policy hook rejected {}: {}", credential, e);
            }),
            None => self.database.lookup_textual(credential),
        }
    }

    /// Map a user id and group id to numeric ids.
    pub fn resolve_textual_to_numeric(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> Result<NumericCredential> {
        match self.registry.hooks().textual_to_numeric() {
            Some(hook) => hook.resolve(user_id, group_id).inspect_err(|e| {
                tracing::debug!("Policy hook rejected {}/{}: {}", user_id, group_id, e);
            }),
            None => self.database.lookup_numeric(user_id, group_id),
        }
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FixedIdentity, HostIdentity};
    use crate::native::MemoryIdentityDatabase;

    fn resolver() -> CredentialResolver {
        CredentialResolver::new(Arc::new(PolicyRegistry::empty())).with_database(
            MemoryIdentityDatabase::new()
                .with_user(0, "root")
                .with_group(0, "root"),
        )
    }

    #[test]
    fn test_native_fallback() {
        let cred = resolver()
            .resolve_numeric_to_textual(NumericCredential::new(0, 0))
            .unwrap();
        assert_eq!(cred.user_id(), "root");
        assert_eq!(cred.group_ids(), ["root".to_string()]);
    }

    #[test]
    fn test_current_user_from_host() {
        let resolver = resolver().with_host_source(FixedIdentity(HostIdentity::new(0, 0)));
        assert_eq!(resolver.resolve_current_user().unwrap().user_id(), "root");
    }

    #[test]
    fn test_empty_user_rejected_without_hook() {
        let err = resolver()
            .resolve_textual_to_numeric("", "anygroup")
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidInput(_)));
    }
}
