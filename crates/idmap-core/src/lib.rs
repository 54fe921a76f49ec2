//! Pluggable identity mapping for idmap.
//!
//! Translates between numeric process credentials (uid/gid) and textual
//! credentials (a user id plus an ordered list of group ids). Policy plugins
//! found at startup can override either direction; otherwise the local
//! passwd/group database answers.
//!
//! ```no_run
//! use idmap_core::CredentialResolver;
//!
//! let resolver = CredentialResolver::global();
//! let me = resolver.resolve_current_user()?;
//! println!("{}", me);
//! # Ok::<(), idmap_core::PolicyError>(())
//! ```

pub mod abi;
pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod loader;
pub mod native;
pub mod registry;
pub mod resolver;
pub mod types;

pub use abi::{HookOrigin, NumericToTextualHook, TextualToNumericHook};
pub use config::PolicyConfig;
pub use error::{PolicyError, Result};
pub use hooks::{ActiveHookSet, HookSetBuilder, HookSummary, PluginHooks};
pub use host::{FixedIdentity, HostIdentity, HostIdentitySource, NoHostIdentity, ProcessIdentity};
pub use loader::{LoadedPlugin, LoadedPolicy, PluginLoader};
pub use native::{IdentityDatabase, MemoryIdentityDatabase, SystemIdentityDatabase};
pub use registry::PolicyRegistry;
pub use resolver::CredentialResolver;
pub use types::{NumericCredential, TextualCredential};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::PolicyConfig;
    pub use crate::error::{PolicyError, Result};
    pub use crate::host::{HostIdentity, HostIdentitySource};
    pub use crate::native::IdentityDatabase;
    pub use crate::registry::PolicyRegistry;
    pub use crate::resolver::CredentialResolver;
    pub use crate::types::{NumericCredential, TextualCredential};
}
