//! Host identity sources: who is calling.
//!
//! The host integration layer (a FUSE request context, for instance) knows
//! the numeric identity of the process behind a request. When it cannot say,
//! the resolver falls back to this process's own effective ids.

/// Identity reported by a host. Each id may be missing independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostIdentity {
    pub user_id: Option<u32>,
    pub group_id: Option<u32>,
}

impl HostIdentity {
    pub fn new(user_id: u32, group_id: u32) -> Self {
        Self {
            user_id: Some(user_id),
            group_id: Some(group_id),
        }
    }

    /// Fill missing ids from `fallback`.
    pub fn or(self, fallback: HostIdentity) -> HostIdentity {
        HostIdentity {
            user_id: self.user_id.or(fallback.user_id),
            group_id: self.group_id.or(fallback.group_id),
        }
    }
}

/// Supplies the numeric identity of the current caller.
pub trait HostIdentitySource: Send + Sync {
    fn caller_identity(&self) -> HostIdentity;
}

impl<F> HostIdentitySource for F
where
    F: Fn() -> HostIdentity + Send + Sync,
{
    fn caller_identity(&self) -> HostIdentity {
        self()
    }
}

/// No host integration: always defer to the process identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHostIdentity;

impl HostIdentitySource for NoHostIdentity {
    fn caller_identity(&self) -> HostIdentity {
        HostIdentity::default()
    }
}

/// A host that always reports the same identity.
#[derive(Debug, Clone, Copy)]
pub struct FixedIdentity(pub HostIdentity);

impl HostIdentitySource for FixedIdentity {
    fn caller_identity(&self) -> HostIdentity {
        self.0
    }
}

/// The effective ids of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessIdentity;

impl HostIdentitySource for ProcessIdentity {
    #[cfg(unix)]
    fn caller_identity(&self) -> HostIdentity {
        // SAFETY: geteuid and getegid cannot fail.
        let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
        HostIdentity::new(uid as u32, gid as u32)
    }

    #[cfg(not(unix))]
    fn caller_identity(&self) -> HostIdentity {
        HostIdentity::default()
    }
}
