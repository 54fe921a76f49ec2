//! Native identity backend: the local passwd/group database.

use std::collections::HashMap;

use crate::error::{PolicyError, Result};
use crate::types::{NumericCredential, TextualCredential};

/// Lookups against a user/group database.
///
/// `Ok(None)` means "no such entry"; `Err` means the lookup itself failed.
pub trait IdentityDatabase: Send + Sync {
    fn user_name(&self, uid: u32) -> Result<Option<String>>;

    fn group_name(&self, gid: u32) -> Result<Option<String>>;

    fn user_id(&self, name: &str) -> Result<Option<u32>>;

    fn group_id(&self, name: &str) -> Result<Option<u32>>;

    /// Map a numeric credential to user and primary group names.
    fn lookup_textual(&self, credential: NumericCredential) -> Result<TextualCredential> {
        let user = self.user_name(credential.user_id)?;
        let group = self.group_name(credential.group_id)?;
        match (user, group) {
            (Some(user), Some(group)) if !user.is_empty() && !group.is_empty() => {
                TextualCredential::new(user, vec![group])
            }
            _ => Err(PolicyError::CredentialNotFound(credential.to_string())),
        }
    }

    /// Map a user name and group name to their numeric ids.
    fn lookup_numeric(&self, user_id: &str, group_id: &str) -> Result<NumericCredential> {
        if user_id.is_empty() || group_id.is_empty() {
            return Err(PolicyError::InvalidInput(format!(
                "user id {:?} and group id {:?} must both be non-empty",
                user_id, group_id
            )));
        }
        match (self.user_id(user_id)?, self.group_id(group_id)?) {
            (Some(uid), Some(gid)) => Ok(NumericCredential::new(uid, gid)),
            _ => Err(PolicyError::CredentialNotFound(format!(
                "user {} group {}",
                user_id, group_id
            ))),
        }
    }
}

/// The operating system's database, queried through the reentrant
/// `getpwuid_r` family. Without a local database (non-Unix) every lookup
/// finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdentityDatabase;

impl SystemIdentityDatabase {
    pub fn new() -> Self {
        Self
    }
}

fn lookup_error(what: String) -> impl FnOnce(std::io::Error) -> PolicyError {
    move |source| PolicyError::Lookup { what, source }
}

impl IdentityDatabase for SystemIdentityDatabase {
    fn user_name(&self, uid: u32) -> Result<Option<String>> {
        sys::user_name(uid).map_err(lookup_error(format!("uid {}", uid)))
    }

    fn group_name(&self, gid: u32) -> Result<Option<String>> {
        sys::group_name(gid).map_err(lookup_error(format!("gid {}", gid)))
    }

    fn user_id(&self, name: &str) -> Result<Option<u32>> {
        sys::user_id(name).map_err(lookup_error(format!("user {}", name)))
    }

    fn group_id(&self, name: &str) -> Result<Option<u32>> {
        sys::group_id(name).map_err(lookup_error(format!("group {}", name)))
    }
}

/// In-memory database, for embedders that manage identities themselves.
#[derive(Debug, Default, Clone)]
pub struct MemoryIdentityDatabase {
    users: HashMap<u32, String>,
    groups: HashMap<u32, String>,
}

impl MemoryIdentityDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, uid: u32, name: impl Into<String>) -> Self {
        self.users.insert(uid, name.into());
        self
    }

    pub fn with_group(mut self, gid: u32, name: impl Into<String>) -> Self {
        self.groups.insert(gid, name.into());
        self
    }
}

impl IdentityDatabase for MemoryIdentityDatabase {
    fn user_name(&self, uid: u32) -> Result<Option<String>> {
        Ok(self.users.get(&uid).cloned())
    }

    fn group_name(&self, gid: u32) -> Result<Option<String>> {
        Ok(self.groups.get(&gid).cloned())
    }

    fn user_id(&self, name: &str) -> Result<Option<u32>> {
        Ok(self.users.iter().find(|(_, n)| *n == name).map(|(id, _)| *id))
    }

    fn group_id(&self, name: &str) -> Result<Option<u32>> {
        Ok(self.groups.iter().find(|(_, n)| *n == name).map(|(id, _)| *id))
    }
}

#[cfg(unix)]
mod sys {
    use std::ffi::{c_char, c_int, CStr, CString};
    use std::io;
    use std::mem::MaybeUninit;
    use std::ptr;

    const FALLBACK_BUFFER_LEN: usize = 1024;
    const MAX_BUFFER_LEN: usize = 1 << 20;

    /// Outcome of one `get*_r` attempt: found value, no entry, or errno.
    type Attempt<T> = std::result::Result<Option<T>, c_int>;

    /// Run a `get*_r` call, doubling the scratch buffer on `ERANGE`.
    fn with_buffer<T>(
        size_key: c_int,
        mut call: impl FnMut(&mut [c_char]) -> Attempt<T>,
    ) -> io::Result<Option<T>> {
        // SAFETY: sysconf has no preconditions.
        let hint = unsafe { libc::sysconf(size_key) };
        let mut len = if hint > 0 { hint as usize } else { FALLBACK_BUFFER_LEN };
        loop {
            let mut buf = vec![0 as c_char; len];
            match call(&mut buf) {
                Ok(found) => return Ok(found),
                Err(libc::ERANGE) if len < MAX_BUFFER_LEN => len *= 2,
                // Several libcs report a missing entry as one of these.
                Err(libc::ENOENT | libc::ESRCH | libc::EBADF | libc::EPERM) => return Ok(None),
                Err(code) => return Err(io::Error::from_raw_os_error(code)),
            }
        }
    }

    /// Entry name as UTF-8. Empty and non-UTF-8 names count as no entry.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated string.
    unsafe fn owned_name(ptr: *const c_char) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let raw = CStr::from_ptr(ptr);
        match raw.to_str() {
            Ok(name) if !name.is_empty() => Some(name.to_string()),
            Ok(_) => None,
            Err(_) => {
                tracing::warn!("Ignoring identity entry with non-UTF-8 name {:?}", raw);
                None
            }
        }
    }

    fn c_name(name: &str) -> Option<CString> {
        CString::new(name).ok()
    }

    pub fn user_name(uid: u32) -> io::Result<Option<String>> {
        with_buffer(libc::_SC_GETPW_R_SIZE_MAX, |buf| {
            let mut pwd = MaybeUninit::<libc::passwd>::uninit();
            let mut result: *mut libc::passwd = ptr::null_mut();
            // SAFETY: every pointer is valid for the duration of the call.
            let rc = unsafe {
                libc::getpwuid_r(uid as libc::uid_t, pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc != 0 {
                return Err(rc);
            }
            if result.is_null() {
                return Ok(None);
            }
            // SAFETY: a non-null result points at `pwd`, whose strings live in `buf`.
            Ok(unsafe { owned_name((*result).pw_name) })
        })
    }

    pub fn group_name(gid: u32) -> io::Result<Option<String>> {
        with_buffer(libc::_SC_GETGR_R_SIZE_MAX, |buf| {
            let mut grp = MaybeUninit::<libc::group>::uninit();
            let mut result: *mut libc::group = ptr::null_mut();
            // SAFETY: every pointer is valid for the duration of the call.
            let rc = unsafe {
                libc::getgrgid_r(gid as libc::gid_t, grp.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc != 0 {
                return Err(rc);
            }
            if result.is_null() {
                return Ok(None);
            }
            // SAFETY: a non-null result points at `grp`, whose strings live in `buf`.
            Ok(unsafe { owned_name((*result).gr_name) })
        })
    }

    pub fn user_id(name: &str) -> io::Result<Option<u32>> {
        let Some(name) = c_name(name) else {
            return Ok(None);
        };
        with_buffer(libc::_SC_GETPW_R_SIZE_MAX, |buf| {
            let mut pwd = MaybeUninit::<libc::passwd>::uninit();
            let mut result: *mut libc::passwd = ptr::null_mut();
            // SAFETY: every pointer is valid for the duration of the call.
            let rc = unsafe {
                libc::getpwnam_r(name.as_ptr(), pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc != 0 {
                return Err(rc);
            }
            if result.is_null() {
                return Ok(None);
            }
            // SAFETY: a non-null result points at the initialized `pwd`.
            Ok(Some(unsafe { (*result).pw_uid } as u32))
        })
    }

    pub fn group_id(name: &str) -> io::Result<Option<u32>> {
        let Some(name) = c_name(name) else {
            return Ok(None);
        };
        with_buffer(libc::_SC_GETGR_R_SIZE_MAX, |buf| {
            let mut grp = MaybeUninit::<libc::group>::uninit();
            let mut result: *mut libc::group = ptr::null_mut();
            // SAFETY: every pointer is valid for the duration of the call.
            let rc = unsafe {
                libc::getgrnam_r(name.as_ptr(), grp.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
            };
            if rc != 0 {
                return Err(rc);
            }
            if result.is_null() {
                return Ok(None);
            }
            // SAFETY: a non-null result points at the initialized `grp`.
            Ok(Some(unsafe { (*result).gr_gid } as u32))
        })
    }

}

#[cfg(not(unix))]
mod sys {
    use std::io;

    pub fn user_name(_uid: u32) -> io::Result<Option<String>> {
        Ok(None)
    }

    pub fn group_name(_gid: u32) -> io::Result<Option<String>> {
        Ok(None)
    }

    pub fn user_id(_name: &str) -> io::Result<Option<u32>> {
        Ok(None)
    }

    pub fn group_id(_name: &str) -> io::Result<Option<u32>> {
        Ok(None)
    }
}
