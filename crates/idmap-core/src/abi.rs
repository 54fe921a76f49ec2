//! Host side of the policy plugin ABI.
//!
//! Hooks are raw function pointers resolved from a plugin (or supplied
//! in-process). The wrappers here run the two-call sizing convention and
//! decode the results, so no raw buffer ever leaves this module.

use std::ffi::{c_int, CString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr;

use idmap_policy_sdk::abi::{id_from_abi, id_to_abi};
pub use idmap_policy_sdk::abi::{
    NumericToTextualFn, TextualToNumericFn, NUMERIC_TO_TEXTUAL_SYMBOL, TEXTUAL_TO_NUMERIC_SYMBOL,
};

use crate::error::{PolicyError, Result};
use crate::types::{NumericCredential, TextualCredential};

/// Largest buffer a sizing call may ask the host to allocate.
pub const MAX_HOOK_BUFFER_LEN: usize = 1 << 20;

/// Where a hook came from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum HookOrigin {
    Plugin(PathBuf),
    InProcess,
}

impl fmt::Display for HookOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOrigin::Plugin(path) => write!(f, "{}", path.display()),
            HookOrigin::InProcess => write!(f, "<in-process>"),
        }
    }
}

fn check_status(hook: &'static str, status: c_int) -> Result<()> {
    if status < 0 {
        return Err(PolicyError::HookExecution {
            hook,
            code: status.saturating_neg(),
        });
    }
    Ok(())
}

fn malformed(reason: impl Into<String>) -> PolicyError {
    PolicyError::MalformedOutput {
        hook: NUMERIC_TO_TEXTUAL_SYMBOL,
        reason: reason.into(),
    }
}

/// Decode a user id buffer: exactly one NUL-terminated UTF-8 string.
pub fn decode_user_id(buf: &[u8]) -> Result<String> {
    let Some((&0, name)) = buf.split_last() else {
        return Err(malformed("user id is not NUL-terminated"));
    };
    if name.is_empty() {
        return Err(malformed("empty user id"));
    }
    if name.contains(&0) {
        return Err(malformed("user id has trailing data after its terminator"));
    }
    String::from_utf8(name.to_vec()).map_err(|_| malformed("user id is not valid UTF-8"))
}

/// Decode a packed group id buffer: NUL-terminated strings until the
/// consumed length equals the buffer length.
pub fn decode_group_ids(buf: &[u8]) -> Result<Vec<String>> {
    let mut group_ids = Vec::new();
    let mut rest = buf;
    while !rest.is_empty() {
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(malformed("group id is not NUL-terminated"));
        };
        if end == 0 {
            return Err(malformed("empty group id"));
        }
        let name = std::str::from_utf8(&rest[..end])
            .map_err(|_| malformed("group id is not valid UTF-8"))?;
        group_ids.push(name.to_string());
        rest = &rest[end + 1..];
    }
    if group_ids.is_empty() {
        return Err(malformed("no group ids"));
    }
    Ok(group_ids)
}

/// A `resolve_numeric_to_textual` hook.
pub struct NumericToTextualHook {
    func: NumericToTextualFn,
    origin: HookOrigin,
}

impl NumericToTextualHook {
    /// Wrap a hook exported by the plugin at `path`.
    ///
    /// # Safety
    ///
    /// `func` must follow the ABI contract, and the library it lives in must
    /// stay loaded for as long as this hook exists.
    pub unsafe fn from_plugin(func: NumericToTextualFn, path: &Path) -> Self {
        Self {
            func,
            origin: HookOrigin::Plugin(path.to_path_buf()),
        }
    }

    /// Wrap a hook compiled into the current binary.
    ///
    /// # Safety
    ///
    /// `func` must follow the ABI contract.
    pub unsafe fn in_process(func: NumericToTextualFn) -> Self {
        Self {
            func,
            origin: HookOrigin::InProcess,
        }
    }

    pub fn origin(&self) -> &HookOrigin {
        &self.origin
    }

    /// Resolve through the hook: sizing call, then fill call into buffers of
    /// exactly the reported lengths.
    pub fn resolve(&self, credential: NumericCredential) -> Result<TextualCredential> {
        let uid = id_to_abi(credential.user_id);
        let gid = id_to_abi(credential.group_id);

        let mut user_id_size = 0usize;
        let mut group_ids_size = 0usize;
        // SAFETY: null buffers with valid size pointers is the sizing call.
        let status = unsafe {
            (self.func)(
                uid,
                gid,
                ptr::null_mut(),
                &mut user_id_size,
                ptr::null_mut(),
                &mut group_ids_size,
            )
        };
        check_status(NUMERIC_TO_TEXTUAL_SYMBOL, status)?;
        if user_id_size == 0 || group_ids_size == 0 {
            return Err(malformed(format!(
                "sizing call reported user id size {} and group ids size {}",
                user_id_size, group_ids_size
            )));
        }
        if user_id_size > MAX_HOOK_BUFFER_LEN || group_ids_size > MAX_HOOK_BUFFER_LEN {
            return Err(malformed(format!(
                "sizing call reported user id size {} and group ids size {}, limit is {}",
                user_id_size, group_ids_size, MAX_HOOK_BUFFER_LEN
            )));
        }

        let mut user_id = vec![0u8; user_id_size];
        let mut group_ids = vec![0u8; group_ids_size];
        // SAFETY: each buffer is valid for writes of the size passed with it.
        let status = unsafe {
            (self.func)(
                uid,
                gid,
                user_id.as_mut_ptr().cast(),
                &mut user_id_size,
                group_ids.as_mut_ptr().cast(),
                &mut group_ids_size,
            )
        };
        check_status(NUMERIC_TO_TEXTUAL_SYMBOL, status)?;
        if user_id_size > user_id.len() || group_ids_size > group_ids.len() {
            return Err(malformed("fill call reported more data than was allocated"));
        }
        user_id.truncate(user_id_size);
        group_ids.truncate(group_ids_size);

        TextualCredential::new(decode_user_id(&user_id)?, decode_group_ids(&group_ids)?)
            .map_err(|e| malformed(e.to_string()))
    }
}

impl fmt::Debug for NumericToTextualHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericToTextualHook")
            .field("origin", &self.origin)
            .finish()
    }
}

/// A `resolve_textual_to_numeric` hook.
pub struct TextualToNumericHook {
    func: TextualToNumericFn,
    origin: HookOrigin,
}

impl TextualToNumericHook {
    /// Wrap a hook exported by the plugin at `path`.
    ///
    /// # Safety
    ///
    /// `func` must follow the ABI contract, and the library it lives in must
    /// stay loaded for as long as this hook exists.
    pub unsafe fn from_plugin(func: TextualToNumericFn, path: &Path) -> Self {
        Self {
            func,
            origin: HookOrigin::Plugin(path.to_path_buf()),
        }
    }

    /// Wrap a hook compiled into the current binary.
    ///
    /// # Safety
    ///
    /// `func` must follow the ABI contract.
    pub unsafe fn in_process(func: TextualToNumericFn) -> Self {
        Self {
            func,
            origin: HookOrigin::InProcess,
        }
    }

    pub fn origin(&self) -> &HookOrigin {
        &self.origin
    }

    /// Resolve through the hook. The outputs are two integers, so the sizing
    /// call only validates the input; the fill call writes the ids.
    pub fn resolve(&self, user_id: &str, group_id: &str) -> Result<NumericCredential> {
        let user_id = CString::new(user_id)
            .map_err(|_| PolicyError::InvalidInput(format!("user id {:?} contains NUL", user_id)))?;
        let group_id = CString::new(group_id).map_err(|_| {
            PolicyError::InvalidInput(format!("group id {:?} contains NUL", group_id))
        })?;

        // SAFETY: both inputs are NUL-terminated and outlive the call.
        let status = unsafe {
            (self.func)(
                user_id.as_ptr(),
                group_id.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        check_status(TEXTUAL_TO_NUMERIC_SYMBOL, status)?;

        let mut uid: c_int = -1;
        let mut gid: c_int = -1;
        // SAFETY: as above, plus valid out pointers.
        let status = unsafe { (self.func)(user_id.as_ptr(), group_id.as_ptr(), &mut uid, &mut gid) };
        check_status(TEXTUAL_TO_NUMERIC_SYMBOL, status)?;

        Ok(NumericCredential::new(id_from_abi(uid), id_from_abi(gid)))
    }
}

impl fmt::Debug for TextualToNumericHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextualToNumericHook")
            .field("origin", &self.origin)
            .finish()
    }
}
