//! Output encoding and the plugin side of the two-call sizing convention.

use std::ffi::c_char;
use std::ptr;

use crate::error::{PolicyError, PolicyResult};

/// Textual identity produced by a numeric to textual hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextualIdentity {
    /// User identifier
    pub user_id: String,
    /// Group identifiers, primary group first
    pub group_ids: Vec<String>,
}

impl TextualIdentity {
    /// Create a new textual identity.
    pub fn new(user_id: impl Into<String>, group_ids: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            group_ids,
        }
    }
}

fn check_name(kind: &str, name: &str) -> PolicyResult<()> {
    if name.is_empty() {
        return Err(PolicyError::InvalidInput(format!("empty {}", kind)));
    }
    if name.as_bytes().contains(&0) {
        return Err(PolicyError::InvalidInput(format!(
            "{} contains a NUL byte: {:?}",
            kind, name
        )));
    }
    Ok(())
}

/// Encode a user id as a single NUL-terminated string.
pub fn encode_user_id(user_id: &str) -> PolicyResult<Vec<u8>> {
    check_name("user id", user_id)?;
    let mut out = Vec::with_capacity(user_id.len() + 1);
    out.extend_from_slice(user_id.as_bytes());
    out.push(0);
    Ok(out)
}

/// Encode group ids as NUL-terminated strings packed back to back.
pub fn encode_group_ids<S: AsRef<str>>(group_ids: &[S]) -> PolicyResult<Vec<u8>> {
    if group_ids.is_empty() {
        return Err(PolicyError::InvalidInput("no group ids".to_string()));
    }
    let mut out = Vec::new();
    for group_id in group_ids {
        let group_id = group_id.as_ref();
        check_name("group id", group_id)?;
        out.extend_from_slice(group_id.as_bytes());
        out.push(0);
    }
    Ok(out)
}

/// Store `bytes` for the caller.
///
/// With a null `out` only the required length is written to `out_size`.
/// Otherwise `*out_size` must hold the allocated length, which has to be at
/// least `bytes.len()`; the bytes are copied and `*out_size` is set to the
/// number written.
///
/// # Safety
///
/// `out_size` must be null or valid for reads and writes. When `out` is not
/// null it must be valid for writes of `*out_size` bytes.
pub unsafe fn write_sized(bytes: &[u8], out: *mut c_char, out_size: *mut usize) -> PolicyResult<()> {
    if out_size.is_null() {
        return Err(PolicyError::InvalidInput("null size pointer".to_string()));
    }
    if out.is_null() {
        *out_size = bytes.len();
        return Ok(());
    }
    let available = *out_size;
    if available < bytes.len() {
        return Err(PolicyError::BufferTooSmall {
            needed: bytes.len(),
            available,
        });
    }
    ptr::copy_nonoverlapping(bytes.as_ptr(), out.cast::<u8>(), bytes.len());
    *out_size = bytes.len();
    Ok(())
}

/// Write a textual identity using the two-call convention.
///
/// # Safety
///
/// Same contract as [`write_sized`] for each buffer/size pair.
pub unsafe fn write_textual_identity(
    identity: &TextualIdentity,
    out_user_id: *mut c_char,
    out_user_id_size: *mut usize,
    out_group_ids: *mut c_char,
    out_group_ids_size: *mut usize,
) -> PolicyResult<()> {
    let user_id = encode_user_id(&identity.user_id)?;
    let group_ids = encode_group_ids(&identity.group_ids)?;
    write_sized(&user_id, out_user_id, out_user_id_size)?;
    write_sized(&group_ids, out_group_ids, out_group_ids_size)
}
