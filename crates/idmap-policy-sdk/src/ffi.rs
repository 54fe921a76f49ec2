//! Boundary adapters used by the export macros.
//!
//! Each adapter turns a safe resolver function into a hook body: it decodes
//! the C arguments, runs the resolver, writes the outputs per phase and
//! converts the result into a status code. Panics never unwind into the host.

use std::ffi::{c_char, c_int, CStr};
use std::panic::{self, AssertUnwindSafe};

use crate::abi::{id_from_abi, id_to_abi};
use crate::buffer::{write_textual_identity, TextualIdentity};
use crate::error::{status_of, PolicyError, PolicyResult};

/// Body of a `resolve_numeric_to_textual` hook.
///
/// `resolve` runs on both the sizing and the fill call and must return the
/// same identity for the same ids.
///
/// # Safety
///
/// The pointers must satisfy the contract of
/// [`NumericToTextualFn`](crate::abi::NumericToTextualFn).
pub unsafe fn numeric_to_textual_entry<F>(
    uid: c_int,
    gid: c_int,
    out_user_id: *mut c_char,
    out_user_id_size: *mut usize,
    out_group_ids: *mut c_char,
    out_group_ids_size: *mut usize,
    resolve: F,
) -> c_int
where
    F: FnOnce(u32, u32) -> PolicyResult<TextualIdentity>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let identity = resolve(id_from_abi(uid), id_from_abi(gid))?;
        write_textual_identity(
            &identity,
            out_user_id,
            out_user_id_size,
            out_group_ids,
            out_group_ids_size,
        )
    }));
    match outcome {
        Ok(result) => status_of(result),
        Err(_) => PolicyError::Panicked.to_status(),
    }
}

/// Body of a `resolve_textual_to_numeric` hook.
///
/// When either output pointer is null this is the sizing call: the input is
/// resolved but nothing is written.
///
/// # Safety
///
/// The pointers must satisfy the contract of
/// [`TextualToNumericFn`](crate::abi::TextualToNumericFn).
pub unsafe fn textual_to_numeric_entry<F>(
    user_id: *const c_char,
    group_ids: *const c_char,
    out_uid: *mut c_int,
    out_gid: *mut c_int,
    resolve: F,
) -> c_int
where
    F: FnOnce(&str, &str) -> PolicyResult<(u32, u32)>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let user_id = read_c_str(user_id, "user id")?;
        let group_ids = read_c_str(group_ids, "group id")?;
        let (uid, gid) = resolve(user_id, group_ids)?;
        if !out_uid.is_null() && !out_gid.is_null() {
            *out_uid = id_to_abi(uid);
            *out_gid = id_to_abi(gid);
        }
        Ok(())
    }));
    match outcome {
        Ok(result) => status_of(result),
        Err(_) => PolicyError::Panicked.to_status(),
    }
}

/// Borrow a NUL-terminated input string.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn read_c_str<'a>(ptr: *const c_char, what: &str) -> PolicyResult<&'a str> {
    if ptr.is_null() {
        return Err(PolicyError::InvalidInput(format!("null {}", what)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| PolicyError::InvalidInput(format!("{} is not valid UTF-8", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::ptr;

    fn staff(uid: u32, _gid: u32) -> PolicyResult<TextualIdentity> {
        if uid == 0 {
            return Err(PolicyError::NotFound("uid 0".into()));
        }
        Ok(TextualIdentity::new(
            format!("user{}", uid),
            vec!["staff".into(), "users".into()],
        ))
    }

    #[test]
    fn test_numeric_entry_two_calls() {
        let mut user_size = 0usize;
        let mut group_size = 0usize;
        let status = unsafe {
            numeric_to_textual_entry(
                42,
                7,
                ptr::null_mut(),
                &mut user_size,
                ptr::null_mut(),
                &mut group_size,
                staff,
            )
        };
        assert_eq!(status, 0);
        assert_eq!(user_size, "user42\0".len());
        assert_eq!(group_size, "staff\0users\0".len());

        let mut user = vec![0u8; user_size];
        let mut groups = vec![0u8; group_size];
        let status = unsafe {
            numeric_to_textual_entry(
                42,
                7,
                user.as_mut_ptr().cast(),
                &mut user_size,
                groups.as_mut_ptr().cast(),
                &mut group_size,
                staff,
            )
        };
        assert_eq!(status, 0);
        assert_eq!(user, b"user42\0");
        assert_eq!(groups, b"staff\0users\0");
    }

    #[test]
    fn test_numeric_entry_reports_errno() {
        let mut user_size = 0usize;
        let mut group_size = 0usize;
        let status = unsafe {
            numeric_to_textual_entry(
                0,
                0,
                ptr::null_mut(),
                &mut user_size,
                ptr::null_mut(),
                &mut group_size,
                staff,
            )
        };
        assert_eq!(status, -libc::ENOENT);
    }

    #[test]
    fn test_panics_become_status() {
        let mut user_size = 0usize;
        let mut group_size = 0usize;
        let status = unsafe {
            numeric_to_textual_entry(
                1,
                1,
                ptr::null_mut(),
                &mut user_size,
                ptr::null_mut(),
                &mut group_size,
                |_, _| panic!("boom"),
            )
        };
        assert_eq!(status, -libc::EIO);
    }

    #[test]
    fn test_textual_entry_sizing_writes_nothing() {
        let user = CString::new("alice").unwrap();
        let group = CString::new("staff").unwrap();
        let status = unsafe {
            textual_to_numeric_entry(
                user.as_ptr(),
                group.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
                |_, _| Ok((1000, 100)),
            )
        };
        assert_eq!(status, 0);

        let mut uid = -1;
        let mut gid = -1;
        let status = unsafe {
            textual_to_numeric_entry(user.as_ptr(), group.as_ptr(), &mut uid, &mut gid, |u, g| {
                assert_eq!((u, g), ("alice", "staff"));
                Ok((1000, 100))
            })
        };
        assert_eq!(status, 0);
        assert_eq!((uid, gid), (1000, 100));
    }

    #[test]
    fn test_textual_entry_null_input() {
        let status = unsafe {
            textual_to_numeric_entry(
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
                |_, _| Ok((0, 0)),
            )
        };
        assert_eq!(status, -libc::EINVAL);
    }
}
