//! Declarative macros for exporting policy hooks.

/// Export a `resolve_numeric_to_textual` hook.
///
/// The argument is a function `fn(u32, u32) -> PolicyResult<TextualIdentity>`.
///
/// # Example
///
/// ```rust,ignore
/// use idmap_policy_sdk::prelude::*;
///
/// fn everyone_is_guest(_uid: u32, _gid: u32) -> PolicyResult<TextualIdentity> {
///     Ok(TextualIdentity::new("guest", vec!["guests".into()]))
/// }
///
/// export_numeric_to_textual!(everyone_is_guest);
/// ```
#[macro_export]
macro_rules! export_numeric_to_textual {
    ($resolve:path) => {
        #[no_mangle]
        pub unsafe extern "C" fn resolve_numeric_to_textual(
            uid: ::std::ffi::c_int,
            gid: ::std::ffi::c_int,
            out_user_id: *mut ::std::ffi::c_char,
            out_user_id_size: *mut usize,
            out_group_ids: *mut ::std::ffi::c_char,
            out_group_ids_size: *mut usize,
        ) -> ::std::ffi::c_int {
            $crate::ffi::numeric_to_textual_entry(
                uid,
                gid,
                out_user_id,
                out_user_id_size,
                out_group_ids,
                out_group_ids_size,
                $resolve,
            )
        }

        const _: $crate::abi::NumericToTextualFn = resolve_numeric_to_textual;
    };
}

/// Export a `resolve_textual_to_numeric` hook.
///
/// The argument is a function `fn(&str, &str) -> PolicyResult<(u32, u32)>`
/// receiving the user id and the group id.
#[macro_export]
macro_rules! export_textual_to_numeric {
    ($resolve:path) => {
        #[no_mangle]
        pub unsafe extern "C" fn resolve_textual_to_numeric(
            user_id: *const ::std::ffi::c_char,
            group_ids: *const ::std::ffi::c_char,
            out_uid: *mut ::std::ffi::c_int,
            out_gid: *mut ::std::ffi::c_int,
        ) -> ::std::ffi::c_int {
            $crate::ffi::textual_to_numeric_entry(user_id, group_ids, out_uid, out_gid, $resolve)
        }

        const _: $crate::abi::TextualToNumericFn = resolve_textual_to_numeric;
    };
}
