//! Hook symbol names and signatures.
//!
//! Ids cross the boundary as C `int`. Status returns are non-negative on
//! success and a negated errno on failure.

use std::ffi::{c_char, c_int};

/// Symbol name of the numeric to textual hook.
pub const NUMERIC_TO_TEXTUAL_SYMBOL: &str = "resolve_numeric_to_textual";

/// Symbol name of the textual to numeric hook.
pub const TEXTUAL_TO_NUMERIC_SYMBOL: &str = "resolve_textual_to_numeric";

/// `int resolve_numeric_to_textual(int uid, int gid, char* out_user_id,
/// size_t* out_user_id_size, char* out_group_ids, size_t* out_group_ids_size)`
///
/// Called twice. With both output buffers null the hook only stores the
/// required sizes. With buffers present the sizes hold the allocated lengths
/// and the hook fills the buffers. The user id is one NUL-terminated string;
/// group ids are NUL-terminated strings packed back to back, primary first.
pub type NumericToTextualFn = unsafe extern "C" fn(
    uid: c_int,
    gid: c_int,
    out_user_id: *mut c_char,
    out_user_id_size: *mut usize,
    out_group_ids: *mut c_char,
    out_group_ids_size: *mut usize,
) -> c_int;

/// `int resolve_textual_to_numeric(const char* user_id, const char* group_ids,
/// int* out_uid, int* out_gid)`
///
/// Called twice. With null output pointers the hook validates the input and
/// reports whether it can resolve it; with output pointers it writes both ids.
pub type TextualToNumericFn = unsafe extern "C" fn(
    user_id: *const c_char,
    group_ids: *const c_char,
    out_uid: *mut c_int,
    out_gid: *mut c_int,
) -> c_int;

/// Convert an id to its ABI representation, preserving the bit pattern.
pub fn id_to_abi(id: u32) -> c_int {
    id as c_int
}

/// Convert an id from its ABI representation, preserving the bit pattern.
pub fn id_from_abi(id: c_int) -> u32 {
    id as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversion_preserves_bits() {
        assert_eq!(id_from_abi(id_to_abi(0)), 0);
        assert_eq!(id_from_abi(id_to_abi(65534)), 65534);
        assert_eq!(id_to_abi(u32::MAX), -1);
        assert_eq!(id_from_abi(-1), u32::MAX);
    }
}
