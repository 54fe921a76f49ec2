//! idmap Policy SDK
//!
//! Tools for building identity policy plugins: dynamic libraries that the
//! idmap policy registry discovers at startup and consults before the
//! operating system's own passwd/group database.
//!
//! A plugin exports up to two C symbols, one per resolution direction. Both
//! follow the same two-call buffer convention so that all memory stays with
//! the caller; this crate implements the plugin half of that convention.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use idmap_policy_sdk::prelude::*;
//!
//! fn to_textual(uid: u32, _gid: u32) -> PolicyResult<TextualIdentity> {
//!     Ok(TextualIdentity::new(format!("user{uid}"), vec!["staff".into()]))
//! }
//!
//! export_numeric_to_textual!(to_textual);
//! ```

pub mod abi;
pub mod buffer;
pub mod error;
pub mod ffi;
#[macro_use]
pub mod macros;

pub use abi::{
    NumericToTextualFn, TextualToNumericFn, NUMERIC_TO_TEXTUAL_SYMBOL, TEXTUAL_TO_NUMERIC_SYMBOL,
};
pub use buffer::{encode_group_ids, encode_user_id, TextualIdentity};
pub use error::{PolicyError, PolicyResult};

/// Prelude module with common imports
pub mod prelude {
    pub use crate::buffer::TextualIdentity;
    pub use crate::error::{PolicyError, PolicyResult};
    pub use crate::{export_numeric_to_textual, export_textual_to_numeric};
}
