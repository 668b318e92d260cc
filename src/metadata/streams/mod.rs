//! Borrowed views over the metadata heaps.
//!
//! Each heap starts with a single zero byte, so offset 0 always names the empty entry.
//! The views only validate that leading byte up front; every lookup is bounds-checked
//! individually.
//!
//! - [`Strings`] - `#Strings`, null-terminated UTF-8 identifiers
//! - [`UserStrings`] - `#US`, length-prefixed UTF-16 literals used by `ldstr`
//! - [`Blob`] - `#Blob`, length-prefixed binary signatures

mod blob;
mod strings;
mod userstrings;

pub use blob::Blob;
pub use strings::Strings;
pub use userstrings::UserStrings;
