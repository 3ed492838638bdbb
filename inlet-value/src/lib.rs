#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod value;
pub use value::*;

mod object;
pub use object::*;

mod file;
pub use file::*;

#[cfg(feature = "json")]
mod json;
