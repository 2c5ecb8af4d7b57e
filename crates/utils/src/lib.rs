//! Common utility for extended `std` types
//!
//! These are left public for convenience.
//!
//! For example, writing model values in a fixed scientific format or finding
//! the nearest timestep to a requested time are useful everywhere.
#![doc = include_str!("../readme.md")]

// Alias for the format! macro
pub use std::format as f;

// Modules
mod error;
pub mod sequence;
mod slice_ext;
mod string_ext;
mod value_ext;

// Flatten
pub use error::{Error, Result};
pub use slice_ext::SliceExt;
pub use string_ext::StringExt;
pub use value_ext::ValueExt;
