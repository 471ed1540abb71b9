//! Configuration types
//!
//! Cell configuration structures, deserialized from `cell.toml` by the
//! controller. Every field has a default so a partial file is valid.

pub mod hardware;
pub mod types;

pub use hardware::*;
pub use types::*;
