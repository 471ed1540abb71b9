//! Configuration loading
//!
//! Loads `cell.toml` from a path given on the command line, or falls back
//! to the copy embedded in the binary.

pub mod loader;

pub use loader::load;
