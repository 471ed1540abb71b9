//! Build script for griddle-controller
//!
//! Checks that the embedded cell.toml is well-formed TOML so a broken
//! default fails the build instead of the first run.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=cell.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("cell.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => panic!("cell.toml could not be read: {}", e),
    };

    if let Err(e) = content.parse::<toml::Table>() {
        panic!("cell.toml is not valid TOML:\n{}", e);
    }
}
