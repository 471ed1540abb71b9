//! Vision detector backed by an external program
//!
//! The camera pipeline runs as a separate program. It grabs a frame from
//! the camera (the robot is already at the photo pose), finds the patties
//! and prints one line per patty with its position in millimetres
//! relative to the frame centre, either `x y` or `x,y`.

use std::process::Command;

use griddle_core::config::DetectorConfig;
use griddle_core::traits::{Coordinate, Detector};
use tracing::{debug, info, warn};

/// Runs the configured detection program for every frame
#[derive(Debug, Clone)]
pub struct CommandDetector {
    command: String,
    args: Vec<String>,
}

impl CommandDetector {
    /// Create a detector from configuration
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

impl Detector for CommandDetector {
    fn detect(&mut self) -> Vec<Coordinate> {
        debug!("Running detector: {} {:?}", self.command, self.args);
        let output = match Command::new(&self.command).args(&self.args).output() {
            Ok(output) => output,
            Err(e) => {
                warn!("Detector {} could not be started: {}", self.command, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            warn!(
                "Detector {} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Vec::new();
        }

        let found = parse_detections(&String::from_utf8_lossy(&output.stdout));
        info!("Detector found {} patties", found.len());
        found
    }
}

/// Parse detector output
///
/// Blank lines and lines starting with `#` are ignored; malformed lines
/// are logged and skipped.
pub fn parse_detections(text: &str) -> Vec<Coordinate> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let parsed = parse_line(line);
            if parsed.is_none() {
                warn!("Ignoring malformed detector line {:?}", line);
            }
            parsed
        })
        .collect()
}

fn parse_line(line: &str) -> Option<Coordinate> {
    let mut fields = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty());
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Coordinate::new(x, y))
}
