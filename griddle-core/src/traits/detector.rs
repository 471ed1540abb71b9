//! Vision detector trait

use std::fmt;

/// Item position on the hotplate in millimetres
///
/// The origin is the reference point the robot program and the detector
/// agree on (the centre of the camera frame at the photo pose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    /// Create a coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, used to match re-detections to known items
    pub fn manhattan_distance(&self, other: &Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Finds items in the current camera frame
///
/// The robot must already be at the photo pose. Duplicate or overlapping
/// detections are passed through as-is; camera failures are the
/// implementation's concern and show up as an empty list.
pub trait Detector {
    /// Capture a frame and return the position of every item found
    fn detect(&mut self) -> Vec<Coordinate>;
}
