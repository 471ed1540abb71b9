//! sysfs GPIO
//!
//! Each line is exported by writing its number to `<root>/export`, after
//! which `<root>/gpioN/direction` and `<root>/gpioN/value` control it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use griddle_hal::{InputPin, OutputPin, PinLevel};
use thiserror::Error;
use tracing::{debug, trace};

/// Time udev may need to fix permissions on a freshly exported line
const EXPORT_SETTLE: Duration = Duration::from_millis(50);

/// sysfs GPIO errors
#[derive(Debug, Error)]
pub enum GpioError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: unexpected value {value:?}")]
    InvalidValue { path: PathBuf, value: String },
}

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// One exported GPIO line
#[derive(Debug)]
pub struct SysfsPin {
    number: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export a line (if needed) and set its direction
    pub fn open(root: &Path, number: u32, direction: Direction) -> Result<Self, GpioError> {
        let line = root.join(format!("gpio{}", number));
        if !line.exists() {
            debug!("Exporting GPIO {}", number);
            write(&root.join("export"), &number.to_string())?;
            thread::sleep(EXPORT_SETTLE);
        }
        write(&line.join("direction"), direction.as_str())?;

        Ok(Self {
            number,
            value_path: line.join("value"),
        })
    }

    /// Open a line as an output
    pub fn output(root: &Path, number: u32) -> Result<Self, GpioError> {
        Self::open(root, number, Direction::Out)
    }

    /// Open a line as an input
    pub fn input(root: &Path, number: u32) -> Result<Self, GpioError> {
        Self::open(root, number, Direction::In)
    }

    /// Kernel GPIO number
    pub fn number(&self) -> u32 {
        self.number
    }

    fn read_level(&self) -> Result<PinLevel, GpioError> {
        let raw = fs::read_to_string(&self.value_path).map_err(|source| GpioError::Io {
            path: self.value_path.clone(),
            source,
        })?;
        match raw.trim() {
            "0" => Ok(PinLevel::Low),
            "1" => Ok(PinLevel::High),
            other => Err(GpioError::InvalidValue {
                path: self.value_path.clone(),
                value: other.to_string(),
            }),
        }
    }

    fn write_level(&mut self, level: PinLevel) -> Result<(), GpioError> {
        trace!("GPIO {} <- {:?}", self.number, level);
        write(&self.value_path, if level.is_high() { "1" } else { "0" })
    }
}

impl OutputPin for SysfsPin {
    type Error = GpioError;

    fn set_high(&mut self) -> Result<(), GpioError> {
        self.write_level(PinLevel::High)
    }

    fn set_low(&mut self) -> Result<(), GpioError> {
        self.write_level(PinLevel::Low)
    }

    fn output_level(&mut self) -> Result<PinLevel, GpioError> {
        self.read_level()
    }
}

impl InputPin for SysfsPin {
    type Error = GpioError;

    fn level(&mut self) -> Result<PinLevel, GpioError> {
        self.read_level()
    }
}

fn write(path: &Path, contents: &str) -> Result<(), GpioError> {
    fs::write(path, contents).map_err(|source| GpioError::Io {
        path: path.to_path_buf(),
        source,
    })
}
