//! Linux HAL for the cell computer
//!
//! This crate provides Linux implementations of the shared `griddle-hal`
//! traits:
//!
//! - GPIO through the sysfs class interface (`/sys/class/gpio`)
//! - I2C through `i2ctransfer` from i2c-tools

#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

pub use gpio::{Direction, GpioError, SysfsPin};
pub use i2c::{I2cError, I2cTools};
