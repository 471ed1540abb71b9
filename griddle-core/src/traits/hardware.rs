//! Mezzanine hardware trait
//!
//! The cell's non-robot hardware: hotplate relay, conveyor, the two panel
//! buttons and the IR thermometer the robot positions over an item.

use std::fmt;

use thiserror::Error;

/// Conveyor drive state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConveyorDirection {
    #[default]
    Stopped,
    Forward,
    Reverse,
}

/// Panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    Stop,
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Start => f.write_str("START"),
            Button::Stop => f.write_str("STOP"),
        }
    }
}

/// Errors from the mezzanine hardware
#[derive(Debug, Error)]
pub enum HardwareError {
    /// A GPIO line could not be read or driven
    #[error("{device}: GPIO access failed: {reason}")]
    Gpio { device: &'static str, reason: String },

    /// The thermometer could not be reached
    #[error("temperature sensor bus error: {0}")]
    SensorBus(String),

    /// The thermometer flagged its reading as invalid
    #[error("temperature sensor reported an error flag (raw {raw:#06x})")]
    SensorFault { raw: u16 },

    /// A button read as pressed when it must be released
    #[error("{0} button reads pressed")]
    ButtonPressed(Button),
}

/// Synchronous access to the mezzanine hardware
///
/// Every call may fail. Step actions decide whether a failure is fatal for
/// the action; the scheduler never sees these errors.
pub trait HardwareIo {
    /// Read the IR thermometer's object temperature in °C
    fn read_temperature(&mut self) -> Result<f64, HardwareError>;

    /// Drive the conveyor
    fn set_conveyor(&mut self, direction: ConveyorDirection) -> Result<(), HardwareError>;

    /// Switch the hotplate relay
    fn set_hotplate(&mut self, on: bool) -> Result<(), HardwareError>;

    /// Check whether a button is pressed
    fn read_button(&mut self, button: Button) -> Result<bool, HardwareError>;
}
