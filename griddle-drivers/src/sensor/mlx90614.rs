//! MLX90614 infrared thermometer
//!
//! SMBus device; object temperature is a little-endian word in RAM
//! register 0x07, in units of 0.02 K. Bit 15 set flags an invalid reading.

use griddle_hal::I2cBus;

/// Default 7-bit SMBus address
pub const DEFAULT_ADDRESS: u8 = 0x5A;

/// RAM register holding object 1 temperature
pub const REG_TOBJ1: u8 = 0x07;

/// Error flag in the raw reading
pub const ERROR_FLAG: u16 = 0x8000;

/// Sensor read failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError<E> {
    /// Bus transfer failed
    Bus(E),
    /// Sensor flagged the reading as invalid
    Flagged(u16),
}

/// Convert a raw object reading to °C
///
/// Returns `None` when the error flag is set.
pub fn raw_to_celsius(raw: u16) -> Option<f64> {
    if raw & ERROR_FLAG != 0 {
        None
    } else {
        Some(f64::from(raw) / 50.0 - 273.15)
    }
}

/// MLX90614 on an I2C bus
pub struct Mlx90614<B> {
    bus: B,
    address: u8,
}

impl<B: I2cBus> Mlx90614<B> {
    /// Create a new sensor at `address`
    pub fn new(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    /// Sensor address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read the raw object temperature word
    pub fn read_raw(&mut self) -> Result<u16, SensorError<B::Error>> {
        self.bus
            .read_word_data(self.address, REG_TOBJ1)
            .map_err(SensorError::Bus)
    }

    /// Read the object temperature in °C
    pub fn read_celsius(&mut self) -> Result<f64, SensorError<B::Error>> {
        let raw = self.read_raw()?;
        raw_to_celsius(raw).ok_or(SensorError::Flagged(raw))
    }

    /// Discard one reading; the first transfer after power-up is unreliable
    pub fn wake(&mut self) {
        let _ = self.read_raw();
    }
}
