//! I2C bus abstractions
//!
//! Provides traits for I2C master operations that can be implemented
//! by platform HALs.

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// SMBus "read word data": command byte out, little-endian word back
    fn read_word_data(&mut self, address: u8, command: u8) -> Result<u16, Self::Error> {
        let mut buf = [0u8; 2];
        self.write_read(address, &[command], &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
}

/// I2C bus location on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cConfig {
    /// Bus number (`/dev/i2c-N`)
    pub bus: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self { bus: 2 }
    }
}
