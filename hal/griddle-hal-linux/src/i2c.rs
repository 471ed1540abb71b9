//! I2C via i2c-tools
//!
//! Transfers are run through `i2ctransfer`, which issues all messages of
//! one call as a single combined transaction (repeated start between
//! messages) and prints the bytes it read as hex.

use std::io;
use std::process::Command;

use griddle_hal::i2c::I2cConfig;
use griddle_hal::I2cBus;
use thiserror::Error;
use tracing::trace;

/// i2c-tools errors
#[derive(Debug, Error)]
pub enum I2cError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected {program} output {output:?}")]
    Parse { program: String, output: String },
}

/// I2C bus driven by the `i2ctransfer` command
#[derive(Debug, Clone)]
pub struct I2cTools {
    config: I2cConfig,
    program: String,
}

impl I2cTools {
    /// Bus `config.bus` using `i2ctransfer` from `PATH`
    pub fn new(config: I2cConfig) -> Self {
        Self::with_program(config, "i2ctransfer")
    }

    /// Bus `config.bus` using a specific transfer program
    pub fn with_program(config: I2cConfig, program: impl Into<String>) -> Self {
        Self {
            config,
            program: program.into(),
        }
    }

    /// Command-line arguments for one combined transaction
    pub fn transfer_args(&self, address: u8, write: &[u8], read_len: usize) -> Vec<String> {
        let mut args = vec!["-y".to_string(), self.config.bus.to_string()];
        if !write.is_empty() {
            args.push(format!("w{}@{:#04x}", write.len(), address));
            args.extend(write.iter().map(|b| format!("{:#04x}", b)));
        }
        if read_len > 0 {
            args.push(format!("r{}@{:#04x}", read_len, address));
        }
        args
    }

    fn transfer(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), I2cError> {
        let args = self.transfer_args(address, write, read.len());
        trace!("{} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| I2cError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(I2cError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_bytes(&stdout, read).ok_or_else(|| I2cError::Parse {
            program: self.program.clone(),
            output: stdout.trim().to_string(),
        })
    }
}

/// Parse `0x12 0xab ...` into `buf`; the count must match exactly
fn parse_bytes(output: &str, buf: &mut [u8]) -> Option<()> {
    let mut tokens = output.split_whitespace();
    for slot in buf.iter_mut() {
        let token = tokens.next()?;
        let hex = token.strip_prefix("0x").unwrap_or(token);
        *slot = u8::from_str_radix(hex, 16).ok()?;
    }
    match tokens.next() {
        Some(_) => None,
        None => Some(()),
    }
}

impl I2cBus for I2cTools {
    type Error = I2cError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        self.transfer(address, data, &mut [])
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        self.transfer(address, &[], buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), I2cError> {
        self.transfer(address, write_data, read_buf)
    }
}
