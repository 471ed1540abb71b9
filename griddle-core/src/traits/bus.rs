//! Register bus trait
//!
//! The robot controller exposes its shared state as 16-bit holding
//! registers. A [`RegisterBus`] is one persistent session to that register
//! bank; it knows nothing about the claim protocol layered on top.

use std::io;

use thiserror::Error;

/// Errors from a register bus session
#[derive(Debug, Error)]
pub enum BusError {
    /// The peer reset or closed the connection
    #[error("connection dropped by peer")]
    Dropped,

    /// No session is open
    #[error("not connected")]
    NotConnected,

    /// No response within the response timeout
    #[error("response timed out")]
    Timeout,

    /// The server answered with an exception response
    #[error("server exception {code:#04x} for function {function:#04x}")]
    Exception { function: u8, code: u8 },

    /// The response could not be decoded or did not match the request
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Any other socket error
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl BusError {
    /// Check if this error means the session is gone and must be reopened
    ///
    /// Only this class of failure is healed by reconnecting; everything else
    /// is reported to the caller.
    pub fn is_dropped(&self) -> bool {
        matches!(self, BusError::Dropped)
    }
}

impl From<io::Error> for BusError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => BusError::Dropped,
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => BusError::Timeout,
            io::ErrorKind::NotConnected => BusError::NotConnected,
            _ => BusError::Io(err),
        }
    }
}

/// One session to a bank of 16-bit holding registers
///
/// Reads return whatever the server sent; callers check the count. Writes
/// return the number of registers the server acknowledged.
pub trait RegisterBus {
    /// Open the session
    fn connect(&mut self) -> Result<(), BusError>;

    /// Close the session; closing a closed session is a no-op
    fn close(&mut self);

    /// Close and reopen the session
    fn reconnect(&mut self) -> Result<(), BusError> {
        self.close();
        self.connect()
    }

    /// Read `count` consecutive registers starting at `address`
    fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, BusError>;

    /// Write one register
    fn write_register(&mut self, address: u16, value: u16) -> Result<usize, BusError>;

    /// Write consecutive registers starting at `address`
    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<usize, BusError>;
}
