//! Modbus/TCP register bus
//!
//! One blocking TCP session to the robot controller's Modbus server. Each
//! call sends one request and reads until the matching response; the
//! socket read timeout bounds how long a single read can block. Any I/O
//! failure closes the session, and the next keep-alive reopens it.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use griddle_core::config::RobotConfig;
use griddle_core::traits::{BusError, RegisterBus};
use griddle_protocol::{Adu, FrameError, FrameParser, Request, Response, MAX_ADU_SIZE};
use tracing::{debug, info, trace, warn};

/// Where and how to reach the Modbus server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusSettings {
    pub host: String,
    pub port: u16,
    pub unit_id: u8,
    pub response_timeout: Duration,
}

impl From<&RobotConfig> for ModbusSettings {
    fn from(config: &RobotConfig) -> Self {
        Self {
            host: config.address.clone(),
            port: config.port,
            unit_id: config.unit_id,
            response_timeout: config.response_timeout,
        }
    }
}

/// Modbus/TCP client session
#[derive(Debug)]
pub struct ModbusTcp {
    settings: ModbusSettings,
    stream: Option<TcpStream>,
    parser: FrameParser,
    transaction_id: u16,
}

impl ModbusTcp {
    /// Create a client; no connection is made until [`RegisterBus::connect`]
    pub fn new(settings: ModbusSettings) -> Self {
        Self {
            settings,
            stream: None,
            parser: FrameParser::new(),
            transaction_id: 0,
        }
    }

    /// Check if a session is open
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Send one request and wait for its response
    ///
    /// A failed write or read leaves the stream at an unknown position,
    /// so the session is closed and the failure reported as
    /// [`BusError::Dropped`].
    fn transact(&mut self, request: &Request) -> Result<Response, BusError> {
        let stream = self.stream.as_mut().ok_or(BusError::NotConnected)?;

        self.transaction_id = self.transaction_id.wrapping_add(1);
        let transaction_id = self.transaction_id;
        let frame = request
            .to_adu(transaction_id, self.settings.unit_id)
            .and_then(|adu| adu.encode_to_vec())
            .map_err(frame_error)?;

        trace!("-> {:?} (tid {})", request, transaction_id);
        let exchange = stream
            .write_all(&frame)
            .map_err(BusError::from)
            .and_then(|()| read_reply(stream, &mut self.parser, transaction_id));
        let reply = match exchange {
            Ok(reply) => reply,
            Err(e) => return Err(self.abandon(e)),
        };

        let response = Response::from_pdu(&reply.pdu).map_err(frame_error)?;
        trace!("<- {:?}", response);
        match response {
            Response::Exception { function, code } => Err(BusError::Exception {
                function,
                code: code.to_byte(),
            }),
            response => Ok(response),
        }
    }

    fn abandon(&mut self, err: BusError) -> BusError {
        warn!("Modbus session lost: {}", err);
        self.close();
        BusError::Dropped
    }
}

/// Read frames until the one answering `transaction_id`
///
/// Late replies to earlier requests are skipped.
fn read_reply(
    stream: &mut TcpStream,
    parser: &mut FrameParser,
    transaction_id: u16,
) -> Result<Adu, BusError> {
    parser.reset();
    let mut buf = [0u8; MAX_ADU_SIZE];
    loop {
        let needed = parser.bytes_needed();
        stream.read_exact(&mut buf[..needed])?;
        let Some(adu) = parser.feed_bytes(&buf[..needed]).map_err(frame_error)? else {
            continue;
        };
        if adu.transaction_id == transaction_id {
            return Ok(adu);
        }
        debug!(
            "Discarding response for transaction {} while waiting for {}",
            adu.transaction_id, transaction_id
        );
    }
}

impl RegisterBus for ModbusTcp {
    fn connect(&mut self) -> Result<(), BusError> {
        if self.is_connected() {
            self.close();
        }
        let stream = TcpStream::connect((self.settings.host.as_str(), self.settings.port))?;
        stream.set_read_timeout(Some(self.settings.response_timeout))?;
        stream.set_write_timeout(Some(self.settings.response_timeout))?;
        stream.set_nodelay(true)?;

        info!(
            "Connected to Modbus server {}:{}",
            self.settings.host, self.settings.port
        );
        self.parser.reset();
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("Closing Modbus session");
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, BusError> {
        let request = Request::read(address, count).map_err(frame_error)?;
        match self.transact(&request)? {
            Response::ReadHoldingRegisters(values) => Ok(values.to_vec()),
            other => Err(unexpected(&other)),
        }
    }

    fn write_register(&mut self, address: u16, value: u16) -> Result<usize, BusError> {
        let request = Request::WriteSingleRegister { address, value };
        match self.transact(&request)? {
            Response::WriteSingleRegister { .. } => Ok(1),
            other => Err(unexpected(&other)),
        }
    }

    fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<usize, BusError> {
        let request = Request::write_multiple(address, values).map_err(frame_error)?;
        match self.transact(&request)? {
            Response::WriteMultipleRegisters { count, .. } => Ok(count as usize),
            other => Err(unexpected(&other)),
        }
    }
}

fn frame_error(err: FrameError) -> BusError {
    BusError::Protocol(format!("{:?}", err))
}

fn unexpected(response: &Response) -> BusError {
    BusError::Protocol(format!("unexpected response {:?}", response))
}
