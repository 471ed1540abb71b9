//! Request and response PDUs for the register functions the robot serves
//!
//! - Host → Robot: read holding registers, write single, write multiple
//! - Robot → Host: matching responses, or an exception response

use crate::frame::{Adu, FrameError, MAX_PDU_SIZE};
use heapless::Vec;

// Function codes
pub const FN_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const FN_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FN_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Bit set on the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Maximum registers in one read request
pub const MAX_READ_REGISTERS: usize = 125;

/// Maximum registers in one write-multiple request
pub const MAX_WRITE_REGISTERS: usize = 123;

/// Exception codes returned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    ServerDeviceFailure,
    Acknowledge,
    ServerDeviceBusy,
    /// Any code this codec does not name
    Other(u8),
}

impl ExceptionCode {
    /// Parse an exception code from its wire byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => ExceptionCode::IllegalFunction,
            0x02 => ExceptionCode::IllegalDataAddress,
            0x03 => ExceptionCode::IllegalDataValue,
            0x04 => ExceptionCode::ServerDeviceFailure,
            0x05 => ExceptionCode::Acknowledge,
            0x06 => ExceptionCode::ServerDeviceBusy,
            other => ExceptionCode::Other(other),
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            ExceptionCode::IllegalFunction => 0x01,
            ExceptionCode::IllegalDataAddress => 0x02,
            ExceptionCode::IllegalDataValue => 0x03,
            ExceptionCode::ServerDeviceFailure => 0x04,
            ExceptionCode::Acknowledge => 0x05,
            ExceptionCode::ServerDeviceBusy => 0x06,
            ExceptionCode::Other(code) => code,
        }
    }
}

/// Requests from the host to the robot controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read `count` consecutive holding registers
    ReadHoldingRegisters { address: u16, count: u16 },
    /// Write one holding register
    WriteSingleRegister { address: u16, value: u16 },
    /// Write consecutive holding registers
    WriteMultipleRegisters {
        address: u16,
        values: Vec<u16, MAX_WRITE_REGISTERS>,
    },
}

impl Request {
    /// Build a read request, validating the register count
    pub fn read(address: u16, count: u16) -> Result<Self, FrameError> {
        if count == 0 || count as usize > MAX_READ_REGISTERS {
            return Err(FrameError::InvalidFrame);
        }
        Ok(Request::ReadHoldingRegisters { address, count })
    }

    /// Build a write-multiple request from a slice of register values
    pub fn write_multiple(address: u16, values: &[u16]) -> Result<Self, FrameError> {
        if values.is_empty() {
            return Err(FrameError::InvalidFrame);
        }
        let mut regs = Vec::new();
        regs.extend_from_slice(values)
            .map_err(|_| FrameError::PduTooLarge)?;
        Ok(Request::WriteMultipleRegisters {
            address,
            values: regs,
        })
    }

    /// Function code for this request
    pub fn function(&self) -> u8 {
        match self {
            Request::ReadHoldingRegisters { .. } => FN_READ_HOLDING_REGISTERS,
            Request::WriteSingleRegister { .. } => FN_WRITE_SINGLE_REGISTER,
            Request::WriteMultipleRegisters { .. } => FN_WRITE_MULTIPLE_REGISTERS,
        }
    }

    /// Encode this request into PDU bytes
    pub fn to_pdu(&self) -> Result<Vec<u8, MAX_PDU_SIZE>, FrameError> {
        let mut pdu = Vec::<u8, MAX_PDU_SIZE>::new();
        pdu.push(self.function())
            .map_err(|_| FrameError::PduTooLarge)?;

        match self {
            Request::ReadHoldingRegisters { address, count } => {
                push_u16(&mut pdu, *address)?;
                push_u16(&mut pdu, *count)?;
            }
            Request::WriteSingleRegister { address, value } => {
                push_u16(&mut pdu, *address)?;
                push_u16(&mut pdu, *value)?;
            }
            Request::WriteMultipleRegisters { address, values } => {
                // Payload: [addr][count][byte count][values...]
                push_u16(&mut pdu, *address)?;
                push_u16(&mut pdu, values.len() as u16)?;
                pdu.push((values.len() * 2) as u8)
                    .map_err(|_| FrameError::PduTooLarge)?;
                for value in values {
                    push_u16(&mut pdu, *value)?;
                }
            }
        }

        Ok(pdu)
    }

    /// Wrap this request in an ADU
    pub fn to_adu(&self, transaction_id: u16, unit_id: u8) -> Result<Adu, FrameError> {
        let pdu = self.to_pdu()?;
        Adu::new(transaction_id, unit_id, &pdu)
    }

    /// Parse a request from PDU bytes (server side, used by simulators)
    pub fn from_pdu(pdu: &[u8]) -> Result<Self, FrameError> {
        let (&function, data) = pdu.split_first().ok_or(FrameError::EmptyPdu)?;
        match function {
            FN_READ_HOLDING_REGISTERS => {
                let address = read_u16(data, 0)?;
                let count = read_u16(data, 2)?;
                Request::read(address, count)
            }
            FN_WRITE_SINGLE_REGISTER => Ok(Request::WriteSingleRegister {
                address: read_u16(data, 0)?,
                value: read_u16(data, 2)?,
            }),
            FN_WRITE_MULTIPLE_REGISTERS => {
                let address = read_u16(data, 0)?;
                let count = read_u16(data, 2)? as usize;
                let byte_count = *data.get(4).ok_or(FrameError::Incomplete)? as usize;
                if byte_count != count * 2 || data.len() != 5 + byte_count {
                    return Err(FrameError::InvalidFrame);
                }
                let mut values = Vec::<u16, MAX_WRITE_REGISTERS>::new();
                for i in 0..count {
                    values
                        .push(read_u16(data, 5 + i * 2)?)
                        .map_err(|_| FrameError::PduTooLarge)?;
                }
                Ok(Request::WriteMultipleRegisters { address, values })
            }
            other => Err(FrameError::UnsupportedFunction(other)),
        }
    }
}

/// Responses from the robot controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Register values, in address order
    ReadHoldingRegisters(Vec<u16, MAX_READ_REGISTERS>),
    /// Echo of a single-register write
    WriteSingleRegister { address: u16, value: u16 },
    /// Echo of a multi-register write
    WriteMultipleRegisters { address: u16, count: u16 },
    /// Server refused the request
    Exception { function: u8, code: ExceptionCode },
}

impl Response {
    /// Parse a response from PDU bytes
    pub fn from_pdu(pdu: &[u8]) -> Result<Self, FrameError> {
        let (&function, data) = pdu.split_first().ok_or(FrameError::EmptyPdu)?;

        if function & EXCEPTION_FLAG != 0 {
            let code = *data.first().ok_or(FrameError::Incomplete)?;
            return Ok(Response::Exception {
                function: function & !EXCEPTION_FLAG,
                code: ExceptionCode::from_byte(code),
            });
        }

        match function {
            FN_READ_HOLDING_REGISTERS => {
                let byte_count = *data.first().ok_or(FrameError::Incomplete)? as usize;
                if byte_count % 2 != 0 || data.len() != 1 + byte_count {
                    return Err(FrameError::InvalidFrame);
                }
                let mut values = Vec::<u16, MAX_READ_REGISTERS>::new();
                for i in 0..byte_count / 2 {
                    values
                        .push(read_u16(data, 1 + i * 2)?)
                        .map_err(|_| FrameError::PduTooLarge)?;
                }
                Ok(Response::ReadHoldingRegisters(values))
            }
            FN_WRITE_SINGLE_REGISTER => Ok(Response::WriteSingleRegister {
                address: read_u16(data, 0)?,
                value: read_u16(data, 2)?,
            }),
            FN_WRITE_MULTIPLE_REGISTERS => Ok(Response::WriteMultipleRegisters {
                address: read_u16(data, 0)?,
                count: read_u16(data, 2)?,
            }),
            other => Err(FrameError::UnsupportedFunction(other)),
        }
    }

    /// Encode this response into PDU bytes (server side, used by simulators)
    pub fn to_pdu(&self) -> Result<Vec<u8, MAX_PDU_SIZE>, FrameError> {
        let mut pdu = Vec::<u8, MAX_PDU_SIZE>::new();
        match self {
            Response::ReadHoldingRegisters(values) => {
                push_u8(&mut pdu, FN_READ_HOLDING_REGISTERS)?;
                push_u8(&mut pdu, (values.len() * 2) as u8)?;
                for value in values {
                    push_u16(&mut pdu, *value)?;
                }
            }
            Response::WriteSingleRegister { address, value } => {
                push_u8(&mut pdu, FN_WRITE_SINGLE_REGISTER)?;
                push_u16(&mut pdu, *address)?;
                push_u16(&mut pdu, *value)?;
            }
            Response::WriteMultipleRegisters { address, count } => {
                push_u8(&mut pdu, FN_WRITE_MULTIPLE_REGISTERS)?;
                push_u16(&mut pdu, *address)?;
                push_u16(&mut pdu, *count)?;
            }
            Response::Exception { function, code } => {
                push_u8(&mut pdu, function | EXCEPTION_FLAG)?;
                push_u8(&mut pdu, code.to_byte())?;
            }
        }
        Ok(pdu)
    }
}

fn push_u8(pdu: &mut Vec<u8, MAX_PDU_SIZE>, value: u8) -> Result<(), FrameError> {
    pdu.push(value).map_err(|_| FrameError::PduTooLarge)
}

fn push_u16(pdu: &mut Vec<u8, MAX_PDU_SIZE>, value: u16) -> Result<(), FrameError> {
    pdu.extend_from_slice(&value.to_be_bytes())
        .map_err(|_| FrameError::PduTooLarge)
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, FrameError> {
    match data.get(offset..offset + 2) {
        Some(bytes) => Ok(u16::from_be_bytes([bytes[0], bytes[1]])),
        None => Err(FrameError::Incomplete),
    }
}
