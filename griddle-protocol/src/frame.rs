//! Modbus/TCP application data unit encoding and decoding
//!
//! ADU format:
//! - TRANSACTION ID (2 bytes): echoed by the server, matches replies to requests
//! - PROTOCOL ID (2 bytes): always 0 for Modbus
//! - LENGTH (2 bytes): number of bytes that follow (UNIT + PDU)
//! - UNIT ID (1 byte): addressed unit behind a gateway
//! - PDU (1-253 bytes): function code followed by function data

use heapless::Vec;

/// Modbus protocol identifier
pub const PROTOCOL_ID: u16 = 0;

/// MBAP header size (transaction + protocol + length + unit)
pub const MBAP_HEADER_LEN: usize = 7;

/// Maximum PDU size in bytes
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum complete ADU size
pub const MAX_ADU_SIZE: usize = MBAP_HEADER_LEN + MAX_PDU_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// PDU exceeds maximum allowed size
    PduTooLarge,
    /// PDU is empty (no function code)
    EmptyPdu,
    /// Protocol identifier was not Modbus
    InvalidProtocol,
    /// LENGTH field outside the legal range
    InvalidLength,
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// Invalid PDU structure for its function code
    InvalidFrame,
    /// Function code not supported by this codec
    UnsupportedFunction(u8),
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed application data unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adu {
    /// Transaction identifier
    pub transaction_id: u16,
    /// Unit identifier
    pub unit_id: u8,
    /// Protocol data unit (function code + data)
    pub pdu: Vec<u8, MAX_PDU_SIZE>,
}

impl Adu {
    /// Create a new ADU around the given PDU bytes
    pub fn new(transaction_id: u16, unit_id: u8, pdu: &[u8]) -> Result<Self, FrameError> {
        if pdu.is_empty() {
            return Err(FrameError::EmptyPdu);
        }
        if pdu.len() > MAX_PDU_SIZE {
            return Err(FrameError::PduTooLarge);
        }

        let mut pdu_vec = Vec::new();
        pdu_vec
            .extend_from_slice(pdu)
            .map_err(|_| FrameError::PduTooLarge)?;

        Ok(Self {
            transaction_id,
            unit_id,
            pdu: pdu_vec,
        })
    }

    /// Function code of the contained PDU
    pub fn function(&self) -> u8 {
        self.pdu.first().copied().unwrap_or(0)
    }

    /// Encode this ADU into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = MBAP_HEADER_LEN + self.pdu.len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = (self.pdu.len() + 1) as u16;

        buffer[0..2].copy_from_slice(&self.transaction_id.to_be_bytes());
        buffer[2..4].copy_from_slice(&PROTOCOL_ID.to_be_bytes());
        buffer[4..6].copy_from_slice(&length.to_be_bytes());
        buffer[6] = self.unit_id;
        buffer[MBAP_HEADER_LEN..frame_len].copy_from_slice(&self.pdu);

        Ok(frame_len)
    }

    /// Encode this ADU into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_ADU_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_ADU_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// State machine for parsing incoming ADUs from a byte stream
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    header: [u8; MBAP_HEADER_LEN],
    header_len: usize,
    pdu: Vec<u8, MAX_PDU_SIZE>,
    expected_pdu_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Collecting the fixed MBAP header
    ReadingHeader,
    /// Collecting the PDU announced by LENGTH
    ReadingPdu,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::ReadingHeader,
            header: [0; MBAP_HEADER_LEN],
            header_len: 0,
            pdu: Vec::new(),
            expected_pdu_len: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::ReadingHeader;
        self.header_len = 0;
        self.pdu.clear();
        self.expected_pdu_len = 0;
    }

    /// Number of bytes still required before the current frame completes
    ///
    /// Lets a blocking reader size its next `read_exact` call.
    pub fn bytes_needed(&self) -> usize {
        match self.state {
            ParseState::ReadingHeader => MBAP_HEADER_LEN - self.header_len,
            ParseState::ReadingPdu => self.expected_pdu_len - self.pdu.len(),
        }
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(adu))` when a complete valid ADU is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// Modbus/TCP has no sync byte, so after an error the stream position
    /// is unknown and the caller should drop the connection.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Adu>, FrameError> {
        match self.state {
            ParseState::ReadingHeader => {
                self.header[self.header_len] = byte;
                self.header_len += 1;

                if self.header_len < MBAP_HEADER_LEN {
                    return Ok(None);
                }

                let protocol = u16::from_be_bytes([self.header[2], self.header[3]]);
                if protocol != PROTOCOL_ID {
                    self.reset();
                    return Err(FrameError::InvalidProtocol);
                }

                let length = u16::from_be_bytes([self.header[4], self.header[5]]) as usize;
                // LENGTH covers the unit byte plus at least a function code
                if length < 2 || length > MAX_PDU_SIZE + 1 {
                    self.reset();
                    return Err(FrameError::InvalidLength);
                }

                self.expected_pdu_len = length - 1;
                self.pdu.clear();
                self.state = ParseState::ReadingPdu;
                Ok(None)
            }
            ParseState::ReadingPdu => {
                // Cannot overflow: expected_pdu_len <= MAX_PDU_SIZE
                let _ = self.pdu.push(byte);
                if self.pdu.len() < self.expected_pdu_len {
                    return Ok(None);
                }

                let adu = Adu {
                    transaction_id: u16::from_be_bytes([self.header[0], self.header[1]]),
                    unit_id: self.header[6],
                    pdu: self.pdu.clone(),
                };

                self.reset();
                Ok(Some(adu))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Adu>, FrameError> {
        for &byte in bytes {
            if let Some(adu) = self.feed(byte)? {
                return Ok(Some(adu));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_read_request() {
        // Read 1 register at 128, transaction 7, unit 1
        let adu = Adu::new(7, 1, &[0x03, 0x00, 0x80, 0x00, 0x01]).unwrap();
        let mut buffer = [0u8; 16];
        let len = adu.encode(&mut buffer).unwrap();

        assert_eq!(len, 12);
        assert_eq!(&buffer[0..2], &[0x00, 0x07]); // transaction
        assert_eq!(&buffer[2..4], &[0x00, 0x00]); // protocol
        assert_eq!(&buffer[4..6], &[0x00, 0x06]); // length = unit + 5 PDU bytes
        assert_eq!(buffer[6], 1); // unit
        assert_eq!(buffer[7], 0x03); // function
    }

    #[test]
    fn test_buffer_too_small() {
        let adu = Adu::new(1, 1, &[0x06, 0x00, 0x80, 0x00, 0x01]).unwrap();
        let mut buffer = [0u8; 8];
        assert_eq!(adu.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_parser_reassembles_split_stream() {
        let adu = Adu::new(0x1234, 1, &[0x03, 0x02, 0x00, 0x01]).unwrap();
        let encoded = adu.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        assert_eq!(parser.bytes_needed(), MBAP_HEADER_LEN);
        assert_eq!(parser.feed_bytes(&encoded[..5]), Ok(None));
        assert_eq!(parser.bytes_needed(), 2);
        assert_eq!(parser.feed_bytes(&encoded[5..9]), Ok(None));
        assert_eq!(parser.bytes_needed(), 2);

        let parsed = parser.feed_bytes(&encoded[9..]).unwrap().unwrap();
        assert_eq!(parsed, adu);
        assert_eq!(parsed.function(), 0x03);
        assert_eq!(parser.bytes_needed(), MBAP_HEADER_LEN);
    }

    #[test]
    fn test_parser_rejects_foreign_protocol() {
        let mut parser = FrameParser::new();
        let result = parser.feed_bytes(&[0x00, 0x01, 0x00, 0x05, 0x00, 0x02, 0x01]);
        assert_eq!(result, Err(FrameError::InvalidProtocol));
    }

    #[test]
    fn test_parser_rejects_bad_length() {
        let mut parser = FrameParser::new();
        // LENGTH = 1 leaves no room for a function code
        let result = parser.feed_bytes(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01]);
        assert_eq!(result, Err(FrameError::InvalidLength));
    }

    #[test]
    fn test_empty_and_oversized_pdu() {
        assert_eq!(Adu::new(1, 1, &[]), Err(FrameError::EmptyPdu));
        let large = [0u8; MAX_PDU_SIZE + 1];
        assert_eq!(Adu::new(1, 1, &large), Err(FrameError::PduTooLarge));
    }
}
