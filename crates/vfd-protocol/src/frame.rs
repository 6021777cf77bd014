//! Modbus-RTU request frame model.
//!
//! Every request built by this crate has the same shape:
//! - Byte 0: Slave address (reserved, filled by the transport)
//! - Byte 1: Function code (0x03 read, 0x06 write)
//! - Bytes 2-3: Register address (big-endian)
//! - Bytes 4-5: Register value for writes, register count for reads (big-endian)
//!
//! The CRC is appended by the transport after `tx_length` bytes.
//!
//! Responses to a single-register read are laid out as
//! `[addr, 0x03, count_hi, count_lo, value_hi, value_lo]`, the declared
//! byte count being read as a 16-bit field the way the drives answer.

use crate::error::{VfdError, VfdResult};

/// Buffer capacity, large enough for the request plus the transport's CRC.
pub const FRAME_CAPACITY: usize = 16;

/// Length of every request and response handled by this crate (CRC excluded).
pub const STANDARD_FRAME_LEN: usize = 6;

/// Byte width of the single register value carried in read responses.
pub const REGISTER_BYTES: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    ReadHoldingRegisters,
    WriteSingleRegister,
}

impl FunctionCode {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0x03 => Some(Self::ReadHoldingRegisters),
            0x06 => Some(Self::WriteSingleRegister),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => 0x03,
            Self::WriteSingleRegister => 0x06,
        }
    }
}

/// A single Modbus request with the lengths the transport needs to send it
/// and to collect the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModbusFrame {
    msg: [u8; FRAME_CAPACITY],
    tx_length: usize,
    rx_length: usize,
}

impl Default for ModbusFrame {
    fn default() -> Self {
        Self::empty()
    }
}

impl ModbusFrame {
    pub const fn empty() -> Self {
        Self {
            msg: [0u8; FRAME_CAPACITY],
            tx_length: 0,
            rx_length: 0,
        }
    }

    pub fn read_registers(register: u16, count: u16) -> Self {
        let mut frame = Self::empty();
        frame.set_read_registers(register, count);
        frame
    }

    pub fn write_register(register: u16, value: u16) -> Self {
        let mut frame = Self::empty();
        frame.set_write_register(register, value);
        frame
    }

    /// Populate as a holding-register read. Payload and both lengths are set
    /// together; the address byte is left untouched.
    pub fn set_read_registers(&mut self, register: u16, count: u16) {
        self.set_payload(FunctionCode::ReadHoldingRegisters, register, count);
    }

    /// Populate as a single-register write. The drive echoes the request, so
    /// the expected reply has the same length.
    pub fn set_write_register(&mut self, register: u16, value: u16) {
        self.set_payload(FunctionCode::WriteSingleRegister, register, value);
    }

    fn set_payload(&mut self, function: FunctionCode, register: u16, word: u16) {
        let [reg_hi, reg_lo] = register.to_be_bytes();
        let [word_hi, word_lo] = word.to_be_bytes();
        self.msg[1] = function.to_u8();
        self.msg[2] = reg_hi;
        self.msg[3] = reg_lo;
        self.msg[4] = word_hi;
        self.msg[5] = word_lo;
        self.tx_length = STANDARD_FRAME_LEN;
        self.rx_length = STANDARD_FRAME_LEN;
    }

    /// Fill in the slave address. Only the transport should call this.
    pub fn set_address(&mut self, address: u8) {
        self.msg[0] = address;
    }

    pub fn address(&self) -> u8 {
        self.msg[0]
    }

    pub fn function_code(&self) -> Option<FunctionCode> {
        FunctionCode::from_u8(self.msg[1])
    }

    pub fn register(&self) -> u16 {
        u16::from_be_bytes([self.msg[2], self.msg[3]])
    }

    /// Written value, or register count for reads.
    pub fn value(&self) -> u16 {
        u16::from_be_bytes([self.msg[4], self.msg[5]])
    }

    pub fn tx_length(&self) -> usize {
        self.tx_length
    }

    pub fn rx_length(&self) -> usize {
        self.rx_length
    }

    pub fn is_populated(&self) -> bool {
        self.tx_length != 0 && self.rx_length != 0
    }

    /// Bytes to transmit, address byte included.
    pub fn payload(&self) -> &[u8] {
        self.msg.get(..self.tx_length).unwrap_or(&[])
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_CAPACITY] {
        &self.msg
    }
}

/// Read a big-endian word at `offset` from a raw response.
pub fn response_word(response: &[u8], offset: usize) -> VfdResult<u16> {
    let end = offset.saturating_add(2);
    match response.get(offset..end) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(VfdError::Truncated {
            expected: end,
            actual: response.len(),
        }),
    }
}

/// Check a single-register read response: length first, then function code,
/// then the declared byte count. Returns the register value.
pub fn validate_read_response(response: &[u8], expected: FunctionCode) -> VfdResult<u16> {
    if response.len() < STANDARD_FRAME_LEN {
        return Err(VfdError::Truncated {
            expected: STANDARD_FRAME_LEN,
            actual: response.len(),
        });
    }

    let function = response.get(1).copied().unwrap_or_default();
    if function != expected.to_u8() {
        return Err(VfdError::FunctionCodeMismatch {
            expected: expected.to_u8(),
            actual: function,
        });
    }

    let byte_count = response_word(response, 2)?;
    if byte_count != REGISTER_BYTES {
        return Err(VfdError::ByteCountMismatch {
            expected: REGISTER_BYTES,
            actual: byte_count,
        });
    }

    response_word(response, 4)
}
