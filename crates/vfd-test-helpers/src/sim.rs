//! Simulated SKI780 drive.
//!
//! Answers the requests the protocol crate builds the way the drive does:
//! reads return `[addr, 0x03, 0x00, 0x02, hi, lo]`, writes are echoed, and
//! unknown registers get a Modbus exception reply.

use crate::transport::{LinkError, ModbusTransport};
use spindle_vfd_protocol::ModbusFrame;
use spindle_vfd_protocol::models::ski780::{command, registers, run_state};
use tracing::trace;

const READ: u8 = 0x03;
const WRITE: u8 = 0x06;
const EXCEPTION_FLAG: u8 = 0x80;
const ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// One-shot damage applied to the next reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Reply with a different function code.
    WrongFunction,
    /// Declare four data bytes instead of two.
    WrongByteCount,
    /// Drop the last two bytes.
    Truncate,
    /// Send nothing back.
    NoReply,
}

#[derive(Debug, Clone)]
pub struct SimulatedSki780 {
    pub address: u8,
    /// P0.14, x0.01 Hz.
    pub min_frequency: u16,
    /// P0.10, x0.01 Hz.
    pub max_frequency: u16,
    /// Output frequency, x0.01 Hz.
    pub output_frequency: u16,
    pub run_state: u16,
    pub fault: u16,
    /// Last written set-point, x0.01 %.
    pub setpoint: u16,
    corruption: Vec<Corruption>,
    requests: Vec<Vec<u8>>,
}

impl Default for SimulatedSki780 {
    fn default() -> Self {
        Self::new(0, 40000)
    }
}

impl SimulatedSki780 {
    pub fn new(min_frequency: u16, max_frequency: u16) -> Self {
        Self {
            address: 0x01,
            min_frequency,
            max_frequency,
            output_frequency: 0,
            run_state: run_state::STOPPED,
            fault: 0,
            setpoint: 0,
            corruption: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn with_fault(mut self, fault: u16) -> Self {
        self.fault = fault;
        self
    }

    /// Damage upcoming replies, in order.
    pub fn corrupt_next(&mut self, corruption: Corruption) {
        self.corruption.push(corruption);
    }

    /// Every request received, address byte included.
    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }

    /// Registers read so far, in order.
    pub fn registers_read(&self) -> Vec<u16> {
        self.requests
            .iter()
            .filter(|req| req.get(1) == Some(&READ))
            .filter_map(|req| match req.get(2..4) {
                Some(&[hi, lo]) => Some(u16::from_be_bytes([hi, lo])),
                _ => None,
            })
            .collect()
    }

    /// Build the reply to a raw request. `None` means no reply.
    pub fn respond(&mut self, request: &[u8]) -> Option<Vec<u8>> {
        self.requests.push(request.to_vec());

        let (function, register, word) = match request {
            [_, function, reg_hi, reg_lo, hi, lo, ..] => (
                *function,
                u16::from_be_bytes([*reg_hi, *reg_lo]),
                u16::from_be_bytes([*hi, *lo]),
            ),
            _ => return None,
        };

        let reply = match function {
            READ => self.read(register),
            WRITE => self.write(register, word),
            other => Err(other),
        };
        let mut reply = match reply {
            Ok(reply) => reply,
            Err(function) => vec![self.address, function | EXCEPTION_FLAG, ILLEGAL_DATA_ADDRESS],
        };

        if !self.corruption.is_empty() {
            match self.corruption.remove(0) {
                Corruption::WrongFunction => {
                    if let Some(byte) = reply.get_mut(1) {
                        *byte ^= 0x05;
                    }
                }
                Corruption::WrongByteCount => {
                    if let Some(byte) = reply.get_mut(3) {
                        *byte = 0x04;
                    }
                }
                Corruption::Truncate => reply.truncate(reply.len().saturating_sub(2)),
                Corruption::NoReply => return None,
            }
        }

        trace!(?request, ?reply, "simulated SKI780");
        Some(reply)
    }

    fn read(&self, register: u16) -> Result<Vec<u8>, u8> {
        let value = match register {
            registers::MIN_FREQUENCY => self.min_frequency,
            registers::MAX_FREQUENCY => self.max_frequency,
            registers::OUTPUT_FREQUENCY => self.output_frequency,
            registers::RUN_STATE => self.run_state,
            registers::FAULT => self.fault,
            _ => return Err(READ),
        };
        let [hi, lo] = value.to_be_bytes();
        Ok(vec![self.address, READ, 0x00, 0x02, hi, lo])
    }

    fn write(&mut self, register: u16, value: u16) -> Result<Vec<u8>, u8> {
        match register {
            registers::COMMAND => {
                self.run_state = match value {
                    command::FORWARD => run_state::FORWARD,
                    command::REVERSE => run_state::REVERSE,
                    command::STOP => run_state::STOPPED,
                    _ => return Err(WRITE),
                };
            }
            registers::SPEED_SETPOINT => self.setpoint = value,
            _ => return Err(WRITE),
        }
        self.output_frequency = if self.run_state == run_state::STOPPED {
            0
        } else {
            let frequency = u32::from(self.setpoint) * u32::from(self.max_frequency) / 10_000;
            u16::try_from(frequency).unwrap_or(self.max_frequency)
        };

        let [reg_hi, reg_lo] = register.to_be_bytes();
        let [hi, lo] = value.to_be_bytes();
        Ok(vec![self.address, WRITE, reg_hi, reg_lo, hi, lo])
    }
}

impl ModbusTransport for SimulatedSki780 {
    fn transact(&mut self, frame: &ModbusFrame) -> Result<Vec<u8>, LinkError> {
        let mut frame = *frame;
        frame.set_address(self.address);
        self.respond(frame.payload()).ok_or(LinkError::Timeout {
            register: frame.register(),
        })
    }
}
