//! Request/response transport and a reference driver loop.
//!
//! The protocol crate never does I/O. These helpers stand in for the serial
//! task that would send each frame, wait for the reply, and hand it back.

use spindle_vfd_protocol::{InitSequencer, ModbusFrame, ResponseParser, VfdError, VfdSpindle};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("No reply to request for register {register:#06x}")]
    Timeout { register: u16 },

    #[error("Init step {index} failed {attempts} times")]
    RetriesExhausted { index: i32, attempts: u32 },

    #[error(transparent)]
    Protocol(#[from] VfdError),
}

/// Sends one request and returns the raw reply, CRC already stripped.
pub trait ModbusTransport {
    fn transact(&mut self, frame: &ModbusFrame) -> Result<Vec<u8>, LinkError>;
}

/// Run the model's initialization sequence to completion, repeating a failed
/// step up to `max_attempts` times.
///
/// # Errors
///
/// Returns [`LinkError::RetriesExhausted`] when one step keeps failing.
pub fn run_initialization<T: ModbusTransport + ?Sized>(
    spindle: &mut VfdSpindle,
    transport: &mut T,
    max_attempts: u32,
) -> Result<InitSequencer, LinkError> {
    let mut sequencer = InitSequencer::new();
    let mut attempts = 0u32;

    while let Some(step) = sequencer.next_step(spindle) {
        let ok = match transport.transact(&step.frame) {
            Ok(reply) => sequencer.handle_response(spindle, &step, &reply),
            Err(e) => {
                debug!(index = step.index, "init transport error: {e}");
                sequencer.record(false);
                false
            }
        };

        if ok {
            attempts = 0;
        } else {
            attempts = attempts.saturating_add(1);
            if attempts >= max_attempts {
                return Err(LinkError::RetriesExhausted {
                    index: step.index,
                    attempts,
                });
            }
        }
    }

    Ok(sequencer)
}

/// Build a query with `build`, send it, and apply the reply.
///
/// ```ignore
/// query(&mut spindle, &mut drive, VfdSpindle::build_status_query)?;
/// ```
///
/// # Errors
///
/// Returns the transport error, or the parser's rejection as
/// [`LinkError::Protocol`].
pub fn query<T: ModbusTransport + ?Sized>(
    spindle: &mut VfdSpindle,
    transport: &mut T,
    build: fn(&VfdSpindle) -> (ModbusFrame, ResponseParser),
) -> Result<(), LinkError> {
    let (frame, parser) = build(spindle);
    let reply = transport.transact(&frame)?;
    spindle.try_handle_response(&parser, &reply)?;
    Ok(())
}

/// Send a write command. Writes are echoed; the echo is only length-checked.
///
/// # Errors
///
/// Returns the transport error or [`VfdError::Truncated`] for a short echo.
pub fn command<T: ModbusTransport + ?Sized>(
    transport: &mut T,
    frame: &ModbusFrame,
) -> Result<(), LinkError> {
    let reply = transport.transact(frame)?;
    if reply.len() < frame.rx_length() {
        return Err(VfdError::Truncated {
            expected: frame.rx_length(),
            actual: reply.len(),
        }
        .into());
    }
    Ok(())
}
