//! Modbus-RTU VFD spindle protocol: request frames, response parsers, and
//! drive initialization.
//!
//! This crate is I/O-free. It builds request frames and applies the raw
//! responses handed back to it; the serial transport, CRC, timeouts and
//! polling cadence belong to the caller.
//!
//! # Key Features
//! - SKI780 direction, speed, status and limit-discovery frames
//! - Response validation (length, function code, byte count) before decode
//! - RPM to percentage-of-max-frequency conversion in integer math
//! - Shelf speeds and configurable RPM speed maps
//! - Explicit model registry and YAML configuration
//!
//! ```
//! use spindle_vfd_protocol::{Direction, ModelRegistry, VfdSpindle};
//!
//! let registry = ModelRegistry::builtin();
//! let spindle = VfdSpindle::new(registry.lookup("ski780")?);
//! let frame = spindle.build_direction_command(Direction::CounterClockwise);
//! assert_eq!(frame.payload(), &[0x00, 0x06, 0x20, 0x00, 0x00, 0x02]);
//! # Ok::<(), spindle_vfd_protocol::VfdError>(())
//! ```

#![deny(static_mut_refs)]

pub mod config;
pub mod convert;
pub mod error;
pub mod frame;
pub mod init;
pub mod models;
pub mod parser;
pub mod registry;
pub mod speed_map;
pub mod spindle;
pub mod types;

// Flat re-exports so callers can use `spindle_vfd_protocol::Foo`.
pub use config::VfdConfig;
pub use convert::{
    PERCENT_CEILING, PRECISION, frequency_to_rpm, percent_to_frequency, percent_to_rpm,
    rpm_per_percent_unit, rpm_to_percent,
};
pub use error::{FailureKind, VfdError, VfdResult};
pub use frame::{
    FRAME_CAPACITY, FunctionCode, ModbusFrame, REGISTER_BYTES, STANDARD_FRAME_LEN, response_word,
    validate_read_response,
};
pub use init::{FIRST_INDEX, InitSequencer, InitState, InitStep};
pub use models::{ModelTable, VfdModel};
pub use parser::{ParseFn, ResponseParser};
pub use registry::ModelRegistry;
pub use speed_map::{SpeedEntry, SpeedMap};
pub use spindle::VfdSpindle;
pub use types::{DeviceLimits, Direction, FaultCode, VfdState};
