//! Shared test utilities for the VFD spindle protocol.
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]`
//! - [`sim`] - A simulated SKI780 drive
//! - [`transport`] - Transport trait and a reference driver loop
//!
//! ```toml
//! [dev-dependencies]
//! spindle-vfd-test-helpers = { workspace = true }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod must;
pub mod sim;
pub mod transport;

pub use must::*;
pub use sim::{Corruption, SimulatedSki780};
pub use transport::{LinkError, ModbusTransport, command, query, run_initialization};

/// Install a test-writer tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("spindle_vfd_protocol=debug,spindle_vfd_test_helpers=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
