//! Response parsers paired with each request.
//!
//! A parser is a plain function over the raw response and the drive state it
//! updates. It either applies every field it owns or none of them.

use crate::error::{FailureKind, VfdResult};
use crate::frame::FunctionCode;
use crate::types::VfdState;
use tracing::{debug, warn};

/// Parse a raw response into `state`.
pub type ParseFn = fn(&[u8], &mut VfdState) -> VfdResult<()>;

/// The parser for one request, tagged with the request's function code.
#[derive(Clone, Copy)]
pub struct ResponseParser {
    name: &'static str,
    function: FunctionCode,
    parse: ParseFn,
}

impl ResponseParser {
    pub const fn new(name: &'static str, function: FunctionCode, parse: ParseFn) -> Self {
        Self {
            name,
            function,
            parse,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Function code of the request this parser answers.
    pub fn function(&self) -> FunctionCode {
        self.function
    }

    /// Parse and apply, keeping the failure detail.
    ///
    /// # Errors
    ///
    /// Returns the framing or device error that caused the rejection. State
    /// is unchanged except for a reported fault code.
    pub fn try_apply(&self, response: &[u8], state: &mut VfdState) -> VfdResult<()> {
        (self.parse)(response, state)
    }

    /// Parse and apply, reducing the outcome to success or failure.
    ///
    /// Malformed frames and device faults are logged at different levels.
    pub fn apply(&self, response: &[u8], state: &mut VfdState) -> bool {
        match self.try_apply(response, state) {
            Ok(()) => true,
            Err(e) => {
                match e.kind() {
                    FailureKind::DeviceFault => warn!(parser = self.name, "VFD fault: {e}"),
                    FailureKind::Limits => warn!(parser = self.name, "VFD limits rejected: {e}"),
                    FailureKind::Malformed | FailureKind::Configuration => {
                        debug!(parser = self.name, "VFD response rejected: {e}")
                    }
                }
                false
            }
        }
    }
}

impl std::fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseParser")
            .field("name", &self.name)
            .field("function", &self.function)
            .finish()
    }
}
