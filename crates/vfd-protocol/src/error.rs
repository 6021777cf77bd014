//! VFD protocol error types.

use thiserror::Error;

/// Broad failure class, used by callers to decide between retrying on the
/// next polling tick and stopping the spindle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The response was not shaped like the answer to the request sent.
    Malformed,
    /// The response was well-formed but reports a device fault.
    DeviceFault,
    /// Discovered or requested limits are inconsistent.
    Limits,
    /// Configuration could not be resolved.
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfdError {
    #[error("Response too short: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Function code mismatch: expected {expected:#04x}, got {actual:#04x}")]
    FunctionCodeMismatch { expected: u8, actual: u8 },

    #[error("Byte count mismatch: expected {expected}, got {actual}")]
    ByteCountMismatch { expected: u16, actual: u16 },

    #[error("Device reported fault code {code}")]
    DeviceFault { code: u16 },

    #[error("Frequency limits inverted: min {min} > max {max} (x0.01 Hz)")]
    LimitsInverted { min: u16, max: u16 },

    #[error("Register {register:#06x} changed after initialization: {stored} -> {reported}")]
    LimitsChanged {
        register: u16,
        stored: u16,
        reported: u16,
    },

    #[error("Unknown VFD model: {0}")]
    UnknownModel(String),

    #[error("Invalid speed map: {0}")]
    InvalidSpeedMap(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type VfdResult<T> = Result<T, VfdError>;

impl VfdError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Truncated { .. }
            | Self::FunctionCodeMismatch { .. }
            | Self::ByteCountMismatch { .. } => FailureKind::Malformed,
            Self::DeviceFault { .. } => FailureKind::DeviceFault,
            Self::LimitsInverted { .. } | Self::LimitsChanged { .. } => FailureKind::Limits,
            Self::UnknownModel(_) | Self::InvalidSpeedMap(_) | Self::Config(_) => {
                FailureKind::Configuration
            }
        }
    }

    /// True when the failure is transient framing noise that the next poll
    /// may clear.
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Malformed
    }
}

impl From<serde_yaml::Error> for VfdError {
    fn from(e: serde_yaml::Error) -> Self {
        VfdError::Config(e.to_string())
    }
}
