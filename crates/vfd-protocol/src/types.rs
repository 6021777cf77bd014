//! Spindle direction, discovered device limits, and per-session drive state.

use crate::convert::frequency_to_rpm;
use crate::speed_map::SpeedMap;

/// Spindle rotation as commanded or reported.
///
/// Defaults to [`Stopped`](Self::Stopped), which is also where every
/// undefined input lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// M3.
    Clockwise,
    /// M4.
    CounterClockwise,
    /// M5.
    #[default]
    Stopped,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Clockwise => "cw",
            Direction::CounterClockwise => "ccw",
            Direction::Stopped => "stopped",
        }
    }

    /// Decode a raw selector (1 = CW, 2 = CCW). Anything else is a stop.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Direction::Clockwise,
            2 => Direction::CounterClockwise,
            _ => Direction::Stopped,
        }
    }

    /// Parse direction from text such as `"cw"`, `"M4"` or `"stop"`.
    ///
    /// Input is trimmed and case-insensitive.
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cw" | "m3" | "clockwise" => Some(Direction::Clockwise),
            "ccw" | "m4" | "counterclockwise" => Some(Direction::CounterClockwise),
            "stop" | "stopped" | "m5" | "off" => Some(Direction::Stopped),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, Direction::Stopped)
    }
}

/// Fault number reported by the drive. Zero means healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultCode(pub u16);

impl FaultCode {
    pub const NONE: FaultCode = FaultCode(0);

    pub fn is_healthy(&self) -> bool {
        self.0 == 0
    }
}

/// Frequency limits read from the drive, in hundredths of Hz.
///
/// Unknown until the initialization sequence has read them. Both are
/// recorded together when the maximum is accepted, and the pair is fixed
/// for the session from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceLimits {
    pub min_frequency: Option<u16>,
    pub max_frequency: Option<u16>,
}

impl DeviceLimits {
    /// True once both limits are known.
    pub fn is_complete(&self) -> bool {
        self.min_frequency.is_some() && self.max_frequency.is_some()
    }

    pub fn min_rpm(&self) -> Option<u32> {
        self.min_frequency.map(frequency_to_rpm)
    }

    pub fn max_rpm(&self) -> Option<u32> {
        self.max_frequency.map(frequency_to_rpm)
    }
}

/// Everything the parsers know about the drive for this session.
#[derive(Debug, Clone, Default)]
pub struct VfdState {
    pub limits: DeviceLimits,
    /// RPM to device-speed table, set up once the maximum frequency is known.
    pub speed_map: Option<SpeedMap>,
    /// Set by configuration; shelf speeds are not derived when present.
    pub configured_speed_map: bool,
    /// Tolerance band, in RPM, for "at speed" comparisons.
    pub slop: u32,
    /// Last speed reported by the drive, in RPM.
    pub current_speed: Option<u32>,
    /// Last direction reported by the drive.
    pub current_direction: Option<Direction>,
    /// Last fault status read from the drive.
    pub last_fault: Option<FaultCode>,
}

impl VfdState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed_map(speed_map: SpeedMap) -> Self {
        Self {
            speed_map: Some(speed_map),
            configured_speed_map: true,
            ..Self::default()
        }
    }

    pub fn has_fault(&self) -> bool {
        self.last_fault.is_some_and(|fault| !fault.is_healthy())
    }
}
