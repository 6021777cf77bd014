//! RPM to device-unit conversions.
//!
//! Frequencies are in hundredths of Hz, percentages in hundredths of a
//! percent. All arithmetic is integer, widened to `u64` and multiplied
//! before dividing.

use tracing::warn;

/// Fixed-point factor of frequency readings (0.01 Hz).
pub const PRECISION: u32 = 100;

/// 100.00 % in the drive's percentage unit.
pub const PERCENT_CEILING: u16 = 10_000;

/// Frequency (x0.01 Hz) to RPM: `f * 60 / 100`, written as `f * 600 / 1000`
/// so it matches the derivation of the speed range from discovered limits.
#[inline]
pub fn frequency_to_rpm(frequency: u16) -> u32 {
    u32::from(frequency) * 600 / 1000
}

/// RPM to percentage of maximum frequency (x0.01 %), clamped to
/// `[0, PERCENT_CEILING]`.
///
/// With no known maximum the result is 0, which the drive treats as a stop.
pub fn rpm_to_percent(rpm: u32, max_frequency: u16) -> u16 {
    if max_frequency == 0 {
        warn!(rpm, "speed conversion requested before maximum frequency is known");
        return 0;
    }

    let scaled = u64::from(rpm) * u64::from(PERCENT_CEILING) * 1000;
    let max_rpm_x1000 = u64::from(max_frequency) * 600;
    let percent = scaled / max_rpm_x1000;
    u16::try_from(percent.min(u64::from(PERCENT_CEILING))).unwrap_or(PERCENT_CEILING)
}

/// Percentage of maximum (x0.01 %) back to frequency (x0.01 Hz).
pub fn percent_to_frequency(percent: u16, max_frequency: u16) -> u16 {
    let clamped = u64::from(percent.min(PERCENT_CEILING));
    let frequency = clamped * u64::from(max_frequency) / u64::from(PERCENT_CEILING);
    u16::try_from(frequency).unwrap_or(max_frequency)
}

/// Percentage of maximum (x0.01 %) back to RPM.
pub fn percent_to_rpm(percent: u16, max_frequency: u16) -> u32 {
    frequency_to_rpm(percent_to_frequency(percent, max_frequency))
}

/// RPM covered by one step of the percentage unit, rounded up.
pub fn rpm_per_percent_unit(max_frequency: u16) -> u32 {
    (u32::from(max_frequency) * 600).div_ceil(1000 * u32::from(PERCENT_CEILING))
}
