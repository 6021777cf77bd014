//! Piecewise-linear map from requested RPM to device speed.
//!
//! A map is a list of `(rpm, percent)` points, non-decreasing in both
//! columns. After [`SpeedMap::setup`] each point also carries the device
//! speed that percentage represents, and [`SpeedMap::map_speed`] interpolates
//! between neighbouring points.
//!
//! Configuration uses the textual form `"0=0% 1000=0% 24000=100%"`.

use crate::convert::PERCENT_CEILING;
use crate::error::{VfdError, VfdResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedEntry {
    pub rpm: u32,
    /// Percentage of full device speed, x0.01 %.
    pub percent: u16,
    dev_speed: u32,
}

impl SpeedEntry {
    pub fn new(rpm: u32, percent: u16) -> Self {
        Self {
            rpm,
            percent,
            dev_speed: 0,
        }
    }

    pub fn dev_speed(&self) -> u32 {
        self.dev_speed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedMap {
    entries: Vec<SpeedEntry>,
    min_rpm: u32,
    max_dev_speed: Option<u32>,
}

impl SpeedMap {
    /// Build a map from points, rejecting empty or non-monotonic input.
    pub fn new(entries: Vec<SpeedEntry>) -> VfdResult<Self> {
        let Some(first) = entries.first() else {
            return Err(VfdError::InvalidSpeedMap("no entries".into()));
        };
        let min_rpm = first.rpm;

        for entry in &entries {
            if entry.percent > PERCENT_CEILING {
                return Err(VfdError::InvalidSpeedMap(format!(
                    "{}={} exceeds 100%",
                    entry.rpm,
                    PercentDisplay(entry.percent)
                )));
            }
        }
        for pair in entries.windows(2) {
            if let [a, b] = pair {
                if b.rpm < a.rpm || b.percent < a.percent {
                    return Err(VfdError::InvalidSpeedMap(format!(
                        "{}={} follows {}={}",
                        b.rpm,
                        PercentDisplay(b.percent),
                        a.rpm,
                        PercentDisplay(a.percent)
                    )));
                }
            }
        }

        Ok(Self {
            entries,
            min_rpm,
            max_dev_speed: None,
        })
    }

    /// Straight line from 0 RPM at 0 % to `max_rpm` at 100 %.
    pub fn linear(max_rpm: u32) -> Self {
        Self {
            entries: vec![
                SpeedEntry::new(0, 0),
                SpeedEntry::new(max_rpm, PERCENT_CEILING),
            ],
            min_rpm: 0,
            max_dev_speed: None,
        }
    }

    /// Shelf speeds: zero stays off, anything up to `min_rpm` runs at the
    /// minimum, then linear up to `max_rpm` at 100 %.
    pub fn shelf(min_rpm: u32, max_rpm: u32) -> Self {
        let min_percent = if max_rpm == 0 {
            0
        } else {
            let pct = u64::from(min_rpm) * u64::from(PERCENT_CEILING) / u64::from(max_rpm);
            u16::try_from(pct.min(u64::from(PERCENT_CEILING))).unwrap_or(PERCENT_CEILING)
        };

        let mut entries = vec![SpeedEntry::new(0, 0), SpeedEntry::new(0, min_percent)];
        if min_rpm > 0 {
            entries.push(SpeedEntry::new(min_rpm, min_percent));
        }
        entries.push(SpeedEntry::new(max_rpm, PERCENT_CEILING));

        Self {
            entries,
            min_rpm,
            max_dev_speed: None,
        }
    }

    /// Compute device speed for every point against the full-scale device
    /// speed.
    pub fn setup(&mut self, max_dev_speed: u32) {
        for entry in &mut self.entries {
            let dev =
                u64::from(entry.percent) * u64::from(max_dev_speed) / u64::from(PERCENT_CEILING);
            entry.dev_speed = u32::try_from(dev).unwrap_or(max_dev_speed);
        }
        self.max_dev_speed = Some(max_dev_speed);
    }

    pub fn is_setup(&self) -> bool {
        self.max_dev_speed.is_some()
    }

    /// Device speed for `rpm`, clamped to the first and last points.
    pub fn map_speed(&self, rpm: u32) -> u32 {
        let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) else {
            return 0;
        };
        if rpm <= first.rpm {
            return first.dev_speed;
        }

        for pair in self.entries.windows(2) {
            if let [a, b] = pair {
                if rpm < b.rpm {
                    return interpolate(a, b, rpm);
                }
            }
        }
        last.dev_speed
    }

    pub fn entries(&self) -> &[SpeedEntry] {
        &self.entries
    }

    /// Lowest RPM the map reports as supported.
    pub fn min_rpm(&self) -> u32 {
        self.min_rpm
    }

    /// Highest RPM in the map.
    pub fn max_rpm(&self) -> u32 {
        self.entries.last().map_or(0, |entry| entry.rpm)
    }

    pub fn max_dev_speed(&self) -> Option<u32> {
        self.max_dev_speed
    }
}

// Caller guarantees a.rpm <= rpm < b.rpm. The product of two u32 spans
// needs more than 64 signed bits.
fn interpolate(a: &SpeedEntry, b: &SpeedEntry, rpm: u32) -> u32 {
    let span = i128::from(b.rpm) - i128::from(a.rpm);
    if span <= 0 {
        return a.dev_speed;
    }
    let delta_dev = i128::from(b.dev_speed) - i128::from(a.dev_speed);
    let offset = i128::from(rpm) - i128::from(a.rpm);
    let dev = i128::from(a.dev_speed) + offset * delta_dev / span;
    u32::try_from(dev.max(0)).unwrap_or(a.dev_speed)
}

struct PercentDisplay(u16);

impl fmt::Display for PercentDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{whole}%")
        } else if frac % 10 == 0 {
            write!(f, "{whole}.{}%", frac / 10)
        } else {
            write!(f, "{whole}.{frac:02}%")
        }
    }
}

fn parse_percent(text: &str) -> Option<u16> {
    let text = text.strip_suffix('%').unwrap_or(text);
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };
    if whole.is_empty() || frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u16 = whole.parse().ok()?;
    let frac: u16 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u16>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac)
}

impl FromStr for SpeedMap {
    type Err = VfdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();
        for token in s.split_whitespace() {
            let Some((rpm, percent)) = token.split_once('=') else {
                return Err(VfdError::InvalidSpeedMap(format!(
                    "'{token}' is not rpm=percent"
                )));
            };
            let rpm: u32 = rpm
                .parse()
                .map_err(|e| VfdError::InvalidSpeedMap(format!("bad rpm in '{token}': {e}")))?;
            let percent = parse_percent(percent)
                .ok_or_else(|| VfdError::InvalidSpeedMap(format!("bad percent in '{token}'")))?;
            entries.push(SpeedEntry::new(rpm, percent));
        }
        Self::new(entries)
    }
}

impl fmt::Display for SpeedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entry in &self.entries {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}={}", entry.rpm, PercentDisplay(entry.percent))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelf_without_minimum() {
        let map = SpeedMap::shelf(0, 24000);
        assert_eq!(map.min_rpm(), 0);
        assert_eq!(map.max_rpm(), 24000);
        assert_eq!(map.entries().len(), 3);
    }

    #[test]
    fn test_shelf_with_minimum() {
        let map = SpeedMap::shelf(6000, 24000);
        let percents: Vec<u16> = map.entries().iter().map(|e| e.percent).collect();
        let rpms: Vec<u32> = map.entries().iter().map(|e| e.rpm).collect();
        assert_eq!(percents, vec![0, 2500, 2500, 10000]);
        assert_eq!(rpms, vec![0, 0, 6000, 24000]);
        assert_eq!(map.min_rpm(), 6000);
    }

    #[test]
    fn test_map_speed_identity_on_shelf() {
        let mut map = SpeedMap::shelf(0, 24000);
        map.setup(24000);
        assert_eq!(map.map_speed(0), 0);
        assert_eq!(map.map_speed(12000), 12000);
        assert_eq!(map.map_speed(24000), 24000);
        assert_eq!(map.map_speed(30000), 24000);
    }

    #[test]
    fn test_map_speed_minimum_shelf() {
        let mut map = SpeedMap::shelf(6000, 24000);
        map.setup(24000);
        assert_eq!(map.map_speed(0), 0);
        assert_eq!(map.map_speed(1), 6000);
        assert_eq!(map.map_speed(3000), 6000);
        assert_eq!(map.map_speed(6000), 6000);
        assert_eq!(map.map_speed(15000), 15000);
        assert_eq!(map.map_speed(u32::MAX), 24000);
    }

    #[test]
    fn test_map_speed_before_setup_is_zero() {
        let map = SpeedMap::linear(24000);
        assert!(!map.is_setup());
        assert_eq!(map.map_speed(12000), 0);
    }

    #[test]
    fn test_parse_speed_map() -> VfdResult<()> {
        let map: SpeedMap = "0=0% 1000=0% 24000=100%".parse()?;
        assert_eq!(map.entries().len(), 3);
        assert_eq!(map.max_rpm(), 24000);
        assert_eq!(map.to_string(), "0=0% 1000=0% 24000=100%");
        Ok(())
    }

    #[test]
    fn test_parse_fractional_percent() {
        assert_eq!(parse_percent("12.5%"), Some(1250));
        assert_eq!(parse_percent("12.34%"), Some(1234));
        assert_eq!(parse_percent("100"), Some(10000));
        assert_eq!(parse_percent("1.234%"), None);
        assert_eq!(parse_percent("%"), None);
        assert_eq!(parse_percent("x%"), None);
        assert_eq!(parse_percent("700%"), None);
    }

    #[test]
    fn test_parse_rejects_bad_maps() {
        assert!(matches!(
            "".parse::<SpeedMap>(),
            Err(VfdError::InvalidSpeedMap(_))
        ));
        assert!(matches!(
            "0=0% 24000".parse::<SpeedMap>(),
            Err(VfdError::InvalidSpeedMap(_))
        ));
        assert!(matches!(
            "24000=100% 0=0%".parse::<SpeedMap>(),
            Err(VfdError::InvalidSpeedMap(_))
        ));
        assert!(matches!(
            "0=0% 24000=120%".parse::<SpeedMap>(),
            Err(VfdError::InvalidSpeedMap(_))
        ));
        assert!(matches!(
            "0=50% 24000=10%".parse::<SpeedMap>(),
            Err(VfdError::InvalidSpeedMap(_))
        ));
    }

    #[test]
    fn test_display_fractional() {
        let map = SpeedMap::shelf(3000, 24000);
        assert_eq!(map.to_string(), "0=0% 0=12.5% 3000=12.5% 24000=100%");
    }

    #[test]
    fn test_custom_map_interpolation() -> VfdResult<()> {
        let mut map: SpeedMap = "0=0% 1000=10% 11000=60% 21000=100%".parse()?;
        map.setup(10000);
        assert_eq!(map.map_speed(500), 500);
        assert_eq!(map.map_speed(1000), 1000);
        assert_eq!(map.map_speed(6000), 3500);
        assert_eq!(map.map_speed(16000), 8000);
        assert_eq!(map.map_speed(21000), 10000);
        Ok(())
    }

    #[test]
    fn test_full_range_map_does_not_overflow() -> VfdResult<()> {
        let mut map: SpeedMap = "0=0% 4294967295=100%".parse()?;
        map.setup(u32::MAX);
        assert_eq!(map.map_speed(u32::MAX - 1), u32::MAX - 1);
        assert_eq!(map.map_speed(u32::MAX / 2), u32::MAX / 2);
        assert_eq!(map.map_speed(u32::MAX), u32::MAX);
        Ok(())
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(500))]

        #[test]
        fn prop_map_speed_monotone(
            min in 0u32..12000,
            max in 12000u32..40000,
            a in 0u32..50000,
            b in 0u32..50000,
        ) {
            let mut map = SpeedMap::shelf(min, max);
            map.setup(max);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(map.map_speed(lo) <= map.map_speed(hi));
        }

        #[test]
        fn prop_map_speed_bounded(max in 1u32..40000, rpm in any::<u32>()) {
            let mut map = SpeedMap::linear(max);
            map.setup(max);
            prop_assert!(map.map_speed(rpm) <= max);
        }

        #[test]
        fn prop_full_range_map_monotone(a in any::<u32>(), b in any::<u32>()) {
            let mut map: SpeedMap = "0=0% 4294967295=100%"
                .parse()
                .map_err(|e: VfdError| TestCaseError::fail(e.to_string()))?;
            map.setup(u32::MAX);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(map.map_speed(lo) <= map.map_speed(hi));
        }

        #[test]
        fn prop_display_parse_roundtrip(min in 0u32..12000, max in 12000u32..40000) {
            let map = SpeedMap::shelf(min, max);
            let parsed: SpeedMap = map.to_string().parse().map_err(|e: VfdError| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(parsed.entries(), map.entries());
        }
    }
}
