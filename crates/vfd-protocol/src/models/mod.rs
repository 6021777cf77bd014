//! Supported drive models.
//!
//! Each model resolves to a static [`ModelTable`] of plain functions. Adding
//! a drive means adding a variant, a table, and a registry entry.

pub mod ski780;

use crate::frame::ModbusFrame;
use crate::parser::ResponseParser;
use crate::types::{DeviceLimits, Direction};

/// Per-model builders and capability flags.
pub struct ModelTable {
    pub name: &'static str,
    /// Fill a direction write.
    pub direction_command: fn(Direction, &mut ModbusFrame),
    /// Fill a speed write for a device speed in RPM.
    pub set_speed_command: fn(u32, &DeviceLimits, &mut ModbusFrame),
    /// Fill the request for init step `index` (-1, -2, ...). `None` once the
    /// sequence is complete.
    pub initialization_sequence: fn(i32, &mut ModbusFrame) -> Option<ResponseParser>,
    pub current_speed: fn(&mut ModbusFrame) -> ResponseParser,
    pub current_direction: fn(&mut ModbusFrame) -> ResponseParser,
    pub status: fn(&mut ModbusFrame) -> ResponseParser,
    /// The drive needs the host's spin-up/spin-down delays.
    pub uses_delay_settings: bool,
    /// The drive should be polled for faults while running.
    pub safety_polling: bool,
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VfdModel {
    /// Shenzhen SKI780 series.
    Ski780,
}

impl VfdModel {
    pub const ALL: &'static [VfdModel] = &[VfdModel::Ski780];

    pub fn table(&self) -> &'static ModelTable {
        match self {
            VfdModel::Ski780 => &ski780::TABLE,
        }
    }

    pub fn name(&self) -> &'static str {
        self.table().name
    }

    pub fn direction_command(&self, direction: Direction, frame: &mut ModbusFrame) {
        (self.table().direction_command)(direction, frame)
    }

    pub fn set_speed_command(&self, dev_speed: u32, limits: &DeviceLimits, frame: &mut ModbusFrame) {
        (self.table().set_speed_command)(dev_speed, limits, frame)
    }

    pub fn initialization_sequence(
        &self,
        index: i32,
        frame: &mut ModbusFrame,
    ) -> Option<ResponseParser> {
        (self.table().initialization_sequence)(index, frame)
    }

    pub fn current_speed(&self, frame: &mut ModbusFrame) -> ResponseParser {
        (self.table().current_speed)(frame)
    }

    pub fn current_direction(&self, frame: &mut ModbusFrame) -> ResponseParser {
        (self.table().current_direction)(frame)
    }

    pub fn status(&self, frame: &mut ModbusFrame) -> ResponseParser {
        (self.table().status)(frame)
    }

    pub fn uses_delay_settings(&self) -> bool {
        self.table().uses_delay_settings
    }

    pub fn safety_polling(&self) -> bool {
        self.table().safety_polling
    }
}

impl std::fmt::Display for VfdModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_model_has_a_table() {
        for model in VfdModel::ALL {
            assert!(!model.name().is_empty());
        }
    }

    #[test]
    fn test_ski780_dispatch() {
        let model = VfdModel::Ski780;
        assert_eq!(model.to_string(), "SKI780");
        assert!(!model.uses_delay_settings());
        assert!(!model.safety_polling());

        let mut frame = ModbusFrame::empty();
        model.direction_command(Direction::Clockwise, &mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x06, 0x20, 0x00, 0x00, 0x01]);
    }
}
