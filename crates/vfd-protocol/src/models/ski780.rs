//! SKI780 drive.
//!
//! The drive is asymmetric: speed is written as a percentage of the maximum
//! frequency (x0.01 %) but read back as an output frequency (x0.01 Hz).
//! The maximum frequency is read from P0.10 during initialization.

use super::ModelTable;
use crate::convert::{frequency_to_rpm, rpm_to_percent};
use crate::error::{VfdError, VfdResult};
use crate::frame::{FunctionCode, ModbusFrame, validate_read_response};
use crate::parser::ResponseParser;
use crate::speed_map::SpeedMap;
use crate::types::{DeviceLimits, Direction, FaultCode, VfdState};
use tracing::{debug, info, warn};

pub const NAME: &str = "SKI780";

/// Register addresses.
pub mod registers {
    /// Run command: 1 = forward, 2 = reverse, 6 = decelerate to stop.
    pub const COMMAND: u16 = 0x2000;
    /// Speed set-point, x0.01 % of maximum frequency.
    pub const SPEED_SETPOINT: u16 = 0x1000;
    /// Output frequency, x0.01 Hz.
    pub const OUTPUT_FREQUENCY: u16 = 0x1001;
    /// Run state: 1 = forward, 2 = reverse, 3 = stopped.
    pub const RUN_STATE: u16 = 0x3000;
    /// Current fault number, 0 when healthy.
    pub const FAULT: u16 = 0x8000;
    /// P0.10, maximum frequency.
    pub const MAX_FREQUENCY: u16 = 0xF00A;
    /// P0.14, lower frequency limit.
    pub const MIN_FREQUENCY: u16 = 0xF00E;
}

/// Values written to [`registers::COMMAND`].
pub mod command {
    pub const FORWARD: u16 = 0x0001;
    pub const REVERSE: u16 = 0x0002;
    pub const STOP: u16 = 0x0006;
}

/// Values read from [`registers::RUN_STATE`].
pub mod run_state {
    pub const FORWARD: u16 = 1;
    pub const REVERSE: u16 = 2;
    pub const STOPPED: u16 = 3;
}

pub static TABLE: ModelTable = ModelTable {
    name: NAME,
    direction_command,
    set_speed_command,
    initialization_sequence,
    current_speed,
    current_direction,
    status: status_ok,
    uses_delay_settings: false,
    safety_polling: false,
};

pub fn direction_value(direction: Direction) -> u16 {
    match direction {
        Direction::Clockwise => command::FORWARD,
        Direction::CounterClockwise => command::REVERSE,
        Direction::Stopped => command::STOP,
    }
}

pub fn direction_command(direction: Direction, frame: &mut ModbusFrame) {
    frame.set_write_register(registers::COMMAND, direction_value(direction));
}

/// Speed write for `dev_speed` RPM. Without a known maximum frequency the
/// set-point is 0.
pub fn set_speed_command(dev_speed: u32, limits: &DeviceLimits, frame: &mut ModbusFrame) {
    let max_frequency = limits.max_frequency.unwrap_or(0);
    let percent = rpm_to_percent(dev_speed, max_frequency);
    debug!(
        model = NAME,
        rpm = dev_speed,
        max_frequency,
        percent,
        "speed set-point"
    );
    frame.set_write_register(registers::SPEED_SETPOINT, percent);
}

pub fn initialization_sequence(index: i32, frame: &mut ModbusFrame) -> Option<ResponseParser> {
    match index {
        -1 => {
            frame.set_read_registers(registers::MIN_FREQUENCY, 1);
            Some(ResponseParser::new(
                "ski780_min_frequency",
                FunctionCode::ReadHoldingRegisters,
                parse_min_frequency,
            ))
        }
        -2 => {
            frame.set_read_registers(registers::MAX_FREQUENCY, 1);
            Some(ResponseParser::new(
                "ski780_max_frequency",
                FunctionCode::ReadHoldingRegisters,
                parse_max_frequency,
            ))
        }
        _ => None,
    }
}

pub fn current_speed(frame: &mut ModbusFrame) -> ResponseParser {
    frame.set_read_registers(registers::OUTPUT_FREQUENCY, 1);
    ResponseParser::new(
        "ski780_current_speed",
        FunctionCode::ReadHoldingRegisters,
        parse_current_speed,
    )
}

pub fn current_direction(frame: &mut ModbusFrame) -> ResponseParser {
    frame.set_read_registers(registers::RUN_STATE, 1);
    ResponseParser::new(
        "ski780_current_direction",
        FunctionCode::ReadHoldingRegisters,
        parse_current_direction,
    )
}

pub fn status_ok(frame: &mut ModbusFrame) -> ResponseParser {
    frame.set_read_registers(registers::FAULT, 1);
    ResponseParser::new(
        "ski780_status",
        FunctionCode::ReadHoldingRegisters,
        parse_status,
    )
}

/// Once the maximum is known the limits are fixed: a repeated read must
/// report the stored value.
fn check_unchanged(register: u16, stored: Option<u16>, reported: u16) -> VfdResult<()> {
    match stored {
        Some(stored) if stored != reported => Err(VfdError::LimitsChanged {
            register,
            stored,
            reported,
        }),
        _ => Ok(()),
    }
}

fn parse_min_frequency(response: &[u8], state: &mut VfdState) -> VfdResult<()> {
    let min_frequency = validate_read_response(response, FunctionCode::ReadHoldingRegisters)?;
    if let Some(max_frequency) = state.limits.max_frequency {
        if min_frequency > max_frequency {
            return Err(VfdError::LimitsInverted {
                min: min_frequency,
                max: max_frequency,
            });
        }
        check_unchanged(
            registers::MIN_FREQUENCY,
            state.limits.min_frequency,
            min_frequency,
        )?;
        debug!(model = NAME, min_frequency, "minimum frequency confirmed");
        return Ok(());
    }
    info!(model = NAME, min_frequency, "minimum frequency (x0.01 Hz)");
    state.limits.min_frequency = Some(min_frequency);
    Ok(())
}

fn parse_max_frequency(response: &[u8], state: &mut VfdState) -> VfdResult<()> {
    let max_frequency = validate_read_response(response, FunctionCode::ReadHoldingRegisters)?;
    if state.limits.max_frequency.is_some() {
        check_unchanged(
            registers::MAX_FREQUENCY,
            state.limits.max_frequency,
            max_frequency,
        )?;
        debug!(model = NAME, max_frequency, "maximum frequency confirmed");
        return Ok(());
    }
    let min_frequency = state.limits.min_frequency.unwrap_or(0);
    if min_frequency > max_frequency {
        return Err(VfdError::LimitsInverted {
            min: min_frequency,
            max: max_frequency,
        });
    }

    let max_rpm = frequency_to_rpm(max_frequency);
    let min_rpm = frequency_to_rpm(min_frequency);
    let mut speed_map = match (&state.speed_map, state.configured_speed_map) {
        (Some(configured), true) => configured.clone(),
        _ => SpeedMap::shelf(min_rpm, max_rpm),
    };
    speed_map.setup(max_rpm);
    let slop = u32::from((max_frequency / 40).max(1));

    info!(
        model = NAME,
        max_frequency, max_rpm, min_rpm, slop, "maximum frequency (x0.01 Hz)"
    );

    state.limits = DeviceLimits {
        min_frequency: Some(min_frequency),
        max_frequency: Some(max_frequency),
    };
    state.speed_map = Some(speed_map);
    state.slop = slop;
    Ok(())
}

fn parse_current_speed(response: &[u8], state: &mut VfdState) -> VfdResult<()> {
    let frequency = validate_read_response(response, FunctionCode::ReadHoldingRegisters)?;
    let rpm = frequency_to_rpm(frequency);
    debug!(model = NAME, frequency, rpm, "output frequency");
    state.current_speed = Some(rpm);
    Ok(())
}

fn parse_current_direction(response: &[u8], state: &mut VfdState) -> VfdResult<()> {
    let status = validate_read_response(response, FunctionCode::ReadHoldingRegisters)?;
    let direction = match status {
        run_state::FORWARD => Direction::Clockwise,
        run_state::REVERSE => Direction::CounterClockwise,
        run_state::STOPPED => Direction::Stopped,
        other => {
            warn!(model = NAME, status = other, "unknown run state");
            return Ok(());
        }
    };
    debug!(model = NAME, direction = direction.as_str(), "run state");
    state.current_direction = Some(direction);
    Ok(())
}

fn parse_status(response: &[u8], state: &mut VfdState) -> VfdResult<()> {
    let code = validate_read_response(response, FunctionCode::ReadHoldingRegisters)?;
    state.last_fault = Some(FaultCode(code));
    if code != 0 {
        return Err(VfdError::DeviceFault { code });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_reply(value: u16) -> [u8; 6] {
        let [hi, lo] = value.to_be_bytes();
        [0x01, 0x03, 0x00, 0x02, hi, lo]
    }

    fn init_step(index: i32) -> (ModbusFrame, ResponseParser) {
        let mut frame = ModbusFrame::empty();
        match initialization_sequence(index, &mut frame) {
            Some(parser) => (frame, parser),
            None => panic!("no init step {index}"),
        }
    }

    #[test]
    fn test_direction_frames() {
        let mut frame = ModbusFrame::empty();
        direction_command(Direction::Clockwise, &mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x06, 0x20, 0x00, 0x00, 0x01]);
        direction_command(Direction::CounterClockwise, &mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x06, 0x20, 0x00, 0x00, 0x02]);
        direction_command(Direction::Stopped, &mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x06, 0x20, 0x00, 0x00, 0x06]);
        assert_eq!(frame.tx_length(), 6);
        assert_eq!(frame.rx_length(), 6);
    }

    #[test]
    fn test_speed_frame_half_speed() {
        let limits = DeviceLimits {
            min_frequency: Some(0),
            max_frequency: Some(40000),
        };
        let mut frame = ModbusFrame::empty();
        set_speed_command(12000, &limits, &mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x06, 0x10, 0x00, 0x13, 0x88]);
    }

    #[test]
    fn test_speed_frame_without_limits_is_zero() {
        let mut frame = ModbusFrame::empty();
        set_speed_command(12000, &DeviceLimits::default(), &mut frame);
        assert_eq!(frame.value(), 0);
    }

    #[test]
    fn test_query_frames() {
        let mut frame = ModbusFrame::empty();
        current_speed(&mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x03, 0x10, 0x01, 0x00, 0x01]);
        current_direction(&mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x03, 0x30, 0x00, 0x00, 0x01]);
        status_ok(&mut frame);
        assert_eq!(frame.payload(), &[0x00, 0x03, 0x80, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_init_frames() {
        let (frame, _) = init_step(-1);
        assert_eq!(frame.payload(), &[0x00, 0x03, 0xF0, 0x0E, 0x00, 0x01]);
        let (frame, _) = init_step(-2);
        assert_eq!(frame.payload(), &[0x00, 0x03, 0xF0, 0x0A, 0x00, 0x01]);

        let mut frame = ModbusFrame::empty();
        assert!(initialization_sequence(-3, &mut frame).is_none());
        assert!(initialization_sequence(0, &mut frame).is_none());
        assert!(!frame.is_populated());
    }

    #[test]
    fn test_max_frequency_derives_speed_range() {
        let mut state = VfdState::new();
        let (_, min) = init_step(-1);
        let (_, max) = init_step(-2);
        assert!(min.apply(&read_reply(6000), &mut state));
        assert!(max.apply(&read_reply(40000), &mut state));

        assert_eq!(state.limits.max_frequency, Some(40000));
        assert_eq!(state.slop, 1000);
        let map = state.speed_map.as_ref().map(|m| (m.min_rpm(), m.max_rpm()));
        assert_eq!(map, Some((3600, 24000)));
    }

    #[test]
    fn test_max_frequency_keeps_configured_map() {
        let configured = match "0=0% 12000=50% 24000=100%".parse::<SpeedMap>() {
            Ok(map) => map,
            Err(e) => panic!("{e}"),
        };
        let mut state = VfdState::with_speed_map(configured);
        let (_, max) = init_step(-2);
        assert!(max.apply(&read_reply(40000), &mut state));

        let map = state.speed_map.as_ref();
        assert_eq!(map.map(|m| m.entries().len()), Some(3));
        assert_eq!(map.and_then(|m| m.max_dev_speed()), Some(24000));
    }

    #[test]
    fn test_inverted_limits_rejected_without_mutation() {
        let mut state = VfdState::new();
        state.limits.min_frequency = Some(50000);
        let (_, max) = init_step(-2);
        assert_eq!(
            max.try_apply(&read_reply(40000), &mut state),
            Err(VfdError::LimitsInverted {
                min: 50000,
                max: 40000
            })
        );
        assert_eq!(state.limits.max_frequency, None);
        assert!(state.speed_map.is_none());
        assert_eq!(state.slop, 0);
    }

    fn initialized_state(min: u16, max: u16) -> VfdState {
        let mut state = VfdState::new();
        assert!(init_step(-1).1.apply(&read_reply(min), &mut state));
        assert!(init_step(-2).1.apply(&read_reply(max), &mut state));
        state
    }

    #[test]
    fn test_min_above_known_max_rejected_after_init() {
        let mut state = initialized_state(0, 40000);
        let (_, min) = init_step(-1);
        assert_eq!(
            min.try_apply(&read_reply(50000), &mut state),
            Err(VfdError::LimitsInverted {
                min: 50000,
                max: 40000
            })
        );
        assert_eq!(
            state.limits,
            DeviceLimits {
                min_frequency: Some(0),
                max_frequency: Some(40000),
            }
        );
    }

    #[test]
    fn test_limits_fixed_after_init() {
        let mut state = initialized_state(6000, 40000);
        let (_, min) = init_step(-1);
        let (_, max) = init_step(-2);

        assert_eq!(
            min.try_apply(&read_reply(3000), &mut state),
            Err(VfdError::LimitsChanged {
                register: registers::MIN_FREQUENCY,
                stored: 6000,
                reported: 3000
            })
        );
        assert_eq!(
            max.try_apply(&read_reply(32000), &mut state),
            Err(VfdError::LimitsChanged {
                register: registers::MAX_FREQUENCY,
                stored: 40000,
                reported: 32000
            })
        );
        assert_eq!(state.limits.min_frequency, Some(6000));
        assert_eq!(state.limits.max_frequency, Some(40000));
        assert_eq!(state.slop, 1000);
        let range = state.speed_map.as_ref().map(|m| (m.min_rpm(), m.max_rpm()));
        assert_eq!(range, Some((3600, 24000)));
    }

    #[test]
    fn test_repeated_init_with_same_limits_accepted() {
        let mut state = initialized_state(6000, 40000);
        assert!(init_step(-1).1.apply(&read_reply(6000), &mut state));
        assert!(init_step(-2).1.apply(&read_reply(40000), &mut state));
        assert_eq!(state.limits.min_frequency, Some(6000));
        assert_eq!(state.limits.max_frequency, Some(40000));
        assert_eq!(state.slop, 1000);
    }

    #[test]
    fn test_slop_floor() {
        let mut state = VfdState::new();
        let (_, max) = init_step(-2);
        assert!(max.apply(&read_reply(20), &mut state));
        assert_eq!(state.slop, 1);
    }

    #[test]
    fn test_current_speed_parser() {
        let mut state = VfdState::new();
        let mut frame = ModbusFrame::empty();
        let parser = current_speed(&mut frame);
        assert!(parser.apply(&[0x01, 0x03, 0x00, 0x02, 0x09, 0x5D], &mut state));
        assert_eq!(state.current_speed, Some(1438));
    }

    #[test]
    fn test_current_direction_parser() {
        let mut state = VfdState::new();
        let mut frame = ModbusFrame::empty();
        let parser = current_direction(&mut frame);

        assert!(parser.apply(&read_reply(2), &mut state));
        assert_eq!(state.current_direction, Some(Direction::CounterClockwise));
        assert!(parser.apply(&read_reply(3), &mut state));
        assert_eq!(state.current_direction, Some(Direction::Stopped));

        // Unknown status is accepted but leaves the last known direction.
        assert!(parser.apply(&read_reply(9), &mut state));
        assert_eq!(state.current_direction, Some(Direction::Stopped));
    }

    #[test]
    fn test_status_parser() {
        let mut state = VfdState::new();
        let mut frame = ModbusFrame::empty();
        let parser = status_ok(&mut frame);

        assert!(parser.apply(&read_reply(0), &mut state));
        assert_eq!(state.last_fault, Some(FaultCode::NONE));

        assert_eq!(
            parser.try_apply(&read_reply(7), &mut state),
            Err(VfdError::DeviceFault { code: 7 })
        );
        assert_eq!(state.last_fault, Some(FaultCode(7)));
        assert!(state.has_fault());
    }

    #[test]
    fn test_parsers_reject_malformed_without_mutation() {
        let mut state = VfdState::new();
        let mut frame = ModbusFrame::empty();
        let parsers = [
            current_speed(&mut frame),
            current_direction(&mut frame),
            status_ok(&mut frame),
            init_step(-1).1,
            init_step(-2).1,
        ];
        let bad = [
            &[0x01, 0x06, 0x00, 0x02, 0x00, 0x01][..],
            &[0x01, 0x03, 0x01, 0x02, 0x00, 0x01][..],
            &[0x01, 0x03, 0x00, 0x02, 0x00][..],
            &[][..],
        ];
        for parser in &parsers {
            for response in bad {
                assert!(!parser.apply(response, &mut state), "{}", parser.name());
            }
        }
        assert_eq!(state.current_speed, None);
        assert_eq!(state.current_direction, None);
        assert_eq!(state.last_fault, None);
        assert_eq!(state.limits, DeviceLimits::default());
    }
}
