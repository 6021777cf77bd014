//! One drive on the bus: its model and everything learned from it.
//!
//! The spindle builds requests and applies responses. Sending frames,
//! CRC, timeouts and polling cadence belong to the caller.

use crate::config::VfdConfig;
use crate::error::VfdResult;
use crate::frame::ModbusFrame;
use crate::models::VfdModel;
use crate::parser::ResponseParser;
use crate::registry::ModelRegistry;
use crate::speed_map::SpeedMap;
use crate::types::{Direction, VfdState};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct VfdSpindle {
    model: VfdModel,
    state: VfdState,
}

impl VfdSpindle {
    pub fn new(model: VfdModel) -> Self {
        Self {
            model,
            state: VfdState::new(),
        }
    }

    /// Use `speed_map` instead of deriving shelf speeds from the drive limits.
    pub fn with_speed_map(model: VfdModel, speed_map: SpeedMap) -> Self {
        Self {
            model,
            state: VfdState::with_speed_map(speed_map),
        }
    }

    /// Build from configuration, resolving the model through `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown model name or an invalid speed map.
    pub fn from_config(config: &VfdConfig, registry: &ModelRegistry) -> VfdResult<Self> {
        let model = registry.lookup(&config.model)?;
        let spindle = match config.speed_map()? {
            Some(map) => Self::with_speed_map(model, map),
            None => Self::new(model),
        };
        debug!(model = model.name(), "VFD spindle configured");
        Ok(spindle)
    }

    pub fn model(&self) -> VfdModel {
        self.model
    }

    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    pub fn state(&self) -> &VfdState {
        &self.state
    }

    pub fn build_direction_command(&self, direction: Direction) -> ModbusFrame {
        let mut frame = ModbusFrame::empty();
        self.model.direction_command(direction, &mut frame);
        frame
    }

    /// Direction write from a raw selector (1 = CW, 2 = CCW). Any other
    /// value stops the spindle.
    pub fn build_direction_command_raw(&self, raw: u8) -> ModbusFrame {
        self.build_direction_command(Direction::from_raw(raw))
    }

    /// Device speed for a requested RPM. Identity until a speed map is set up.
    pub fn map_speed(&self, rpm: u32) -> u32 {
        match &self.state.speed_map {
            Some(map) if map.is_setup() => map.map_speed(rpm),
            _ => rpm,
        }
    }

    pub fn build_speed_command(&self, rpm: u32) -> ModbusFrame {
        let mut frame = ModbusFrame::empty();
        let dev_speed = self.map_speed(rpm);
        self.model
            .set_speed_command(dev_speed, &self.state.limits, &mut frame);
        frame
    }

    pub fn build_speed_query(&self) -> (ModbusFrame, ResponseParser) {
        let mut frame = ModbusFrame::empty();
        let parser = self.model.current_speed(&mut frame);
        (frame, parser)
    }

    pub fn build_direction_query(&self) -> (ModbusFrame, ResponseParser) {
        let mut frame = ModbusFrame::empty();
        let parser = self.model.current_direction(&mut frame);
        (frame, parser)
    }

    pub fn build_status_query(&self) -> (ModbusFrame, ResponseParser) {
        let mut frame = ModbusFrame::empty();
        let parser = self.model.status(&mut frame);
        (frame, parser)
    }

    /// Request and parser for init step `index` (-1, -2, ...), or `None`
    /// when the sequence is complete.
    pub fn next_init_step(&self, index: i32) -> Option<(ModbusFrame, ResponseParser)> {
        let mut frame = ModbusFrame::empty();
        self.model
            .initialization_sequence(index, &mut frame)
            .map(|parser| (frame, parser))
    }

    /// Apply a response with the parser returned alongside its request.
    pub fn handle_response(&mut self, parser: &ResponseParser, response: &[u8]) -> bool {
        parser.apply(response, &mut self.state)
    }

    /// # Errors
    ///
    /// Returns the framing, limits or device fault error from the parser.
    pub fn try_handle_response(
        &mut self,
        parser: &ResponseParser,
        response: &[u8],
    ) -> VfdResult<()> {
        parser.try_apply(response, &mut self.state)
    }

    /// True once both frequency limits are known and the speed map is set up.
    pub fn is_initialized(&self) -> bool {
        self.state.limits.is_complete()
            && self
                .state
                .speed_map
                .as_ref()
                .is_some_and(SpeedMap::is_setup)
    }

    /// Lowest and highest RPM the drive supports, once initialized.
    pub fn speed_range(&self) -> Option<(u32, u32)> {
        self.state
            .speed_map
            .as_ref()
            .filter(|map| map.is_setup())
            .map(|map| (map.min_rpm(), map.max_rpm()))
    }

    /// Whether the last reported speed is within the slop band of `rpm`.
    pub fn is_at_speed(&self, rpm: u32) -> bool {
        let Some(current) = self.state.current_speed else {
            return false;
        };
        current.abs_diff(self.map_speed(rpm)) <= self.state.slop
    }
}
