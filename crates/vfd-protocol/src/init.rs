//! Initialization sequencing.
//!
//! Steps are numbered -1, -2, ... and run in that order. A step only
//! advances once its response has been applied; a failed step is repeated.

use crate::frame::ModbusFrame;
use crate::parser::ResponseParser;
use crate::spindle::VfdSpindle;
use tracing::{debug, info, warn};

/// Index of the first initialization step.
pub const FIRST_INDEX: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// No step has been issued yet.
    Pending,
    /// A step has been issued or applied, more remain.
    InProgress,
    /// Every step has been applied.
    Ready,
    /// The last step's response was rejected. The next call to
    /// [`InitSequencer::next_step`] repeats it.
    Failed,
}

/// One request of the sequence and the parser for its reply.
#[derive(Debug, Clone, Copy)]
pub struct InitStep {
    pub index: i32,
    pub frame: ModbusFrame,
    pub parser: ResponseParser,
}

#[derive(Debug, Clone)]
pub struct InitSequencer {
    index: i32,
    state: InitState,
}

impl Default for InitSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl InitSequencer {
    pub fn new() -> Self {
        Self {
            index: FIRST_INDEX,
            state: InitState::Pending,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn is_ready(&self) -> bool {
        self.state == InitState::Ready
    }

    /// The step to send next, or `None` once the model has no more steps.
    pub fn next_step(&mut self, spindle: &VfdSpindle) -> Option<InitStep> {
        if self.state == InitState::Ready {
            return None;
        }

        match spindle.next_init_step(self.index) {
            Some((frame, parser)) => {
                debug!(
                    model = spindle.name(),
                    index = self.index,
                    parser = parser.name(),
                    "init step"
                );
                self.state = InitState::InProgress;
                Some(InitStep {
                    index: self.index,
                    frame,
                    parser,
                })
            }
            None => {
                info!(model = spindle.name(), "VFD initialization complete");
                self.state = InitState::Ready;
                None
            }
        }
    }

    /// Record the outcome of the current step.
    pub fn record(&mut self, ok: bool) {
        if self.state == InitState::Ready {
            return;
        }
        if ok {
            self.index = self.index.saturating_sub(1);
            self.state = InitState::InProgress;
        } else {
            warn!(index = self.index, "VFD init step failed, will retry");
            self.state = InitState::Failed;
        }
    }

    /// Apply `response` to `spindle` with the step's parser and record the
    /// outcome.
    pub fn handle_response(
        &mut self,
        spindle: &mut VfdSpindle,
        step: &InitStep,
        response: &[u8],
    ) -> bool {
        let ok = spindle.handle_response(&step.parser, response);
        self.record(ok);
        ok
    }

    /// Start over from the first step.
    pub fn reset(&mut self) {
        self.index = FIRST_INDEX;
        self.state = InitState::Pending;
    }
}
