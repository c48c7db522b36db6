use crate::constants::{ModePhase, MODE_SCHEDULE};
use crate::types::GhostMode;

/// Shared Scatter/Chase timeline. Time left over when a phase expires is
/// dropped; the next phase starts from zero.
#[derive(Clone, Debug, Default)]
pub struct ModeSchedule {
    index: usize,
    elapsed_ms: f32,
}

impl ModeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn phase(&self) -> ModePhase {
        MODE_SCHEDULE[self.index]
    }

    pub fn current(&self) -> GhostMode {
        self.phase().mode
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the new mode when this advance crossed into another phase.
    pub fn advance(&mut self, dt_ms: f32) -> Option<GhostMode> {
        self.elapsed_ms += dt_ms;
        let duration = self.phase().duration_ms?;
        if self.elapsed_ms < duration {
            return None;
        }
        self.elapsed_ms = 0.0;
        self.index = (self.index + 1) % MODE_SCHEDULE.len();
        Some(self.current())
    }
}
