use crate::types::{Direction, SoundCue};

/// Directional input sampled once per tick before the player moves.
pub trait InputSource {
    /// Highest-priority direction currently held, `Direction::None` if nothing is.
    fn held_direction(&self) -> Direction;
    fn last_pressed(&self) -> Direction;
}

/// Fire-and-forget notifications. Implementations must not block the tick.
pub trait AudioSink: Send {
    fn play(&mut self, cue: SoundCue);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Key state fed by press/release notifications. Held keys resolve with
/// priority Up, Down, Left, Right.
#[derive(Clone, Debug, Default)]
pub struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    last: Option<Direction>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, dir: Direction, down: bool) {
        let slot = match dir {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::None => return,
        };
        *slot = down;
        if down {
            self.last = Some(dir);
        }
    }

    pub fn release_all(&mut self) {
        *self = Self {
            last: self.last,
            ..Self::default()
        };
    }
}

impl InputSource for HeldKeys {
    fn held_direction(&self) -> Direction {
        if self.up {
            Direction::Up
        } else if self.down {
            Direction::Down
        } else if self.left {
            Direction::Left
        } else if self.right {
            Direction::Right
        } else {
            Direction::None
        }
    }

    fn last_pressed(&self) -> Direction {
        self.last.unwrap_or(Direction::None)
    }
}
