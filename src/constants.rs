use crate::types::{GhostMode, TilePosition};

pub const TICK_RATE: u32 = 60;
pub const FRAME_MS: f32 = 1000.0 / TICK_RATE as f32;
/// Longer host deltas are split into sub-steps no larger than this.
pub const MAX_STEP_MS: f32 = 50.0;
/// Upper bound on the delta one `step` call will simulate; a longer host stall
/// is dropped rather than replayed.
pub const MAX_FRAME_DELTA_MS: f32 = MAX_STEP_MS * 5.0;

pub const TILE_SIZE: f32 = 20.0;
pub const MAZE_WIDTH: i32 = 28;
pub const MAZE_HEIGHT: i32 = 31;

// Units per second.
pub const PLAYER_SPEED: f32 = 80.0;
pub const GHOST_SPEED: f32 = 75.0;
pub const FRIGHTENED_GHOST_SPEED: f32 = 50.0;
pub const EATEN_GHOST_SPEED: f32 = 100.0;

pub const INITIAL_LIVES: i32 = 3;
pub const PELLET_SCORE: i32 = 10;
pub const POWER_PELLET_SCORE: i32 = 50;
pub const LEVEL_CLEAR_BONUS: i32 = 1_000;
pub const FRIGHTENED_DURATION_MS: f32 = 6_000.0;
pub const FRIGHTENED_GHOST_SCORES: [i32; 4] = [200, 400, 800, 1_600];
pub const GHOST_RELEASE_INTERVAL_MS: f32 = 2_000.0;

pub const INTERSECTION_TOLERANCE: f32 = TILE_SIZE * 0.2;
pub const COLLISION_DISTANCE: f32 = TILE_SIZE * 0.8;

pub const AMBUSH_LOOKAHEAD_TILES: i32 = 4;
pub const SHY_GHOST_FLEE_DISTANCE: i32 = 8;

pub const GHOST_HOUSE_CENTER: TilePosition = TilePosition { row: 14, col: 13 };
pub const GHOST_HOUSE_EXIT: TilePosition = TilePosition { row: 11, col: 13 };
pub const FALLBACK_PLAYER_SPAWN: TilePosition = TilePosition { row: 23, col: 13 };
pub const FALLBACK_GHOST_SPAWN: TilePosition = TilePosition { row: 11, col: 13 };

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModePhase {
    pub mode: GhostMode,
    /// `None` never expires.
    pub duration_ms: Option<f32>,
}

pub const MODE_SCHEDULE: [ModePhase; 8] = [
    ModePhase {
        mode: GhostMode::Scatter,
        duration_ms: Some(7_000.0),
    },
    ModePhase {
        mode: GhostMode::Chase,
        duration_ms: Some(20_000.0),
    },
    ModePhase {
        mode: GhostMode::Scatter,
        duration_ms: Some(7_000.0),
    },
    ModePhase {
        mode: GhostMode::Chase,
        duration_ms: Some(20_000.0),
    },
    ModePhase {
        mode: GhostMode::Scatter,
        duration_ms: Some(5_000.0),
    },
    ModePhase {
        mode: GhostMode::Chase,
        duration_ms: Some(20_000.0),
    },
    ModePhase {
        mode: GhostMode::Scatter,
        duration_ms: Some(5_000.0),
    },
    ModePhase {
        mode: GhostMode::Chase,
        duration_ms: None,
    },
];

pub fn ghost_capture_score(captured_so_far: usize) -> i32 {
    let idx = captured_so_far.min(FRIGHTENED_GHOST_SCORES.len() - 1);
    FRIGHTENED_GHOST_SCORES[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_score_saturates_at_last_entry() {
        assert_eq!(ghost_capture_score(0), 200);
        assert_eq!(ghost_capture_score(1), 400);
        assert_eq!(ghost_capture_score(2), 800);
        assert_eq!(ghost_capture_score(3), 1_600);
        assert_eq!(ghost_capture_score(4), 1_600);
        assert_eq!(ghost_capture_score(40), 1_600);
    }

    #[test]
    fn mode_schedule_alternates_and_ends_in_endless_chase() {
        for (idx, phase) in MODE_SCHEDULE.iter().enumerate() {
            let expected = if idx % 2 == 0 {
                GhostMode::Scatter
            } else {
                GhostMode::Chase
            };
            assert_eq!(phase.mode, expected);
        }
        let last = MODE_SCHEDULE.last().expect("schedule is not empty");
        assert_eq!(last.duration_ms, None);
        assert!(MODE_SCHEDULE[..MODE_SCHEDULE.len() - 1]
            .iter()
            .all(|phase| phase.duration_ms.is_some()));
    }
}
