use crate::constants::{
    AMBUSH_LOOKAHEAD_TILES, EATEN_GHOST_SPEED, FRIGHTENED_GHOST_SPEED, GHOST_HOUSE_CENTER,
    GHOST_HOUSE_EXIT, GHOST_RELEASE_INTERVAL_MS, GHOST_SPEED, INTERSECTION_TOLERANCE,
    SHY_GHOST_FLEE_DISTANCE,
};
use crate::pathfinding::{best_direction, nearest_reachable_tile, random_valid_direction};
use crate::rng::Rng;
use crate::types::{Direction, GhostMode, GhostState, GhostView, TilePosition};
use crate::world::Level;

use super::utils::{advance, distance_per_tick, Body};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Personality {
    /// Heads straight for the player.
    Blip,
    /// Aims ahead of the player's facing.
    Chomp,
    /// Mirrors a partner ghost through the player.
    Zing,
    /// Chases from afar, retreats to its corner up close.
    Grit,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Blip,
        Personality::Chomp,
        Personality::Zing,
        Personality::Grit,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Blip => 0,
            Self::Chomp => 1,
            Self::Zing => 2,
            Self::Grit => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blip => "Blip",
            Self::Chomp => "Chomp",
            Self::Zing => "Zing",
            Self::Grit => "Grit",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Blip => "#FF0000",
            Self::Chomp => "#FFB8FF",
            Self::Zing => "#00FFFF",
            Self::Grit => "#FFB851",
        }
    }

    /// Fixed corner. Zing's lies on the boundary wall row; steering resolves it
    /// to the nearest open tile.
    pub fn scatter_target(self) -> TilePosition {
        match self {
            Self::Blip => TilePosition::new(3, 26),
            Self::Chomp => TilePosition::new(3, 1),
            Self::Zing => TilePosition::new(30, 26),
            Self::Grit => TilePosition::new(30, 1),
        }
    }

    pub fn release_delay_ms(self) -> f32 {
        self.index() as f32 * GHOST_RELEASE_INTERVAL_MS
    }

    /// Raw chase tile. May fall outside the grid or on a wall.
    pub fn chase_target(self, own_tile: TilePosition, ctx: &ChaseContext) -> TilePosition {
        let player = ctx.player_tile;
        match self {
            Self::Blip => player,
            Self::Chomp => {
                if ctx.player_dir == Direction::None {
                    player
                } else {
                    player.offset(ctx.player_dir, AMBUSH_LOOKAHEAD_TILES)
                }
            }
            Self::Zing => match ctx.partner_tile {
                Some(partner) => TilePosition::new(
                    player.row + (player.row - partner.row),
                    player.col + (player.col - partner.col),
                ),
                None => player,
            },
            Self::Grit => {
                if own_tile.manhattan(player) > SHY_GHOST_FLEE_DISTANCE {
                    player
                } else {
                    self.scatter_target()
                }
            }
        }
    }
}

/// Read-only view of the rest of the board a ghost needs to pick its target.
#[derive(Clone, Copy, Debug)]
pub struct ChaseContext {
    pub player_tile: TilePosition,
    pub player_dir: Direction,
    /// Tile of the first ghost in the roster whose personality differs.
    pub partner_tile: Option<TilePosition>,
}

#[derive(Clone, Copy, Debug)]
enum Heading {
    Seek {
        target: TilePosition,
        allow_reverse: bool,
    },
    Wander {
        target: TilePosition,
    },
}

impl Heading {
    fn target(self) -> TilePosition {
        match self {
            Self::Seek { target, .. } | Self::Wander { target } => target,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub personality: Personality,
    pub body: Body,
    pub state: GhostState,
    pub in_house: bool,
    pub frightened_ms: f32,
    pub eaten_multiplier: u32,
    pub release_ms: f32,
}

impl Ghost {
    pub fn new(personality: Personality, spawn: TilePosition, mode: GhostMode) -> Self {
        Self {
            personality,
            body: Body::at_tile(spawn, Direction::Up),
            state: mode.into(),
            in_house: true,
            frightened_ms: 0.0,
            eaten_multiplier: 1,
            release_ms: personality.release_delay_ms(),
        }
    }

    pub fn reset(&mut self, spawn: TilePosition, mode: GhostMode) {
        *self = Self::new(self.personality, spawn, mode);
    }

    pub fn tile(&self) -> TilePosition {
        self.body.tile
    }

    pub fn direction(&self) -> Direction {
        self.body.direction
    }

    /// Global schedule switch. Frightened and eaten ghosts ignore it.
    pub fn apply_mode(&mut self, mode: GhostMode) {
        if !matches!(self.state, GhostState::Frightened | GhostState::Eaten) {
            self.state = mode.into();
        }
    }

    pub fn set_frightened(&mut self, duration_ms: f32) {
        if self.state == GhostState::Eaten {
            return;
        }
        self.state = GhostState::Frightened;
        self.frightened_ms = duration_ms;
        self.body.direction = self.body.direction.opposite();
    }

    pub fn set_eaten(&mut self, multiplier: u32) {
        self.state = GhostState::Eaten;
        self.frightened_ms = 0.0;
        self.eaten_multiplier = multiplier;
    }

    pub fn update(
        &mut self,
        dt_ms: f32,
        level: &Level,
        ctx: &ChaseContext,
        mode: GhostMode,
        rng: &mut Rng,
    ) {
        self.tick_state(dt_ms, mode);

        if self.state == GhostState::Eaten {
            if self.body.tile != GHOST_HOUSE_CENTER {
                let heading = Heading::Seek {
                    target: GHOST_HOUSE_CENTER,
                    allow_reverse: true,
                };
                self.steer(dt_ms, level, heading, rng);
                return;
            }
            self.in_house = true;
            self.state = mode.into();
            self.eaten_multiplier = 1;
        }

        if self.in_house {
            if self.release_ms > 0.0 {
                self.release_ms -= dt_ms;
                return;
            }
            if self.body.tile != GHOST_HOUSE_EXIT {
                let heading = Heading::Seek {
                    target: GHOST_HOUSE_EXIT,
                    allow_reverse: true,
                };
                self.steer(dt_ms, level, heading, rng);
                return;
            }
            self.in_house = false;
        }

        let heading = match self.state {
            GhostState::Frightened => {
                let raw = TilePosition::new(
                    rng.int(0, level.height() - 1),
                    rng.int(0, level.width() - 1),
                );
                Heading::Wander {
                    target: resolve_target(level, self.body.tile, raw),
                }
            }
            GhostState::Scatter => Heading::Seek {
                target: resolve_target(level, self.body.tile, self.personality.scatter_target()),
                allow_reverse: false,
            },
            GhostState::Chase | GhostState::Eaten => {
                let raw = self.personality.chase_target(self.body.tile, ctx);
                Heading::Seek {
                    target: resolve_target(level, self.body.tile, raw),
                    allow_reverse: false,
                }
            }
        };
        self.steer(dt_ms, level, heading, rng);
    }

    fn tick_state(&mut self, dt_ms: f32, mode: GhostMode) {
        if self.state == GhostState::Eaten {
            return;
        }
        if self.frightened_ms > 0.0 {
            self.frightened_ms -= dt_ms;
            if self.frightened_ms <= 0.0 {
                self.frightened_ms = 0.0;
                self.state = mode.into();
            } else {
                self.state = GhostState::Frightened;
            }
        } else {
            self.state = mode.into();
        }
    }

    fn speed(&self) -> f32 {
        match self.state {
            GhostState::Eaten => EATEN_GHOST_SPEED,
            GhostState::Frightened => FRIGHTENED_GHOST_SPEED,
            GhostState::Scatter | GhostState::Chase => GHOST_SPEED,
        }
    }

    fn steer(&mut self, dt_ms: f32, level: &Level, heading: Heading, rng: &mut Rng) {
        let tile = self.body.tile;
        if self.body.distance_to_tile_center() < INTERSECTION_TOLERANCE {
            self.body.direction = match heading {
                Heading::Seek {
                    target,
                    allow_reverse,
                } => best_direction(level, tile, target, self.body.direction, allow_reverse),
                Heading::Wander { .. } => {
                    random_valid_direction(level, tile, self.body.direction, rng)
                }
            };
        }

        let travelling = self.body.direction;
        if travelling == Direction::None {
            self.body.snap_to_tile_center();
            return;
        }
        let step = distance_per_tick(self.speed(), dt_ms);
        if !advance(&mut self.body, step, level) {
            self.body.direction =
                best_direction(level, self.body.tile, heading.target(), travelling, true);
        }
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            name: self.personality.name(),
            color: self.personality.color(),
            personality: self.personality.index(),
            x: self.body.position.x,
            y: self.body.position.y,
            row: self.body.tile.row,
            col: self.body.tile.col,
            dir: self.body.direction,
            state: self.state,
            in_house: self.in_house,
            frightened_ms: self.frightened_ms,
        }
    }
}

fn resolve_target(level: &Level, from: TilePosition, raw: TilePosition) -> TilePosition {
    nearest_reachable_tile(level, from, raw).unwrap_or(raw)
}
