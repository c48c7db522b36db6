use crate::constants::PLAYER_SPEED;
use crate::types::{Direction, PlayerView, TilePosition};
use crate::world::Level;

use super::utils::{advance, distance_per_tick, Body};

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub next_direction: Direction,
}

impl Player {
    pub fn new(spawn: TilePosition) -> Self {
        Self {
            body: Body::at_tile(spawn, Direction::None),
            next_direction: Direction::None,
        }
    }

    pub fn reset(&mut self, spawn: TilePosition) {
        *self = Self::new(spawn);
    }

    pub fn tile(&self) -> TilePosition {
        self.body.tile
    }

    pub fn direction(&self) -> Direction {
        self.body.direction
    }

    pub fn update(&mut self, dt_ms: f32, level: &Level) {
        let wanted = self.next_direction;
        if wanted != Direction::None && wanted != self.body.direction && self.can_enter(wanted, level) {
            self.body.direction = wanted;
        }
        if self.body.direction == Direction::None && wanted != Direction::None && self.can_enter(wanted, level) {
            self.body.direction = wanted;
        }

        advance(&mut self.body, distance_per_tick(PLAYER_SPEED, dt_ms), level);
        if self.body.direction == Direction::None {
            self.body.snap_to_tile_center();
        }
    }

    fn can_enter(&self, dir: Direction, level: &Level) -> bool {
        let next = level.neighbor(self.body.tile, dir);
        level.can_pass(next.row, next.col)
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.body.position.x,
            y: self.body.position.y,
            row: self.body.tile.row,
            col: self.body.tile.col,
            dir: self.body.direction,
            next_dir: self.next_direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FRAME_MS, TILE_SIZE};
    use crate::world::default_layout;

    fn classic() -> Level {
        Level::parse(&default_layout())
    }

    #[test]
    fn buffered_turn_applies_as_soon_as_the_side_tile_opens() {
        let level = classic();
        // Row 5 is a long open corridor; (4,6) above column 6 is open too.
        let mut player = Player::new(TilePosition::new(5, 5));
        player.next_direction = Direction::Right;
        player.update(FRAME_MS, &level);
        assert_eq!(player.direction(), Direction::Right);

        player.next_direction = Direction::Up;
        // (4,5) is a wall, so the buffered Up waits.
        player.update(FRAME_MS, &level);
        assert_eq!(player.direction(), Direction::Right);

        for _ in 0..30 {
            player.update(FRAME_MS, &level);
            if player.direction() == Direction::Up {
                break;
            }
        }
        assert_eq!(player.direction(), Direction::Up);
        assert_eq!(player.body.position.x, TilePosition::new(5, 6).center().x);
    }

    #[test]
    fn walking_into_a_wall_stops_on_tile_center() {
        let level = classic();
        let mut player = Player::new(TilePosition::new(1, 2));
        player.next_direction = Direction::Left;
        for _ in 0..120 {
            player.update(FRAME_MS, &level);
        }
        assert_eq!(player.tile(), TilePosition::new(1, 1));
        assert_eq!(player.direction(), Direction::None);
        assert_eq!(player.body.position, TilePosition::new(1, 1).center());
    }

    #[test]
    fn stationary_player_with_blocked_input_stays_centered() {
        let level = classic();
        let mut player = Player::new(TilePosition::new(1, 1));
        player.body.position.x += 1.25;
        player.next_direction = Direction::Up;
        player.update(FRAME_MS, &level);
        assert_eq!(player.direction(), Direction::None);
        assert_eq!(player.body.position, TilePosition::new(1, 1).center());
    }

    #[test]
    fn travel_distance_is_independent_of_frame_rate() {
        let level = classic();
        let mut coarse = Player::new(TilePosition::new(5, 1));
        let mut fine = Player::new(TilePosition::new(5, 1));
        coarse.next_direction = Direction::Right;
        fine.next_direction = Direction::Right;

        for _ in 0..10 {
            coarse.update(50.0, &level);
        }
        for _ in 0..50 {
            fine.update(10.0, &level);
        }
        assert!((coarse.body.position.x - fine.body.position.x).abs() < 0.01);
        // 80 units per second for half a second.
        let start = TilePosition::new(5, 1).center().x;
        assert!((coarse.body.position.x - (start + 40.0)).abs() < 0.01);
        assert_eq!(coarse.tile(), TilePosition::new(5, 3));
        assert!(coarse.body.position.x < 4.0 * TILE_SIZE);
    }

    #[test]
    fn turning_into_the_tunnel_wraps_to_the_far_side() {
        let level = classic();
        let mut player = Player::new(TilePosition::new(14, 1));
        player.next_direction = Direction::Left;
        for _ in 0..40 {
            player.update(FRAME_MS, &level);
        }
        assert_eq!(player.tile().row, 14);
        assert!(player.tile().col > 20);
        assert_eq!(player.direction(), Direction::Left);
    }

    #[test]
    fn reset_restores_spawn_and_clears_input() {
        let level = classic();
        let spawn = TilePosition::new(23, 13);
        let mut player = Player::new(spawn);
        player.next_direction = Direction::Left;
        for _ in 0..20 {
            player.update(FRAME_MS, &level);
        }
        assert_ne!(player.body.position, spawn.center());
        player.reset(spawn);
        assert_eq!(player.body.position, spawn.center());
        assert_eq!(player.direction(), Direction::None);
        assert_eq!(player.next_direction, Direction::None);
    }
}
