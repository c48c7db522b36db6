use crate::types::{Direction, Position, TilePosition};
use crate::world::Level;

/// Continuous position plus the tile it floors to. `tile` is only ever
/// written from `position`, except when the body is placed on a spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Position,
    pub tile: TilePosition,
    pub direction: Direction,
}

impl Body {
    pub fn at_tile(tile: TilePosition, direction: Direction) -> Self {
        Self {
            position: tile.center(),
            tile,
            direction,
        }
    }

    pub fn distance_to_tile_center(&self) -> f32 {
        let center = self.tile.center();
        (self.position.x - center.x).abs() + (self.position.y - center.y).abs()
    }

    pub fn snap_to_tile_center(&mut self) {
        self.position = self.tile.center();
    }
}

/// Moves `body` `distance` units along its direction. A move whose destination
/// tile is impassable is dropped and the body stops on its current tile
/// center. Returns whether the body moved.
pub(super) fn advance(body: &mut Body, distance: f32, level: &Level) -> bool {
    if body.direction == Direction::None {
        body.snap_to_tile_center();
        return false;
    }

    let (dx, dy) = body.direction.vector();
    let mut next = Position {
        x: body.position.x + dx as f32 * distance,
        y: body.position.y + dy as f32 * distance,
    };
    let mut next_tile = TilePosition::from_position(next);

    if let Some(wrapped) = tunnel_wrap(next_tile, level) {
        next.x = wrapped.center().x;
        next_tile = wrapped;
    }

    if !level.can_pass(next_tile.row, next_tile.col) {
        body.direction = Direction::None;
        body.snap_to_tile_center();
        return false;
    }

    body.position = next;
    body.tile = next_tile;
    let center = body.tile.center();
    if body.direction.is_horizontal() {
        body.position.y = center.y;
    } else {
        body.position.x = center.x;
    }
    true
}

/// Tile on the opposite edge when `tile` has just left the grid sideways on
/// a row whose far edge is open.
fn tunnel_wrap(tile: TilePosition, level: &Level) -> Option<TilePosition> {
    if tile.row < 0 || tile.row >= level.height() {
        return None;
    }
    if tile.col >= 0 && tile.col < level.width() {
        return None;
    }
    let col = if tile.col < 0 { level.width() - 1 } else { 0 };
    level
        .can_pass(tile.row, col)
        .then_some(TilePosition::new(tile.row, col))
}

pub(super) fn distance_per_tick(speed: f32, dt_ms: f32) -> f32 {
    speed * (dt_ms / 1000.0)
}
