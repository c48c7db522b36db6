use std::collections::VecDeque;

use crate::rng::Rng;
use crate::types::{Direction, TilePosition};

/// Bounded grid that can answer passability questions.
pub trait Passable {
    /// (rows, cols)
    fn dimensions(&self) -> (i32, i32);
    fn is_passable(&self, tile: TilePosition) -> bool;

    fn contains(&self, tile: TilePosition) -> bool {
        let (rows, cols) = self.dimensions();
        tile.row >= 0 && tile.col >= 0 && tile.row < rows && tile.col < cols
    }
}

/// Breadth-first distance in steps, `None` when `target` cannot be reached from `start`.
pub fn shortest_path_length<G: Passable + ?Sized>(
    grid: &G,
    start: TilePosition,
    target: TilePosition,
) -> Option<u32> {
    if start == target {
        return Some(0);
    }
    if !grid.contains(start) || !grid.contains(target) {
        return None;
    }

    let (rows, cols) = grid.dimensions();
    let index = |tile: TilePosition| (tile.row * cols + tile.col) as usize;
    let mut visited = vec![false; (rows * cols) as usize];
    let mut queue = VecDeque::new();
    visited[index(start)] = true;
    queue.push_back((start, 0u32));

    while let Some((tile, dist)) = queue.pop_front() {
        if tile == target {
            return Some(dist);
        }
        for dir in Direction::ALL {
            let next = tile.offset(dir, 1);
            if !grid.contains(next) || visited[index(next)] || !grid.is_passable(next) {
                continue;
            }
            visited[index(next)] = true;
            queue.push_back((next, dist + 1));
        }
    }

    None
}

/// Direction whose neighbouring tile is strictly closest to `target`; the first
/// candidate in `Direction::ALL` order wins ties. Reversal is excluded on the
/// first pass unless `allow_reverse`, and admitted on a second pass if the
/// first produced nothing.
pub fn best_direction<G: Passable + ?Sized>(
    grid: &G,
    current: TilePosition,
    target: TilePosition,
    current_dir: Direction,
    allow_reverse: bool,
) -> Direction {
    let passes: &[bool] = if allow_reverse { &[true] } else { &[false, true] };
    for &reverse_ok in passes {
        let mut best: Option<(u32, Direction)> = None;
        for dir in Direction::ALL {
            if !reverse_ok && dir.is_opposite(current_dir) {
                continue;
            }
            let next = current.offset(dir, 1);
            if !grid.is_passable(next) {
                continue;
            }
            let Some(dist) = shortest_path_length(grid, next, target) else {
                continue;
            };
            if best.map(|(best_dist, _)| dist < best_dist).unwrap_or(true) {
                best = Some((dist, dir));
            }
        }
        if let Some((_, dir)) = best {
            return dir;
        }
    }
    Direction::None
}

/// Uniform pick among passable non-reversing directions. Falls back to the
/// first passable direction (reversal included) and to `Direction::None` when
/// the tile is sealed.
pub fn random_valid_direction<G: Passable + ?Sized>(
    grid: &G,
    current: TilePosition,
    current_dir: Direction,
    rng: &mut Rng,
) -> Direction {
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| grid.is_passable(current.offset(*dir, 1)))
        .collect();
    let forward: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| !dir.is_opposite(current_dir))
        .collect();

    if forward.is_empty() {
        return open.first().copied().unwrap_or(Direction::None);
    }
    forward[rng.pick_index(forward.len())]
}

/// Tile reachable from `start` that lies closest (Manhattan) to `target`.
/// Ties go to the tile found first by the breadth-first walk, so the target
/// itself wins whenever it is reachable.
pub fn nearest_reachable_tile<G: Passable + ?Sized>(
    grid: &G,
    start: TilePosition,
    target: TilePosition,
) -> Option<TilePosition> {
    if !grid.contains(start) {
        return None;
    }

    let (rows, cols) = grid.dimensions();
    let index = |tile: TilePosition| (tile.row * cols + tile.col) as usize;
    let mut visited = vec![false; (rows * cols) as usize];
    let mut queue = VecDeque::new();
    visited[index(start)] = true;
    queue.push_back(start);
    let mut best = (start.manhattan(target), start);

    while let Some(tile) = queue.pop_front() {
        let dist = tile.manhattan(target);
        if dist < best.0 {
            best = (dist, tile);
            if dist == 0 {
                break;
            }
        }
        for dir in Direction::ALL {
            let next = tile.offset(dir, 1);
            if !grid.contains(next) || visited[index(next)] || !grid.is_passable(next) {
                continue;
            }
            visited[index(next)] = true;
            queue.push_back(next);
        }
    }

    Some(best.1)
}
