use std::fs;
use std::io;
use std::path::Path;

use crate::constants::{FALLBACK_GHOST_SPAWN, FALLBACK_PLAYER_SPAWN, MAZE_HEIGHT, MAZE_WIDTH};
use crate::pathfinding::Passable;
use crate::types::{Direction, TileKind, TilePosition};

const DEFAULT_LAYOUT: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###==### ##.#     ",
    "######.## #      # ##.######",
    "      .   # GGGG #   .      ",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##................##..o#",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "#o########################o#",
    "############################",
];

/// The classic maze, with a player spawn marker injected when the layout lacks one.
pub fn default_layout() -> Vec<String> {
    let mut rows: Vec<String> = DEFAULT_LAYOUT.iter().map(|row| row.to_string()).collect();
    if !rows.iter().any(|row| row.contains('P')) {
        let spawn = FALLBACK_PLAYER_SPAWN;
        if let Some(row) = rows.get_mut(spawn.row as usize) {
            let mut chars: Vec<char> = row.chars().collect();
            if let Some(cell) = chars.get_mut(spawn.col as usize) {
                *cell = 'P';
            }
            *row = chars.into_iter().collect();
        }
    }
    rows
}

pub fn load_layout(path: &Path) -> io::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    let rows: Vec<String> = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    if rows.iter().all(|row| row.is_empty()) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("layout {} has no rows", path.display()),
        ));
    }
    Ok(rows)
}

/// Static maze geometry plus the mutable pellet state of one round.
#[derive(Clone, Debug)]
pub struct Level {
    width: i32,
    height: i32,
    tiles: Vec<TileKind>,
    pellet_count: usize,
    pub player_spawn: TilePosition,
    pub ghost_spawn: TilePosition,
}

impl Level {
    pub fn parse(rows: &[String]) -> Self {
        Self::with_size(rows, MAZE_WIDTH, MAZE_HEIGHT)
    }

    /// Rows shorter than `width` (and missing rows) are filled with empty tiles.
    pub fn with_size(rows: &[String], width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut tiles = Vec::with_capacity((width * height) as usize);
        let mut pellet_count = 0;
        let mut player_spawn = None;
        let mut ghost_spawn = None;

        for row in 0..height {
            let mut chars = rows
                .get(row as usize)
                .map(|line| line.chars())
                .into_iter()
                .flatten();
            for col in 0..width {
                let kind = TileKind::from_char(chars.next().unwrap_or(' '));
                match kind {
                    TileKind::Pellet | TileKind::PowerPellet => pellet_count += 1,
                    TileKind::GhostSpawn => ghost_spawn = Some(TilePosition::new(row, col)),
                    TileKind::PlayerSpawn => player_spawn = Some(TilePosition::new(row, col)),
                    _ => {}
                }
                tiles.push(kind);
            }
        }

        Self {
            width,
            height,
            tiles,
            pellet_count,
            player_spawn: player_spawn.unwrap_or(FALLBACK_PLAYER_SPAWN),
            ghost_spawn: ghost_spawn.unwrap_or(FALLBACK_GHOST_SPAWN),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && row < self.height && col < self.width
    }

    pub fn tile_at(&self, row: i32, col: i32) -> TileKind {
        if !self.in_bounds(row, col) {
            return TileKind::Wall;
        }
        self.tiles[(row * self.width + col) as usize]
    }

    /// Gates are open to every agent.
    pub fn can_pass(&self, row: i32, col: i32) -> bool {
        self.tile_at(row, col) != TileKind::Wall
    }

    /// Returns whether the removed tile was a power pellet; non-pellet tiles are left alone.
    pub fn remove_pellet(&mut self, row: i32, col: i32) -> bool {
        let tile = self.tile_at(row, col);
        if !tile.is_pellet() {
            return false;
        }
        self.tiles[(row * self.width + col) as usize] = TileKind::Empty;
        self.pellet_count -= 1;
        tile == TileKind::PowerPellet
    }

    pub fn remaining_pellets(&self) -> usize {
        self.pellet_count
    }

    /// Adjacent tile, wrapping across the left/right edge on rows whose edge
    /// tiles form a tunnel.
    pub fn neighbor(&self, tile: TilePosition, dir: Direction) -> TilePosition {
        let next = tile.offset(dir, 1);
        if next.row < 0 || next.row >= self.height {
            return next;
        }
        if next.col < 0 || next.col >= self.width {
            let wrapped = TilePosition::new(next.row, next.col.rem_euclid(self.width));
            if self.can_pass(wrapped.row, wrapped.col) {
                return wrapped;
            }
        }
        next
    }

    pub fn pellet_tiles(&self) -> Vec<TilePosition> {
        let mut out = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                if self.tile_at(row, col).is_pellet() {
                    out.push(TilePosition::new(row, col));
                }
            }
        }
        out
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|tile| tile.to_char()).collect())
            .collect()
    }
}

impl Passable for Level {
    fn dimensions(&self) -> (i32, i32) {
        (self.height, self.width)
    }

    fn is_passable(&self, tile: TilePosition) -> bool {
        self.can_pass(tile.row, tile.col)
    }
}
