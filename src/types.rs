use serde::Serialize;

use crate::constants::TILE_SIZE;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Fixed evaluation order for every directional search.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self != Self::None && other != Self::None && self.opposite() == other
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// (d_col, d_row)
    pub fn vector(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Pellet,
    PowerPellet,
    Empty,
    GhostSpawn,
    PlayerSpawn,
    Gate,
}

impl TileKind {
    pub fn from_char(c: char) -> Self {
        match c {
            '#' => Self::Wall,
            '.' => Self::Pellet,
            'o' => Self::PowerPellet,
            'G' => Self::GhostSpawn,
            'P' => Self::PlayerSpawn,
            '=' => Self::Gate,
            _ => Self::Empty,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Pellet => '.',
            Self::PowerPellet => 'o',
            Self::GhostSpawn => 'G',
            Self::PlayerSpawn => 'P',
            Self::Gate => '=',
            Self::Empty => ' ',
        }
    }

    pub fn is_pellet(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TilePosition {
    pub row: i32,
    pub col: i32,
}

impl TilePosition {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn from_position(position: Position) -> Self {
        Self {
            row: (position.y / TILE_SIZE).floor() as i32,
            col: (position.x / TILE_SIZE).floor() as i32,
        }
    }

    pub fn center(self) -> Position {
        Position {
            x: self.col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            y: self.row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        }
    }

    pub fn offset(self, dir: Direction, steps: i32) -> Self {
        let (dc, dr) = dir.vector();
        Self {
            row: self.row + dr * steps,
            col: self.col + dc * steps,
        }
    }

    pub fn manhattan(self, other: TilePosition) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

/// Continuous coordinate in tile-size units; the origin is the maze's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn distance(self, other: Position) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Globally scheduled phase shared by every ghost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    Scatter,
    Chase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

impl From<GhostMode> for GhostState {
    fn from(mode: GhostMode) -> Self {
        match mode {
            GhostMode::Scatter => Self::Scatter,
            GhostMode::Chase => Self::Chase,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Title,
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Pellet,
    PowerPellet,
    GhostEaten,
    PlayerDied,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "initialLives")]
    pub initial_lives: i32,
    #[serde(rename = "frightenedDurationMs")]
    pub frightened_duration_ms: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub row: i32,
    pub col: i32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub name: &'static str,
    pub color: &'static str,
    pub personality: usize,
    pub x: f32,
    pub y: f32,
    pub row: i32,
    pub col: i32,
    pub dir: Direction,
    pub state: GhostState,
    #[serde(rename = "inHouse")]
    pub in_house: bool,
    #[serde(rename = "frightenedMs")]
    pub frightened_ms: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        row: i32,
        col: i32,
    },
    PowerPelletEaten {
        row: i32,
        col: i32,
    },
    GhostEaten {
        ghost: &'static str,
        points: i32,
    },
    PlayerDied {
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    RoundCleared {
        round: u32,
        bonus: i32,
    },
    ModeChanged {
        mode: GhostMode,
    },
    GameOver {
        score: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub state: GameState,
    pub score: i32,
    #[serde(rename = "highScore")]
    pub high_score: i32,
    pub lives: i32,
    pub round: u32,
    pub mode: GhostMode,
    #[serde(rename = "remainingPellets")]
    pub remaining_pellets: usize,
    pub tiles: Vec<String>,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}
