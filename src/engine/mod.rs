use crate::constants::{
    ghost_capture_score, COLLISION_DISTANCE, FRIGHTENED_DURATION_MS, INITIAL_LIVES,
    LEVEL_CLEAR_BONUS, MAX_FRAME_DELTA_MS, MAX_STEP_MS, PELLET_SCORE, POWER_PELLET_SCORE,
    TICK_RATE, TILE_SIZE,
};
use crate::high_score_store::HighScoreStore;
use crate::ports::{AudioSink, InputSource};
use crate::rng::Rng;
use crate::types::{
    GameConfig, GameState, GhostMode, GhostState, RuntimeEvent, Snapshot, SoundCue,
};
use crate::world::{default_layout, Level};

mod ghost;
mod mode_schedule;
mod player;
mod utils;

pub use self::ghost::{ChaseContext, Ghost, Personality};
pub use self::mode_schedule::ModeSchedule;
pub use self::player::Player;
pub use self::utils::Body;

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u64,
    pub initial_lives: i32,
    /// Maze rows; the classic maze when absent.
    pub layout: Option<Vec<String>>,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            initial_lives: INITIAL_LIVES,
            layout: None,
        }
    }
}

pub struct GameEngine {
    pub config: GameConfig,

    layout: Vec<String>,
    level: Level,
    player: Player,
    ghosts: Vec<Ghost>,
    modes: ModeSchedule,
    rng: Rng,
    events: Vec<RuntimeEvent>,
    high_scores: Box<dyn HighScoreStore>,
    audio: Box<dyn AudioSink>,

    state: GameState,
    score: i32,
    high_score: i32,
    lives: i32,
    round: u32,
    ghosts_eaten: usize,
    tick_counter: u64,
    round_pellets: usize,
    pellets_collected: usize,
}

impl GameEngine {
    pub fn new(
        options: GameEngineOptions,
        mut high_scores: Box<dyn HighScoreStore>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let layout = options.layout.unwrap_or_else(default_layout);
        let initial_lives = options.initial_lives.max(1);
        let level = Level::parse(&layout);
        let high_score = high_scores.load().max(0);

        let config = GameConfig {
            tick_rate: TICK_RATE,
            tile_size: TILE_SIZE,
            width: level.width(),
            height: level.height(),
            initial_lives,
            frightened_duration_ms: FRIGHTENED_DURATION_MS,
        };

        let mut engine = Self {
            config,
            player: Player::new(level.player_spawn),
            layout,
            level,
            ghosts: Vec::new(),
            modes: ModeSchedule::new(),
            rng: Rng::new(options.seed),
            events: Vec::new(),
            high_scores,
            audio,
            state: GameState::Title,
            score: 0,
            high_score,
            lives: initial_lives,
            round: 1,
            ghosts_eaten: 0,
            tick_counter: 0,
            round_pellets: 0,
            pellets_collected: 0,
        };
        engine.initialize_round();
        engine
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn high_score(&self) -> i32 {
        self.high_score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn mode(&self) -> GhostMode {
        self.modes.current()
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    /// Pellets on the board when the current round began.
    pub fn round_pellets(&self) -> usize {
        self.round_pellets
    }

    /// Pellets collected since the current round began.
    pub fn pellets_collected(&self) -> usize {
        self.pellets_collected
    }

    /// Resets score and lives and begins a fresh round. Only valid from the
    /// title screen or after game over.
    pub fn start_game(&mut self) {
        if !matches!(self.state, GameState::Title | GameState::GameOver) {
            return;
        }
        self.score = 0;
        self.lives = self.config.initial_lives;
        self.round = 1;
        self.initialize_round();
        self.state = GameState::Playing;
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            GameState::Playing => GameState::Paused,
            GameState::Paused => GameState::Playing,
            other => other,
        };
    }

    /// Advances the simulation by `dt_ms` of wall-clock time, clamped to
    /// `MAX_FRAME_DELTA_MS`. Does nothing unless playing or when `dt_ms` is not
    /// a positive finite number.
    pub fn step(&mut self, dt_ms: f32, input: &dyn InputSource) {
        if self.state != GameState::Playing || !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.tick_counter += 1;
        self.player.next_direction = input.held_direction();

        let mut remaining = dt_ms.min(MAX_FRAME_DELTA_MS);
        while remaining > 0.0 && self.state == GameState::Playing {
            let slice = remaining.min(MAX_STEP_MS);
            self.update(slice);
            remaining -= slice;
        }
    }

    fn update(&mut self, dt_ms: f32) {
        if let Some(mode) = self.modes.advance(dt_ms) {
            for ghost in &mut self.ghosts {
                ghost.apply_mode(mode);
            }
            self.events.push(RuntimeEvent::ModeChanged { mode });
        }

        self.player.update(dt_ms, &self.level);
        self.collect_pellet();
        self.update_ghosts(dt_ms);
        self.resolve_collisions();

        if self.state == GameState::Playing
            && self.round_pellets > 0
            && self.level.remaining_pellets() == 0
        {
            self.score += LEVEL_CLEAR_BONUS;
            self.events.push(RuntimeEvent::RoundCleared {
                round: self.round,
                bonus: LEVEL_CLEAR_BONUS,
            });
            self.round += 1;
            self.initialize_round();
        }

        self.update_high_score();
    }

    fn collect_pellet(&mut self) {
        let tile = self.player.tile();
        if !self.level.tile_at(tile.row, tile.col).is_pellet() {
            return;
        }
        let was_power = self.level.remove_pellet(tile.row, tile.col);
        self.pellets_collected += 1;

        if was_power {
            self.score += POWER_PELLET_SCORE;
            self.audio.play(SoundCue::PowerPellet);
            self.events.push(RuntimeEvent::PowerPelletEaten {
                row: tile.row,
                col: tile.col,
            });
            self.activate_frightened_mode();
        } else {
            self.score += PELLET_SCORE;
            self.audio.play(SoundCue::Pellet);
            self.events.push(RuntimeEvent::PelletEaten {
                row: tile.row,
                col: tile.col,
            });
        }
    }

    fn activate_frightened_mode(&mut self) {
        self.ghosts_eaten = 0;
        for ghost in &mut self.ghosts {
            ghost.set_frightened(FRIGHTENED_DURATION_MS);
        }
    }

    fn update_ghosts(&mut self, dt_ms: f32) {
        let mode = self.modes.current();
        for idx in 0..self.ghosts.len() {
            let personality = self.ghosts[idx].personality;
            let partner_tile = self
                .ghosts
                .iter()
                .find(|other| other.personality != personality)
                .map(Ghost::tile);
            let ctx = ChaseContext {
                player_tile: self.player.tile(),
                player_dir: self.player.direction(),
                partner_tile,
            };
            self.ghosts[idx].update(dt_ms, &self.level, &ctx, mode, &mut self.rng);
        }
    }

    fn resolve_collisions(&mut self) {
        let player_at = self.player.body.position;
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].body.position.distance(player_at) >= COLLISION_DISTANCE {
                continue;
            }
            match self.ghosts[idx].state {
                GhostState::Frightened => {
                    let points = ghost_capture_score(self.ghosts_eaten);
                    self.score += points;
                    self.ghosts_eaten += 1;
                    self.audio.play(SoundCue::GhostEaten);
                    let ghost = &mut self.ghosts[idx];
                    ghost.set_eaten(self.ghosts_eaten as u32);
                    self.events.push(RuntimeEvent::GhostEaten {
                        ghost: ghost.personality.name(),
                        points,
                    });
                }
                GhostState::Eaten => {}
                GhostState::Scatter | GhostState::Chase => {
                    // Everyone has just been sent back to spawn.
                    self.handle_player_death();
                    return;
                }
            }
        }
    }

    fn handle_player_death(&mut self) {
        self.lives -= 1;
        self.audio.play(SoundCue::PlayerDied);
        self.events.push(RuntimeEvent::PlayerDied {
            lives_left: self.lives.max(0),
        });

        if self.lives <= 0 {
            self.lives = 0;
            self.state = GameState::GameOver;
            self.events.push(RuntimeEvent::GameOver { score: self.score });
            return;
        }

        let mode = self.modes.current();
        self.player.reset(self.level.player_spawn);
        for ghost in &mut self.ghosts {
            ghost.reset(self.level.ghost_spawn, mode);
        }
        self.ghosts_eaten = 0;
    }

    fn initialize_round(&mut self) {
        self.level = Level::parse(&self.layout);
        self.player = Player::new(self.level.player_spawn);
        self.modes.reset();
        let mode = self.modes.current();
        self.ghosts = Personality::ALL
            .into_iter()
            .map(|personality| Ghost::new(personality, self.level.ghost_spawn, mode))
            .collect();
        self.ghosts_eaten = 0;
        self.round_pellets = self.level.remaining_pellets();
        self.pellets_collected = 0;
    }

    fn update_high_score(&mut self) {
        if self.score > self.high_score {
            self.high_score = self.score;
            self.high_scores.save(self.high_score);
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            state: self.state,
            score: self.score,
            high_score: self.high_score,
            lives: self.lives,
            round: self.round,
            mode: self.modes.current(),
            remaining_pellets: self.level.remaining_pellets(),
            tiles: self.level.to_rows(),
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::constants::{FRAME_MS, MAX_FRAME_DELTA_MS};
    use crate::engine::{Body, GameEngine, GameEngineOptions, Ghost, Personality};
    use crate::high_score_store::{HighScoreStore, MemoryHighScoreStore};
    use crate::ports::{AudioSink, HeldKeys, SilentAudio};
    use crate::types::{
        Direction, GameState, GhostMode, GhostState, RuntimeEvent, SoundCue, TileKind,
        TilePosition,
    };

    #[derive(Clone, Default)]
    struct RecordingAudio(Arc<Mutex<Vec<SoundCue>>>);

    impl AudioSink for RecordingAudio {
        fn play(&mut self, cue: SoundCue) {
            self.0.lock().expect("audio log").push(cue);
        }
    }

    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<Vec<i32>>>);

    impl HighScoreStore for SharedStore {
        fn load(&mut self) -> i32 {
            100
        }

        fn save(&mut self, high_score: i32) {
            self.0.lock().expect("save log").push(high_score);
        }
    }

    fn make_engine(seed: u64) -> GameEngine {
        GameEngine::new(
            GameEngineOptions {
                seed,
                ..GameEngineOptions::default()
            },
            Box::new(MemoryHighScoreStore::default()),
            Box::new(SilentAudio),
        )
    }

    fn started(seed: u64) -> GameEngine {
        let mut engine = make_engine(seed);
        engine.start_game();
        engine
    }

    fn place_player(engine: &mut GameEngine, tile: TilePosition) {
        engine.player.body = Body::at_tile(tile, Direction::None);
    }

    fn release(ghost: &mut Ghost, tile: TilePosition) {
        ghost.body = Body::at_tile(tile, Direction::Left);
        ghost.in_house = false;
        ghost.release_ms = 0.0;
    }

    #[test]
    fn engine_starts_on_title_and_ignores_steps() {
        let mut engine = make_engine(1);
        assert_eq!(engine.state(), GameState::Title);
        engine.step(FRAME_MS, &HeldKeys::new());
        assert_eq!(engine.tick(), 0);

        engine.start_game();
        assert_eq!(engine.state(), GameState::Playing);
        engine.step(FRAME_MS, &HeldKeys::new());
        assert_eq!(engine.tick(), 1);
    }

    #[test]
    fn pause_freezes_every_timer() {
        let mut engine = started(2);
        let keys = HeldKeys::new();
        for _ in 0..30 {
            engine.step(FRAME_MS, &keys);
        }
        engine.toggle_pause();
        assert_eq!(engine.state(), GameState::Paused);
        let before = engine.build_snapshot(false);
        let release_before: Vec<f32> = engine.ghosts().iter().map(|g| g.release_ms).collect();
        for _ in 0..120 {
            engine.step(FRAME_MS, &keys);
        }
        let after = engine.build_snapshot(false);
        assert_eq!(before.tick, after.tick);
        for (a, b) in before.ghosts.iter().zip(after.ghosts.iter()) {
            assert_eq!((a.x, a.y), (b.x, b.y));
        }
        let release_after: Vec<f32> = engine.ghosts().iter().map(|g| g.release_ms).collect();
        assert_eq!(release_before, release_after);

        engine.toggle_pause();
        assert_eq!(engine.state(), GameState::Playing);
    }

    #[test]
    fn consecutive_captures_follow_the_score_table() {
        let mut engine = started(3);
        let spot = TilePosition::new(5, 6);
        place_player(&mut engine, spot);
        let extra = Ghost::new(Personality::Blip, engine.level.ghost_spawn, GhostMode::Chase);
        engine.ghosts.push(extra);
        for ghost in &mut engine.ghosts {
            release(ghost, spot);
        }
        engine.activate_frightened_mode();
        assert!(engine
            .ghosts
            .iter()
            .all(|ghost| ghost.state == GhostState::Frightened));

        engine.score = 0;
        engine.resolve_collisions();

        assert_eq!(engine.score(), 200 + 400 + 800 + 1_600 + 1_600);
        let points: Vec<i32> = engine
            .build_snapshot(true)
            .events
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::GhostEaten { points, .. } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(points, vec![200, 400, 800, 1_600, 1_600]);
        let multipliers: Vec<u32> = engine.ghosts.iter().map(|g| g.eaten_multiplier).collect();
        assert_eq!(multipliers, vec![1, 2, 3, 4, 5]);
        assert!(engine
            .ghosts
            .iter()
            .all(|ghost| ghost.state == GhostState::Eaten));
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn new_power_pellet_restarts_the_capture_table() {
        let mut engine = started(4);
        let spot = TilePosition::new(5, 6);
        place_player(&mut engine, spot);
        release(&mut engine.ghosts[0], spot);
        engine.activate_frightened_mode();
        engine.resolve_collisions();
        assert_eq!(engine.ghosts_eaten, 1);

        engine.activate_frightened_mode();
        assert_eq!(engine.ghosts_eaten, 0);
        assert_eq!(engine.ghosts[0].state, GhostState::Eaten);
    }

    #[test]
    fn power_pellet_frightens_and_reverses_ghosts() {
        let audio = RecordingAudio::default();
        let mut engine = GameEngine::new(
            GameEngineOptions::default(),
            Box::new(MemoryHighScoreStore::default()),
            Box::new(audio.clone()),
        );
        engine.start_game();
        release(&mut engine.ghosts[1], TilePosition::new(5, 10));
        engine.ghosts[2].set_eaten(1);
        let eaten_dir = engine.ghosts[2].direction();

        place_player(&mut engine, TilePosition::new(3, 1));
        assert_eq!(engine.level.tile_at(3, 1), TileKind::PowerPellet);
        engine.collect_pellet();

        assert_eq!(engine.score(), 50);
        assert_eq!(engine.ghosts[1].state, GhostState::Frightened);
        assert_eq!(engine.ghosts[1].direction(), Direction::Right);
        assert_eq!(engine.ghosts[0].state, GhostState::Frightened);
        assert_eq!(engine.ghosts[0].direction(), Direction::Down);
        assert_eq!(engine.ghosts[2].state, GhostState::Eaten);
        assert_eq!(engine.ghosts[2].direction(), eaten_dir);
        assert_eq!(engine.pellets_collected(), 1);
        assert_eq!(
            engine.level.remaining_pellets() + engine.pellets_collected(),
            engine.round_pellets()
        );
        assert_eq!(
            *audio.0.lock().expect("audio log"),
            vec![SoundCue::PowerPellet]
        );

        // Standing on the now-empty tile awards nothing more.
        engine.collect_pellet();
        assert_eq!(engine.score(), 50);
    }

    #[test]
    fn losing_a_life_resets_positions_but_keeps_score() {
        let mut engine = started(5);
        let spot = TilePosition::new(5, 6);
        place_player(&mut engine, spot);
        release(&mut engine.ghosts[0], spot);
        release(&mut engine.ghosts[3], spot);
        engine.score = 1_234;

        engine.resolve_collisions();

        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.score(), 1_234);
        assert_eq!(engine.state(), GameState::Playing);
        assert_eq!(engine.player().tile(), engine.level.player_spawn);
        assert_eq!(engine.player().direction(), Direction::None);
        for (idx, ghost) in engine.ghosts().iter().enumerate() {
            assert_eq!(ghost.tile(), engine.level.ghost_spawn);
            assert!(ghost.in_house);
            assert_eq!(ghost.release_ms, idx as f32 * 2_000.0);
            assert_ne!(ghost.state, GhostState::Frightened);
        }
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut engine = started(6);
        engine.lives = 1;
        let spot = TilePosition::new(5, 6);
        place_player(&mut engine, spot);
        release(&mut engine.ghosts[0], spot);

        engine.resolve_collisions();
        assert_eq!(engine.lives(), 0);
        assert_eq!(engine.state(), GameState::GameOver);
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PlayerDied { lives_left: 0 }));
        assert!(events.contains(&RuntimeEvent::GameOver { score: engine.score() }));

        let tick = engine.tick();
        engine.step(FRAME_MS, &HeldKeys::new());
        assert_eq!(engine.tick(), tick);

        engine.start_game();
        assert_eq!(engine.state(), GameState::Playing);
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn clearing_the_board_starts_a_fresh_round() {
        let mut engine = started(7);
        let initial = engine.round_pellets();
        for _ in 0..200 {
            engine.step(FRAME_MS, &HeldKeys::new());
        }
        for tile in engine.level.pellet_tiles() {
            engine.level.remove_pellet(tile.row, tile.col);
        }
        assert_eq!(engine.level.remaining_pellets(), 0);
        engine.score = 500;
        let lives = engine.lives();

        engine.step(FRAME_MS, &HeldKeys::new());

        assert_eq!(engine.score(), 1_500);
        assert_eq!(engine.lives(), lives);
        assert_eq!(engine.round(), 2);
        assert_eq!(engine.level.remaining_pellets(), initial);
        assert_eq!(engine.pellets_collected(), 0);
        assert_eq!(engine.player().body.position, engine.level.player_spawn.center());
        assert_eq!(engine.mode(), GhostMode::Scatter);
        assert_eq!(engine.modes.index(), 0);
        for (idx, ghost) in engine.ghosts().iter().enumerate() {
            assert_eq!(ghost.personality, Personality::ALL[idx]);
            assert_eq!(ghost.tile(), engine.level.ghost_spawn);
            assert!(ghost.in_house);
            assert_eq!(ghost.release_ms, idx as f32 * 2_000.0);
        }
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::RoundCleared {
            round: 1,
            bonus: 1_000
        }));
    }

    #[test]
    fn mode_switch_is_broadcast_and_reported() {
        let mut engine = started(8);
        engine.ghosts[1].set_frightened(60_000.0);
        for _ in 0..27 {
            engine.step(MAX_FRAME_DELTA_MS, &HeldKeys::new());
        }
        assert_eq!(engine.mode(), GhostMode::Scatter);
        engine.step(MAX_FRAME_DELTA_MS, &HeldKeys::new());
        assert_eq!(engine.mode(), GhostMode::Chase);
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::ModeChanged {
            mode: GhostMode::Chase
        }));
        assert_eq!(engine.ghosts[1].state, GhostState::Frightened);
    }

    #[test]
    fn step_rejects_non_finite_deltas_and_clamps_long_stalls() {
        let rows = ["#####", "#P#.#", "#####"]
            .iter()
            .map(|row| row.to_string())
            .collect();
        let mut engine = GameEngine::new(
            GameEngineOptions {
                seed: 3,
                layout: Some(rows),
                ..GameEngineOptions::default()
            },
            Box::new(MemoryHighScoreStore::default()),
            Box::new(SilentAudio),
        );
        engine.start_game();
        let keys = HeldKeys::new();

        engine.step(f32::INFINITY, &keys);
        engine.step(f32::NAN, &keys);
        engine.step(f32::NEG_INFINITY, &keys);
        assert_eq!(engine.tick(), 0);

        engine.step(1.0e12, &keys);
        assert_eq!(engine.tick(), 1);
        assert_eq!(engine.state(), GameState::Playing);
        // A replayed stall would have run the schedule into endless chase.
        assert_eq!(engine.mode(), GhostMode::Scatter);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = started(424_242);
        let mut b = started(424_242);
        let mut keys = HeldKeys::new();

        for frame in 0..2_400 {
            if frame % 150 == 0 {
                keys.release_all();
                keys.set(Direction::ALL[(frame / 150) % 4], true);
            }
            a.step(FRAME_MS, &keys);
            b.step(FRAME_MS, &keys);
            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.lives, sb.lives);
            assert_eq!((sa.player.x, sa.player.y), (sb.player.x, sb.player.y));
            for (ga, gb) in sa.ghosts.iter().zip(sb.ghosts.iter()) {
                assert_eq!((ga.x, ga.y), (gb.x, gb.y));
                assert_eq!(ga.state, gb.state);
            }
            if a.state() == GameState::GameOver {
                assert_eq!(b.state(), GameState::GameOver);
                break;
            }
        }
    }

    #[test]
    fn long_run_conserves_pellets_and_never_enters_walls() {
        let mut engine = started(99);
        let mut keys = HeldKeys::new();
        let order = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

        for frame in 0..(60 * 90) {
            if frame % 97 == 0 {
                keys.release_all();
                keys.set(order[(frame / 97) % order.len()], true);
            }
            engine.step(FRAME_MS, &keys);

            assert_eq!(
                engine.level.remaining_pellets() + engine.pellets_collected(),
                engine.round_pellets()
            );
            let player = engine.player().tile();
            assert_ne!(engine.level.tile_at(player.row, player.col), TileKind::Wall);
            for ghost in engine.ghosts() {
                let tile = ghost.tile();
                assert_ne!(engine.level.tile_at(tile.row, tile.col), TileKind::Wall);
            }
            if engine.state() == GameState::GameOver {
                engine.start_game();
            }
        }
        assert!(engine.tick() > 0);
    }

    #[test]
    fn high_score_is_saved_whenever_it_improves() {
        let store = SharedStore::default();
        let mut engine = GameEngine::new(
            GameEngineOptions::default(),
            Box::new(store.clone()),
            Box::new(SilentAudio),
        );
        assert_eq!(engine.high_score(), 100);
        engine.start_game();

        engine.score = 90;
        engine.update_high_score();
        assert!(store.0.lock().expect("save log").is_empty());

        engine.score = 150;
        engine.update_high_score();
        engine.update_high_score();
        engine.score = 160;
        engine.update_high_score();
        assert_eq!(*store.0.lock().expect("save log"), vec![150, 160]);
        assert_eq!(engine.high_score(), 160);
        assert_eq!(engine.build_snapshot(false).high_score, 160);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = started(10);
        engine.events.push(RuntimeEvent::ModeChanged {
            mode: GhostMode::Chase,
        });

        let kept = engine.build_snapshot(false);
        assert!(kept.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert_eq!(second.events.len(), 0);
        assert_eq!(first.tiles.len(), 31);
        assert_eq!(first.ghosts.len(), 4);
    }

    #[test]
    fn config_reflects_grid_and_lives() {
        let engine = GameEngine::new(
            GameEngineOptions {
                initial_lives: 5,
                ..GameEngineOptions::default()
            },
            Box::new(MemoryHighScoreStore::default()),
            Box::new(SilentAudio),
        );
        assert_eq!(engine.config.width, 28);
        assert_eq!(engine.config.height, 31);
        assert_eq!(engine.config.initial_lives, 5);
        assert_eq!(engine.lives(), 5);
    }
}
