use clap::Parser;
use gludi_man_rust_server::constants::FRAME_MS;
use gludi_man_rust_server::engine::{GameEngine, GameEngineOptions};
use gludi_man_rust_server::high_score_store::MemoryHighScoreStore;
use gludi_man_rust_server::ports::{AudioSink, InputSource};
use gludi_man_rust_server::types::{
    Direction, GameState, GhostState, RuntimeEvent, Snapshot, SoundCue, TileKind, TilePosition,
};
use gludi_man_rust_server::world::{load_layout, Level};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

const DANGER_RADIUS_TILES: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated seconds per run; a single custom scenario when given.
    #[arg(long)]
    seconds: Option<u32>,
    #[arg(long)]
    lives: Option<i32>,
    #[arg(long)]
    layout: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u64,
    seconds: u32,
    lives: i32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    seconds: u32,
    #[serde(rename = "finalState")]
    final_state: GameState,
    #[serde(rename = "simulatedMs")]
    simulated_ms: u64,
    score: i32,
    #[serde(rename = "highScore")]
    high_score: i32,
    lives: i32,
    round: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPellets")]
    power_pellets: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    deaths: u32,
    #[serde(rename = "roundsCleared")]
    rounds_cleared: u32,
    #[serde(rename = "modeChanges")]
    mode_changes: u32,
    sounds: BTreeMap<String, u64>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "bestScore")]
    best_score: i32,
    #[serde(rename = "stateCounts")]
    state_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Counts every cue the engine fires.
#[derive(Clone, Default)]
struct TallyAudio(Arc<Mutex<BTreeMap<SoundCue, u64>>>);

impl AudioSink for TallyAudio {
    fn play(&mut self, cue: SoundCue) {
        if let Ok(mut tally) = self.0.lock() {
            *tally.entry(cue).or_insert(0) += 1;
        }
    }
}

impl TallyAudio {
    fn snapshot(&self) -> BTreeMap<String, u64> {
        match self.0.lock() {
            Ok(tally) => tally
                .iter()
                .map(|(cue, count)| (sound_cue_key(*cue).to_string(), *count))
                .collect(),
            Err(_) => BTreeMap::new(),
        }
    }
}

/// Steers toward the closest pellet, treating tiles near dangerous ghosts as blocked.
#[derive(Clone, Debug, Default)]
struct Autopilot {
    dir: Direction,
}

impl InputSource for Autopilot {
    fn held_direction(&self) -> Direction {
        self.dir
    }

    fn last_pressed(&self) -> Direction {
        self.dir
    }
}

impl Autopilot {
    fn plan(&mut self, engine: &GameEngine) {
        let level = engine.level();
        let danger: Vec<TilePosition> = engine
            .ghosts()
            .iter()
            .filter(|ghost| {
                !ghost.in_house
                    && matches!(ghost.state, GhostState::Scatter | GhostState::Chase)
            })
            .map(|ghost| ghost.tile())
            .collect();
        let start = engine.player().tile();
        self.dir = first_step_to_pellet(level, start, &danger)
            .or_else(|| first_step_to_pellet(level, start, &[]))
            .unwrap_or(Direction::None);
    }
}

fn first_step_to_pellet(
    level: &Level,
    start: TilePosition,
    danger: &[TilePosition],
) -> Option<Direction> {
    let blocked = |tile: TilePosition| {
        danger
            .iter()
            .any(|ghost| ghost.manhattan(tile) <= DANGER_RADIUS_TILES)
    };
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::new();
    for dir in Direction::ALL {
        let next = level.neighbor(start, dir);
        if level.can_pass(next.row, next.col) && !blocked(next) && visited.insert(next) {
            queue.push_back((next, dir));
        }
    }
    while let Some((tile, first)) = queue.pop_front() {
        if level.tile_at(tile.row, tile.col).is_pellet() {
            return Some(first);
        }
        for dir in Direction::ALL {
            let next = level.neighbor(tile, dir);
            if level.can_pass(next.row, next.col) && !blocked(next) && visited.insert(next) {
                queue.push_back((next, first));
            }
        }
    }
    None
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let layout = cli.layout.as_ref().and_then(|path| match load_layout(path) {
        Ok(rows) => Some(rows),
        Err(error) => {
            emit_log(
                "warn",
                "layout_fallback",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            None
        }
    });
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut state_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "seconds": scenario.seconds,
                "lives": scenario.lives,
                "customLayout": layout.is_some(),
            }),
        );
        let scenario_run = run_scenario(&scenario, layout.clone());

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *state_counts
            .entry(game_state_key(scenario_run.result.final_state).to_string())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "finalState": scenario_run.result.final_state,
                "score": scenario_run.result.score,
                "round": scenario_run.result.round,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        state_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "bestScore": summary.best_score,
            "stateCounts": summary.state_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, layout: Option<Vec<String>>) -> ScenarioRunResult {
    let audio = TallyAudio::default();
    let mut engine = GameEngine::new(
        GameEngineOptions {
            seed: scenario.seed,
            initial_lives: scenario.lives,
            layout,
        },
        Box::new(MemoryHighScoreStore::default()),
        Box::new(audio.clone()),
    );
    engine.start_game();

    let mut pilot = Autopilot::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut counters = EventCounters::default();
    let mut last_score = 0;
    let mut last_tick = 0u64;
    let max_ticks = scenario.seconds as u64 * 60;

    while engine.state() == GameState::Playing && engine.tick() < max_ticks {
        pilot.plan(&engine);
        engine.step(FRAME_MS, &pilot);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        let mut messages = collect_snapshot_anomalies(&snapshot, engine.level());
        let conserved = snapshot.remaining_pellets + engine.pellets_collected();
        if conserved != engine.round_pellets() {
            messages.push(format!(
                "pellet conservation broken: {} remaining + {} collected != {}",
                snapshot.remaining_pellets,
                engine.pellets_collected(),
                engine.round_pellets()
            ));
        }
        if snapshot.score < last_score {
            messages.push(format!(
                "score decreased: {last_score} -> {}",
                snapshot.score
            ));
        }
        last_score = snapshot.score;
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        counters.record(&snapshot.events);
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            seconds: scenario.seconds,
            final_state: engine.state(),
            simulated_ms: (last_tick as f64 * FRAME_MS as f64).round() as u64,
            score: engine.score(),
            high_score: engine.high_score(),
            lives: engine.lives(),
            round: engine.round(),
            pellets_eaten: counters.pellets,
            power_pellets: counters.power_pellets,
            ghosts_eaten: counters.ghosts,
            deaths: counters.deaths,
            rounds_cleared: counters.rounds,
            mode_changes: counters.mode_changes,
            sounds: audio.snapshot(),
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

#[derive(Clone, Debug, Default)]
struct EventCounters {
    pellets: u32,
    power_pellets: u32,
    ghosts: u32,
    deaths: u32,
    rounds: u32,
    mode_changes: u32,
}

impl EventCounters {
    fn record(&mut self, events: &[RuntimeEvent]) {
        for event in events {
            match event {
                RuntimeEvent::PelletEaten { .. } => self.pellets += 1,
                RuntimeEvent::PowerPelletEaten { .. } => self.power_pellets += 1,
                RuntimeEvent::GhostEaten { .. } => self.ghosts += 1,
                RuntimeEvent::PlayerDied { .. } => self.deaths += 1,
                RuntimeEvent::RoundCleared { .. } => self.rounds += 1,
                RuntimeEvent::ModeChanged { .. } => self.mode_changes += 1,
                RuntimeEvent::GameOver { .. } => {}
            }
        }
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, level: &Level) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.lives < 0 {
        anomalies.push(format!("negative lives: {}", snapshot.lives));
    }
    if snapshot.high_score < snapshot.score {
        anomalies.push(format!(
            "high score {} behind score {}",
            snapshot.high_score, snapshot.score
        ));
    }
    if level.tile_at(snapshot.player.row, snapshot.player.col) == TileKind::Wall {
        anomalies.push(format!(
            "player inside wall at ({}, {})",
            snapshot.player.row, snapshot.player.col
        ));
    }
    for ghost in &snapshot.ghosts {
        if level.tile_at(ghost.row, ghost.col) == TileKind::Wall {
            anomalies.push(format!(
                "ghost {} inside wall at ({}, {})",
                ghost.name, ghost.row, ghost.col
            ));
        }
        if ghost.frightened_ms < 0.0 {
            anomalies.push(format!("ghost {} frightened timer negative", ghost.name));
        }
    }
    if snapshot.ghosts.len() != 4 {
        anomalies.push(format!("unexpected ghost count: {}", snapshot.ghosts.len()));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(now_ms);
    let lives = cli.lives.unwrap_or(3).clamp(1, 9);

    if let Some(seconds) = cli.seconds {
        return vec![Scenario {
            name: format!("custom-{}s", seconds.clamp(1, 3_600)),
            seed,
            seconds: seconds.clamp(1, 3_600),
            lives,
        }];
    }

    vec![
        Scenario {
            name: "quick-check".to_string(),
            seed,
            seconds: 60,
            lives,
        },
        Scenario {
            name: "endurance".to_string(),
            seed: seed.wrapping_add(1),
            seconds: 600,
            lives,
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    state_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let best_score = scenarios
        .iter()
        .map(|scenario| scenario.score)
        .max()
        .unwrap_or(0);
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count: scenarios.len(),
        anomaly_count,
        best_score,
        state_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn game_state_key(state: GameState) -> &'static str {
    match state {
        GameState::Title => "title",
        GameState::Playing => "playing",
        GameState::Paused => "paused",
        GameState::GameOver => "game_over",
    }
}

fn sound_cue_key(cue: SoundCue) -> &'static str {
    match cue {
        SoundCue::Pellet => "pellet",
        SoundCue::PowerPellet => "power_pellet",
        SoundCue::GhostEaten => "ghost_eaten",
        SoundCue::PlayerDied => "player_died",
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
