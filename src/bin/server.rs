use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use futures_util::{SinkExt, StreamExt};
use gludi_man_rust_server::constants::TICK_RATE;
use gludi_man_rust_server::engine::{GameEngine, GameEngineOptions};
use gludi_man_rust_server::high_score_store::JsonHighScoreStore;
use gludi_man_rust_server::ports::{HeldKeys, SilentAudio};
use gludi_man_rust_server::server_protocol::{parse_client_message, parse_seed, ParsedClientMessage};
use gludi_man_rust_server::types::GameState;
use gludi_man_rust_server::world::load_layout;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    game: GameEngine,
    keys: HeldKeys,
    last_state: GameState,
}

impl ServerState {
    fn new(game: GameEngine) -> Self {
        let last_state = game.state();
        Self {
            clients: HashMap::new(),
            game,
            keys: HeldKeys::new(),
            last_state,
        }
    }
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let high_score_path = std::env::var("HIGH_SCORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/high-score.json"));
    let seed = parse_seed(std::env::var("SEED").ok().as_deref()).unwrap_or_else(now_ms);
    let layout = std::env::var("LAYOUT_PATH").ok().and_then(|raw| {
        let path = PathBuf::from(raw);
        match load_layout(&path) {
            Ok(rows) => {
                println!("[server] layout loaded from {}", path.display());
                Some(rows)
            }
            Err(error) => {
                eprintln!(
                    "[server] failed to load layout {}: {error}; using default maze",
                    path.display()
                );
                None
            }
        }
    });

    let game = GameEngine::new(
        GameEngineOptions {
            seed,
            layout,
            ..GameEngineOptions::default()
        },
        Box::new(JsonHighScoreStore::new(high_score_path)),
        Box::new(SilentAudio),
    );
    println!("[server] seed={seed} high score={}", game.high_score());

    let state = Arc::new(Mutex::new(ServerState::new(game)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/high-score", get(high_score_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found; serving websocket and api only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist"), PathBuf::from("public")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn high_score_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "highScore": guard.game.high_score(),
        "generatedAtIso": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        let welcome = json!({
            "type": "welcome",
            "clientId": client_id,
            "config": guard.game.config,
            "snapshot": guard.game.build_snapshot(false),
        });
        send_to_client(&mut guard, &client_id, &welcome, QueuePolicy::DisconnectOnFull);
        println!(
            "[server] client connected: {client_id} (clients={})",
            guard.clients.len()
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(&state, &client_id, &text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        disconnect_client_internal(&mut guard, &client_id);
    }
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    if let Some(reply) = apply_client_message(&mut guard, message) {
        send_to_client(&mut guard, client_id, &reply, QueuePolicy::DisconnectOnFull);
    }
}

/// Applies one client message to the shared session; returns a direct reply if any.
fn apply_client_message(state: &mut ServerState, message: ParsedClientMessage) -> Option<Value> {
    match message {
        ParsedClientMessage::Key { dir, down } => {
            state.keys.set(dir, down);
            None
        }
        ParsedClientMessage::Start => {
            state.game.start_game();
            state.keys.release_all();
            None
        }
        ParsedClientMessage::Pause => {
            state.game.toggle_pause();
            None
        }
        ParsedClientMessage::Ping { t } => Some(json!({
            "type": "pong",
            "t": t,
            "serverNowMs": now_ms(),
        })),
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(1_000 / TICK_RATE as u64));
        let mut last = Instant::now();
        loop {
            interval.tick().await;
            let now = Instant::now();
            let dt_ms = now.duration_since(last).as_secs_f32() * 1_000.0;
            last = now;
            let mut guard = state.lock().await;
            tick_game(&mut guard, dt_ms);
        }
    });
}

fn tick_game(state: &mut ServerState, dt_ms: f32) {
    if state.clients.is_empty() && state.game.state() == GameState::Playing {
        state.game.toggle_pause();
        println!("[server] no clients connected; pausing");
    }

    state.game.step(dt_ms, &state.keys);
    let current = state.game.state();
    if current != state.last_state {
        println!(
            "[server] state {:?} -> {:?} (score={}, lives={}, round={})",
            state.last_state,
            current,
            state.game.score(),
            state.game.lives(),
            state.game.round()
        );
        state.last_state = current;
    }
    if state.clients.is_empty() {
        return;
    }

    let snapshot = state.game.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client_internal(state, &client_id);
    }
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    let Some(client) = state.clients.remove(client_id) else {
        return;
    };
    let _ = client.tx.try_send(OutboundMessage::Close {
        code: 1000,
        reason: "bye".to_string(),
    });
    // Keys held by a vanished client would otherwise stay down forever.
    state.keys.release_all();
    println!(
        "[server] client disconnected: {client_id} (clients={})",
        state.clients.len()
    );
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DropOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
