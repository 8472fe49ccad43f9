use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use match3_arena_server::protocol::{parse_client_message, ParsedClientMessage};
use match3_arena_server::registry::{LeaveOutcome, SessionRegistry};
use match3_arena_server::server_utils::{
    normalize_room_key, parse_leaderboard_limit, sanitize_name,
};
use match3_arena_server::types::{Coord, GameError};
use rand::Rng as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
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

struct ServerState {
    clients: HashMap<String, ClientContext>,
    registry: SessionRegistry,
}

impl ServerState {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
            registry: SessionRegistry::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<String>,
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let state = Arc::new(Mutex::new(ServerState::new()));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
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
        eprintln!("[server] static file root not found. serving API and websocket only.");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] match-3 arena listening on :{port}");
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

    let candidates = [PathBuf::from("public"), PathBuf::from("client/dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "status": "healthy",
        "activeGames": guard.registry.active_session_count(),
    }))
}

async fn leaderboard_handler(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(
        guard
            .registry
            .ledger()
            .build_response(parse_leaderboard_limit(query.limit.as_deref())),
    )
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection_id = make_id("conn");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(connection_id.clone(), ClientContext { tx: tx.clone() });
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
                handle_client_message(state.clone(), &connection_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &connection_id, text).await;
                } else {
                    send_error_text(&state, &connection_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(state, &connection_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, connection_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_text(&state, connection_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::JoinRoom { room, name } => {
            handle_join_room(&mut guard, connection_id, &room, &name);
        }
        ParsedClientMessage::StartSingle { name, mode } => {
            let solo = guard.registry.start_single_player(
                &sanitize_name(&name),
                mode,
                connection_id,
                random_seed(),
            );
            if let Some(left) = solo.left {
                broadcast_leave(&mut guard, left);
            }
            send_to_client(
                &mut guard,
                connection_id,
                &json!({
                    "type": "game_start",
                    "playerId": connection_id,
                    "snapshot": solo.snapshot,
                }),
            );
        }
        ParsedClientMessage::MakeMove { from, to } => {
            handle_make_move(&mut guard, connection_id, from, to);
        }
        ParsedClientMessage::RestartGame => {
            handle_restart(&mut guard, connection_id);
        }
        ParsedClientMessage::LeaveRoom => {
            leave_current_room(&mut guard, connection_id);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                connection_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
            );
        }
    }
}

fn handle_join_room(state: &mut ServerState, connection_id: &str, room: &str, name: &str) {
    let room = normalize_room_key(room);
    let name = sanitize_name(name);

    match state
        .registry
        .join_room(&room, &name, connection_id, random_seed())
    {
        Ok(mut outcome) => {
            // the old room hears about its departure before the new room
            // hears about the arrival
            if let Some(left) = outcome.left.take() {
                broadcast_leave(state, left);
            }
            let members = state.registry.connection_ids_in_room(&outcome.room_key);
            send_to_client(
                state,
                connection_id,
                &json!({
                    "type": "joined",
                    "playerId": connection_id,
                    "room": outcome.room_key,
                    "position": outcome.position,
                    "snapshot": &outcome.snapshot,
                }),
            );
            send_to_many(
                state,
                members.iter().filter(|id| *id != connection_id),
                &json!({
                    "type": "player_joined",
                    "playerName": name,
                    "snapshot": &outcome.snapshot,
                }),
            );
            if outcome.started {
                send_to_many(
                    state,
                    members.iter(),
                    &json!({
                        "type": "game_start",
                        "snapshot": &outcome.snapshot,
                    }),
                );
            }
        }
        Err(error) => send_game_error(state, connection_id, error),
    }
}

fn handle_make_move(state: &mut ServerState, connection_id: &str, from: Coord, to: Coord) {
    match state.registry.apply_move(connection_id, from, to) {
        Ok(applied) => {
            let members = state
                .registry
                .room_of(connection_id)
                .map(|room| state.registry.connection_ids_in_room(room))
                .unwrap_or_default();
            send_to_many(
                state,
                members.iter(),
                &json!({
                    "type": "board_update",
                    "by": connection_id,
                    "snapshot": applied.snapshot,
                    "matches": applied.matched,
                    "pointsAwarded": applied.points_awarded,
                }),
            );
            if let Some(outcome) = applied.outcome {
                send_to_many(
                    state,
                    members.iter(),
                    &json!({
                        "type": "game_over",
                        "outcome": outcome,
                    }),
                );
            }
        }
        Err(error) => {
            send_to_client(
                state,
                connection_id,
                &json!({
                    "type": "move_result",
                    "valid": false,
                    "reason": error,
                    "message": error.message(),
                }),
            );
        }
    }
}

fn handle_restart(state: &mut ServerState, connection_id: &str) {
    match state.registry.restart(connection_id) {
        Ok(Some(snapshot)) => {
            let members = state
                .registry
                .room_of(connection_id)
                .map(|room| state.registry.connection_ids_in_room(room))
                .unwrap_or_default();
            send_to_many(
                state,
                members.iter(),
                &json!({
                    "type": "game_start",
                    "snapshot": snapshot,
                }),
            );
        }
        Ok(None) => {}
        Err(error) => send_game_error(state, connection_id, error),
    }
}

fn leave_current_room(state: &mut ServerState, connection_id: &str) {
    let Some(leave) = state.registry.remove_connection(connection_id) else {
        return;
    };
    broadcast_leave(state, leave);
}

fn broadcast_leave(state: &mut ServerState, leave: LeaveOutcome) {
    if leave.session_removed {
        return;
    }

    let members = state.registry.connection_ids_in_room(&leave.room_key);
    send_to_many(
        state,
        members.iter(),
        &json!({
            "type": "player_left",
            "playerName": leave.player_name,
            "snapshot": leave.snapshot,
        }),
    );
    if let Some(outcome) = leave.outcome {
        send_to_many(
            state,
            members.iter(),
            &json!({
                "type": "game_over",
                "outcome": outcome,
            }),
        );
    }
}

async fn handle_disconnect(state: SharedState, connection_id: &str) {
    let mut guard = state.lock().await;
    leave_current_room(&mut guard, connection_id);
    guard.clients.remove(connection_id);
}

fn send_game_error(state: &mut ServerState, connection_id: &str, error: GameError) {
    send_to_client(
        state,
        connection_id,
        &json!({
            "type": "error",
            "reason": error,
            "message": error.message(),
        }),
    );
}

async fn send_error_text(state: &SharedState, connection_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        connection_id,
        &json!({
            "type": "error",
            "message": message,
        }),
    );
}

fn send_to_client(state: &mut ServerState, connection_id: &str, message: &Value) {
    let send_failed = if let Some(client) = state.clients.get(connection_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed {
        drop_client(state, connection_id);
    }
}

fn send_to_many<'a>(
    state: &mut ServerState,
    connection_ids: impl Iterator<Item = &'a String>,
    message: &Value,
) {
    let payload = message.to_string();
    let mut failed = Vec::new();
    for connection_id in connection_ids {
        let Some(client) = state.clients.get(connection_id) else {
            continue;
        };
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
        {
            failed.push(connection_id.clone());
        }
    }
    for connection_id in failed {
        drop_client(state, &connection_id);
    }
}

fn drop_client(state: &mut ServerState, connection_id: &str) {
    if let Some(client) = state.clients.remove(connection_id) {
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: 1011,
            reason: "outbound queue overflow".to_string(),
        });
    }
    leave_current_room(state, connection_id);
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn random_seed() -> u32 {
    rand::rng().random()
}
