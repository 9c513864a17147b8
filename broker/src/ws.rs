//! Axum WebSocket gateway: per-connection `mpsc` fanout and a `tokio::
//! select!`-free reader loop, grounded on `echo-session-ws-gateway`'s shape
//! (writer task draining an outbound queue, reader task dispatching inbound
//! frames) but carrying this system's session/role/channel model instead of
//! that gateway's warp-subscription protocol.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use engine::state_machine::Handle as EngineHandle;
use engine::tally::{Vote, VoteTally};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::BrokerError;
use crate::hub::{ChannelTarget, Hub};
use crate::meet_lookup::MeetLookup;
use crate::protocol::{ClientMessage, ServerEvent};
use crate::session::Role;
use crate::token;

pub struct AppState {
    pub hub: Arc<Hub>,
    pub engine: EngineHandle,
    pub tally: Arc<VoteTally>,
    pub meet_lookup: Arc<dyn MeetLookup>,
    pub judge_token_secret: Vec<u8>,
}

pub async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);

    let writer = tokio::spawn(async move {
        while let Some(payload) = out_rx.recv().await {
            if ws_tx.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let session_id = Uuid::new_v4();
    let mut joined: Option<(Uuid, Role)> = None;

    while let Some(msg) = ws_rx.next().await {
        let Ok(msg) = msg else { break };
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
        };

        let client_msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(err) => {
                let ack = ServerEvent::ack_err("BadInput", format!("malformed message: {err}"));
                let _ = out_tx.send(ack.to_json()).await;
                continue;
            }
        };

        if let ClientMessage::SessionJoin { role, meet_code, token: token_str } = client_msg {
            let ack = match handle_join(&state, &role, &meet_code, token_str.as_deref(), session_id, out_tx.clone()).await
            {
                Ok((meet_id, role)) => {
                    joined = Some((meet_id, role));
                    ServerEvent::ack_ok()
                }
                Err(err) => ServerEvent::ack_err(err.kind(), err.to_string()),
            };
            let _ = out_tx.send(ack.to_json()).await;
            continue;
        }

        let Some((meet_id, role)) = joined.clone() else {
            let ack = ServerEvent::ack_err("StateConflict", "join a session before sending commands");
            let _ = out_tx.send(ack.to_json()).await;
            continue;
        };

        let ack = dispatch(&state, meet_id, &role, session_id, client_msg).await;
        let _ = out_tx.send(ack.to_json()).await;
    }

    if let Some((meet_id, _)) = joined {
        state.hub.leave(meet_id, session_id).await;
    }
    writer.abort();
}

async fn handle_join(
    state: &AppState,
    role: &str,
    meet_code: &str,
    token_str: Option<&str>,
    session_id: Uuid,
    out_tx: mpsc::Sender<String>,
) -> Result<(Uuid, Role), BrokerError> {
    let meet_id = state
        .meet_lookup
        .meet_id_for_code(meet_code)
        .await
        .ok_or_else(|| BrokerError::BadInput(format!("unknown meet_code {meet_code}")))?;

    let resolved_role = match role {
        "judge" => {
            let tok = token_str
                .ok_or_else(|| BrokerError::Unauthorized("judge session requires a token".to_string()))?;
            let claims = token::verify(tok, &state.judge_token_secret, now_epoch_s())?;
            if claims.meet_id != meet_id {
                return Err(BrokerError::Unauthorized("token is for a different meet".to_string()));
            }
            Role::Judge { judge_id: claims.judge_id, role: claims.role }
        }
        "director" => Role::Director,
        "viewer" => Role::Viewer,
        other => return Err(BrokerError::BadInput(format!("unknown role: {other}"))),
    };

    state.hub.join(meet_id, session_id, resolved_role.clone(), out_tx).await;
    tracing::info!(%meet_id, %session_id, role = resolved_role.label(), "session joined");
    Ok((meet_id, resolved_role))
}

async fn dispatch(
    state: &AppState,
    meet_id: Uuid,
    role: &Role,
    session_id: Uuid,
    msg: ClientMessage,
) -> ServerEvent {
    match msg {
        ClientMessage::SessionJoin { .. } => ServerEvent::ack_err("BadInput", "already joined a session"),
        ClientMessage::JudgeVote { attempt_id, vote } => handle_vote(state, meet_id, role, attempt_id, &vote).await,
        ClientMessage::DirectorNext => {
            if let Err(ack) = require_director(role) {
                return ack;
            }
            to_ack(state.engine.next().await.map(|_| ()))
        }
        ClientMessage::DirectorDeclare { registration_id, lift_id, attempt_no, kg } => {
            if let Err(ack) = require_director(role) {
                return ack;
            }
            to_ack(
                state
                    .engine
                    .declare_weight(registration_id, lift_id, attempt_no, kg, Some(session_id.to_string()))
                    .await,
            )
        }
        ClientMessage::DirectorTimer { action, duration_s } => {
            if let Err(ack) = require_director(role) {
                return ack;
            }
            match action.as_str() {
                "start" => {
                    let Some(duration_s) = duration_s else {
                        return ServerEvent::ack_err("BadInput", "timer start requires duration_s");
                    };
                    to_ack(state.engine.timer_start(duration_s).await)
                }
                "stop" => to_ack(state.engine.timer_stop().await),
                other => ServerEvent::ack_err("BadInput", format!("unknown timer action: {other}")),
            }
        }
        ClientMessage::DirectorInitialize { flight_id, lift_id } => {
            if let Err(ack) = require_director(role) {
                return ack;
            }
            to_ack(state.engine.initialize(meet_id, flight_id, lift_id).await.map(|_| ()))
        }
        ClientMessage::DirectorReset => {
            if let Err(ack) = require_director(role) {
                return ack;
            }
            to_ack(state.engine.reset().await)
        }
    }
}

/// Judge votes never broadcast to other judges, to prevent influence --
/// only the aggregated count reaches the director and viewer channels,
/// and only the originating session gets the per-vote ack.
async fn handle_vote(state: &AppState, meet_id: Uuid, role: &Role, attempt_id: Uuid, vote_str: &str) -> ServerEvent {
    let Some(judge_role) = role.judge_role() else {
        return ServerEvent::ack_err("Unauthorized", "only judge sessions may vote");
    };
    let vote = match Vote::parse(vote_str) {
        Ok(v) => v,
        Err(err) => return ServerEvent::ack_err(err.kind(), err.to_string()),
    };

    let result = state.tally.register_vote(attempt_id, judge_role, vote);
    let count_event = ServerEvent::JudgeVoteCount { attempt_id, count: result.snapshot.len() }.to_json();

    state.hub.broadcast(meet_id, ChannelTarget::DirectorOnly, count_event.clone(), true).await;
    state.hub.broadcast(meet_id, ChannelTarget::ViewersOnly, count_event, true).await;

    if result.complete {
        let outcome = result.outcome.expect("a complete tally always carries an outcome");
        if let Err(err) = state.engine.finalize_from_tally(attempt_id, outcome, result.snapshot.clone()).await {
            return ServerEvent::ack_err(err.kind(), err.to_string());
        }
        state.tally.clear(attempt_id);
    }

    ServerEvent::JudgeVoteAck { attempt_id, recorded: vote }
}

fn require_director(role: &Role) -> Result<(), ServerEvent> {
    if role.is_director() {
        Ok(())
    } else {
        Err(ServerEvent::ack_err("Unauthorized", "only the director session may issue this command"))
    }
}

fn to_ack(result: engine::Result<()>) -> ServerEvent {
    match result {
        Ok(()) => ServerEvent::ack_ok(),
        Err(err) => ServerEvent::ack_err(err.kind(), err.to_string()),
    }
}

fn now_epoch_s() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
