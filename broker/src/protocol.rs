//! Wire shapes for the realtime event catalog. The broker decides semantic
//! content and channel routing only; transport encoding is JSON text
//! frames.

use std::collections::HashMap;

use engine::ordering::QueueEntry;
use engine::ranking::RankedEntry;
use engine::state_machine::CurrentState;
use engine::tally::{JudgeRole, Outcome, Vote};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound frames, one per row of the §6 event table with a J/D/V origin.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "session.join")]
    SessionJoin { role: String, meet_code: String, token: Option<String> },
    #[serde(rename = "judge.vote")]
    JudgeVote { attempt_id: Uuid, vote: String },
    #[serde(rename = "director.next")]
    DirectorNext,
    #[serde(rename = "director.declare")]
    DirectorDeclare { registration_id: Uuid, lift_id: Uuid, attempt_no: i16, kg: Decimal },
    #[serde(rename = "director.timer")]
    DirectorTimer { action: String, duration_s: Option<u32> },
    #[serde(rename = "director.initialize")]
    DirectorInitialize { flight_id: Uuid, lift_id: Uuid },
    #[serde(rename = "director.reset")]
    DirectorReset,
}

/// Outbound frames. `Ack` answers the originating session only; every other
/// variant is a broadcast selected by the hub's channel matrix.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "ack")]
    Ack { ok: bool, kind: Option<String>, message: Option<String> },
    #[serde(rename = "judge.vote.ack")]
    JudgeVoteAck { attempt_id: Uuid, recorded: Vote },
    #[serde(rename = "judge.vote.count")]
    JudgeVoteCount { attempt_id: Uuid, count: usize },
    #[serde(rename = "attempt.result")]
    AttemptResult {
        attempt_id: Uuid,
        registration_id: Uuid,
        outcome: Outcome,
        votes: HashMap<JudgeRole, Vote>,
    },
    #[serde(rename = "state.update")]
    StateUpdate { current: CurrentState },
    #[serde(rename = "queue.update")]
    QueueUpdate { group_id: Uuid, lift_id: Uuid, round: i16, queue: Vec<QueueEntry> },
    #[serde(rename = "weight.updated")]
    WeightUpdated { registration_id: Uuid, lift_id: Uuid, attempt_no: i16, kg: Decimal },
    #[serde(rename = "ranking.update")]
    RankingUpdate { rankings: Vec<RankedEntry> },
    #[serde(rename = "timer.started")]
    TimerStarted { start_ts: i64, duration_s: u32 },
    #[serde(rename = "timer.stopped")]
    TimerStopped,
    #[serde(rename = "meet.finished")]
    MeetFinished { reason: String },
}

impl ServerEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"ack","ok":false}"#.to_string())
    }

    pub fn ack_ok() -> Self {
        Self::Ack { ok: true, kind: None, message: None }
    }

    pub fn ack_err(kind: &str, message: impl Into<String>) -> Self {
        Self::Ack { ok: false, kind: Some(kind.to_string()), message: Some(message.into()) }
    }
}
