//! The one-way dependency seam: the engine depends only on these traits,
//! never on `storage`'s sqlx types or `broker`'s axum types directly. The
//! composition root (`server` crate) wires concrete adapters in; tests
//! wire in-memory fakes.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::tally::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pending,
    Valid,
    Invalid,
}

impl From<Outcome> for AttemptStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Valid => Self::Valid,
            Outcome::Invalid => Self::Invalid,
        }
    }
}

/// One group-entry's relevant declared weight for a round, batched across
/// a whole group in a single lookup (REDESIGN FLAGS: no N+1 queries).
#[derive(Debug, Clone)]
pub struct GroupRoundWeight {
    pub registration_id: Uuid,
    pub bodyweight_kg: Decimal,
    pub start_ord: i32,
    pub declared_kg: Option<Decimal>,
    pub status: Option<AttemptStatus>,
}

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub attempt_id: Uuid,
    pub registration_id: Uuid,
    pub lift_id: Uuid,
    pub attempt_no: i16,
    pub weight_kg: Decimal,
    pub status: AttemptStatus,
}

/// Persisted shape of the `CurrentState` singleton, restored on process
/// restart.
#[derive(Debug, Clone, Default)]
pub struct PersistedCurrentState {
    pub meet_id: Option<Uuid>,
    pub flight_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub lift_id: Option<Uuid>,
    pub round: Option<i16>,
    pub current_registration_id: Option<Uuid>,
    pub timer_start_epoch_ms: Option<i64>,
    pub timer_duration_s: Option<i32>,
    pub status: String,
}

/// A best valid mark for one (registration, lift) pair, as needed by the
/// ranking engine's `total` computation.
#[derive(Debug, Clone)]
pub struct BestMark {
    pub registration_id: Uuid,
    pub lift_id: Uuid,
    pub best_kg: Decimal,
}

/// Category and identity facts about a registration, batched for an
/// entire meet so the ranking engine (C5) never fetches per-athlete.
#[derive(Debug, Clone)]
pub struct RankableRegistration {
    pub registration_id: Uuid,
    pub sex: String,
    pub weight_category_id: Option<Uuid>,
    pub age_category_id: Option<Uuid>,
    pub bodyweight_kg: Decimal,
    pub start_ord: i32,
}

/// C1's narrow lookups, as consumed by the engine. Implemented by the
/// `storage` crate's repositories in the composition root.
#[async_trait::async_trait]
pub trait CatalogPort: Send + Sync {
    async fn group_round_weights(
        &self,
        group_id: Uuid,
        lift_id: Uuid,
        round: i16,
    ) -> Result<Vec<GroupRoundWeight>>;

    async fn declare_attempt(
        &self,
        registration_id: Uuid,
        lift_id: Uuid,
        attempt_no: i16,
        weight_kg: Decimal,
        declared_by: Option<String>,
    ) -> Result<AttemptRecord>;

    async fn finalize_attempt(&self, attempt_id: Uuid, outcome: Outcome) -> Result<AttemptRecord>;

    async fn first_group(&self, flight_id: Uuid) -> Result<Option<Uuid>>;
    async fn next_group(&self, flight_id: Uuid, group_id: Uuid) -> Result<Option<Uuid>>;
    async fn group_entry_count(&self, group_id: Uuid) -> Result<i64>;

    async fn meet_type_id_for(&self, meet_id: Uuid) -> Result<Uuid>;
    async fn first_lift(&self, meet_type_id: Uuid) -> Result<Option<Uuid>>;
    async fn next_lift(&self, meet_type_id: Uuid, lift_id: Uuid) -> Result<Option<Uuid>>;
    async fn lifts_for_meet_type(&self, meet_type_id: Uuid) -> Result<Vec<Uuid>>;

    async fn load_current_state(&self) -> Result<PersistedCurrentState>;
    async fn save_current_state(&self, state: &PersistedCurrentState) -> Result<()>;

    async fn best_marks(&self, meet_id: Uuid) -> Result<Vec<BestMark>>;
    async fn rankable_registrations(&self, meet_id: Uuid) -> Result<Vec<RankableRegistration>>;
}

/// Events published by the state machine (C4) and ranking engine (C5),
/// consumed by the broker (C6). The engine never imports axum/websocket
/// types; `broker` depends on `engine`, not the reverse.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    StateUpdate(crate::state_machine::CurrentState),
    QueueUpdate {
        group_id: Uuid,
        lift_id: Uuid,
        round: i16,
        queue: Vec<crate::ordering::QueueEntry>,
    },
    WeightUpdated {
        registration_id: Uuid,
        lift_id: Uuid,
        attempt_no: i16,
        kg: Decimal,
    },
    AttemptResult {
        attempt_id: Uuid,
        registration_id: Uuid,
        outcome: Outcome,
        votes: crate::tally::VoteSnapshot,
    },
    RankingUpdate(Vec<crate::ranking::RankedEntry>),
    TimerStarted {
        start_epoch_ms: i64,
        duration_s: u32,
    },
    TimerStopped,
    MeetFinished {
        reason: String,
    },
}

/// Publish sink the state machine pushes to. `broker` implements this by
/// fanning the event out to the right channels (§6's publish matrix).
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, event: EngineEvent);
}
