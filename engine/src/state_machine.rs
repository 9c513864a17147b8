//! Attempt State Machine (C4): the singleton "current" pointer (meet,
//! flight, group, lift, round, athlete) and the commands that drive it.
//!
//! The data model keeps exactly one `CurrentState` row, so this crate runs
//! one actor for the whole process rather than a registry keyed by meet --
//! see DESIGN.md OQ-3. Commands arrive over an mpsc channel and are
//! processed one at a time against owned state, which gives total
//! ordering without an explicit mutex: a NEXT received
//! while a finalize is still being processed simply waits its turn in the
//! channel.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::ordering;
use crate::ports::{CatalogPort, EngineEvent, PersistedCurrentState, Publisher};
use crate::ranking;
use crate::tally::{Outcome, VoteSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineState {
    Idle,
    Active,
    BetweenGroups,
    Finished,
}

/// The process-wide singleton. Nil in every pointer when idle, or a fully
/// coherent tuple when a meet is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentState {
    pub meet_id: Option<Uuid>,
    pub flight_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub lift_id: Option<Uuid>,
    pub round: Option<i16>,
    pub current_registration_id: Option<Uuid>,
    pub timer_start_epoch_ms: Option<i64>,
    pub timer_duration_s: Option<u32>,
    pub status: MachineState,
}

impl Default for CurrentState {
    fn default() -> Self {
        Self {
            meet_id: None,
            flight_id: None,
            group_id: None,
            lift_id: None,
            round: None,
            current_registration_id: None,
            timer_start_epoch_ms: None,
            timer_duration_s: None,
            status: MachineState::Idle,
        }
    }
}

impl CurrentState {
    fn from_persisted(p: PersistedCurrentState) -> Self {
        let status = match p.status.as_str() {
            "ACTIVE" => MachineState::Active,
            "BETWEEN_GROUPS" => MachineState::BetweenGroups,
            "FINISHED" => MachineState::Finished,
            _ => MachineState::Idle,
        };
        Self {
            meet_id: p.meet_id,
            flight_id: p.flight_id,
            group_id: p.group_id,
            lift_id: p.lift_id,
            round: p.round,
            current_registration_id: p.current_registration_id,
            timer_start_epoch_ms: p.timer_start_epoch_ms,
            timer_duration_s: p.timer_duration_s.map(|d| d.max(0) as u32),
            status,
        }
    }

    fn to_persisted(&self) -> PersistedCurrentState {
        let status = match self.status {
            MachineState::Idle => "IDLE",
            MachineState::Active => "ACTIVE",
            MachineState::BetweenGroups => "BETWEEN_GROUPS",
            MachineState::Finished => "FINISHED",
        };
        PersistedCurrentState {
            meet_id: self.meet_id,
            flight_id: self.flight_id,
            group_id: self.group_id,
            lift_id: self.lift_id,
            round: self.round,
            current_registration_id: self.current_registration_id,
            timer_start_epoch_ms: self.timer_start_epoch_ms,
            timer_duration_s: self.timer_duration_s.map(|d| d as i32),
            status: status.to_string(),
        }
    }
}

enum Command {
    Initialize {
        meet_id: Uuid,
        flight_id: Uuid,
        lift_id: Uuid,
        reply: oneshot::Sender<Result<CurrentState>>,
    },
    DeclareWeight {
        registration_id: Uuid,
        lift_id: Uuid,
        attempt_no: i16,
        kg: Decimal,
        declared_by: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    Next {
        reply: oneshot::Sender<Result<CurrentState>>,
    },
    FinalizeFromTally {
        attempt_id: Uuid,
        outcome: Outcome,
        votes: VoteSnapshot,
        reply: oneshot::Sender<Result<()>>,
    },
    TimerStart {
        duration_s: u32,
        reply: oneshot::Sender<Result<()>>,
    },
    TimerStop {
        reply: oneshot::Sender<Result<()>>,
    },
    Reset {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// A cheaply-cloneable front for the actor. This is the "command port" the
/// broker (C6) depends on; the broker never touches `CurrentState` or
/// `CatalogPort` directly.
#[derive(Clone)]
pub struct Handle {
    tx: mpsc::Sender<Command>,
}

fn actor_gone() -> EngineError {
    EngineError::Fatal("state machine actor has stopped".to_string())
}

impl Handle {
    pub async fn initialize(&self, meet_id: Uuid, flight_id: Uuid, lift_id: Uuid) -> Result<CurrentState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Initialize { meet_id, flight_id, lift_id, reply })
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn declare_weight(
        &self,
        registration_id: Uuid,
        lift_id: Uuid,
        attempt_no: i16,
        kg: Decimal,
        declared_by: Option<String>,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::DeclareWeight { registration_id, lift_id, attempt_no, kg, declared_by, reply })
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn next(&self) -> Result<CurrentState> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Next { reply }).await.map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn finalize_from_tally(&self, attempt_id: Uuid, outcome: Outcome, votes: VoteSnapshot) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::FinalizeFromTally { attempt_id, outcome, votes, reply })
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn timer_start(&self, duration_s: u32) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::TimerStart { duration_s, reply })
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn timer_stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::TimerStop { reply }).await.map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn reset(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Reset { reply }).await.map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }
}

/// Starts the actor, restoring persisted state (or defaulting to idle if
/// none exists / the load fails) and returning a `Handle` clients use to
/// submit commands. Command processing is serialized by construction: the
/// loop below `.await`s one command to completion before pulling the next.
pub fn spawn(catalog: Arc<dyn CatalogPort>, publisher: Arc<dyn Publisher>) -> Handle {
    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(run(catalog, publisher, rx));
    Handle { tx }
}

async fn run(catalog: Arc<dyn CatalogPort>, publisher: Arc<dyn Publisher>, mut rx: mpsc::Receiver<Command>) {
    let mut state = match catalog.load_current_state().await {
        Ok(persisted) => CurrentState::from_persisted(persisted),
        Err(err) => {
            tracing::error!(?err, "failed to restore current_state, starting idle");
            CurrentState::default()
        }
    };
    let mut meet_type_id: Option<Uuid> = None;

    tracing::info!(status = ?state.status, "attempt state machine actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Initialize { meet_id, flight_id, lift_id, reply } => {
                let result = do_initialize(
                    catalog.as_ref(),
                    publisher.as_ref(),
                    &mut state,
                    &mut meet_type_id,
                    meet_id,
                    flight_id,
                    lift_id,
                )
                .await;
                log_transition("initialize", &result, &state);
                let _ = reply.send(result);
            }
            Command::DeclareWeight { registration_id, lift_id, attempt_no, kg, declared_by, reply } => {
                let result =
                    do_declare_weight(catalog.as_ref(), publisher.as_ref(), registration_id, lift_id, attempt_no, kg, declared_by)
                        .await;
                let _ = reply.send(result);
            }
            Command::Next { reply } => {
                let result = do_next(catalog.as_ref(), publisher.as_ref(), &mut state, &mut meet_type_id).await;
                log_transition("next", &result, &state);
                let _ = reply.send(result);
            }
            Command::FinalizeFromTally { attempt_id, outcome, votes, reply } => {
                let result =
                    do_finalize(catalog.as_ref(), publisher.as_ref(), &state, attempt_id, outcome, votes).await;
                let _ = reply.send(result);
            }
            Command::TimerStart { duration_s, reply } => {
                let result = do_timer_start(catalog.as_ref(), publisher.as_ref(), &mut state, duration_s).await;
                let _ = reply.send(result);
            }
            Command::TimerStop { reply } => {
                let result = do_timer_stop(catalog.as_ref(), publisher.as_ref(), &mut state).await;
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                let result = do_reset(catalog.as_ref(), publisher.as_ref(), &mut state, &mut meet_type_id).await;
                log_transition("reset", &result, &state);
                let _ = reply.send(result);
            }
        }
    }

    tracing::info!("attempt state machine actor stopped (command channel closed)");
}

fn log_transition<T>(command: &'static str, result: &Result<T>, state: &CurrentState) {
    match result {
        Ok(_) => tracing::info!(command, status = ?state.status, "state transition"),
        Err(err) => tracing::warn!(command, ?err, "state transition rejected"),
    }
}

/// `initialize(meetId, flightId, liftId)` sets flight to
/// the given flight, group to its first group, round to 1, current
/// registration to the queue's head. `NotReady` if the flight has no
/// groups or the first group has no entries with openers.
async fn do_initialize(
    catalog: &dyn CatalogPort,
    publisher: &dyn Publisher,
    state: &mut CurrentState,
    meet_type_id: &mut Option<Uuid>,
    meet_id: Uuid,
    flight_id: Uuid,
    lift_id: Uuid,
) -> Result<CurrentState> {
    let group_id = catalog
        .first_group(flight_id)
        .await?
        .ok_or_else(|| EngineError::NotReady("flight has no groups".to_string()))?;

    if catalog.group_entry_count(group_id).await? == 0 {
        return Err(EngineError::NotReady("first group has no entries".to_string()));
    }

    let weights = catalog.group_round_weights(group_id, lift_id, 1).await?;
    let queue = ordering::compute_queue(&weights);
    let first = queue
        .first()
        .ok_or_else(|| EngineError::NotReady("first group has no entries with openers".to_string()))?;

    *meet_type_id = Some(catalog.meet_type_id_for(meet_id).await?);

    *state = CurrentState {
        meet_id: Some(meet_id),
        flight_id: Some(flight_id),
        group_id: Some(group_id),
        lift_id: Some(lift_id),
        round: Some(1),
        current_registration_id: Some(first.registration_id),
        timer_start_epoch_ms: None,
        timer_duration_s: None,
        status: MachineState::Active,
    };

    catalog.save_current_state(&state.to_persisted()).await?;
    publisher.publish(EngineEvent::StateUpdate(state.clone())).await;
    publisher
        .publish(EngineEvent::QueueUpdate { group_id, lift_id, round: 1, queue })
        .await;

    Ok(state.clone())
}

/// `declareWeight(regId, liftId, attemptNo, kg)`: delegates to C1. May be
/// issued for the next round while another athlete is mid-attempt.
async fn do_declare_weight(
    catalog: &dyn CatalogPort,
    publisher: &dyn Publisher,
    registration_id: Uuid,
    lift_id: Uuid,
    attempt_no: i16,
    kg: Decimal,
    declared_by: Option<String>,
) -> Result<()> {
    catalog
        .declare_attempt(registration_id, lift_id, attempt_no, kg, declared_by)
        .await?;
    publisher
        .publish(EngineEvent::WeightUpdated { registration_id, lift_id, attempt_no, kg })
        .await;
    Ok(())
}

/// `next()`: advances the current registration pointer per the six-step
/// algorithm. A NEXT in `Idle` is a `StateConflict`; a NEXT in `Finished`
/// is an idempotent no-op.
async fn do_next(
    catalog: &dyn CatalogPort,
    publisher: &dyn Publisher,
    state: &mut CurrentState,
    meet_type_id: &mut Option<Uuid>,
) -> Result<CurrentState> {
    match state.status {
        MachineState::Idle => return Err(EngineError::StateConflict("no meet is active".to_string())),
        MachineState::Finished => return Ok(state.clone()),
        MachineState::Active | MachineState::BetweenGroups => {}
    }

    let meet_id = state.meet_id.expect("active state carries meet_id");
    let flight_id = state.flight_id.expect("active state carries flight_id");
    let mut group_id = state.group_id.expect("active state carries group_id");
    let mut lift_id = state.lift_id.expect("active state carries lift_id");
    let mut round = state.round.expect("active state carries round");

    let mtid = match *meet_type_id {
        Some(id) => id,
        None => {
            let id = catalog.meet_type_id_for(meet_id).await?;
            *meet_type_id = Some(id);
            id
        }
    };

    loop {
        let weights = catalog.group_round_weights(group_id, lift_id, round).await?;
        let queue = ordering::compute_queue(&weights);

        if let Some(first) = queue.first() {
            state.group_id = Some(group_id);
            state.lift_id = Some(lift_id);
            state.round = Some(round);
            state.current_registration_id = Some(first.registration_id);
            state.status = MachineState::Active;

            catalog.save_current_state(&state.to_persisted()).await?;
            publisher.publish(EngineEvent::StateUpdate(state.clone())).await;
            publisher
                .publish(EngineEvent::QueueUpdate { group_id, lift_id, round, queue })
                .await;
            return Ok(state.clone());
        }

        if round < 3 {
            round += 1;
            continue;
        }

        if let Some(next_group) = catalog.next_group(flight_id, group_id).await? {
            group_id = next_group;
            round = 1;
            continue;
        }

        if let Some(next_lift) = catalog.next_lift(mtid, lift_id).await? {
            lift_id = next_lift;
            group_id = catalog
                .first_group(flight_id)
                .await?
                .ok_or_else(|| EngineError::Fatal("flight lost its groups mid-meet".to_string()))?;
            round = 1;
            continue;
        }

        state.status = MachineState::Finished;
        state.current_registration_id = None;
        catalog.save_current_state(&state.to_persisted()).await?;
        publisher.publish(EngineEvent::StateUpdate(state.clone())).await;
        publisher
            .publish(EngineEvent::MeetFinished { reason: "all lifts in the meet-type are complete".to_string() })
            .await;
        return Ok(state.clone());
    }
}

/// `finalizeFromTally(attemptId, outcome)`: persists the outcome through
/// C1, publishes the result, then recomputes and publishes rankings.
/// Never calls `next()` itself -- advancement is always director-triggered.
async fn do_finalize(
    catalog: &dyn CatalogPort,
    publisher: &dyn Publisher,
    state: &CurrentState,
    attempt_id: Uuid,
    outcome: Outcome,
    votes: VoteSnapshot,
) -> Result<()> {
    let record = catalog.finalize_attempt(attempt_id, outcome).await?;

    publisher
        .publish(EngineEvent::AttemptResult {
            attempt_id,
            registration_id: record.registration_id,
            outcome,
            votes,
        })
        .await;

    if let Some(meet_id) = state.meet_id {
        let registrations = catalog.rankable_registrations(meet_id).await?;
        let best_marks = catalog.best_marks(meet_id).await?;
        let ranked = ranking::rank_meet(&registrations, &best_marks);
        publisher.publish(EngineEvent::RankingUpdate(ranked)).await;
    }

    Ok(())
}

async fn do_timer_start(
    catalog: &dyn CatalogPort,
    publisher: &dyn Publisher,
    state: &mut CurrentState,
    duration_s: u32,
) -> Result<()> {
    if state.status == MachineState::Idle {
        return Err(EngineError::StateConflict("no meet is active".to_string()));
    }
    let start_epoch_ms = epoch_ms_now();
    state.timer_start_epoch_ms = Some(start_epoch_ms);
    state.timer_duration_s = Some(duration_s);
    catalog.save_current_state(&state.to_persisted()).await?;
    publisher
        .publish(EngineEvent::TimerStarted { start_epoch_ms, duration_s })
        .await;
    Ok(())
}

async fn do_timer_stop(catalog: &dyn CatalogPort, publisher: &dyn Publisher, state: &mut CurrentState) -> Result<()> {
    state.timer_start_epoch_ms = None;
    state.timer_duration_s = None;
    catalog.save_current_state(&state.to_persisted()).await?;
    publisher.publish(EngineEvent::TimerStopped).await;
    Ok(())
}

/// `reset()`: returns to IDLE for operator recovery.
async fn do_reset(
    catalog: &dyn CatalogPort,
    publisher: &dyn Publisher,
    state: &mut CurrentState,
    meet_type_id: &mut Option<Uuid>,
) -> Result<()> {
    *state = CurrentState::default();
    *meet_type_id = None;
    catalog.save_current_state(&state.to_persisted()).await?;
    publisher.publish(EngineEvent::StateUpdate(state.clone())).await;
    Ok(())
}

fn epoch_ms_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AttemptRecord, AttemptStatus, BestMark, GroupRoundWeight, RankableRegistration};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct FakeCatalogState {
        /// (group_id, lift_id, round) -> entries
        round_weights: HashMap<(Uuid, Uuid, i16), Vec<GroupRoundWeight>>,
        first_group: HashMap<Uuid, Uuid>,
        next_group: HashMap<(Uuid, Uuid), Uuid>,
        entry_counts: HashMap<Uuid, i64>,
        meet_type: HashMap<Uuid, Uuid>,
        persisted: PersistedCurrentState,
    }

    struct FakeCatalog {
        state: AsyncMutex<FakeCatalogState>,
    }

    #[async_trait::async_trait]
    impl CatalogPort for FakeCatalog {
        async fn group_round_weights(&self, group_id: Uuid, lift_id: Uuid, round: i16) -> Result<Vec<GroupRoundWeight>> {
            let state = self.state.lock().await;
            Ok(state.round_weights.get(&(group_id, lift_id, round)).cloned().unwrap_or_default())
        }

        async fn declare_attempt(
            &self,
            registration_id: Uuid,
            lift_id: Uuid,
            attempt_no: i16,
            weight_kg: Decimal,
            _declared_by: Option<String>,
        ) -> Result<AttemptRecord> {
            Ok(AttemptRecord {
                attempt_id: Uuid::new_v4(),
                registration_id,
                lift_id,
                attempt_no,
                weight_kg,
                status: AttemptStatus::Pending,
            })
        }

        async fn finalize_attempt(&self, attempt_id: Uuid, outcome: Outcome) -> Result<AttemptRecord> {
            Ok(AttemptRecord {
                attempt_id,
                registration_id: Uuid::new_v4(),
                lift_id: Uuid::new_v4(),
                attempt_no: 1,
                weight_kg: Decimal::new(1000, 1),
                status: outcome.into(),
            })
        }

        async fn first_group(&self, flight_id: Uuid) -> Result<Option<Uuid>> {
            Ok(self.state.lock().await.first_group.get(&flight_id).copied())
        }

        async fn next_group(&self, flight_id: Uuid, group_id: Uuid) -> Result<Option<Uuid>> {
            let _ = flight_id;
            Ok(self.state.lock().await.next_group.get(&(flight_id, group_id)).copied())
        }

        async fn group_entry_count(&self, group_id: Uuid) -> Result<i64> {
            Ok(self.state.lock().await.entry_counts.get(&group_id).copied().unwrap_or(0))
        }

        async fn meet_type_id_for(&self, meet_id: Uuid) -> Result<Uuid> {
            Ok(self.state.lock().await.meet_type.get(&meet_id).copied().unwrap_or_else(Uuid::new_v4))
        }

        async fn first_lift(&self, _meet_type_id: Uuid) -> Result<Option<Uuid>> {
            Ok(None)
        }

        async fn next_lift(&self, _meet_type_id: Uuid, _lift_id: Uuid) -> Result<Option<Uuid>> {
            Ok(None)
        }

        async fn lifts_for_meet_type(&self, _meet_type_id: Uuid) -> Result<Vec<Uuid>> {
            Ok(vec![])
        }

        async fn load_current_state(&self) -> Result<PersistedCurrentState> {
            Ok(self.state.lock().await.persisted.clone())
        }

        async fn save_current_state(&self, state: &PersistedCurrentState) -> Result<()> {
            self.state.lock().await.persisted = state.clone();
            Ok(())
        }

        async fn best_marks(&self, _meet_id: Uuid) -> Result<Vec<BestMark>> {
            Ok(vec![])
        }

        async fn rankable_registrations(&self, _meet_id: Uuid) -> Result<Vec<RankableRegistration>> {
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: StdMutex<Vec<EngineEvent>>,
    }

    #[async_trait::async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, event: EngineEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn entry(reg: Uuid, bw: &str, kg: &str, start_ord: i32) -> GroupRoundWeight {
        GroupRoundWeight {
            registration_id: reg,
            bodyweight_kg: bw.parse().unwrap(),
            start_ord,
            declared_kg: Some(kg.parse().unwrap()),
            status: None,
        }
    }

    #[tokio::test]
    async fn initialize_fails_not_ready_on_empty_group() {
        let flight_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let mut fake_state = FakeCatalogState::default();
        fake_state.first_group.insert(flight_id, group_id);
        fake_state.entry_counts.insert(group_id, 0);
        let catalog: Arc<dyn CatalogPort> = Arc::new(FakeCatalog { state: AsyncMutex::new(fake_state) });
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::default());

        let handle = spawn(catalog, publisher);
        let err = handle
            .initialize(Uuid::new_v4(), flight_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotReady");
    }

    #[tokio::test]
    async fn initialize_then_next_advances_through_rounds() {
        let meet_id = Uuid::new_v4();
        let flight_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let lift_id = Uuid::new_v4();
        let athlete = Uuid::new_v4();

        let mut fake_state = FakeCatalogState::default();
        fake_state.first_group.insert(flight_id, group_id);
        fake_state.entry_counts.insert(group_id, 1);
        fake_state
            .round_weights
            .insert((group_id, lift_id, 1), vec![entry(athlete, "80", "100", 1)]);
        // Round 2 has no declaration yet -> deferred -> empty queue -> NEXT
        // must advance rounds until it runs out, then finish (no next group/lift).
        fake_state.round_weights.insert((group_id, lift_id, 2), vec![]);
        fake_state.round_weights.insert((group_id, lift_id, 3), vec![]);

        let catalog: Arc<dyn CatalogPort> = Arc::new(FakeCatalog { state: AsyncMutex::new(fake_state) });
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::default());
        let handle = spawn(catalog, publisher);

        let state = handle.initialize(meet_id, flight_id, lift_id).await.unwrap();
        assert_eq!(state.status, MachineState::Active);
        assert_eq!(state.current_registration_id, Some(athlete));
        assert_eq!(state.round, Some(1));

        let finished = handle.next().await.unwrap();
        assert_eq!(finished.status, MachineState::Finished);
        assert_eq!(finished.current_registration_id, None);

        // A retried NEXT against FINISHED is an idempotent no-op.
        let still_finished = handle.next().await.unwrap();
        assert_eq!(still_finished.status, MachineState::Finished);
    }

    #[tokio::test]
    async fn next_in_idle_is_state_conflict() {
        let catalog: Arc<dyn CatalogPort> = Arc::new(FakeCatalog { state: AsyncMutex::new(FakeCatalogState::default()) });
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::default());
        let handle = spawn(catalog, publisher);

        let err = handle.next().await.unwrap_err();
        assert_eq!(err.kind(), "StateConflict");
    }

    #[tokio::test]
    async fn scenario_group_transition() {
        // End-to-end scenario 4: G1 (1 athlete) finishes round 3 of MU, NEXT
        // places the machine on G2 round 1 same lift.
        let meet_id = Uuid::new_v4();
        let flight_id = Uuid::new_v4();
        let g1 = Uuid::new_v4();
        let g2 = Uuid::new_v4();
        let lift_id = Uuid::new_v4();
        let athlete_g1 = Uuid::new_v4();
        let athlete_g2 = Uuid::new_v4();

        let mut fake_state = FakeCatalogState::default();
        fake_state.first_group.insert(flight_id, g1);
        fake_state.next_group.insert((flight_id, g1), g2);
        fake_state.entry_counts.insert(g1, 1);
        fake_state.entry_counts.insert(g2, 1);
        fake_state
            .round_weights
            .insert((g1, lift_id, 1), vec![entry(athlete_g1, "80", "100", 1)]);
        fake_state.round_weights.insert((g1, lift_id, 2), vec![]);
        fake_state.round_weights.insert((g1, lift_id, 3), vec![]);
        fake_state
            .round_weights
            .insert((g2, lift_id, 1), vec![entry(athlete_g2, "80", "100", 1)]);

        let catalog: Arc<dyn CatalogPort> = Arc::new(FakeCatalog { state: AsyncMutex::new(fake_state) });
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::default());
        let handle = spawn(catalog, publisher);

        handle.initialize(meet_id, flight_id, lift_id).await.unwrap();
        let next_state = handle.next().await.unwrap();

        assert_eq!(next_state.group_id, Some(g2));
        assert_eq!(next_state.lift_id, Some(lift_id));
        assert_eq!(next_state.round, Some(1));
        assert_eq!(next_state.current_registration_id, Some(athlete_g2));
    }

    #[tokio::test]
    async fn declare_weight_does_not_require_active_meet() {
        let catalog: Arc<dyn CatalogPort> = Arc::new(FakeCatalog { state: AsyncMutex::new(FakeCatalogState::default()) });
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::default());
        let handle = spawn(catalog, publisher);

        handle
            .declare_weight(Uuid::new_v4(), Uuid::new_v4(), 2, Decimal::new(1000, 1), Some("director-1".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let flight_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let lift_id = Uuid::new_v4();
        let athlete = Uuid::new_v4();

        let mut fake_state = FakeCatalogState::default();
        fake_state.first_group.insert(flight_id, group_id);
        fake_state.entry_counts.insert(group_id, 1);
        fake_state
            .round_weights
            .insert((group_id, lift_id, 1), vec![entry(athlete, "80", "100", 1)]);

        let catalog: Arc<dyn CatalogPort> = Arc::new(FakeCatalog { state: AsyncMutex::new(fake_state) });
        let publisher: Arc<dyn Publisher> = Arc::new(RecordingPublisher::default());
        let handle = spawn(catalog, publisher);

        handle.initialize(Uuid::new_v4(), flight_id, lift_id).await.unwrap();
        handle.reset().await.unwrap();

        let err = handle.next().await.unwrap_err();
        assert_eq!(err.kind(), "StateConflict");
    }
}
