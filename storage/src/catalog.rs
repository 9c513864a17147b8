//! Bridges this crate's Postgres-backed repositories to `engine::ports::
//! CatalogPort`, the narrow seam the competition-flow engine (C2-C5)
//! depends on instead of touching sqlx directly -- dependency flows one
//! way. Wired in by the `server` crate's composition root; nothing in
//! `engine` imports this module.

use engine::ports::{
    AttemptRecord as EngineAttemptRecord, AttemptStatus as EngineAttemptStatus, BestMark,
    CatalogPort, GroupRoundWeight as EngineGroupRoundWeight, PersistedCurrentState,
    RankableRegistration,
};
use engine::tally::Outcome;
use engine::EngineError;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{Attempt, AttemptStatus, CurrentStateRow};
use crate::repository::attempt::AttemptRepository;
use crate::repository::current_state::CurrentStateRepository;
use crate::repository::flight::FlightRepository;
use crate::repository::meet::MeetRepository;
use crate::repository::ranking::RankingRepository;
use crate::Database;

pub struct StorageCatalog {
    db: Database,
}

impl StorageCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn map_err(err: StorageError) -> EngineError {
    match err {
        StorageError::NotFound => EngineError::NotFound("not found".to_string()),
        StorageError::BadInput(msg) => EngineError::BadInput(msg),
        StorageError::StateConflict(msg) => EngineError::StateConflict(msg),
        StorageError::NotReady(msg) => EngineError::NotReady(msg),
        StorageError::ConstraintViolation(msg) => EngineError::StateConflict(msg),
        StorageError::Database(e) => EngineError::Transient(e.to_string()),
        StorageError::Migration(e) => EngineError::Fatal(e.to_string()),
    }
}

fn to_engine_status(status: AttemptStatus) -> EngineAttemptStatus {
    match status {
        AttemptStatus::Pending => EngineAttemptStatus::Pending,
        AttemptStatus::Valid => EngineAttemptStatus::Valid,
        AttemptStatus::Invalid => EngineAttemptStatus::Invalid,
    }
}

fn from_engine_status(status: EngineAttemptStatus) -> AttemptStatus {
    match status {
        EngineAttemptStatus::Pending => AttemptStatus::Pending,
        EngineAttemptStatus::Valid => AttemptStatus::Valid,
        EngineAttemptStatus::Invalid => AttemptStatus::Invalid,
    }
}

fn to_engine_attempt(a: Attempt) -> EngineAttemptRecord {
    EngineAttemptRecord {
        attempt_id: a.attempt_id,
        registration_id: a.registration_id,
        lift_id: a.lift_id,
        attempt_no: a.attempt_no,
        weight_kg: a.weight_kg,
        status: to_engine_status(a.status),
    }
}

#[async_trait::async_trait]
impl CatalogPort for StorageCatalog {
    async fn group_round_weights(
        &self,
        group_id: Uuid,
        lift_id: Uuid,
        round: i16,
    ) -> engine::Result<Vec<EngineGroupRoundWeight>> {
        let repo = AttemptRepository::new(self.db.pool());
        let rows = repo
            .group_round_weights(group_id, lift_id, round)
            .await
            .map_err(map_err)?;

        Ok(rows
            .into_iter()
            .map(|r| EngineGroupRoundWeight {
                registration_id: r.registration_id,
                bodyweight_kg: r.bodyweight_kg,
                start_ord: r.start_ord,
                declared_kg: r.declared_kg,
                status: r.status.map(to_engine_status),
            })
            .collect())
    }

    async fn declare_attempt(
        &self,
        registration_id: Uuid,
        lift_id: Uuid,
        attempt_no: i16,
        weight_kg: Decimal,
        declared_by: Option<String>,
    ) -> engine::Result<EngineAttemptRecord> {
        let repo = AttemptRepository::new(self.db.pool());
        let attempt = repo
            .declare_attempt(registration_id, lift_id, attempt_no, weight_kg, declared_by.as_deref())
            .await
            .map_err(map_err)?;
        Ok(to_engine_attempt(attempt))
    }

    async fn finalize_attempt(&self, attempt_id: Uuid, outcome: Outcome) -> engine::Result<EngineAttemptRecord> {
        let repo = AttemptRepository::new(self.db.pool());
        let status = from_engine_status(outcome.into());
        let attempt = repo.finalize_attempt(attempt_id, status).await.map_err(map_err)?;
        Ok(to_engine_attempt(attempt))
    }

    async fn first_group(&self, flight_id: Uuid) -> engine::Result<Option<Uuid>> {
        let repo = FlightRepository::new(self.db.pool());
        Ok(repo.first_group(flight_id).await.map_err(map_err)?.map(|g| g.group_id))
    }

    async fn next_group(&self, flight_id: Uuid, group_id: Uuid) -> engine::Result<Option<Uuid>> {
        let repo = FlightRepository::new(self.db.pool());
        Ok(repo
            .next_group(flight_id, group_id)
            .await
            .map_err(map_err)?
            .map(|g| g.group_id))
    }

    async fn group_entry_count(&self, group_id: Uuid) -> engine::Result<i64> {
        let repo = FlightRepository::new(self.db.pool());
        repo.group_entry_count(group_id).await.map_err(map_err)
    }

    async fn meet_type_id_for(&self, meet_id: Uuid) -> engine::Result<Uuid> {
        let repo = MeetRepository::new(self.db.pool());
        repo.meet_type_id_for(meet_id).await.map_err(map_err)
    }

    async fn first_lift(&self, meet_type_id: Uuid) -> engine::Result<Option<Uuid>> {
        let repo = FlightRepository::new(self.db.pool());
        Ok(repo.first_lift(meet_type_id).await.map_err(map_err)?.map(|l| l.lift_id))
    }

    async fn next_lift(&self, meet_type_id: Uuid, lift_id: Uuid) -> engine::Result<Option<Uuid>> {
        let repo = FlightRepository::new(self.db.pool());
        Ok(repo
            .next_lift(meet_type_id, lift_id)
            .await
            .map_err(map_err)?
            .map(|l| l.lift_id))
    }

    async fn lifts_for_meet_type(&self, meet_type_id: Uuid) -> engine::Result<Vec<Uuid>> {
        let repo = FlightRepository::new(self.db.pool());
        Ok(repo
            .lifts_for_meet_type(meet_type_id)
            .await
            .map_err(map_err)?
            .into_iter()
            .map(|l| l.lift_id)
            .collect())
    }

    async fn load_current_state(&self) -> engine::Result<PersistedCurrentState> {
        let repo = CurrentStateRepository::new(self.db.pool());
        let row = repo.load().await.map_err(map_err)?;
        Ok(persisted_from_row(row))
    }

    async fn save_current_state(&self, state: &PersistedCurrentState) -> engine::Result<()> {
        let repo = CurrentStateRepository::new(self.db.pool());
        let row = row_from_persisted(state);
        repo.save(&row).await.map_err(map_err)
    }

    async fn best_marks(&self, meet_id: Uuid) -> engine::Result<Vec<BestMark>> {
        let repo = RankingRepository::new(self.db.pool());
        let rows = repo.best_marks(meet_id).await.map_err(map_err)?;
        Ok(rows
            .into_iter()
            .map(|r| BestMark {
                registration_id: r.registration_id,
                lift_id: r.lift_id,
                best_kg: r.best_kg,
            })
            .collect())
    }

    async fn rankable_registrations(&self, meet_id: Uuid) -> engine::Result<Vec<RankableRegistration>> {
        let repo = RankingRepository::new(self.db.pool());
        let rows = repo.rankable_registrations(meet_id).await.map_err(map_err)?;
        Ok(rows
            .into_iter()
            .map(|r| RankableRegistration {
                registration_id: r.registration_id,
                sex: r.sex,
                weight_category_id: r.weight_category_id,
                age_category_id: r.age_category_id,
                bodyweight_kg: r.bodyweight_kg,
                start_ord: r.start_ord,
            })
            .collect())
    }
}

fn persisted_from_row(row: CurrentStateRow) -> PersistedCurrentState {
    PersistedCurrentState {
        meet_id: row.meet_id,
        flight_id: row.flight_id,
        group_id: row.group_id,
        lift_id: row.lift_id,
        round: row.round,
        current_registration_id: row.current_registration_id,
        timer_start_epoch_ms: row.timer_start.map(|t| t.and_utc().timestamp_millis()),
        timer_duration_s: row.timer_duration_s,
        status: row.status,
    }
}

fn row_from_persisted(state: &PersistedCurrentState) -> CurrentStateRow {
    CurrentStateRow {
        id: 1,
        meet_id: state.meet_id,
        flight_id: state.flight_id,
        group_id: state.group_id,
        lift_id: state.lift_id,
        round: state.round,
        current_registration_id: state.current_registration_id,
        timer_start: state
            .timer_start_epoch_ms
            .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms))
            .map(|dt| dt.naive_utc()),
        timer_duration_s: state.timer_duration_s,
        status: state.status.clone(),
    }
}
