//! Trait seam between the resolver's orchestration (`resolver.rs`,
//! `rules.rs`) and the concrete Postgres-backed archives (`pg.rs`). Mirrors
//! `engine::ports::CatalogPort`: the resolver depends only on these traits,
//! never on `sqlx`/`storage` types directly, so its control flow can be
//! exercised against in-memory fakes in tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub use engine::ports::{BestMark, RankableRegistration};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct AthleteIdentity {
    pub cf: String,
    pub given_name: String,
    pub family_name: String,
    pub sex: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct LocalMeet {
    pub meet_id: Uuid,
    pub meet_code: String,
    pub name: String,
    pub date: NaiveDate,
    pub level: String,
    pub regulation_tag: String,
    pub meet_type_id: Uuid,
    pub meet_type_name: String,
}

#[derive(Debug, Clone)]
pub struct LocalLift {
    pub lift_id: Uuid,
    pub code: String,
    pub order_index: i16,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryNames {
    pub weight_category_name: Option<String>,
    pub age_category_name: Option<String>,
}

/// The local archive half of the protocol -- everything read, nothing
/// written. Implemented against `storage`'s repositories in `pg.rs`.
#[async_trait]
pub trait LocalSource: Send + Sync {
    async fn find_meet_by_code(&self, meet_code: &str) -> Result<LocalMeet>;
    async fn lifts_for_meet_type(&self, meet_type_id: Uuid) -> Result<Vec<LocalLift>>;
    async fn rankable_registrations(&self, meet_id: Uuid) -> Result<Vec<RankableRegistration>>;
    async fn best_marks(&self, meet_id: Uuid) -> Result<Vec<BestMark>>;
    async fn athlete_identity(&self, registration_id: Uuid) -> Result<AthleteIdentity>;
    async fn category_names(
        &self,
        weight_category_id: Option<Uuid>,
        age_category_id: Option<Uuid>,
    ) -> Result<CategoryNames>;
}

/// A (weight category, age category, lift) combo's best local mark,
/// proposed to the remote archive as a record candidate. Whether it
/// actually promotes is decided against the remote's own current mark
/// inside `RemoteArchive::commit_meet`.
#[derive(Debug, Clone)]
pub struct RecordCandidate {
    pub weight_category_name: String,
    pub age_category_name: String,
    pub lift_code: String,
    pub kg: Decimal,
    pub bodyweight_kg: Decimal,
    pub athlete_cf: String,
}

#[derive(Debug, Clone)]
pub struct ResultUpload {
    pub athlete_cf: String,
    pub weight_category_name: Option<String>,
    pub age_category_name: Option<String>,
    pub total_kg: Decimal,
    pub bodyweight_kg: Decimal,
    pub ris_score: Decimal,
    pub category_placement: Option<i32>,
    pub absolute_placement: Option<i32>,
    pub lift_bests: Vec<(String, Decimal)>,
}

#[derive(Debug, Clone)]
pub struct MeetUpload {
    pub meet_code: String,
    pub name: String,
    pub date: NaiveDate,
    pub level: String,
    pub regulation_tag: String,
    pub meet_type_name: String,
    pub lifts: Vec<LocalLift>,
    pub record_promotions: Vec<RecordCandidate>,
    pub results: Vec<ResultUpload>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOutcome {
    pub records_promoted: usize,
    pub results_written: usize,
}

/// The remote archive half: identity upsert, the `AlreadySynced` guard, and
/// the all-or-nothing commit (step 4 of spec.md §4.7).
#[async_trait]
pub trait RemoteArchive: Send + Sync {
    async fn exists_by_code(&self, meet_code: &str) -> Result<bool>;
    async fn upsert_athlete(&self, athlete: &AthleteIdentity) -> Result<()>;
    async fn commit_meet(&self, upload: MeetUpload) -> Result<CommitOutcome>;
}
