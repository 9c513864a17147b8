//! Postgres-backed implementations of the `LocalSource`/`RemoteArchive`
//! ports, used by the `server` CLI's `sync` subcommand. All the actual
//! `sqlx` queries live in `storage`'s repositories; this module only wires
//! them to the trait seam and owns the remote all-or-nothing transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use storage::dto::athlete::CreateAthleteRequest;
use storage::error::StorageError;
use storage::repository::athlete::AthleteRepository;
use storage::repository::category::CategoryRepository;
use storage::repository::flight::FlightRepository;
use storage::repository::meet::MeetRepository;
use storage::repository::ranking::RankingRepository;
use storage::repository::record::RecordRepository;
use storage::repository::registration::RegistrationRepository;
use storage::repository::result::ResultRepository;
use storage::Database;
use uuid::Uuid;

use crate::error::{Result, SyncError};
use crate::ports::{
    AthleteIdentity, BestMark, CategoryNames, CommitOutcome, LocalLift, LocalMeet, LocalSource, MeetUpload,
    RankableRegistration, RemoteArchive,
};

pub struct PgLocalSource<'a> {
    db: &'a Database,
}

impl<'a> PgLocalSource<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<'a> LocalSource for PgLocalSource<'a> {
    async fn find_meet_by_code(&self, meet_code: &str) -> Result<LocalMeet> {
        let meet = MeetRepository::new(self.db.pool()).find_by_code(meet_code).await.map_err(|e| match e {
            StorageError::NotFound => SyncError::UnknownMeet(meet_code.to_string()),
            other => SyncError::Storage(other),
        })?;
        let meet_type = MeetRepository::new(self.db.pool()).meet_type_by_id(meet.meet_type_id).await?;

        Ok(LocalMeet {
            meet_id: meet.meet_id,
            meet_code: meet.meet_code,
            name: meet.name,
            date: meet.date,
            level: meet.level,
            regulation_tag: meet.regulation_tag,
            meet_type_id: meet.meet_type_id,
            meet_type_name: meet_type.name,
        })
    }

    async fn lifts_for_meet_type(&self, meet_type_id: Uuid) -> Result<Vec<LocalLift>> {
        let lifts = FlightRepository::new(self.db.pool()).lifts_for_meet_type(meet_type_id).await?;
        Ok(lifts.into_iter().map(|l| LocalLift { lift_id: l.lift_id, code: l.code, order_index: l.order_index }).collect())
    }

    async fn rankable_registrations(&self, meet_id: Uuid) -> Result<Vec<RankableRegistration>> {
        let rows = RankingRepository::new(self.db.pool()).rankable_registrations(meet_id).await?;
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

    async fn best_marks(&self, meet_id: Uuid) -> Result<Vec<BestMark>> {
        let rows = RankingRepository::new(self.db.pool()).best_marks(meet_id).await?;
        Ok(rows
            .into_iter()
            .map(|r| BestMark { registration_id: r.registration_id, lift_id: r.lift_id, best_kg: r.best_kg })
            .collect())
    }

    async fn athlete_identity(&self, registration_id: Uuid) -> Result<AthleteIdentity> {
        let registration = RegistrationRepository::new(self.db.pool()).find_by_id(registration_id).await?;
        let athlete = AthleteRepository::new(self.db.pool()).find_by_id(registration.athlete_id).await?;
        Ok(AthleteIdentity {
            cf: athlete.cf,
            given_name: athlete.given_name,
            family_name: athlete.family_name,
            sex: athlete.sex,
            date_of_birth: athlete.date_of_birth,
        })
    }

    async fn category_names(
        &self,
        weight_category_id: Option<Uuid>,
        age_category_id: Option<Uuid>,
    ) -> Result<CategoryNames> {
        let category_repo = CategoryRepository::new(self.db.pool());
        let weight_category_name = match weight_category_id {
            Some(id) => Some(category_repo.weight_category_by_id(id).await?.name),
            None => None,
        };
        let age_category_name = match age_category_id {
            Some(id) => Some(category_repo.age_category_by_id(id).await?.name),
            None => None,
        };
        Ok(CategoryNames { weight_category_name, age_category_name })
    }
}

pub struct PgRemoteArchive<'a> {
    db: &'a Database,
}

impl<'a> PgRemoteArchive<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<'a> RemoteArchive for PgRemoteArchive<'a> {
    async fn exists_by_code(&self, meet_code: &str) -> Result<bool> {
        Ok(MeetRepository::new(self.db.pool()).exists_by_code(meet_code).await?)
    }

    async fn upsert_athlete(&self, athlete: &AthleteIdentity) -> Result<()> {
        AthleteRepository::new(self.db.pool())
            .upsert(&CreateAthleteRequest {
                cf: athlete.cf.clone(),
                given_name: athlete.given_name.clone(),
                family_name: athlete.family_name.clone(),
                sex: athlete.sex.clone(),
                date_of_birth: athlete.date_of_birth,
            })
            .await?;
        Ok(())
    }

    /// Everything from here runs inside one remote transaction; any
    /// failure leaves the remote archive exactly as it was before the
    /// call (spec.md §4.7 step 4/5).
    async fn commit_meet(&self, upload: MeetUpload) -> Result<CommitOutcome> {
        let mut tx = self.db.pool().begin().await.map_err(StorageError::from)?;

        let meet_type = MeetRepository::find_or_create_meet_type_in_tx(&mut tx, &upload.meet_type_name).await?;

        let mut remote_lift_id_by_code: HashMap<String, Uuid> = HashMap::new();
        for lift in &upload.lifts {
            let remote_lift =
                FlightRepository::upsert_lift_in_tx(&mut tx, meet_type.meet_type_id, &lift.code, lift.order_index).await?;
            remote_lift_id_by_code.insert(lift.code.clone(), remote_lift.lift_id);
        }

        let remote_meet = MeetRepository::insert_in_tx(
            &mut tx,
            &upload.meet_code,
            &upload.name,
            upload.date,
            &upload.level,
            &upload.regulation_tag,
            meet_type.meet_type_id,
        )
        .await?;
        tracing::info!(remote_meet_id = %remote_meet.meet_id, "inserted remote meet");

        let today = chrono::Utc::now().date_naive();
        let mut records_promoted = 0usize;
        for candidate in &upload.record_promotions {
            let Some(&lift_id) = remote_lift_id_by_code.get(&candidate.lift_code) else { continue };
            let did_promote = RecordRepository::promote_in_tx(
                &mut tx,
                &candidate.weight_category_name,
                &candidate.age_category_name,
                lift_id,
                candidate.kg,
                candidate.bodyweight_kg,
                &candidate.athlete_cf,
                &upload.meet_code,
                today,
            )
            .await?;
            if did_promote {
                records_promoted += 1;
            }
        }

        let mut results_written = 0usize;
        for result in &upload.results {
            let result_id = ResultRepository::upsert_in_tx(
                &mut tx,
                remote_meet.meet_id,
                &result.athlete_cf,
                result.weight_category_name.as_deref(),
                result.age_category_name.as_deref(),
                result.total_kg,
                result.bodyweight_kg,
                result.ris_score,
                result.category_placement,
                result.absolute_placement,
            )
            .await?;
            results_written += 1;

            for (lift_code, best_kg) in &result.lift_bests {
                let Some(&lift_id) = remote_lift_id_by_code.get(lift_code) else { continue };
                ResultRepository::insert_lift_in_tx(&mut tx, result_id, lift_id, *best_kg).await?;
            }
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(CommitOutcome { records_promoted, results_written })
    }
}
