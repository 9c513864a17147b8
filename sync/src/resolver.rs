//! Orchestrates the 5-step protocol of spec.md §4.7 against the
//! `LocalSource`/`RemoteArchive` port seam -- pure control flow, no `sqlx`
//! or `storage` types in scope, so it is exercised directly against
//! in-memory fakes in this module's tests.

use std::collections::HashMap;

use engine::ranking::rank_meet;
use uuid::Uuid;

use crate::error::{Result, SyncError};
use crate::ports::{CategoryNames, LocalSource, MeetUpload, RankableRegistration, RemoteArchive};
use crate::rules::{build_result_uploads, select_record_candidates};

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub meet_code: String,
    pub athletes_upserted: usize,
    pub records_promoted: usize,
    pub results_written: usize,
}

/// Runs the 5-step protocol against `local` and `remote` archives sharing
/// the same schema. `force` bypasses the `AlreadySynced` guard (step 3)
/// only; every other step always runs.
#[tracing::instrument(skip(local, remote), fields(meet_code))]
pub async fn sync_meet<L, R>(local: &L, remote: &R, meet_code: &str, force: bool) -> Result<SyncReport>
where
    L: LocalSource,
    R: RemoteArchive,
{
    // Step 1: load the local meet by code.
    let local_meet = local.find_meet_by_code(meet_code).await?;
    tracing::info!(meet_id = %local_meet.meet_id, "loaded local meet");

    let lifts = local.lifts_for_meet_type(local_meet.meet_type_id).await?;
    let rankable = local.rankable_registrations(local_meet.meet_id).await?;
    let best_marks = local.best_marks(local_meet.meet_id).await?;

    // Step 2: upsert every athlete in the meet into the remote archive by
    // CF. This always runs, even if step 3 below rejects the sync.
    let mut athlete_cf_by_registration: HashMap<Uuid, String> = HashMap::new();
    for entry in &rankable {
        let identity = local.athlete_identity(entry.registration_id).await?;
        remote.upsert_athlete(&identity).await?;
        athlete_cf_by_registration.insert(entry.registration_id, identity.cf);
    }
    let athletes_upserted = athlete_cf_by_registration.len();
    tracing::info!(athletes_upserted, "athletes upserted into remote archive");

    // Step 3: refuse a second sync unless the caller forces it.
    if remote.exists_by_code(meet_code).await? && !force {
        return Err(SyncError::AlreadySynced(meet_code.to_string()));
    }

    let category_names_by_registration = resolve_category_names(local, &rankable).await?;
    let lift_code_by_id: HashMap<Uuid, String> = lifts.iter().map(|l| (l.lift_id, l.code.clone())).collect();

    let record_promotions = select_record_candidates(
        &rankable,
        &best_marks,
        &athlete_cf_by_registration,
        &category_names_by_registration,
        &lift_code_by_id,
    );

    let ranked = rank_meet(&rankable, &best_marks);
    let results = build_result_uploads(
        &ranked,
        &athlete_cf_by_registration,
        &category_names_by_registration,
        &best_marks,
        &lift_code_by_id,
    );

    let upload = MeetUpload {
        meet_code: meet_code.to_string(),
        name: local_meet.name,
        date: local_meet.date,
        level: local_meet.level,
        regulation_tag: local_meet.regulation_tag,
        meet_type_name: local_meet.meet_type_name,
        lifts,
        record_promotions,
        results,
    };

    // Step 4 + 5: the remote archive decides, inside its own all-or-nothing
    // transaction, which candidates actually beat its current standing
    // marks, then commits or leaves itself untouched on any failure.
    let outcome = remote.commit_meet(upload).await?;
    tracing::info!(
        records_promoted = outcome.records_promoted,
        results_written = outcome.results_written,
        "sync committed"
    );

    Ok(SyncReport {
        meet_code: meet_code.to_string(),
        athletes_upserted,
        records_promoted: outcome.records_promoted,
        results_written: outcome.results_written,
    })
}

async fn resolve_category_names<L: LocalSource>(
    local: &L,
    rankable: &[RankableRegistration],
) -> Result<HashMap<Uuid, CategoryNames>> {
    let mut cache: HashMap<(Option<Uuid>, Option<Uuid>), CategoryNames> = HashMap::new();
    let mut out = HashMap::new();

    for reg in rankable {
        let key = (reg.weight_category_id, reg.age_category_id);
        let names = match cache.get(&key) {
            Some(n) => n.clone(),
            None => {
                let n = local.category_names(reg.weight_category_id, reg.age_category_id).await?;
                cache.insert(key, n.clone());
                n
            }
        };
        out.insert(reg.registration_id, names);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::ports::{AthleteIdentity, BestMark, CommitOutcome, LocalLift, LocalMeet};
    use crate::rules::should_promote;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    struct FakeLocal {
        meet: LocalMeet,
        lifts: Vec<LocalLift>,
        rankable: Vec<RankableRegistration>,
        best_marks: Vec<BestMark>,
        athletes: HashMap<Uuid, AthleteIdentity>,
        category_names: HashMap<(Option<Uuid>, Option<Uuid>), CategoryNames>,
    }

    #[async_trait]
    impl LocalSource for FakeLocal {
        async fn find_meet_by_code(&self, meet_code: &str) -> Result<LocalMeet> {
            if meet_code == self.meet.meet_code {
                Ok(self.meet.clone())
            } else {
                Err(SyncError::UnknownMeet(meet_code.to_string()))
            }
        }

        async fn lifts_for_meet_type(&self, _meet_type_id: Uuid) -> Result<Vec<LocalLift>> {
            Ok(self.lifts.clone())
        }

        async fn rankable_registrations(&self, _meet_id: Uuid) -> Result<Vec<RankableRegistration>> {
            Ok(self.rankable.clone())
        }

        async fn best_marks(&self, _meet_id: Uuid) -> Result<Vec<BestMark>> {
            Ok(self.best_marks.clone())
        }

        async fn athlete_identity(&self, registration_id: Uuid) -> Result<AthleteIdentity> {
            self.athletes
                .get(&registration_id)
                .cloned()
                .ok_or_else(|| SyncError::UnknownMeet(format!("no fixture athlete for {registration_id}")))
        }

        async fn category_names(
            &self,
            weight_category_id: Option<Uuid>,
            age_category_id: Option<Uuid>,
        ) -> Result<CategoryNames> {
            Ok(self.category_names.get(&(weight_category_id, age_category_id)).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeRemoteState {
        synced_meets: Vec<String>,
        athletes: Vec<String>,
        records: HashMap<(String, String, String), Decimal>,
        results: Vec<(String, Decimal)>,
    }

    #[derive(Default)]
    struct FakeRemote {
        state: Mutex<FakeRemoteState>,
    }

    #[async_trait]
    impl RemoteArchive for FakeRemote {
        async fn exists_by_code(&self, meet_code: &str) -> Result<bool> {
            Ok(self.state.lock().unwrap().synced_meets.iter().any(|m| m == meet_code))
        }

        async fn upsert_athlete(&self, athlete: &AthleteIdentity) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if !state.athletes.contains(&athlete.cf) {
                state.athletes.push(athlete.cf.clone());
            }
            Ok(())
        }

        async fn commit_meet(&self, upload: MeetUpload) -> Result<CommitOutcome> {
            let mut state = self.state.lock().unwrap();

            let mut records_promoted = 0usize;
            for candidate in &upload.record_promotions {
                let key =
                    (candidate.weight_category_name.clone(), candidate.age_category_name.clone(), candidate.lift_code.clone());
                let existing = state.records.get(&key).copied();
                if should_promote(candidate.kg, existing) {
                    state.records.insert(key, candidate.kg);
                    records_promoted += 1;
                }
            }

            let results_written = upload.results.len();
            for result in &upload.results {
                state.results.push((result.athlete_cf.clone(), result.total_kg));
            }

            state.synced_meets.push(upload.meet_code.clone());

            Ok(CommitOutcome { records_promoted, results_written })
        }
    }

    /// Fabio, bw 80kg, category (CF, F1), a 100kg VALID pull-up -- the
    /// scenario named by spec.md §8's end-to-end scenario 5.
    fn scenario_fixture() -> FakeLocal {
        let fabio = Uuid::new_v4();
        let wc = Uuid::new_v4();
        let ac = Uuid::new_v4();
        let pu = Uuid::new_v4();
        let meet_type_id = Uuid::new_v4();
        let meet_id = Uuid::new_v4();

        let athletes = HashMap::from([(
            fabio,
            AthleteIdentity {
                cf: "FABIO01".to_string(),
                given_name: "Fabio".to_string(),
                family_name: "Rossi".to_string(),
                sex: "M".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            },
        )]);

        let category_names = HashMap::from([(
            (Some(wc), Some(ac)),
            CategoryNames { weight_category_name: Some("CF".to_string()), age_category_name: Some("F1".to_string()) },
        )]);

        FakeLocal {
            meet: LocalMeet {
                meet_id,
                meet_code: "SLM-2026".to_string(),
                name: "Spring Streetlifting Meet".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                level: "Regional".to_string(),
                regulation_tag: "STD-2026".to_string(),
                meet_type_id,
                meet_type_name: "Street Power 4-Lift".to_string(),
            },
            lifts: vec![LocalLift { lift_id: pu, code: "PU".to_string(), order_index: 2 }],
            rankable: vec![RankableRegistration {
                registration_id: fabio,
                sex: "M".to_string(),
                weight_category_id: Some(wc),
                age_category_id: Some(ac),
                bodyweight_kg: dec("80"),
                start_ord: 1,
            }],
            best_marks: vec![BestMark { registration_id: fabio, lift_id: pu, best_kg: dec("100") }],
            athletes,
            category_names,
        }
    }

    fn record_key() -> (String, String, String) {
        ("CF".to_string(), "F1".to_string(), "PU".to_string())
    }

    #[tokio::test]
    async fn scenario_5_record_promotion_when_local_mark_beats_remote_standing_record() {
        let local = scenario_fixture();
        let remote = FakeRemote::default();
        remote.state.lock().unwrap().records.insert(record_key(), dec("95"));

        let report = sync_meet(&local, &remote, "SLM-2026", false).await.unwrap();

        assert_eq!(report.athletes_upserted, 1);
        assert_eq!(report.records_promoted, 1);
        assert_eq!(report.results_written, 1);
        assert_eq!(remote.state.lock().unwrap().records[&record_key()], dec("100"));
    }

    #[tokio::test]
    async fn scenario_5_no_promotion_when_local_mark_does_not_beat_remote_record() {
        let local = scenario_fixture();
        let remote = FakeRemote::default();
        remote.state.lock().unwrap().records.insert(record_key(), dec("105"));

        let report = sync_meet(&local, &remote, "SLM-2026", false).await.unwrap();

        assert_eq!(report.records_promoted, 0);
        assert_eq!(remote.state.lock().unwrap().records[&record_key()], dec("105"));
    }

    #[tokio::test]
    async fn scenario_6_second_sync_without_force_is_already_synced() {
        let local = scenario_fixture();
        let remote = FakeRemote::default();

        sync_meet(&local, &remote, "SLM-2026", false).await.unwrap();
        let err = sync_meet(&local, &remote, "SLM-2026", false).await.unwrap_err();

        assert!(matches!(&err, SyncError::AlreadySynced(code) if code == "SLM-2026"));
        assert_eq!(err.kind(), "StateConflict");
        // The remote row counts from the first commit are untouched by the
        // rejected second call.
        assert_eq!(remote.state.lock().unwrap().results.len(), 1);
    }

    #[tokio::test]
    async fn scenario_6_second_sync_with_force_re_runs_the_full_protocol() {
        let local = scenario_fixture();
        let remote = FakeRemote::default();

        sync_meet(&local, &remote, "SLM-2026", false).await.unwrap();
        let report = sync_meet(&local, &remote, "SLM-2026", true).await.unwrap();

        assert_eq!(report.results_written, 1);
        assert_eq!(remote.state.lock().unwrap().results.len(), 2);
    }

    #[tokio::test]
    async fn unknown_meet_code_is_rejected_before_any_remote_write() {
        let local = scenario_fixture();
        let remote = FakeRemote::default();

        let err = sync_meet(&local, &remote, "NOPE", false).await.unwrap_err();
        assert!(matches!(err, SyncError::UnknownMeet(_)));
        assert!(remote.state.lock().unwrap().athletes.is_empty());
    }
}
