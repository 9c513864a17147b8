use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Record;

/// Batched lookups for the Ranking Engine (C5): best-valid-attempt marks
/// and category/identity facts for a whole meet in one round trip each,
/// never per-athlete.
pub struct RankingRepository<'a> {
    pool: &'a PgPool,
}

#[derive(Debug, Clone)]
pub struct BestMarkRow {
    pub registration_id: Uuid,
    pub lift_id: Uuid,
    pub best_kg: rust_decimal::Decimal,
}

#[derive(Debug, Clone)]
pub struct RankableRegistrationRow {
    pub registration_id: Uuid,
    pub sex: String,
    pub weight_category_id: Option<Uuid>,
    pub age_category_id: Option<Uuid>,
    pub bodyweight_kg: rust_decimal::Decimal,
    pub start_ord: i32,
}

impl<'a> RankingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// `best(regId, liftId)` for every (registration, lift) in the meet
    /// that has at least one `VALID` attempt.
    pub async fn best_marks(&self, meet_id: Uuid) -> Result<Vec<BestMarkRow>> {
        let rows = sqlx::query!(
            r#"
            SELECT a.registration_id, a.lift_id, MAX(a.weight_kg) as "best_kg!"
            FROM attempts a
            JOIN registrations r ON r.registration_id = a.registration_id
            WHERE r.meet_id = $1 AND a.status = 'VALID'
            GROUP BY a.registration_id, a.lift_id
            "#,
            meet_id
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BestMarkRow {
                registration_id: r.registration_id,
                lift_id: r.lift_id,
                best_kg: r.best_kg,
            })
            .collect())
    }

    /// Category and identity facts for every registration in a meet. A
    /// registration with no `group_entries` row (not yet assigned to a
    /// group) gets `start_ord = 0`, the weakest possible tiebreak.
    pub async fn rankable_registrations(&self, meet_id: Uuid) -> Result<Vec<RankableRegistrationRow>> {
        let rows = sqlx::query!(
            r#"
            SELECT DISTINCT ON (r.registration_id)
                r.registration_id,
                a.sex,
                r.weight_category_id,
                r.age_category_id,
                r.bodyweight_kg,
                COALESCE(ge.start_ord, 0) as "start_ord!"
            FROM registrations r
            JOIN athletes a ON a.athlete_id = r.athlete_id
            LEFT JOIN group_entries ge ON ge.registration_id = r.registration_id
            WHERE r.meet_id = $1
            ORDER BY r.registration_id, ge.start_ord ASC NULLS LAST
            "#,
            meet_id
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RankableRegistrationRow {
                registration_id: r.registration_id,
                sex: r.sex,
                weight_category_id: r.weight_category_id,
                age_category_id: r.age_category_id,
                bodyweight_kg: r.bodyweight_kg,
                start_ord: r.start_ord,
            })
            .collect())
    }

    /// Looks up a (weight_cat_name, age_cat_name) record's current mark by
    /// category *id*, resolving names first -- the record table is keyed
    /// by logical names, not ids.
    pub async fn record_for_category_ids(
        &self,
        weight_category_id: Option<Uuid>,
        age_category_id: Option<Uuid>,
        lift_id: Uuid,
    ) -> Result<Option<Record>> {
        let (Some(wc), Some(ac)) = (weight_category_id, age_category_id) else {
            return Ok(None);
        };

        sqlx::query_as!(
            Record,
            r#"
            SELECT rec.record_id, rec.weight_category_name, rec.age_category_name, rec.lift_id,
                   rec.kg, rec.bodyweight_kg, rec.athlete_cf, rec.meet_code, rec.date_set
            FROM records rec
            JOIN weight_categories wc ON wc.name = rec.weight_category_name
            JOIN age_categories ac ON ac.name = rec.age_category_name
            WHERE wc.weight_category_id = $1 AND ac.age_category_id = $2 AND rec.lift_id = $3
            "#,
            wc,
            ac,
            lift_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }
}
