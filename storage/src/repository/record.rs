use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Record;

pub struct RecordRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecordRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        weight_category_name: &str,
        age_category_name: &str,
        lift_id: Uuid,
    ) -> Result<Option<Record>> {
        sqlx::query_as!(
            Record,
            r#"
            SELECT record_id, weight_category_name, age_category_name, lift_id,
                   kg, bodyweight_kg, athlete_cf, meet_code, date_set
            FROM records
            WHERE weight_category_name = $1 AND age_category_name = $2 AND lift_id = $3
            "#,
            weight_category_name,
            age_category_name,
            lift_id
        )
        .fetch_optional(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Promotes a record within an existing transaction only if `kg`
    /// strictly exceeds the current mark (spec treats a tie as not
    /// promoting, per DESIGN.md OQ-2).
    pub async fn promote_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        weight_category_name: &str,
        age_category_name: &str,
        lift_id: Uuid,
        kg: Decimal,
        bodyweight_kg: Decimal,
        athlete_cf: &str,
        meet_code: &str,
        date_set: chrono::NaiveDate,
    ) -> Result<bool> {
        let current = sqlx::query_scalar!(
            r#"
            SELECT kg FROM records
            WHERE weight_category_name = $1 AND age_category_name = $2 AND lift_id = $3
            "#,
            weight_category_name,
            age_category_name,
            lift_id
        )
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(existing_kg) = current {
            if kg <= existing_kg {
                return Ok(false);
            }
        }

        sqlx::query!(
            r#"
            INSERT INTO records
                (weight_category_name, age_category_name, lift_id, kg, bodyweight_kg, athlete_cf, meet_code, date_set)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (weight_category_name, age_category_name, lift_id) DO UPDATE SET
                kg = EXCLUDED.kg,
                bodyweight_kg = EXCLUDED.bodyweight_kg,
                athlete_cf = EXCLUDED.athlete_cf,
                meet_code = EXCLUDED.meet_code,
                date_set = EXCLUDED.date_set
            "#,
            weight_category_name,
            age_category_name,
            lift_id,
            kg,
            bodyweight_kg,
            athlete_cf,
            meet_code,
            date_set
        )
        .execute(&mut **tx)
        .await?;

        Ok(true)
    }
}
