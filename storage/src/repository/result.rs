use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;

/// Writes for the `results`/`result_lifts` pair the sync resolver (C7)
/// populates inside its all-or-nothing remote transaction. There is no
/// standalone reader here: the remote archive's
/// result rows are read back through the same batched queries `ranking.rs`
/// already exposes for the local side, since both archives share a schema.
pub struct ResultRepository;

impl ResultRepository {
    pub async fn upsert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        meet_id: Uuid,
        athlete_cf: &str,
        weight_category_name: Option<&str>,
        age_category_name: Option<&str>,
        total_kg: Decimal,
        bodyweight_kg: Decimal,
        ris_score: Decimal,
        category_placement: Option<i32>,
        absolute_placement: Option<i32>,
    ) -> Result<Uuid> {
        let result_id = sqlx::query_scalar!(
            r#"
            INSERT INTO results
                (meet_id, athlete_cf, weight_category_name, age_category_name,
                 total_kg, bodyweight_kg, ris_score, category_placement, absolute_placement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (meet_id, athlete_cf) DO UPDATE SET
                weight_category_name = EXCLUDED.weight_category_name,
                age_category_name = EXCLUDED.age_category_name,
                total_kg = EXCLUDED.total_kg,
                bodyweight_kg = EXCLUDED.bodyweight_kg,
                ris_score = EXCLUDED.ris_score,
                category_placement = EXCLUDED.category_placement,
                absolute_placement = EXCLUDED.absolute_placement
            RETURNING result_id
            "#,
            meet_id,
            athlete_cf,
            weight_category_name,
            age_category_name,
            total_kg,
            bodyweight_kg,
            ris_score,
            category_placement,
            absolute_placement
        )
        .fetch_one(&mut **tx)
        .await?;

        Ok(result_id)
    }

    pub async fn insert_lift_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        result_id: Uuid,
        lift_id: Uuid,
        best_kg: Decimal,
    ) -> Result<()> {
        sqlx::query!(
            r#"
            INSERT INTO result_lifts (result_id, lift_id, best_kg)
            VALUES ($1, $2, $3)
            ON CONFLICT (result_id, lift_id) DO UPDATE SET best_kg = EXCLUDED.best_kg
            "#,
            result_id,
            lift_id,
            best_kg
        )
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
