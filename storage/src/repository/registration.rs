use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::registration::WeighInRequest;
use crate::error::{Result, StorageError};
use crate::models::Registration;

pub struct RegistrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistrationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Registration> {
        sqlx::query_as!(
            Registration,
            r#"
            SELECT registration_id, meet_id, athlete_id, bodyweight_kg,
                   weight_category_id, age_category_id, rack_height, belt
            FROM registrations
            WHERE registration_id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Records weigh-in data and attempt-#1 rows (PENDING, declared
    /// openers) for an athlete in one transaction.
    pub async fn weigh_in(
        &self,
        meet_id: Uuid,
        req: &WeighInRequest,
    ) -> Result<Registration> {
        StorageError::check_quantized(req.bodyweight_kg)?;

        let mut tx = self.pool.begin().await?;

        let registration = sqlx::query_as!(
            Registration,
            r#"
            INSERT INTO registrations
                (meet_id, athlete_id, bodyweight_kg, weight_category_id, age_category_id, rack_height, belt)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (meet_id, athlete_id) DO UPDATE SET
                bodyweight_kg = EXCLUDED.bodyweight_kg,
                weight_category_id = EXCLUDED.weight_category_id,
                age_category_id = EXCLUDED.age_category_id,
                rack_height = EXCLUDED.rack_height,
                belt = EXCLUDED.belt
            RETURNING registration_id, meet_id, athlete_id, bodyweight_kg,
                      weight_category_id, age_category_id, rack_height, belt
            "#,
            meet_id,
            req.athlete_id,
            req.bodyweight_kg,
            req.weight_category_id,
            req.age_category_id,
            req.rack_height,
            req.belt
        )
        .fetch_one(&mut *tx)
        .await?;

        for (lift_id, kg) in &req.openers {
            StorageError::check_quantized(*kg)?;

            sqlx::query!(
                r#"
                INSERT INTO declared_openers (registration_id, lift_id, kg)
                VALUES ($1, $2, $3)
                ON CONFLICT (registration_id, lift_id) DO UPDATE SET kg = EXCLUDED.kg
                "#,
                registration.registration_id,
                lift_id,
                kg
            )
            .execute(&mut *tx)
            .await?;

            sqlx::query!(
                r#"
                INSERT INTO attempts (registration_id, lift_id, attempt_no, weight_kg, status)
                VALUES ($1, $2, 1, $3, 'PENDING')
                ON CONFLICT (registration_id, lift_id, attempt_no) DO NOTHING
                "#,
                registration.registration_id,
                lift_id,
                kg
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(registration)
    }

    /// The registration's current total bodyweight, used by the ordering
    /// tiebreak and by RIS.
    pub async fn bodyweight(&self, registration_id: Uuid) -> Result<Decimal> {
        sqlx::query_scalar!(
            "SELECT bodyweight_kg FROM registrations WHERE registration_id = $1",
            registration_id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }
}
