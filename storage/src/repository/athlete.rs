use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::athlete::CreateAthleteRequest;
use crate::error::{Result, StorageError};
use crate::models::Athlete;

pub struct AthleteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AthleteRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolves an athlete by their stable external code. Used by `sync`
    /// to map identities across the local and remote archives.
    pub async fn resolve_by_cf(&self, cf: &str) -> Result<Athlete> {
        sqlx::query_as!(
            Athlete,
            r#"
            SELECT athlete_id, cf, given_name, family_name, sex, date_of_birth, created_at
            FROM athletes
            WHERE cf = $1
            "#,
            cf
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Athlete> {
        sqlx::query_as!(
            Athlete,
            r#"
            SELECT athlete_id, cf, given_name, family_name, sex, date_of_birth, created_at
            FROM athletes
            WHERE athlete_id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Creates an athlete, or returns the existing row if the CF is already
    /// known (athletes are never deleted once referenced, and re-ingest at
    /// sync time must be idempotent).
    pub async fn upsert(&self, req: &CreateAthleteRequest) -> Result<Athlete> {
        sqlx::query_as!(
            Athlete,
            r#"
            INSERT INTO athletes (cf, given_name, family_name, sex, date_of_birth)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (cf) DO UPDATE SET cf = EXCLUDED.cf
            RETURNING athlete_id, cf, given_name, family_name, sex, date_of_birth, created_at
            "#,
            req.cf,
            req.given_name,
            req.family_name,
            req.sex,
            req.date_of_birth
        )
        .fetch_one(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Admin correction: the only path allowed to mutate an athlete after
    /// first ingest.
    pub async fn correct(
        &self,
        id: Uuid,
        given_name: &str,
        family_name: &str,
        date_of_birth: chrono::NaiveDate,
    ) -> Result<Athlete> {
        sqlx::query_as!(
            Athlete,
            r#"
            UPDATE athletes
            SET given_name = $2, family_name = $3, date_of_birth = $4
            WHERE athlete_id = $1
            RETURNING athlete_id, cf, given_name, family_name, sex, date_of_birth, created_at
            "#,
            id,
            given_name,
            family_name,
            date_of_birth
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }
}
