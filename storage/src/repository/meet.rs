use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Meet, MeetType};

pub struct MeetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MeetRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, meet_code: &str) -> Result<Meet> {
        sqlx::query_as!(
            Meet,
            r#"
            SELECT meet_id, meet_code, name, date, level, regulation_tag, meet_type_id
            FROM meets WHERE meet_code = $1
            "#,
            meet_code
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_id(&self, meet_id: Uuid) -> Result<Meet> {
        sqlx::query_as!(
            Meet,
            r#"
            SELECT meet_id, meet_code, name, date, level, regulation_tag, meet_type_id
            FROM meets WHERE meet_id = $1
            "#,
            meet_id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn meet_type_id_for(&self, meet_id: Uuid) -> Result<Uuid> {
        sqlx::query_scalar!("SELECT meet_type_id FROM meets WHERE meet_id = $1", meet_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)
    }

    /// Inserts a meet by logical key (`meet_code`); used both at meet
    /// creation and by the sync resolver (C7) writing into the remote
    /// archive, where autoincrement/UUID ids are never propagated -- the
    /// remote side mints its own `meet_id`.
    pub async fn insert(
        &self,
        meet_code: &str,
        name: &str,
        date: chrono::NaiveDate,
        level: &str,
        regulation_tag: &str,
        meet_type_id: Uuid,
    ) -> Result<Meet> {
        sqlx::query_as!(
            Meet,
            r#"
            INSERT INTO meets (meet_code, name, date, level, regulation_tag, meet_type_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING meet_id, meet_code, name, date, level, regulation_tag, meet_type_id
            "#,
            meet_code,
            name,
            date,
            level,
            regulation_tag,
            meet_type_id
        )
        .fetch_one(self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn exists_by_code(&self, meet_code: &str) -> Result<bool> {
        let found = sqlx::query_scalar!(
            r#"SELECT meet_id FROM meets WHERE meet_code = $1"#,
            meet_code
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Every meet-type in the catalog, for the read-only REST surface's
    /// format picker.
    pub async fn list_meet_types(&self) -> Result<Vec<MeetType>> {
        sqlx::query_as!(MeetType, "SELECT meet_type_id, name FROM meet_types ORDER BY name ASC")
            .fetch_all(self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn meet_type_by_id(&self, meet_type_id: Uuid) -> Result<MeetType> {
        sqlx::query_as!(
            MeetType,
            "SELECT meet_type_id, name FROM meet_types WHERE meet_type_id = $1",
            meet_type_id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn find_or_create_meet_type(&self, name: &str) -> Result<MeetType> {
        if let Some(existing) = sqlx::query_as!(
            MeetType,
            "SELECT meet_type_id, name FROM meet_types WHERE name = $1",
            name
        )
        .fetch_optional(self.pool)
        .await?
        {
            return Ok(existing);
        }

        sqlx::query_as!(
            MeetType,
            r#"
            INSERT INTO meet_types (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING meet_type_id, name
            "#,
            name
        )
        .fetch_one(self.pool)
        .await
        .map_err(Into::into)
    }

    /// Transaction-scoped counterpart of `insert`, for the sync resolver's
    /// (C7) all-or-nothing write into the remote archive.
    pub async fn insert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        meet_code: &str,
        name: &str,
        date: chrono::NaiveDate,
        level: &str,
        regulation_tag: &str,
        meet_type_id: Uuid,
    ) -> Result<Meet> {
        sqlx::query_as!(
            Meet,
            r#"
            INSERT INTO meets (meet_code, name, date, level, regulation_tag, meet_type_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING meet_id, meet_code, name, date, level, regulation_tag, meet_type_id
            "#,
            meet_code,
            name,
            date,
            level,
            regulation_tag,
            meet_type_id
        )
        .fetch_one(&mut **tx)
        .await
        .map_err(Into::into)
    }

    /// Transaction-scoped counterpart of `find_or_create_meet_type`.
    pub async fn find_or_create_meet_type_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<MeetType> {
        if let Some(existing) = sqlx::query_as!(
            MeetType,
            "SELECT meet_type_id, name FROM meet_types WHERE name = $1",
            name
        )
        .fetch_optional(&mut **tx)
        .await?
        {
            return Ok(existing);
        }

        sqlx::query_as!(
            MeetType,
            r#"
            INSERT INTO meet_types (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING meet_type_id, name
            "#,
            name
        )
        .fetch_one(&mut **tx)
        .await
        .map_err(Into::into)
    }
}
