use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{AgeCategory, WeightCategory};

/// Category identity is by *name* within (sex, bounds) -- the sync
/// resolver (C7) never propagates local category ids to the remote
/// archive.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn weight_category_by_id(&self, id: Uuid) -> Result<WeightCategory> {
        sqlx::query_as!(
            WeightCategory,
            "SELECT weight_category_id, name, sex, min_kg, max_kg FROM weight_categories WHERE weight_category_id = $1",
            id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn age_category_by_id(&self, id: Uuid) -> Result<AgeCategory> {
        sqlx::query_as!(
            AgeCategory,
            "SELECT age_category_id, name, min_age, max_age FROM age_categories WHERE age_category_id = $1",
            id
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    pub async fn upsert_weight_category(
        &self,
        name: &str,
        sex: &str,
        min_kg: Option<rust_decimal::Decimal>,
        max_kg: Option<rust_decimal::Decimal>,
    ) -> Result<WeightCategory> {
        sqlx::query_as!(
            WeightCategory,
            r#"
            INSERT INTO weight_categories (name, sex, min_kg, max_kg)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (sex, name) DO UPDATE SET min_kg = EXCLUDED.min_kg, max_kg = EXCLUDED.max_kg
            RETURNING weight_category_id, name, sex, min_kg, max_kg
            "#,
            name,
            sex,
            min_kg,
            max_kg
        )
        .fetch_one(self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn upsert_age_category(
        &self,
        name: &str,
        min_age: Option<i16>,
        max_age: Option<i16>,
    ) -> Result<AgeCategory> {
        sqlx::query_as!(
            AgeCategory,
            r#"
            INSERT INTO age_categories (name, min_age, max_age)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET min_age = EXCLUDED.min_age, max_age = EXCLUDED.max_age
            RETURNING age_category_id, name, min_age, max_age
            "#,
            name,
            min_age,
            max_age
        )
        .fetch_one(self.pool)
        .await
        .map_err(Into::into)
    }
}
