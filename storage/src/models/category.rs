use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Category-name uniqueness is global within (sex, bounds).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WeightCategory {
    pub weight_category_id: Uuid,
    pub name: String,
    pub sex: String,
    pub min_kg: Option<Decimal>,
    pub max_kg: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AgeCategory {
    pub age_category_id: Uuid,
    pub name: String,
    pub min_age: Option<i16>,
    pub max_age: Option<i16>,
}
