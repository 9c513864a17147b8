use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A (weight_cat, age_cat, lift) -> best-known-mark record, updated
/// transactionally only when a new lift strictly exceeds the current one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Record {
    pub record_id: Uuid,
    pub weight_category_name: String,
    pub age_category_name: String,
    pub lift_id: Uuid,
    pub kg: Decimal,
    pub bodyweight_kg: Decimal,
    pub athlete_cf: String,
    pub meet_code: String,
    pub date_set: chrono::NaiveDate,
}
