use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A per-athlete totals/placement row written by the sync resolver (C7)
/// into the remote archive, keyed by logical identity (`athlete_cf`) --
/// never the local `registration_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MeetResult {
    pub result_id: Uuid,
    pub meet_id: Uuid,
    pub athlete_cf: String,
    pub weight_category_name: Option<String>,
    pub age_category_name: Option<String>,
    pub total_kg: Decimal,
    pub bodyweight_kg: Decimal,
    pub ris_score: Decimal,
    pub category_placement: Option<i32>,
    pub absolute_placement: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ResultLift {
    pub result_id: Uuid,
    pub lift_id: Uuid,
    pub best_kg: Decimal,
}
