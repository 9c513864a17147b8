use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// An (athlete, meet) pair with weigh-in data. Unique per (meet, athlete).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Registration {
    pub registration_id: Uuid,
    pub meet_id: Uuid,
    pub athlete_id: Uuid,
    pub bodyweight_kg: Decimal,
    pub weight_category_id: Option<Uuid>,
    pub age_category_id: Option<Uuid>,
    pub rack_height: Option<String>,
    pub belt: Option<bool>,
}

/// A declared first-attempt weight recorded at weigh-in, keyed by
/// (registration, lift).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeclaredOpener {
    pub registration_id: Uuid,
    pub lift_id: Uuid,
    pub kg: Decimal,
}
