use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A lift within a meet-type's sequence (e.g. SQ, PU, DIP, MU, MP).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lift {
    pub lift_id: Uuid,
    pub meet_type_id: Uuid,
    pub code: String,
    pub order_index: i16,
}
