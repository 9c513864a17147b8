use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// An ordered partition of a meet (e.g. morning/afternoon).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Flight {
    pub flight_id: Uuid,
    pub meet_id: Uuid,
    pub name: String,
    pub ord: i16,
}
