use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// An ordered group within a flight, typically partitioned by weight class.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Group {
    pub group_id: Uuid,
    pub flight_id: Uuid,
    pub name: String,
    pub ord: i16,
}

/// Pins a registration to a group with a `start_ord` used only as a
/// last-resort ordering tiebreak.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GroupEntry {
    pub group_entry_id: Uuid,
    pub group_id: Uuid,
    pub registration_id: Uuid,
    pub start_ord: i32,
}
