use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A named, ordered sequence of lifts defining a competition format.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MeetType {
    pub meet_type_id: Uuid,
    pub name: String,
}
