use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Persisted row backing the process-wide `CurrentState` singleton
/// (`id = 1`). Every pointer is nil when the meet is idle, or the full
/// tuple is coherent when a meet is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CurrentStateRow {
    pub id: i32,
    pub meet_id: Option<Uuid>,
    pub flight_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub lift_id: Option<Uuid>,
    pub round: Option<i16>,
    pub current_registration_id: Option<Uuid>,
    pub timer_start: Option<chrono::NaiveDateTime>,
    pub timer_duration_s: Option<i32>,
    pub status: String,
}
