use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attempt_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AttemptStatus {
    Pending,
    Valid,
    Invalid,
}

/// An (registration, lift, attempt_no) triple. `attempt_no` is monotone per
/// (registration, lift): attempt n exists only after attempt n-1 has a
/// status other than `Pending`. Status transitions exactly once,
/// `Pending -> {Valid, Invalid}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub registration_id: Uuid,
    pub lift_id: Uuid,
    pub attempt_no: i16,
    pub weight_kg: Decimal,
    pub status: AttemptStatus,
    pub created_at: chrono::NaiveDateTime,
    pub created_by: Option<String>,
}
