use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A competitor identified across meets by their stable external code (CF).
///
/// Immutable after first ingest except by admin correction; see
/// `AthleteRepository::correct`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Athlete {
    pub athlete_id: Uuid,
    pub cf: String,
    pub given_name: String,
    pub family_name: String,
    pub sex: String,
    pub date_of_birth: chrono::NaiveDate,
    pub created_at: chrono::NaiveDateTime,
}
