use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Meet {
    pub meet_id: Uuid,
    pub meet_code: String,
    pub name: String,
    pub date: chrono::NaiveDate,
    pub level: String,
    pub regulation_tag: String,
    pub meet_type_id: Uuid,
}
