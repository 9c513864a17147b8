use axum::extract::{Path, State};
use axum::Json;
use storage::models::{Lift, MeetType};
use storage::repository::flight::FlightRepository;
use storage::repository::meet::MeetRepository;
use storage::Database;
use uuid::Uuid;

use crate::error::WebResult;

#[utoipa::path(
    get,
    path = "/api/meet-types",
    responses((status = 200, description = "Every meet-type in the catalog", body = [MeetType])),
    tag = "catalog"
)]
pub async fn list_meet_types(State(db): State<Database>) -> WebResult<Json<Vec<MeetType>>> {
    let types = MeetRepository::new(db.pool()).list_meet_types().await?;
    Ok(Json(types))
}

#[utoipa::path(
    get,
    path = "/api/meet-types/{meet_type_id}/lifts",
    params(("meet_type_id" = Uuid, Path, description = "The meet-type's id")),
    responses((status = 200, description = "The meet-type's lift sequence, in order", body = [Lift])),
    tag = "catalog"
)]
pub async fn list_lifts(State(db): State<Database>, Path(meet_type_id): Path<Uuid>) -> WebResult<Json<Vec<Lift>>> {
    let lifts = FlightRepository::new(db.pool()).lifts_for_meet_type(meet_type_id).await?;
    Ok(Json(lifts))
}
