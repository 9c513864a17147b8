use axum::extract::State;
use axum::Json;
use storage::models::CurrentStateRow;
use storage::repository::current_state::CurrentStateRepository;
use storage::Database;

use crate::error::WebResult;

#[utoipa::path(
    get,
    path = "/api/state",
    responses(
        (status = 200, description = "The process-wide current-attempt pointer", body = CurrentStateRow),
    ),
    tag = "state"
)]
pub async fn current_state(State(db): State<Database>) -> WebResult<Json<CurrentStateRow>> {
    let row = CurrentStateRepository::new(db.pool()).load().await?;
    Ok(Json(row))
}
