use axum::extract::{Path, State};
use axum::Json;
use engine::ranking::rank_meet;
use rust_decimal::Decimal;
use serde::Serialize;
use storage::repository::meet::MeetRepository;
use storage::repository::ranking::RankingRepository;
use storage::Database;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::WebResult;

/// Response shape for one ranked entry. Mirrors `engine::ranking::
/// RankedEntry` field-for-field; kept as a separate type here since
/// `engine` deliberately carries no `utoipa` dependency (it stays
/// DB/transport-agnostic, per DESIGN.md's one-way dependency note).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingEntryResponse {
    pub registration_id: Uuid,
    pub sex: String,
    pub weight_category_id: Option<Uuid>,
    pub age_category_id: Option<Uuid>,
    pub total_kg: Decimal,
    pub bodyweight_kg: Decimal,
    pub category_placement: Option<u32>,
    pub ris_score: Decimal,
    pub absolute_placement: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/meets/{meet_code}/rankings",
    params(("meet_code" = String, Path, description = "The meet's logical code")),
    responses(
        (status = 200, description = "Category and absolute rankings for the meet", body = [RankingEntryResponse]),
        (status = 404, description = "No such meet"),
    ),
    tag = "rankings"
)]
pub async fn meet_rankings(
    State(db): State<Database>,
    Path(meet_code): Path<String>,
) -> WebResult<Json<Vec<RankingEntryResponse>>> {
    let meet = MeetRepository::new(db.pool()).find_by_code(&meet_code).await?;

    let ranking_repo = RankingRepository::new(db.pool());
    let rankable = ranking_repo.rankable_registrations(meet.meet_id).await?;
    let best_marks = ranking_repo.best_marks(meet.meet_id).await?;

    let rankable_engine: Vec<_> = rankable
        .iter()
        .map(|r| engine::ports::RankableRegistration {
            registration_id: r.registration_id,
            sex: r.sex.clone(),
            weight_category_id: r.weight_category_id,
            age_category_id: r.age_category_id,
            bodyweight_kg: r.bodyweight_kg,
            start_ord: r.start_ord,
        })
        .collect();
    let best_marks_engine: Vec<_> = best_marks
        .iter()
        .map(|m| engine::ports::BestMark { registration_id: m.registration_id, lift_id: m.lift_id, best_kg: m.best_kg })
        .collect();

    let ranked = rank_meet(&rankable_engine, &best_marks_engine);

    let response = ranked
        .into_iter()
        .map(|entry| RankingEntryResponse {
            registration_id: entry.registration_id,
            sex: entry.category.sex,
            weight_category_id: entry.category.weight_category_id,
            age_category_id: entry.category.age_category_id,
            total_kg: entry.total_kg,
            bodyweight_kg: entry.bodyweight_kg,
            category_placement: entry.category_placement,
            ris_score: entry.ris_score,
            absolute_placement: entry.absolute_placement,
        })
        .collect();

    Ok(Json(response))
}
