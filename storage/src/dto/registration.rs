use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct WeighInRequest {
    pub athlete_id: Uuid,

    #[validate(custom(function = "crate::dto::attempt::validate_quantized_kg"))]
    pub bodyweight_kg: Decimal,

    pub weight_category_id: Option<Uuid>,
    pub age_category_id: Option<Uuid>,
    pub rack_height: Option<String>,
    pub belt: Option<bool>,

    /// (lift_id, opener_kg) pairs recorded at weigh-in.
    pub openers: Vec<(Uuid, Decimal)>,
}
