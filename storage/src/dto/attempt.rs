use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::AttemptStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeclareAttemptRequest {
    pub registration_id: Uuid,
    pub lift_id: Uuid,

    #[validate(range(min = 1, max = 4))]
    pub attempt_no: i16,

    #[validate(custom(function = "validate_quantized_kg"))]
    pub kg: Decimal,
}

pub fn validate_quantized_kg(kg: &Decimal) -> Result<(), validator::ValidationError> {
    let half = Decimal::new(5, 1);
    if kg.is_sign_negative() || (kg / half).fract() != Decimal::ZERO {
        return Err(validator::ValidationError::new("not_quantized_to_half_kg"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FinalizeAttemptRequest {
    pub attempt_id: Uuid,
    pub outcome: AttemptStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantized_kg_accepts_half_kg_steps() {
        assert!(validate_quantized_kg(&Decimal::new(1225, 1)).is_ok());
    }

    #[test]
    fn quantized_kg_rejects_sub_half_kg_steps() {
        assert!(validate_quantized_kg(&Decimal::new(1221, 1)).is_err());
    }
}
