use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAthleteRequest {
    #[validate(length(min = 1, max = 32))]
    pub cf: String,

    #[validate(length(min = 1, max = 255))]
    pub given_name: String,

    #[validate(length(min = 1, max = 255))]
    pub family_name: String,

    #[validate(custom(function = "validate_sex"))]
    pub sex: String,

    pub date_of_birth: NaiveDate,
}

pub fn validate_sex(sex: &str) -> Result<(), validator::ValidationError> {
    if sex == "M" || sex == "F" {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_sex"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_sex_accepts_m_and_f() {
        assert!(validate_sex("M").is_ok());
        assert!(validate_sex("F").is_ok());
    }

    #[test]
    fn validate_sex_rejects_anything_else() {
        assert!(validate_sex("X").is_err());
        assert!(validate_sex("").is_err());
        assert!(validate_sex("m").is_err());
    }
}
