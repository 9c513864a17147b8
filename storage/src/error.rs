use thiserror::Error;

/// Storage-layer error taxonomy. Mirrors the kinds (not types) in the
/// competition-flow error design: a caller maps these onto `BadInput` /
/// `NotFound` / `StateConflict` / `NotReady` / `Transient` / `Fatal`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Not ready: {0}")]
    NotReady(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Weights and bodyweights are quantized to 0.5 kg; the store rejects
    /// anything else at the boundary rather than silently rounding.
    pub fn check_quantized(kg: rust_decimal::Decimal) -> Result<()> {
        use rust_decimal::Decimal;
        let half = Decimal::new(5, 1);
        if kg.is_sign_negative() {
            return Err(StorageError::BadInput(format!("{kg} is negative")));
        }
        if (kg / half).fract() != Decimal::ZERO {
            return Err(StorageError::BadInput(format!(
                "{kg} is not a multiple of 0.5kg"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn check_quantized_accepts_half_kg_multiples() {
        assert!(StorageError::check_quantized(Decimal::new(1000, 1)).is_ok());
        assert!(StorageError::check_quantized(Decimal::new(1005, 1)).is_ok());
        assert!(StorageError::check_quantized(Decimal::ZERO).is_ok());
    }

    #[test]
    fn check_quantized_rejects_finer_fractions() {
        let err = StorageError::check_quantized(Decimal::new(1002, 1)).unwrap_err();
        assert!(matches!(err, StorageError::BadInput(_)));
    }

    #[test]
    fn check_quantized_rejects_negative() {
        let err = StorageError::check_quantized(Decimal::new(-50, 1)).unwrap_err();
        assert!(matches!(err, StorageError::BadInput(_)));
    }
}
