//! Domain operations over the store schema. Handlers stay thin and delegate here.

pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;
pub mod statistics;

use validator::ValidationError;

/// Rejects strings that are empty once trimmed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
