use axum::{
    extract::{FromRequest, Request},
    Json,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use validator::{Validate, ValidationError};

use super::PayError;

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| PayError::InvalidRequest(format!("Json parse error: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Rejects empty or whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Money columns are `NUMERIC(19, 2)`.
pub const MONEY_SCALE: u32 = 2;

/// Smallest amount that no longer fits a money column.
/// Equal to 10^17 at scale 0 (`Decimal::new` is not const).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x5D8A_0000, 0x0163_4578, 0, false, 0);

/// Rejects amounts the database would round or refuse.
pub fn storable_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::new("amount_precision"));
    }
    if value.abs() >= MAX_AMOUNT {
        return Err(ValidationError::new("amount_too_large"));
    }
    Ok(())
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("amount_not_positive"));
    }
    storable_amount(value)
}

pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("amount_negative"));
    }
    storable_amount(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_text_is_rejected() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank("ABC LTD").is_ok());
    }

    #[test]
    fn amount_rules() {
        assert!(positive_amount(&dec!(0)).is_err());
        assert!(positive_amount(&dec!(0.01)).is_ok());
        assert!(non_negative_amount(&dec!(0)).is_ok());
        assert!(non_negative_amount(&dec!(-1)).is_err());
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        assert!(positive_amount(&dec!(0.005)).is_err());
        assert!(non_negative_amount(&dec!(0.004)).is_err());
        assert!(positive_amount(&dec!(12.50)).is_ok());
        assert!(positive_amount(&dec!(12.500)).is_ok());
    }

    #[test]
    fn amounts_beyond_column_range_are_rejected() {
        assert!(positive_amount(&dec!(1000000000000000000)).is_err());
        assert!(positive_amount(&MAX_AMOUNT).is_err());
        assert!(positive_amount(&dec!(99999999999999999.99)).is_ok());
        assert!(non_negative_amount(&dec!(100000000000000000)).is_err());
    }
}
