//! Domain errors with stable codes returned in the `type` field.

use axum::http::StatusCode;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayError {
    #[error("An account id is required to map an EFT short name")]
    EftShortNameAccountIdRequired,

    #[error("EFT short name is already mapped to an account")]
    EftShortNameAlreadyMapped,

    #[error("EFT short name not found")]
    EftShortNameNotFound,

    #[error("Payment account not found")]
    AccountNotFound,

    #[error("Payment account already exists")]
    AccountAlreadyExists,

    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Payment method '{0}' is not supported")]
    InvalidPaymentMethod(String),

    #[error("Only unpaid invoices in CREATED status can be cancelled")]
    InvoiceCancelNotAllowed,

    #[error("{0}")]
    InvalidRequest(String),
}

impl PayError {
    pub fn code(&self) -> &'static str {
        match self {
            PayError::EftShortNameAccountIdRequired => "EFT_SHORT_NAME_ACCOUNT_ID_REQUIRED",
            PayError::EftShortNameAlreadyMapped => "EFT_SHORT_NAME_ALREADY_MAPPED",
            PayError::EftShortNameNotFound => "EFT_SHORT_NAME_NOT_FOUND",
            PayError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            PayError::AccountAlreadyExists => "ACCOUNT_ALREADY_EXISTS",
            PayError::InvoiceNotFound => "INVOICE_NOT_FOUND",
            PayError::InvalidPaymentMethod(_) => "INVALID_PAYMENT_METHOD",
            PayError::InvoiceCancelNotAllowed => "INVOICE_CANCEL_NOT_ALLOWED",
            PayError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PayError::EftShortNameNotFound
            | PayError::AccountNotFound
            | PayError::InvoiceNotFound => StatusCode::NOT_FOUND,
            PayError::AccountAlreadyExists => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<PayError> for AppError {
    fn from(err: PayError) -> Self {
        AppError::Business {
            code: err.code(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}
