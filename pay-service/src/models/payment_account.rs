//! Payment account model.

use super::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Account that invoices are billed to, keyed externally by the auth account id.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentAccount {
    pub id: i64,
    pub auth_account_id: String,
    pub name: Option<String>,
    pub payment_method_code: String,
    pub eft_enable: bool,
    pub created_on: DateTime<Utc>,
}

impl PaymentAccount {
    /// Parsed payment method; rows are only written with known codes.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        PaymentMethod::parse(&self.payment_method_code)
    }
}

/// Input for creating a payment account.
#[derive(Debug, Clone)]
pub struct CreatePaymentAccount {
    pub auth_account_id: String,
    pub name: Option<String>,
    pub payment_method: PaymentMethod,
}
