//! Payment and receipt records written when credit settles an invoice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub payment_account_id: i64,
    pub invoice_id: i64,
    pub invoice_number: String,
    pub invoice_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status_code: String,
    pub payment_method_code: String,
    pub payment_system_code: String,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Receipt {
    pub id: i64,
    pub invoice_id: i64,
    pub receipt_number: String,
    pub receipt_amount: Decimal,
    pub receipt_date: DateTime<Utc>,
}
