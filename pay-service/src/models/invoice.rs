//! Invoice, line item and invoice reference models.

use super::InvoiceStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub payment_account_id: i64,
    pub business_identifier: Option<String>,
    pub total: Decimal,
    pub paid: Decimal,
    pub invoice_status_code: String,
    pub payment_method_code: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::from_string(&self.invoice_status_code)
    }

    /// Amount still owed.
    pub fn balance(&self) -> Decimal {
        self.total - self.paid
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LineItem {
    pub id: i64,
    pub invoice_id: i64,
    pub description: String,
    pub quantity: i32,
    pub total: Decimal,
}

/// External provider tracking number for an invoice.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceReference {
    pub id: i64,
    pub invoice_id: i64,
    pub invoice_number: String,
    pub reference_number: Option<String>,
    pub status_code: String,
}

#[derive(Debug, Clone)]
pub struct CreateLineItem {
    pub description: String,
    pub quantity: i32,
    pub total: Decimal,
}

/// Input for creating an invoice; the total is derived from the line items.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub payment_account_id: i64,
    pub business_identifier: Option<String>,
    pub status: InvoiceStatus,
    pub payment_method_code: String,
    pub line_items: Vec<CreateLineItem>,
}

impl CreateInvoice {
    pub fn total(&self) -> Decimal {
        self.line_items.iter().map(|item| item.total).sum()
    }
}
