use crate::models::{Invoice, InvoiceReference, LineItem, Payment, Receipt};
use crate::services::payment_system::ReceiptDetails;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(max = 20))]
    pub business_identifier: Option<String>,
    #[validate(length(min = 1, message = "At least one line item is required"), nested)]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    #[validate(length(max = 200), custom(function = "crate::utils::not_blank"))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[validate(custom(function = "crate::utils::non_negative_amount"))]
    pub total: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub id: i64,
    pub description: String,
    pub quantity: i32,
    pub total: Decimal,
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        Self {
            id: item.id,
            description: item.description,
            quantity: item.quantity,
            total: item.total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceReferenceResponse {
    pub id: i64,
    pub invoice_number: String,
    pub reference_number: Option<String>,
    pub status_code: String,
}

impl From<InvoiceReference> for InvoiceReferenceResponse {
    fn from(reference: InvoiceReference) -> Self {
        Self {
            id: reference.id,
            invoice_number: reference.invoice_number,
            reference_number: reference.reference_number,
            status_code: reference.status_code,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: i64,
    pub payment_account_id: i64,
    pub business_identifier: Option<String>,
    pub total: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
    pub status_code: String,
    pub payment_method: String,
    pub payment_date: Option<String>,
    pub created_on: String,
    pub updated_on: Option<String>,
    pub payment_system_url: String,
    pub line_items: Vec<LineItemResponse>,
    pub references: Vec<InvoiceReferenceResponse>,
}

impl InvoiceResponse {
    pub fn new(
        invoice: Invoice,
        line_items: Vec<LineItem>,
        references: Vec<InvoiceReference>,
        payment_system_url: String,
    ) -> Self {
        Self {
            balance: invoice.balance(),
            id: invoice.id,
            payment_account_id: invoice.payment_account_id,
            business_identifier: invoice.business_identifier,
            total: invoice.total,
            paid: invoice.paid,
            status_code: invoice.invoice_status_code,
            payment_method: invoice.payment_method_code,
            payment_date: invoice.payment_date.map(|d| d.to_rfc3339()),
            created_on: invoice.created_on.to_rfc3339(),
            updated_on: invoice.updated_on.map(|d| d.to_rfc3339()),
            payment_system_url,
            line_items: line_items.into_iter().map(Into::into).collect(),
            references: references.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub receipt_number: String,
    pub receipt_amount: Decimal,
    pub receipt_date: String,
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            receipt_number: receipt.receipt_number,
            receipt_amount: receipt.receipt_amount,
            receipt_date: receipt.receipt_date.to_rfc3339(),
        }
    }
}

impl From<ReceiptDetails> for ReceiptResponse {
    fn from(details: ReceiptDetails) -> Self {
        Self {
            receipt_number: details.receipt_number,
            receipt_amount: details.receipt_amount,
            receipt_date: details.receipt_date.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: i64,
    pub invoice_number: String,
    pub invoice_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status_code: String,
    pub payment_method_code: String,
    pub payment_system_code: String,
    pub payment_date: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            invoice_number: payment.invoice_number,
            invoice_amount: payment.invoice_amount,
            paid_amount: payment.paid_amount,
            payment_status_code: payment.payment_status_code,
            payment_method_code: payment.payment_method_code,
            payment_system_code: payment.payment_system_code,
            payment_date: payment.payment_date.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_line_item_is_invalid() {
        let req: CreateInvoiceRequest = serde_json::from_str(
            r#"{"lineItems": [{"description": "Filing fee", "total": "-1.00"}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let req: CreateInvoiceRequest = serde_json::from_str(
            r#"{"lineItems": [{"description": "Filing fee", "quantity": 0, "total": 10}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn invoice_without_line_items_is_invalid() {
        let req: CreateInvoiceRequest = serde_json::from_str(r#"{"lineItems": []}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
