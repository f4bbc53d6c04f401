//! EFT: invoices are settled when bank-file credits are applied, so the
//! invoice reference is written by the credit application, not here.

use super::{InvoiceReferenceDraft, PaymentSystemService, ReceiptDetails};
use crate::models::{
    Invoice, InvoiceReference, InvoiceStatus, LineItem, PaymentAccount, PaymentMethod,
    PaymentStatus, PaymentSystem,
};
use async_trait::async_trait;
use service_core::error::AppError;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct EftService;

#[async_trait]
impl PaymentSystemService for EftService {
    fn payment_system_code(&self) -> PaymentSystem {
        PaymentSystem::Cgi
    }

    fn payment_method_code(&self) -> PaymentMethod {
        PaymentMethod::Eft
    }

    fn default_invoice_status(&self) -> InvoiceStatus {
        InvoiceStatus::Created
    }

    fn default_payment_status(&self) -> PaymentStatus {
        PaymentStatus::Created
    }

    fn payment_system_url(
        &self,
        _invoice: &Invoice,
        _reference: Option<&InvoiceReference>,
        _return_url: &str,
    ) -> String {
        String::new()
    }

    async fn create_account(&self, account: &PaymentAccount) -> Result<(), AppError> {
        info!(auth_account_id = %account.auth_account_id, "EFT enabled for account");
        Ok(())
    }

    async fn create_invoice(
        &self,
        _account: &PaymentAccount,
        _line_items: &[LineItem],
        _invoice: &Invoice,
    ) -> Result<Option<InvoiceReferenceDraft>, AppError> {
        Ok(None)
    }

    async fn update_invoice(
        &self,
        _account: &PaymentAccount,
        _line_items: &[LineItem],
        _invoice: &Invoice,
        _invoice_number: &str,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn cancel_invoice(
        &self,
        account: &PaymentAccount,
        invoice_number: &str,
    ) -> Result<(), AppError> {
        info!(
            auth_account_id = %account.auth_account_id,
            invoice_number = %invoice_number,
            "EFT invoice cancelled"
        );
        Ok(())
    }

    async fn get_receipt(
        &self,
        _account: &PaymentAccount,
        _reference: &InvoiceReference,
    ) -> Result<Option<ReceiptDetails>, AppError> {
        Ok(None)
    }

    async fn complete_post_payment(&self, _payment_id: i64) -> Result<(), AppError> {
        Ok(())
    }
}
