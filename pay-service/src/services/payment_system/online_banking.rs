//! Online banking: payers settle through their bank, so there is nothing to
//! register up front and no receipt to fetch.

use super::{InvoiceReferenceDraft, PaymentSystemService, ReceiptDetails};
use crate::models::{
    Invoice, InvoiceReference, InvoiceStatus, LineItem, PaymentAccount, PaymentMethod,
    PaymentStatus, PaymentSystem,
};
use async_trait::async_trait;
use service_core::error::AppError;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct OnlineBankingService;

#[async_trait]
impl PaymentSystemService for OnlineBankingService {
    fn payment_system_code(&self) -> PaymentSystem {
        PaymentSystem::Paybc
    }

    fn payment_method_code(&self) -> PaymentMethod {
        PaymentMethod::OnlineBanking
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
        debug!(auth_account_id = %account.auth_account_id, "Online banking account registered");
        Ok(())
    }

    async fn create_invoice(
        &self,
        _account: &PaymentAccount,
        _line_items: &[LineItem],
        invoice: &Invoice,
    ) -> Result<Option<InvoiceReferenceDraft>, AppError> {
        debug!(invoice_id = invoice.id, "create_invoice_online_banking");
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
        _account: &PaymentAccount,
        _invoice_number: &str,
    ) -> Result<(), AppError> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn defaults_are_created() {
        let service = OnlineBankingService;
        assert_eq!(service.default_invoice_status(), InvoiceStatus::Created);
        assert_eq!(service.default_payment_status(), PaymentStatus::Created);
    }

    #[tokio::test]
    async fn invoice_operations_are_no_ops() {
        let service = OnlineBankingService;
        let account = PaymentAccount {
            id: 1,
            auth_account_id: "1234".to_string(),
            name: None,
            payment_method_code: "ONLINE_BANKING".to_string(),
            eft_enable: false,
            created_on: Utc::now(),
        };
        let invoice = Invoice {
            id: 5,
            payment_account_id: 1,
            business_identifier: None,
            total: Decimal::from(10),
            paid: Decimal::ZERO,
            invoice_status_code: "CREATED".to_string(),
            payment_method_code: "ONLINE_BANKING".to_string(),
            payment_date: None,
            created_on: Utc::now(),
            updated_on: None,
        };

        assert_eq!(service.payment_system_url(&invoice, None, "https://return"), "");
        assert!(service
            .create_invoice(&account, &[], &invoice)
            .await
            .unwrap()
            .is_none());
        service
            .update_invoice(&account, &[], &invoice, "INV-5")
            .await
            .unwrap();
        service.cancel_invoice(&account, "INV-5").await.unwrap();
        service.complete_post_payment(9).await.unwrap();
    }
}
