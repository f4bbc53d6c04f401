//! Payment system adapters, one per payment method.

mod eft;
mod online_banking;

pub use eft::EftService;
pub use online_banking::OnlineBankingService;

use crate::models::{
    Invoice, InvoiceReference, InvoiceStatus, LineItem, PaymentAccount, PaymentMethod,
    PaymentStatus, PaymentSystem,
};
use crate::utils::PayError;
use async_trait::async_trait;
use service_core::error::AppError;

/// Reference issued by a payment system when an invoice is registered with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceReferenceDraft {
    pub invoice_number: String,
    pub reference_number: Option<String>,
}

/// Receipt details reported back by a payment system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDetails {
    pub receipt_number: String,
    pub receipt_date: chrono::DateTime<chrono::Utc>,
    pub receipt_amount: rust_decimal::Decimal,
}

/// Capabilities every payment method exposes to the invoice flow.
#[async_trait]
pub trait PaymentSystemService: Send + Sync {
    fn payment_system_code(&self) -> PaymentSystem;

    fn payment_method_code(&self) -> PaymentMethod;

    fn default_invoice_status(&self) -> InvoiceStatus;

    /// Status of a payment opened through the payment system's own portal.
    /// Credit application records settled payments, so it does not use it.
    fn default_payment_status(&self) -> PaymentStatus;

    /// URL the payer is redirected to, empty when the method has no portal.
    fn payment_system_url(
        &self,
        invoice: &Invoice,
        reference: Option<&InvoiceReference>,
        return_url: &str,
    ) -> String;

    /// Hook run after a payment account of this method is stored.
    async fn create_account(&self, _account: &PaymentAccount) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_invoice(
        &self,
        account: &PaymentAccount,
        line_items: &[LineItem],
        invoice: &Invoice,
    ) -> Result<Option<InvoiceReferenceDraft>, AppError>;

    /// Completion hook for systems that settle invoices on their side. Credit
    /// application updates invoices in the database instead of calling it.
    async fn update_invoice(
        &self,
        account: &PaymentAccount,
        line_items: &[LineItem],
        invoice: &Invoice,
        invoice_number: &str,
    ) -> Result<(), AppError>;

    async fn cancel_invoice(
        &self,
        account: &PaymentAccount,
        invoice_number: &str,
    ) -> Result<(), AppError>;

    async fn get_receipt(
        &self,
        account: &PaymentAccount,
        reference: &InvoiceReference,
    ) -> Result<Option<ReceiptDetails>, AppError>;

    async fn complete_post_payment(&self, payment_id: i64) -> Result<(), AppError>;
}

/// Adapter for a payment method.
pub fn payment_system_for(method: PaymentMethod) -> Box<dyn PaymentSystemService> {
    match method {
        PaymentMethod::Eft => Box::new(EftService),
        PaymentMethod::OnlineBanking => Box::new(OnlineBankingService),
    }
}

/// Adapter for an account, rejecting unknown stored method codes.
pub fn payment_system_for_account(
    account: &PaymentAccount,
) -> Result<Box<dyn PaymentSystemService>, AppError> {
    account
        .payment_method()
        .map(payment_system_for)
        .ok_or_else(|| PayError::InvalidPaymentMethod(account.payment_method_code.clone()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(method: &str) -> PaymentAccount {
        PaymentAccount {
            id: 1,
            auth_account_id: "1234".to_string(),
            name: None,
            payment_method_code: method.to_string(),
            eft_enable: false,
            created_on: Utc::now(),
        }
    }

    #[test]
    fn factory_selects_adapter_by_method() {
        let eft = payment_system_for(PaymentMethod::Eft);
        assert_eq!(eft.payment_method_code(), PaymentMethod::Eft);
        assert_eq!(eft.payment_system_code(), PaymentSystem::Cgi);

        let ob = payment_system_for(PaymentMethod::OnlineBanking);
        assert_eq!(ob.payment_method_code(), PaymentMethod::OnlineBanking);
        assert_eq!(ob.payment_system_code(), PaymentSystem::Paybc);
    }

    #[test]
    fn unknown_account_method_is_rejected() {
        let err = payment_system_for_account(&account("CHEQUE"))
            .err()
            .expect("unknown method must fail");
        assert_eq!(err.code(), "INVALID_PAYMENT_METHOD");

        assert!(payment_system_for_account(&account("EFT")).is_ok());
    }
}
