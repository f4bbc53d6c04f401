//! Domain models for pay-service.

mod codes;
mod eft;
mod invoice;
mod payment;
mod payment_account;

pub use codes::{
    HistoryOperation, InvoiceReferenceStatus, InvoiceStatus, PaymentMethod, PaymentStatus,
    PaymentSystem,
};
pub use eft::{CreateEftCredit, EftCredit, EftFile, EftShortName, ShortNameSearch};
pub use invoice::{CreateInvoice, CreateLineItem, Invoice, InvoiceReference, LineItem};
pub use payment::{Payment, Receipt};
pub use payment_account::{CreatePaymentAccount, PaymentAccount};
