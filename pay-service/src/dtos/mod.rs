pub mod accounts;
pub mod eft;
pub mod invoices;

pub use accounts::{AccountResponse, CreateAccountRequest};
pub use eft::{
    CreateEftFileRequest, EftCreditLine, EftCreditResponse, EftFileResponse, MapShortNameRequest,
    ShortNameListResponse, ShortNameResponse, ShortNameSearchParams,
};
pub use invoices::{
    CreateInvoiceRequest, InvoiceReferenceResponse, InvoiceResponse, LineItemRequest,
    LineItemResponse, PaymentResponse, ReceiptResponse,
};
