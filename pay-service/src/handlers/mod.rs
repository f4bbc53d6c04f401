pub mod accounts;
pub mod eft_files;
pub mod eft_short_names;
pub mod health;
pub mod invoices;

pub use accounts::{create_account, get_account};
pub use eft_files::create_eft_file;
pub use eft_short_names::{
    get_short_name, list_short_name_credits, map_short_name, search_short_names,
};
pub use health::{health_check, metrics_handler, readiness_check};
pub use invoices::{cancel_invoice, create_invoice, get_invoice, list_payments, list_receipts};
