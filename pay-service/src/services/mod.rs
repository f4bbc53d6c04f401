//! Services module for pay-service.

pub mod credit_plan;
pub mod database;
pub mod metrics;
pub mod payment_system;

pub use database::{CreditApplicationSummary, Database, EftFileIngest, ShortNameMapping};
pub use metrics::{get_metrics, init_metrics, record_error};
pub use payment_system::{payment_system_for, payment_system_for_account, PaymentSystemService};
