//! Shared helpers for pay-service.

pub mod errors;
pub mod pagination;
pub mod validation;

pub use errors::PayError;
pub use pagination::Pagination;
pub use validation::{
    non_negative_amount, not_blank, positive_amount, storable_amount, ValidatedJson,
};
