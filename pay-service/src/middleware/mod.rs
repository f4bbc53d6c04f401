pub mod user;

pub use user::{UserContext, STAFF_ROLE};
