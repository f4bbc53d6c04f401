//! Pay Service - payment accounts, invoices and EFT short-name reconciliation.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;
