//! EFT file, short name and credit models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EftFile {
    pub id: i64,
    pub file_ref: String,
    pub created_on: DateTime<Utc>,
}

/// Name printed on a bank file line, optionally mapped to an auth account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EftShortName {
    pub id: i64,
    pub short_name: String,
    pub auth_account_id: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl EftShortName {
    pub fn is_mapped(&self) -> bool {
        self.auth_account_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EftCredit {
    pub id: i64,
    pub eft_file_id: i64,
    pub short_name_id: i64,
    pub payment_account_id: Option<i64>,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub created_on: DateTime<Utc>,
}

/// One credit line of an incoming EFT file.
#[derive(Debug, Clone)]
pub struct CreateEftCredit {
    pub short_name: String,
    pub amount: Decimal,
}

/// Filter for the short-name search.
#[derive(Debug, Clone, Default)]
pub struct ShortNameSearch {
    pub include_all: bool,
    pub short_name: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
