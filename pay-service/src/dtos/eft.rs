use crate::models::{EftCredit, EftShortName};
use crate::services::EftFileIngest;
use crate::utils::Pagination;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `PATCH /eft-shortnames/{id}`. The account id is checked by the
/// handler so a missing value gets its own error code.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapShortNameRequest {
    pub account_id: Option<String>,
}

impl MapShortNameRequest {
    /// Trimmed account id, `None` when missing or blank.
    pub fn account_id(&self) -> Option<&str> {
        self.account_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortNameResponse {
    pub id: i64,
    pub short_name: String,
    pub account_id: Option<String>,
    pub created_on: String,
}

impl From<EftShortName> for ShortNameResponse {
    fn from(short_name: EftShortName) -> Self {
        Self {
            id: short_name.id,
            short_name: short_name.short_name,
            account_id: short_name.auth_account_id,
            created_on: short_name.created_on.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortNameSearchParams {
    pub include_all: Option<bool>,
    pub short_name: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ShortNameSearchParams {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn short_name_filter(&self) -> Option<String> {
        self.short_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortNameListResponse {
    pub items: Vec<ShortNameResponse>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EftCreditResponse {
    pub id: i64,
    pub eft_file_id: i64,
    pub short_name_id: i64,
    pub payment_account_id: Option<i64>,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub created_on: String,
}

impl From<EftCredit> for EftCreditResponse {
    fn from(credit: EftCredit) -> Self {
        Self {
            id: credit.id,
            eft_file_id: credit.eft_file_id,
            short_name_id: credit.short_name_id,
            payment_account_id: credit.payment_account_id,
            amount: credit.amount,
            remaining_amount: credit.remaining_amount,
            created_on: credit.created_on.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEftFileRequest {
    #[validate(length(max = 2000), custom(function = "crate::utils::not_blank"))]
    pub file_ref: String,
    #[validate(length(min = 1, message = "At least one credit is required"), nested)]
    pub credits: Vec<EftCreditLine>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EftCreditLine {
    #[validate(length(max = 100), custom(function = "crate::utils::not_blank"))]
    pub short_name: String,
    #[validate(custom(function = "crate::utils::positive_amount"))]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EftFileResponse {
    pub id: i64,
    pub file_ref: String,
    pub created_on: String,
    pub credit_count: usize,
    pub total_amount: Decimal,
    pub applied_amount: Decimal,
}

impl From<EftFileIngest> for EftFileResponse {
    fn from(ingest: EftFileIngest) -> Self {
        Self {
            id: ingest.file.id,
            file_ref: ingest.file.file_ref,
            created_on: ingest.file.created_on.to_rfc3339(),
            credit_count: ingest.credit_count,
            total_amount: ingest.total_amount,
            applied_amount: ingest.applied.total_applied(),
        }
    }
}
