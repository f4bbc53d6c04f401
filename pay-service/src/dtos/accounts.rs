use crate::models::PaymentAccount;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[validate(
        length(max = 50, message = "Account id is too long"),
        custom(function = "crate::utils::not_blank")
    )]
    pub account_id: String,
    #[validate(length(max = 250))]
    pub name: Option<String>,
    pub payment_method: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i64,
    pub account_id: String,
    pub name: Option<String>,
    pub payment_method: String,
    pub eft_enable: bool,
    pub created_on: String,
}

impl From<PaymentAccount> for AccountResponse {
    fn from(account: PaymentAccount) -> Self {
        Self {
            id: account.id,
            account_id: account.auth_account_id,
            name: account.name,
            payment_method: account.payment_method_code,
            eft_enable: account.eft_enable,
            created_on: account.created_on.to_rfc3339(),
        }
    }
}
