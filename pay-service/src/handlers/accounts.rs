use crate::dtos::{AccountResponse, CreateAccountRequest};
use crate::middleware::UserContext;
use crate::models::{CreatePaymentAccount, PaymentMethod};
use crate::services::payment_system_for;
use crate::startup::AppState;
use crate::utils::{PayError, ValidatedJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

#[tracing::instrument(skip(state, user, request), fields(user_id = %user.user_id))]
pub async fn create_account(
    State(state): State<AppState>,
    user: UserContext,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let payment_method = PaymentMethod::parse(request.payment_method.trim())
        .ok_or_else(|| PayError::InvalidPaymentMethod(request.payment_method.clone()))?;

    let account = state
        .db
        .create_payment_account(&CreatePaymentAccount {
            auth_account_id: request.account_id.trim().to_string(),
            name: request.name,
            payment_method,
        })
        .await?;

    payment_system_for(payment_method)
        .create_account(&account)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_account(
    State(state): State<AppState>,
    user: UserContext,
    Path(account_id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .db
        .get_payment_account(&account_id)
        .await?
        .ok_or(PayError::AccountNotFound)?;

    Ok(Json(account.into()))
}
