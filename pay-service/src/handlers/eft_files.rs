use super::eft_short_names::complete_post_payments;
use crate::dtos::{CreateEftFileRequest, EftFileResponse};
use crate::middleware::{UserContext, STAFF_ROLE};
use crate::models::CreateEftCredit;
use crate::services::record_error;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

/// Record a bank file of EFT credits.
#[tracing::instrument(skip(state, user, request), fields(user_id = %user.user_id))]
pub async fn create_eft_file(
    State(state): State<AppState>,
    user: UserContext,
    ValidatedJson(request): ValidatedJson<CreateEftFileRequest>,
) -> Result<(StatusCode, Json<EftFileResponse>), AppError> {
    user.require_role(STAFF_ROLE)?;

    let credits: Vec<CreateEftCredit> = request
        .credits
        .into_iter()
        .map(|line| CreateEftCredit {
            short_name: line.short_name,
            amount: line.amount,
        })
        .collect();

    let ingest = state
        .db
        .create_eft_file(
            request.file_ref.trim(),
            &credits,
            &state.config.eft.invoice_prefix,
        )
        .await
        .inspect_err(|e| record_error(e.code()))?;

    complete_post_payments(&ingest.applied.payment_ids).await;

    Ok((StatusCode::CREATED, Json(ingest.into())))
}
