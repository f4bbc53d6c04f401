use crate::dtos::{
    EftCreditResponse, MapShortNameRequest, ShortNameListResponse, ShortNameResponse,
    ShortNameSearchParams,
};
use crate::middleware::{UserContext, STAFF_ROLE};
use crate::models::{PaymentMethod, ShortNameSearch};
use crate::services::{payment_system_for, record_error};
use crate::startup::AppState;
use crate::utils::PayError;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

/// Run the EFT post-payment hook for payments written by a committed credit
/// application. Failures are logged; the payments stay recorded.
pub(crate) async fn complete_post_payments(payment_ids: &[i64]) {
    let eft = payment_system_for(PaymentMethod::Eft);
    for payment_id in payment_ids {
        if let Err(e) = eft.complete_post_payment(*payment_id).await {
            record_error(e.code());
            tracing::warn!(payment_id = payment_id, error = %e, "Post-payment hook failed");
        }
    }
}

#[tracing::instrument(skip(state, user, body), fields(user_id = %user.user_id))]
pub async fn map_short_name(
    State(state): State<AppState>,
    user: UserContext,
    Path(short_name_id): Path<i64>,
    body: Option<Json<MapShortNameRequest>>,
) -> Result<Json<ShortNameResponse>, AppError> {
    user.require_role(STAFF_ROLE)?;

    let request = body.map(|Json(b)| b).unwrap_or_default();
    let account_id = request
        .account_id()
        .ok_or(PayError::EftShortNameAccountIdRequired)?;

    let mapping = state
        .db
        .map_short_name(short_name_id, account_id, &state.config.eft.invoice_prefix)
        .await
        .inspect_err(|e| record_error(e.code()))?;

    complete_post_payments(&mapping.applied.payment_ids).await;

    Ok(Json(mapping.short_name.into()))
}

#[tracing::instrument(skip(state, user, params), fields(user_id = %user.user_id))]
pub async fn search_short_names(
    State(state): State<AppState>,
    user: UserContext,
    Query(params): Query<ShortNameSearchParams>,
) -> Result<Json<ShortNameListResponse>, AppError> {
    user.require_role(STAFF_ROLE)?;

    let pagination = params.pagination();
    let search = ShortNameSearch {
        include_all: params.include_all.unwrap_or(false),
        short_name: params.short_name_filter(),
        limit: pagination.limit(),
        offset: pagination.offset(),
    };

    let (items, total) = state.db.search_short_names(&search).await?;

    Ok(Json(ShortNameListResponse {
        items: items.into_iter().map(Into::into).collect(),
        page: pagination.page(),
        limit: pagination.limit(),
        total,
    }))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_short_name(
    State(state): State<AppState>,
    user: UserContext,
    Path(short_name_id): Path<i64>,
) -> Result<Json<ShortNameResponse>, AppError> {
    user.require_role(STAFF_ROLE)?;

    let short_name = state
        .db
        .get_short_name(short_name_id)
        .await?
        .ok_or(PayError::EftShortNameNotFound)?;

    Ok(Json(short_name.into()))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_short_name_credits(
    State(state): State<AppState>,
    user: UserContext,
    Path(short_name_id): Path<i64>,
) -> Result<Json<Vec<EftCreditResponse>>, AppError> {
    user.require_role(STAFF_ROLE)?;

    state
        .db
        .get_short_name(short_name_id)
        .await?
        .ok_or(PayError::EftShortNameNotFound)?;

    let credits = state.db.list_credits(short_name_id).await?;

    Ok(Json(credits.into_iter().map(Into::into).collect()))
}
