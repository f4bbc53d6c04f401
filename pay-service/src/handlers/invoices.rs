use crate::dtos::{CreateInvoiceRequest, InvoiceResponse, PaymentResponse, ReceiptResponse};
use crate::middleware::UserContext;
use crate::models::{
    CreateInvoice, CreateLineItem, Invoice, InvoiceReferenceStatus, InvoiceStatus, PaymentAccount,
};
use crate::services::payment_system_for_account;
use crate::startup::AppState;
use crate::utils::{storable_amount, PayError, ValidatedJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use service_core::error::AppError;

async fn load_invoice(
    state: &AppState,
    invoice_id: i64,
) -> Result<(Invoice, PaymentAccount), AppError> {
    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or(PayError::InvoiceNotFound)?;

    let account = state
        .db
        .get_payment_account_by_id(invoice.payment_account_id)
        .await?
        .ok_or(PayError::AccountNotFound)?;

    Ok((invoice, account))
}

async fn invoice_response(
    state: &AppState,
    invoice: Invoice,
    account: &PaymentAccount,
) -> Result<InvoiceResponse, AppError> {
    let line_items = state.db.get_line_items(invoice.id).await?;
    let references = state.db.get_invoice_references(invoice.id).await?;
    let url = payment_system_for_account(account)?.payment_system_url(
        &invoice,
        references.first(),
        "",
    );

    Ok(InvoiceResponse::new(invoice, line_items, references, url))
}

#[tracing::instrument(skip(state, user, request), fields(user_id = %user.user_id))]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Path(account_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    let total: Decimal = request.line_items.iter().map(|item| item.total).sum();
    storable_amount(&total).map_err(|_| {
        PayError::InvalidRequest("Invoice total exceeds the maximum amount".to_string())
    })?;

    let account = state
        .db
        .get_payment_account(&account_id)
        .await?
        .ok_or(PayError::AccountNotFound)?;

    let payment_system = payment_system_for_account(&account)?;

    let input = CreateInvoice {
        payment_account_id: account.id,
        business_identifier: request.business_identifier,
        status: payment_system.default_invoice_status(),
        payment_method_code: payment_system.payment_method_code().as_str().to_string(),
        line_items: request
            .line_items
            .into_iter()
            .map(|item| CreateLineItem {
                description: item.description.trim().to_string(),
                quantity: item.quantity.unwrap_or(1),
                total: item.total,
            })
            .collect(),
    };

    let (invoice, line_items) = state.db.create_invoice(&input).await?;

    let mut references = Vec::new();
    if let Some(draft) = payment_system
        .create_invoice(&account, &line_items, &invoice)
        .await?
    {
        references.push(state.db.create_invoice_reference(invoice.id, &draft).await?);
    }

    let url = payment_system.payment_system_url(&invoice, references.first(), "");

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::new(invoice, line_items, references, url)),
    ))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let (invoice, account) = load_invoice(&state, invoice_id).await?;
    Ok(Json(invoice_response(&state, invoice, &account).await?))
}

/// Receipts stored for the invoice. When none are stored yet, the payment
/// system is asked for receipts of the invoice's live references.
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_receipts(
    State(state): State<AppState>,
    user: UserContext,
    Path(invoice_id): Path<i64>,
) -> Result<Json<Vec<ReceiptResponse>>, AppError> {
    let (invoice, account) = load_invoice(&state, invoice_id).await?;

    let receipts = state.db.list_receipts(invoice.id).await?;
    if !receipts.is_empty() {
        return Ok(Json(receipts.into_iter().map(Into::into).collect()));
    }

    let payment_system = payment_system_for_account(&account)?;
    let mut fetched = Vec::new();
    for reference in state.db.get_invoice_references(invoice.id).await? {
        if reference.status_code == InvoiceReferenceStatus::Cancelled.as_str() {
            continue;
        }
        if let Some(details) = payment_system.get_receipt(&account, &reference).await? {
            fetched.push(details.into());
        }
    }

    Ok(Json(fetched))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_payments(
    State(state): State<AppState>,
    user: UserContext,
    Path(invoice_id): Path<i64>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let (invoice, _) = load_invoice(&state, invoice_id).await?;
    let payments = state.db.list_payments(invoice.id).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Cancel an unpaid invoice with its payment system, then mark it deleted.
#[tracing::instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn cancel_invoice(
    State(state): State<AppState>,
    user: UserContext,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let (invoice, account) = load_invoice(&state, invoice_id).await?;

    if invoice.status() != InvoiceStatus::Created || invoice.paid > Decimal::ZERO {
        return Err(PayError::InvoiceCancelNotAllowed.into());
    }

    let payment_system = payment_system_for_account(&account)?;
    for reference in state.db.get_invoice_references(invoice.id).await? {
        if reference.status_code != InvoiceReferenceStatus::Cancelled.as_str() {
            payment_system
                .cancel_invoice(&account, &reference.invoice_number)
                .await?;
        }
    }

    let cancelled = state.db.cancel_invoice(invoice.id).await?;

    Ok(Json(invoice_response(&state, cancelled, &account).await?))
}
