//! Database service for pay-service.

use crate::models::{
    CreateEftCredit, CreateInvoice, CreatePaymentAccount, EftCredit, EftFile, EftShortName,
    HistoryOperation, Invoice, InvoiceReference, InvoiceReferenceStatus, InvoiceStatus, LineItem,
    Payment, PaymentAccount, PaymentStatus, Receipt, ShortNameSearch,
};
use crate::services::credit_plan::{
    plan_credit_application, CreditBalance, InvoiceApplication, OutstandingInvoice,
};
use crate::services::metrics::{
    record_credit_applied, record_invoice, record_receipt, record_short_name_mapping,
    DB_QUERY_DURATION,
};
use crate::services::payment_system::{EftService, InvoiceReferenceDraft, PaymentSystemService};
use crate::utils::PayError;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Result of applying credit for one or more short names.
#[derive(Debug, Clone, Default)]
pub struct CreditApplicationSummary {
    pub invoices: Vec<InvoiceApplication>,
    pub payment_ids: Vec<i64>,
}

impl CreditApplicationSummary {
    pub fn total_applied(&self) -> Decimal {
        self.invoices.iter().map(|i| i.applied).sum()
    }

    fn merge(&mut self, other: CreditApplicationSummary) {
        self.invoices.extend(other.invoices);
        self.payment_ids.extend(other.payment_ids);
    }
}

/// Outcome of mapping a short name to an account.
#[derive(Debug, Clone)]
pub struct ShortNameMapping {
    pub short_name: EftShortName,
    /// `None` when no payment account exists for the auth account id yet.
    pub account: Option<PaymentAccount>,
    pub applied: CreditApplicationSummary,
}

/// Outcome of ingesting an EFT file.
#[derive(Debug, Clone)]
pub struct EftFileIngest {
    pub file: EftFile,
    pub credit_count: usize,
    pub total_amount: Decimal,
    pub applied: CreditApplicationSummary,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "pay-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Pool that connects on first use. Nothing is opened until a query runs.
    pub fn connect_lazy(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy(database_url)
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Invalid database url: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payment Account Operations
    // -------------------------------------------------------------------------

    /// Create a payment account.
    #[instrument(skip(self, input), fields(auth_account_id = %input.auth_account_id))]
    pub async fn create_payment_account(
        &self,
        input: &CreatePaymentAccount,
    ) -> Result<PaymentAccount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_payment_account"])
            .start_timer();

        let account = sqlx::query_as::<_, PaymentAccount>(
            r#"
            INSERT INTO payment_accounts (auth_account_id, name, payment_method_code, eft_enable)
            VALUES ($1, $2, $3, $4)
            RETURNING id, auth_account_id, name, payment_method_code, eft_enable, created_on
            "#,
        )
        .bind(&input.auth_account_id)
        .bind(&input.name)
        .bind(input.payment_method.as_str())
        .bind(input.payment_method == crate::models::PaymentMethod::Eft)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                PayError::AccountAlreadyExists.into()
            }
            _ => AppError::DatabaseError(anyhow::anyhow!(
                "Failed to create payment account: {}",
                e
            )),
        })?;

        timer.observe_duration();

        info!(account_id = account.id, "Payment account created");

        Ok(account)
    }

    /// Get a payment account by its auth account id.
    #[instrument(skip(self))]
    pub async fn get_payment_account(
        &self,
        auth_account_id: &str,
    ) -> Result<Option<PaymentAccount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payment_account"])
            .start_timer();

        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to acquire connection: {}", e))
        })?;
        let account = find_account_by_auth_id(&mut conn, auth_account_id).await?;

        timer.observe_duration();

        Ok(account)
    }

    /// Get a payment account by internal id.
    #[instrument(skip(self))]
    pub async fn get_payment_account_by_id(
        &self,
        id: i64,
    ) -> Result<Option<PaymentAccount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payment_account_by_id"])
            .start_timer();

        let account = sqlx::query_as::<_, PaymentAccount>(
            r#"
            SELECT id, auth_account_id, name, payment_method_code, eft_enable, created_on
            FROM payment_accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get payment account: {}", e))
        })?;

        timer.observe_duration();

        Ok(account)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Create an invoice and its line items.
    #[instrument(skip(self, input), fields(payment_account_id = input.payment_account_id))]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoice,
    ) -> Result<(Invoice, Vec<LineItem>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (payment_account_id, business_identifier, total, paid, invoice_status_code, payment_method_code)
            VALUES ($1, $2, $3, 0, $4, $5)
            RETURNING id, payment_account_id, business_identifier, total, paid, invoice_status_code,
                payment_method_code, payment_date, created_on, updated_on
            "#,
        )
        .bind(input.payment_account_id)
        .bind(&input.business_identifier)
        .bind(input.total())
        .bind(input.status.as_str())
        .bind(&input.payment_method_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        let mut line_items = Vec::with_capacity(input.line_items.len());
        for item in &input.line_items {
            let line_item = sqlx::query_as::<_, LineItem>(
                r#"
                INSERT INTO payment_line_items (invoice_id, description, quantity, total)
                VALUES ($1, $2, $3, $4)
                RETURNING id, invoice_id, description, quantity, total
                "#,
            )
            .bind(invoice.id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.total)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to add line item: {}", e))
            })?;
            line_items.push(line_item);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_invoice(&invoice.invoice_status_code);

        info!(invoice_id = invoice.id, total = %invoice.total, "Invoice created");

        Ok((invoice, line_items))
    }

    /// Get an invoice by id.
    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, payment_account_id, business_identifier, total, paid, invoice_status_code,
                payment_method_code, payment_date, created_on, updated_on
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// Line items of an invoice.
    #[instrument(skip(self))]
    pub async fn get_line_items(&self, invoice_id: i64) -> Result<Vec<LineItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_line_items"])
            .start_timer();

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, invoice_id, description, quantity, total
            FROM payment_line_items
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e))
        })?;

        timer.observe_duration();

        Ok(items)
    }

    /// Provider references of an invoice.
    #[instrument(skip(self))]
    pub async fn get_invoice_references(
        &self,
        invoice_id: i64,
    ) -> Result<Vec<InvoiceReference>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_references"])
            .start_timer();

        let references = sqlx::query_as::<_, InvoiceReference>(
            r#"
            SELECT id, invoice_id, invoice_number, reference_number, status_code
            FROM invoice_references
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice references: {}", e))
        })?;

        timer.observe_duration();

        Ok(references)
    }

    /// Store a reference issued by a payment system.
    #[instrument(skip(self, draft))]
    pub async fn create_invoice_reference(
        &self,
        invoice_id: i64,
        draft: &InvoiceReferenceDraft,
    ) -> Result<InvoiceReference, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice_reference"])
            .start_timer();

        let reference = sqlx::query_as::<_, InvoiceReference>(
            r#"
            INSERT INTO invoice_references (invoice_id, invoice_number, reference_number, status_code)
            VALUES ($1, $2, $3, $4)
            RETURNING id, invoice_id, invoice_number, reference_number, status_code
            "#,
        )
        .bind(invoice_id)
        .bind(&draft.invoice_number)
        .bind(&draft.reference_number)
        .bind(InvoiceReferenceStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice reference: {}", e))
        })?;

        timer.observe_duration();

        Ok(reference)
    }

    /// Mark an unpaid invoice as deleted and cancel its references.
    #[instrument(skip(self))]
    pub async fn cancel_invoice(&self, invoice_id: i64) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let current = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, payment_account_id, business_identifier, total, paid, invoice_status_code,
                payment_method_code, payment_date, created_on, updated_on
            FROM invoices
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock invoice: {}", e)))?
        .ok_or(PayError::InvoiceNotFound)?;

        if current.status() != InvoiceStatus::Created || current.paid > Decimal::ZERO {
            return Err(PayError::InvoiceCancelNotAllowed.into());
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET invoice_status_code = $2, updated_on = NOW()
            WHERE id = $1
            RETURNING id, payment_account_id, business_identifier, total, paid, invoice_status_code,
                payment_method_code, payment_date, created_on, updated_on
            "#,
        )
        .bind(invoice_id)
        .bind(InvoiceStatus::Deleted.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to cancel invoice: {}", e)))?;

        sqlx::query("UPDATE invoice_references SET status_code = $2 WHERE invoice_id = $1")
            .bind(invoice_id)
            .bind(InvoiceReferenceStatus::Cancelled.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to cancel references: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_invoice(&invoice.invoice_status_code);

        info!(invoice_id = invoice.id, "Invoice cancelled");

        Ok(invoice)
    }

    /// Receipts issued for an invoice, oldest first.
    #[instrument(skip(self))]
    pub async fn list_receipts(&self, invoice_id: i64) -> Result<Vec<Receipt>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_receipts"])
            .start_timer();

        let receipts = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, invoice_id, receipt_number, receipt_amount, receipt_date
            FROM receipts
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list receipts: {}", e)))?;

        timer.observe_duration();

        Ok(receipts)
    }

    /// Payments recorded against an invoice, oldest first.
    #[instrument(skip(self))]
    pub async fn list_payments(&self, invoice_id: i64) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, payment_account_id, invoice_id, invoice_number, invoice_amount, paid_amount,
                payment_status_code, payment_method_code, payment_system_code, payment_date
            FROM payments
            WHERE invoice_id = $1
            ORDER BY id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // EFT Short Name Operations
    // -------------------------------------------------------------------------

    /// Get a short name by id.
    #[instrument(skip(self))]
    pub async fn get_short_name(&self, id: i64) -> Result<Option<EftShortName>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_short_name"])
            .start_timer();

        let short_name = sqlx::query_as::<_, EftShortName>(
            r#"
            SELECT id, short_name, auth_account_id, created_on
            FROM eft_short_names
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get short name: {}", e))
        })?;

        timer.observe_duration();

        Ok(short_name)
    }

    /// Search short names. Returns one page and the total match count.
    #[instrument(skip(self))]
    pub async fn search_short_names(
        &self,
        search: &ShortNameSearch,
    ) -> Result<(Vec<EftShortName>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_short_names"])
            .start_timer();

        let items = sqlx::query_as::<_, EftShortName>(
            r#"
            SELECT id, short_name, auth_account_id, created_on
            FROM eft_short_names
            WHERE ($1::bool OR auth_account_id IS NULL)
              AND ($2::text IS NULL OR short_name ILIKE '%' || $2 || '%')
            ORDER BY short_name, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(search.include_all)
        .bind(&search.short_name)
        .bind(search.limit)
        .bind(search.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to search short names: {}", e))
        })?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM eft_short_names
            WHERE ($1::bool OR auth_account_id IS NULL)
              AND ($2::text IS NULL OR short_name ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(search.include_all)
        .bind(&search.short_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count short names: {}", e))
        })?;

        timer.observe_duration();

        Ok((items, total))
    }

    /// Credits received under a short name, oldest first.
    #[instrument(skip(self))]
    pub async fn list_credits(&self, short_name_id: i64) -> Result<Vec<EftCredit>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_credits"])
            .start_timer();

        let credits = sqlx::query_as::<_, EftCredit>(
            r#"
            SELECT id, eft_file_id, short_name_id, payment_account_id, amount, remaining_amount, created_on
            FROM eft_credits
            WHERE short_name_id = $1
            ORDER BY id
            "#,
        )
        .bind(short_name_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list credits: {}", e)))?;

        timer.observe_duration();

        Ok(credits)
    }

    /// Map a short name to an auth account and apply its credits to the
    /// account's unpaid invoices, all in one transaction.
    #[instrument(skip(self, invoice_prefix))]
    pub async fn map_short_name(
        &self,
        short_name_id: i64,
        auth_account_id: &str,
        invoice_prefix: &str,
    ) -> Result<ShortNameMapping, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["map_short_name"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let current = sqlx::query_as::<_, EftShortName>(
            r#"
            SELECT id, short_name, auth_account_id, created_on
            FROM eft_short_names
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(short_name_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to lock short name: {}", e))
        })?
        .ok_or(PayError::EftShortNameNotFound)?;

        if let Some(existing) = current.auth_account_id.as_deref() {
            if existing != auth_account_id {
                record_short_name_mapping("already_mapped");
                return Err(PayError::EftShortNameAlreadyMapped.into());
            }
        }

        let short_name = if current.is_mapped() {
            current
        } else {
            let updated = sqlx::query_as::<_, EftShortName>(
                r#"
                UPDATE eft_short_names
                SET auth_account_id = $2
                WHERE id = $1
                RETURNING id, short_name, auth_account_id, created_on
                "#,
            )
            .bind(short_name_id)
            .bind(auth_account_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to map short name: {}", e))
            })?;

            insert_short_name_history(&mut tx, &updated, HistoryOperation::Update).await?;
            updated
        };

        let account = find_account_by_auth_id(&mut tx, auth_account_id).await?;
        let applied = match &account {
            Some(account) => {
                apply_short_name_credits(&mut tx, short_name.id, account, invoice_prefix).await?
            }
            None => {
                warn!(
                    short_name_id = short_name.id,
                    auth_account_id = %auth_account_id,
                    "No payment account for mapped short name, credits left unapplied"
                );
                CreditApplicationSummary::default()
            }
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        record_short_name_mapping("mapped");

        info!(
            short_name_id = short_name.id,
            auth_account_id = %auth_account_id,
            invoices_paid = applied.invoices.len(),
            amount_applied = %applied.total_applied(),
            "EFT short name mapped"
        );

        Ok(ShortNameMapping {
            short_name,
            account,
            applied,
        })
    }

    // -------------------------------------------------------------------------
    // EFT File Operations
    // -------------------------------------------------------------------------

    /// Record an EFT file and its credits. Credits under short names that are
    /// already mapped are applied straight away.
    #[instrument(skip(self, credits, invoice_prefix), fields(credit_count = credits.len()))]
    pub async fn create_eft_file(
        &self,
        file_ref: &str,
        credits: &[CreateEftCredit],
        invoice_prefix: &str,
    ) -> Result<EftFileIngest, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_eft_file"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let file = sqlx::query_as::<_, EftFile>(
            r#"
            INSERT INTO eft_files (file_ref)
            VALUES ($1)
            RETURNING id, file_ref, created_on
            "#,
        )
        .bind(file_ref)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create EFT file: {}", e)))?;

        // Short names are locked in name order so concurrent files cannot deadlock.
        let mut resolved: BTreeMap<&str, (EftShortName, Option<PaymentAccount>)> = BTreeMap::new();
        let names: BTreeSet<&str> = credits.iter().map(|c| c.short_name.trim()).collect();
        for name in names {
            let short_name = find_or_create_short_name(&mut tx, name).await?;
            let account = match short_name.auth_account_id.as_deref() {
                Some(auth_account_id) => find_account_by_auth_id(&mut tx, auth_account_id).await?,
                None => None,
            };
            resolved.insert(name, (short_name, account));
        }

        let mut total_amount = Decimal::ZERO;

        for credit in credits {
            let (short_name, account) =
                resolved.get(credit.short_name.trim()).ok_or_else(|| {
                    AppError::InternalError(anyhow::anyhow!(
                        "Short name '{}' was not resolved",
                        credit.short_name
                    ))
                })?;

            sqlx::query(
                r#"
                INSERT INTO eft_credits (eft_file_id, short_name_id, payment_account_id, amount, remaining_amount)
                VALUES ($1, $2, $3, $4, $4)
                "#,
            )
            .bind(file.id)
            .bind(short_name.id)
            .bind(account.as_ref().map(|a| a.id))
            .bind(credit.amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create EFT credit: {}", e))
            })?;

            total_amount += credit.amount;
        }

        let mut applied = CreditApplicationSummary::default();
        for (short_name, account) in resolved.values() {
            if let Some(account) = account {
                let summary =
                    apply_short_name_credits(&mut tx, short_name.id, account, invoice_prefix)
                        .await?;
                applied.merge(summary);
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            eft_file_id = file.id,
            file_ref = %file.file_ref,
            total_amount = %total_amount,
            amount_applied = %applied.total_applied(),
            "EFT file recorded"
        );

        Ok(EftFileIngest {
            file,
            credit_count: credits.len(),
            total_amount,
            applied,
        })
    }
}

async fn find_account_by_auth_id(
    conn: &mut PgConnection,
    auth_account_id: &str,
) -> Result<Option<PaymentAccount>, AppError> {
    sqlx::query_as::<_, PaymentAccount>(
        r#"
        SELECT id, auth_account_id, name, payment_method_code, eft_enable, created_on
        FROM payment_accounts
        WHERE auth_account_id = $1
        "#,
    )
    .bind(auth_account_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payment account: {}", e)))
}

async fn insert_short_name_history(
    conn: &mut PgConnection,
    short_name: &EftShortName,
    operation: HistoryOperation,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO eft_short_names_history (short_name_id, short_name, auth_account_id, operation_type)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(short_name.id)
    .bind(&short_name.short_name)
    .bind(&short_name.auth_account_id)
    .bind(operation.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        AppError::DatabaseError(anyhow::anyhow!("Failed to write short name history: {}", e))
    })?;
    Ok(())
}

/// Oldest short name with this exact text, or a new unmapped one.
async fn find_or_create_short_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<EftShortName, AppError> {
    let existing = sqlx::query_as::<_, EftShortName>(
        r#"
        SELECT id, short_name, auth_account_id, created_on
        FROM eft_short_names
        WHERE short_name = $1
        ORDER BY id
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find short name: {}", e)))?;

    if let Some(short_name) = existing {
        return Ok(short_name);
    }

    let created = sqlx::query_as::<_, EftShortName>(
        r#"
        INSERT INTO eft_short_names (short_name)
        VALUES ($1)
        RETURNING id, short_name, auth_account_id, created_on
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create short name: {}", e)))?;

    insert_short_name_history(conn, &created, HistoryOperation::Insert).await?;

    Ok(created)
}

/// Link the short name's credits to the account and spend them on its unpaid
/// invoices. Credits and invoices are row-locked for the rest of the caller's
/// transaction.
async fn apply_short_name_credits(
    conn: &mut PgConnection,
    short_name_id: i64,
    account: &PaymentAccount,
    invoice_prefix: &str,
) -> Result<CreditApplicationSummary, AppError> {
    sqlx::query(
        r#"
        UPDATE eft_credits
        SET payment_account_id = $2
        WHERE short_name_id = $1 AND payment_account_id IS DISTINCT FROM $2
        "#,
    )
    .bind(short_name_id)
    .bind(account.id)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to link credits: {}", e)))?;

    let credits: Vec<CreditBalance> = sqlx::query_as::<_, (i64, Decimal)>(
        r#"
        SELECT id, remaining_amount
        FROM eft_credits
        WHERE short_name_id = $1 AND remaining_amount > 0
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(short_name_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load credits: {}", e)))?
    .into_iter()
    .map(|(credit_id, remaining)| CreditBalance {
        credit_id,
        remaining,
    })
    .collect();

    if credits.is_empty() {
        return Ok(CreditApplicationSummary::default());
    }

    let invoices: Vec<OutstandingInvoice> = sqlx::query_as::<_, (i64, Decimal, Decimal)>(
        r#"
        SELECT id, total, paid
        FROM invoices
        WHERE payment_account_id = $1
          AND invoice_status_code IN ($2, $3)
          AND paid < total
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(account.id)
    .bind(InvoiceStatus::Created.as_str())
    .bind(InvoiceStatus::Partial.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load invoices: {}", e)))?
    .into_iter()
    .map(|(invoice_id, total, paid)| OutstandingInvoice {
        invoice_id,
        total,
        paid,
    })
    .collect();

    let plan = plan_credit_application(&credits, &invoices);
    if plan.is_empty() {
        return Ok(CreditApplicationSummary::default());
    }

    let eft = EftService;
    let now = Utc::now();
    let mut payment_ids = Vec::with_capacity(plan.invoices.len());

    for application in &plan.invoices {
        let status = application.status();

        sqlx::query(
            r#"
            UPDATE invoices
            SET paid = $2,
                invoice_status_code = $3,
                payment_date = COALESCE(payment_date, $4),
                updated_on = $4
            WHERE id = $1
            "#,
        )
        .bind(application.invoice_id)
        .bind(application.paid)
        .bind(status.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        let existing_reference = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT id, invoice_number
            FROM invoice_references
            WHERE invoice_id = $1 AND status_code <> $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(application.invoice_id)
        .bind(InvoiceReferenceStatus::Cancelled.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice reference: {}", e))
        })?;

        let invoice_number = match existing_reference {
            Some((reference_id, invoice_number)) => {
                sqlx::query("UPDATE invoice_references SET status_code = $2 WHERE id = $1")
                    .bind(reference_id)
                    .bind(application.reference_status().as_str())
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!(
                            "Failed to update invoice reference: {}",
                            e
                        ))
                    })?;
                invoice_number
            }
            None => {
                let invoice_number = format!("{}{}", invoice_prefix, application.invoice_id);
                sqlx::query(
                    r#"
                    INSERT INTO invoice_references (invoice_id, invoice_number, status_code)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(application.invoice_id)
                .bind(&invoice_number)
                .bind(application.reference_status().as_str())
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to create invoice reference: {}",
                        e
                    ))
                })?;
                invoice_number
            }
        };

        let payment_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO payments (
                payment_account_id, invoice_id, invoice_number, invoice_amount, paid_amount,
                payment_status_code, payment_method_code, payment_system_code, payment_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(account.id)
        .bind(application.invoice_id)
        .bind(&invoice_number)
        .bind(application.total)
        .bind(application.applied)
        .bind(PaymentStatus::Completed.as_str())
        .bind(eft.payment_method_code().as_str())
        .bind(eft.payment_system_code().as_str())
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;
        payment_ids.push(payment_id);

        sqlx::query(
            r#"
            INSERT INTO receipts (invoice_id, receipt_number, receipt_amount, receipt_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(application.invoice_id)
        .bind(application.invoice_id.to_string())
        .bind(application.applied)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create receipt: {}", e)))?;

        record_invoice(status.as_str());
        record_receipt(eft.payment_method_code().as_str());
    }

    for draw in &plan.draws {
        sqlx::query(
            r#"
            INSERT INTO eft_credit_invoice_links (eft_credit_id, invoice_id, amount)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(draw.credit_id)
        .bind(draw.invoice_id)
        .bind(draw.amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to link credit to invoice: {}", e))
        })?;
    }

    for credit in &plan.credits {
        sqlx::query("UPDATE eft_credits SET remaining_amount = $2 WHERE id = $1")
            .bind(credit.credit_id)
            .bind(credit.remaining)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to consume credit: {}", e))
            })?;
    }

    let total_applied = plan.total_applied();
    record_credit_applied(total_applied.to_f64().unwrap_or_default());

    info!(
        short_name_id = short_name_id,
        payment_account_id = account.id,
        invoices = plan.invoices.len(),
        amount_applied = %total_applied,
        "EFT credits applied"
    );

    Ok(CreditApplicationSummary {
        invoices: plan.invoices,
        payment_ids,
    })
}
