//! Prometheus metrics for pay-service.
//!
//! Domain and database metrics live in the default `prometheus` registry. HTTP
//! request metrics are emitted through the `metrics` facade by the shared
//! middleware and rendered by the installed Prometheus recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

/// Handle to the recorder behind the `metrics` facade.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pay_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Invoice counter by status written.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pay_invoices_total",
        "Invoice writes by resulting status",
        &["status"]
    )
    .expect("Failed to register invoices_total")
});

/// Receipt counter.
pub static RECEIPTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pay_receipts_total",
        "Total number of receipts by payment method",
        &["payment_method"]
    )
    .expect("Failed to register receipts_total")
});

/// Short-name mapping attempts by outcome.
pub static SHORT_NAME_MAPPINGS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pay_eft_short_name_mappings_total",
        "EFT short-name mapping attempts by outcome",
        &["outcome"]
    )
    .expect("Failed to register short_name_mappings_total")
});

/// EFT credit applied to invoices, in currency units.
pub static EFT_CREDIT_APPLIED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "pay_eft_credit_applied_amount_total",
        "EFT credit amount applied to invoices"
    )
    .expect("Failed to register eft_credit_applied")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pay_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
        }
    }

    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&RECEIPTS_TOTAL);
    Lazy::force(&SHORT_NAME_MAPPINGS_TOTAL);
    Lazy::force(&EFT_CREDIT_APPLIED);
    Lazy::force(&ERRORS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut text = encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default();

    if let Some(handle) = METRICS_HANDLE.get() {
        text.push_str(&handle.render());
    }

    text
}

pub fn record_invoice(status: &str) {
    INVOICES_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_receipt(payment_method: &str) {
    RECEIPTS_TOTAL.with_label_values(&[payment_method]).inc();
}

pub fn record_short_name_mapping(outcome: &str) {
    SHORT_NAME_MAPPINGS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_credit_applied(amount: f64) {
    if amount > 0.0 {
        EFT_CREDIT_APPLIED.inc_by(amount);
    }
}

pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_metrics_appear_in_export() {
        init_metrics();
        record_short_name_mapping("mapped");
        record_credit_applied(12.5);

        let text = get_metrics();
        assert!(text.contains("pay_eft_short_name_mappings_total"));
        assert!(text.contains("pay_eft_credit_applied_amount_total"));
    }
}
