//! Prometheus exposition of the billing metrics.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Registers help text for the metrics the billing workflow emits.
pub fn describe() {
    describe_counter!("bills_created_total", "Bills persisted by the create-bill workflow");
    describe_counter!(
        "bill_workflow_aborted_total",
        "Create-bill workflows aborted, labelled by reason"
    );
    describe_counter!(
        "bill_uncompensated_stock_adjustments_total",
        "Stock decrements left in place by aborted workflows"
    );
    describe_counter!(
        "remote_calls_total",
        "Calls to collaborator services, labelled by service and outcome"
    );
    describe_histogram!(
        "bill_create_duration_seconds",
        Unit::Seconds,
        "Wall time of successful create-bill workflows"
    );
}

/// GET /metrics
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], handle.render())
}
