use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static LIFECYCLE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "household_lifecycle_transitions_total",
        "Service request transitions applied, by transition",
        &["transition"]
    )
    .expect("register lifecycle_transitions_total")
});

pub static JOB_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "household_job_runs_total",
        "Background job runs, by job and outcome",
        &["job", "outcome"]
    )
    .expect("register job_runs_total")
});

pub static HTTP_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "household_http_errors_total",
        "Error responses returned by the API, by status code",
        &["status"]
    )
    .expect("register http_errors_total")
});

pub fn record_transition(transition: &str) {
    LIFECYCLE_TRANSITIONS.with_label_values(&[transition]).inc();
}

pub fn record_job_run(job: &str, ok: bool) {
    JOB_RUNS.with_label_values(&[job, if ok { "success" } else { "failure" }]).inc();
}

pub fn record_http_error(status: u16) {
    HTTP_ERRORS.with_label_values(&[&status.to_string()]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
