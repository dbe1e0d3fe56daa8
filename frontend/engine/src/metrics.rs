use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // Session lifecycle
    pub static ref SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kiosk_sessions_total",
        "Total number of game sessions",
        &["status"]
    )
    .unwrap();

    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "kiosk_sessions_active",
        "Number of currently active game sessions"
    )
    .unwrap();

    // Gameplay
    pub static ref ROUNDS_RESOLVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kiosk_rounds_resolved_total",
        "Total number of rounds resolved",
        &["result"]
    )
    .unwrap();

    // Collaborators
    pub static ref SCORE_SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kiosk_score_submissions_total",
        "Total number of score submissions",
        &["status"]
    )
    .unwrap();

    pub static ref CHECKPOINT_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kiosk_checkpoint_operations_total",
        "Total number of checkpoint store operations",
        &["operation", "status"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}
