//! Metrics collection for identity-service.
//!
//! Counters go through the `metrics` facade; the Prometheus exporter renders
//! them, together with the HTTP metrics from `service-core`, on `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once; only the
/// first call installs.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    let _ = METRICS_HANDLE.set(handle);

    metrics::describe_counter!("identity_registrations_total", "Accounts registered, by kind");
    metrics::describe_counter!("identity_logins_total", "Login attempts, by outcome");
    metrics::describe_counter!("identity_tokens_issued_total", "Ephemeral tokens issued, by purpose");
    metrics::describe_counter!(
        "identity_tokens_redeemed_total",
        "Ephemeral token redemptions, by purpose and outcome"
    );
    metrics::describe_counter!(
        "identity_notifications_total",
        "Notification deliveries, by kind and outcome"
    );

    Ok(())
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_registration(kind: &'static str) {
    metrics::counter!("identity_registrations_total", "kind" => kind).increment(1);
}

pub fn record_login(outcome: &'static str) {
    metrics::counter!("identity_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_token_issued(purpose: &'static str) {
    metrics::counter!("identity_tokens_issued_total", "purpose" => purpose).increment(1);
}

pub fn record_token_redeemed(purpose: &'static str, outcome: &'static str) {
    metrics::counter!("identity_tokens_redeemed_total", "purpose" => purpose, "outcome" => outcome)
        .increment(1);
}

pub fn record_notification(kind: &'static str, outcome: &'static str) {
    metrics::counter!("identity_notifications_total", "kind" => kind, "outcome" => outcome).increment(1);
}
