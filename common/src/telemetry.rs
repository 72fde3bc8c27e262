// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence over `log_level` when set. JSON output carries
/// the current span so per-run fields (job, run id) reach every entry.
pub fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer().with_target(false).with_filter(env_filter).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::debug!(log_level = log_level, json = json, "Structured logging initialized");
    Ok(())
}

/// Initialize the Prometheus metrics exporter and describe every metric
#[tracing::instrument]
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!("reminders_sent_total", "Reminder offsets fired");
    describe_counter!(
        "documents_provisioned_total",
        "Content documents copied from the template"
    );
    describe_counter!(
        "notification_failures_total",
        "Failed reminder deliveries by channel"
    );
    describe_counter!(
        "calendar_events_created_total",
        "Calendar events created from sheet rows"
    );
    describe_counter!("job_runs_total", "Job runs by job and outcome");
    describe_histogram!("job_duration_seconds", "Duration of job runs in seconds");

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );
    Ok(())
}

/// Record one finished job run
#[inline]
pub fn record_job_run(job: &'static str, outcome: &'static str, duration: Duration) {
    counter!("job_runs_total", "job" => job, "outcome" => outcome).increment(1);
    histogram!("job_duration_seconds", "job" => job).record(duration.as_secs_f64());
}
