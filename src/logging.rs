//! # Structured Logging Module
//!
//! One-time `tracing` subscriber setup plus structured helpers for the events
//! operators search for: batch boundaries and sub-request outcomes.

use crate::config::{LogFormat, LoggingConfig};
use crate::models::{ExecutionMode, RequestId};
use chrono::Utc;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. `RUST_LOG`, when set, overrides
/// `config.level`. Later calls are no-ops.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

        let result = match config.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json(),
                )
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true),
                )
                .try_init(),
        };

        // A global subscriber may already be installed by the host application
        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            "Structured logging initialized"
        );
    });
}

/// Log the start of a batch run
pub fn log_batch_started(batch_id: Uuid, mode: ExecutionMode, size: usize) {
    tracing::info!(
        batch_id = %batch_id,
        mode = %mode,
        size = size,
        timestamp = %Utc::now().to_rfc3339(),
        "BATCH_STARTED"
    );
}

/// Log how a batch run ended
pub fn log_batch_finished(
    batch_id: Uuid,
    mode: ExecutionMode,
    outcome: &str,
    responses: usize,
    elapsed: Duration,
) {
    tracing::info!(
        batch_id = %batch_id,
        mode = %mode,
        outcome = %outcome,
        responses = responses,
        duration_ms = duration_millis(elapsed),
        timestamp = %Utc::now().to_rfc3339(),
        "BATCH_FINISHED"
    );
}

/// Whole milliseconds, saturating at `u64::MAX`
fn duration_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Log the recorded outcome of one sub-request
pub fn log_sub_request_outcome(
    request_id: RequestId,
    method: &str,
    relative_url: &str,
    status_code: u16,
    error_type: Option<&str>,
    details: Option<&str>,
) {
    if (200..300).contains(&status_code) {
        tracing::info!(
            request_id = request_id,
            method = %method,
            relative_url = %relative_url,
            status_code = status_code,
            timestamp = %Utc::now().to_rfc3339(),
            "SUB_REQUEST_OUTCOME"
        );
    } else {
        tracing::warn!(
            request_id = request_id,
            method = %method,
            relative_url = %relative_url,
            status_code = status_code,
            error_type = error_type,
            details = details,
            timestamp = %Utc::now().to_rfc3339(),
            "SUB_REQUEST_OUTCOME"
        );
    }
}
