//! Diagnostic sink for failed backend calls.

use std::panic::{catch_unwind, AssertUnwindSafe};

/// What the monitor learns about one failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub endpoint: String,
    pub method: String,
    pub status: i64,
    pub message: String,
    pub had_token: bool,
}

/// Receives every failure the request client produces.
///
/// Implementations must return quickly; they run inline on the request path.
pub trait ErrorMonitor: Send + Sync {
    fn capture(&self, report: &ErrorReport);
}

/// Default monitor: one structured `tracing` event per failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl ErrorMonitor for TracingMonitor {
    fn capture(&self, report: &ErrorReport) {
        tracing::warn!(
            endpoint = %report.endpoint,
            method = %report.method,
            status = report.status,
            had_token = report.had_token,
            "API request failed: {}",
            report.message
        );
    }
}

/// Forward a report, swallowing a panicking monitor.
pub(crate) fn dispatch(monitor: &dyn ErrorMonitor, report: &ErrorReport) {
    if catch_unwind(AssertUnwindSafe(|| monitor.capture(report))).is_err() {
        tracing::error!("Error monitor panicked while reporting {}", report.endpoint);
    }
}
