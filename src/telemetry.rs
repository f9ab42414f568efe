//! Telemetry port.
//!
//! Both engines report lifecycle events (run started, range split, retry
//! budget exhausted, ...) through a caller-injected [`TelemetrySink`].
//! Recording is fire-and-forget: sinks must not block and must never fail the
//! fetch. Not injecting a sink is a valid no-op configuration.

use std::sync::Arc;

use crate::error::FetchError;

/// Property bag attached to every telemetry record.
pub type TelemetryFields<'a> = &'a [(&'a str, String)];

/// Receives named events and errors from the fetch engines.
///
/// Implementations are caller-owned and may be shared across many concurrent
/// fetch calls, so they must be safe for concurrent use.
pub trait TelemetrySink: Send + Sync {
    /// Records a named event with its properties.
    fn record_event(&self, name: &str, fields: TelemetryFields<'_>);

    /// Records a named error with its properties.
    fn record_error(&self, name: &str, error: &FetchError, fields: TelemetryFields<'_>);
}

/// [`TelemetrySink`] that forwards every record to `tracing`.
///
/// Useful as a default when no external telemetry pipeline exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record_event(&self, name: &str, fields: TelemetryFields<'_>) {
        info!(event = name, fields = ?fields, "Telemetry event");
    }

    fn record_error(&self, name: &str, error: &FetchError, fields: TelemetryFields<'_>) {
        error!(event = name, error = %error, fields = ?fields, "Telemetry error");
    }
}

/// Optional sink handle used internally by the engines.
///
/// Wrapping the `Option` keeps the "absence is a no-op" rule in one place.
#[derive(Clone, Default)]
pub(crate) struct Telemetry(Option<Arc<dyn TelemetrySink>>);

impl Telemetry {
    pub(crate) fn new(sink: Option<Arc<dyn TelemetrySink>>) -> Self {
        Self(sink)
    }

    pub(crate) fn event(&self, name: &str, fields: TelemetryFields<'_>) {
        if let Some(sink) = &self.0 {
            sink.record_event(name, fields);
        }
    }

    pub(crate) fn error(&self, name: &str, error: &FetchError, fields: TelemetryFields<'_>) {
        if let Some(sink) = &self.0 {
            sink.record_error(name, error, fields);
        }
    }
}
