//! Shared helpers for the integration suites: JSON transaction fixtures and
//! a telemetry sink that records what the engines emit.

use std::sync::Mutex;

use range_fetcher::{FetchError, TelemetryFields, TelemetrySink};
use serde_json::{Value, json};

/// Builds a transaction record the way block explorers return them: a
/// string-keyed map with stringified numbers.
pub fn tx(hash: &str, block: u64, index: u64) -> Value {
    json!({
        "hash": hash,
        "blockNumber": block.to_string(),
        "transactionIndex": index.to_string(),
    })
}

/// Key function for [`tx`] records.
pub fn tx_key(tx: &Value) -> Option<String> {
    tx.get("hash").and_then(|h| h.as_str()).map(String::from)
}

/// Order function for [`tx`] records.
pub fn tx_order(tx: &Value) -> Option<(u64, u64)> {
    let block = tx.get("blockNumber")?.as_str()?.parse().ok()?;
    let index = tx.get("transactionIndex")?.as_str()?.parse().ok()?;
    Some((block, index))
}

/// Telemetry sink collecting event and error names for assertions.
#[derive(Default)]
pub struct CollectingTelemetry {
    events: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl CollectingTelemetry {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl TelemetrySink for CollectingTelemetry {
    fn record_event(&self, name: &str, _fields: TelemetryFields<'_>) {
        self.events.lock().unwrap().push(name.to_string());
    }

    fn record_error(&self, name: &str, _error: &FetchError, _fields: TelemetryFields<'_>) {
        self.errors.lock().unwrap().push(name.to_string());
    }
}
