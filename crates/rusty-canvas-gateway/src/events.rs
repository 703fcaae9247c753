//! Export events.
//!
//! Every successful export is reported to an [`ExportObserver`]. Nothing in
//! the gateway depends on what an observer does with the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use rusty_canvas_core::types::CanvasMetadata;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEvent {
    pub canvas_id: String,
    pub timestamp: DateTime<Utc>,
    pub format: &'static str,
    pub metadata: CanvasMetadata,
}

impl ExportEvent {
    pub fn html(canvas_id: &str, metadata: CanvasMetadata) -> Self {
        Self {
            canvas_id: canvas_id.to_string(),
            timestamp: Utc::now(),
            format: "html",
            metadata,
        }
    }

    /// Milliseconds between canvas creation and the export.
    pub fn time_since_creation_ms(&self) -> i64 {
        self.metadata.age_millis(self.timestamp)
    }
}

/// Receives export events.
pub trait ExportObserver: Send + Sync {
    fn on_export(&self, event: &ExportEvent);
}

/// Default observer: one structured log line per export.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExportObserver;

impl ExportObserver for LogExportObserver {
    fn on_export(&self, event: &ExportEvent) {
        info!(
            canvas_id = %event.canvas_id,
            format = event.format,
            timestamp = %event.timestamp,
            element_count = event.metadata.element_count,
            time_since_creation_ms = event.time_since_creation_ms(),
            "Canvas exported"
        );
    }
}
