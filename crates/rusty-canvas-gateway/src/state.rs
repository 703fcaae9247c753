//! Gateway shared state.

use std::sync::Arc;

use axum::http::HeaderValue;

use rusty_canvas_core::config::Config;

use crate::events::{ExportObserver, LogExportObserver};
use crate::registry::CanvasRegistry;

/// Shared gateway state accessible from all handlers.
pub struct GatewayState {
    pub config: Arc<Config>,
    pub canvases: CanvasRegistry,
    pub exports: Arc<dyn ExportObserver>,
    cors_origin: Option<HeaderValue>,
}

impl GatewayState {
    /// Build state from config, loading fonts as configured.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let canvases = CanvasRegistry::from_config(&config);
        Self::with_registry(config, canvases)
    }

    /// Build state around an existing registry.
    pub fn with_registry(config: Config, canvases: CanvasRegistry) -> anyhow::Result<Self> {
        let cors_origin = config
            .cors_origin()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {origin:?}: {e}"))
            })
            .transpose()?;

        Ok(Self {
            config: Arc::new(config),
            canvases,
            exports: Arc::new(LogExportObserver),
            cors_origin,
        })
    }

    /// Replace the export observer.
    pub fn with_export_observer(mut self, observer: Arc<dyn ExportObserver>) -> Self {
        self.exports = observer;
        self
    }

    /// The single allowed CORS origin; `None` allows any origin.
    pub fn cors_origin(&self) -> Option<&HeaderValue> {
        self.cors_origin.as_ref()
    }
}
