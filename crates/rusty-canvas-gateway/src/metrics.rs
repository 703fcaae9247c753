//! Prometheus metrics recording and endpoint.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics recorder and return the handle for rendering.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))
}

/// Record a newly created canvas.
pub fn record_canvas_created() {
    metrics::gauge!("canvases_active").increment(1.0);
}

/// Record a deleted canvas.
pub fn record_canvas_deleted() {
    metrics::gauge!("canvases_active").decrement(1.0);
}

/// Record a drawn element of the given kind.
pub fn record_element(kind: &'static str) {
    metrics::counter!("canvas_elements_total", "kind" => kind).increment(1);
}

/// Record an export in the given format.
pub fn record_export(format: &'static str) {
    metrics::counter!("canvas_exports_total", "format" => format).increment(1);
}

/// Record an error of a given kind.
pub fn record_error(kind: &'static str) {
    metrics::counter!("errors_total", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_prometheus_recorder() {
        // Can only install once per process
        let handle = install_prometheus_recorder().unwrap();
        record_element("rectangle");
        let output = handle.render();
        assert!(output.contains("canvas_elements_total"));
    }

    #[test]
    fn test_recording_without_recorder_does_not_panic() {
        // metrics falls back to a no-op recorder
        record_canvas_created();
        record_canvas_deleted();
        record_export("html");
        record_error("not_found");
    }
}
