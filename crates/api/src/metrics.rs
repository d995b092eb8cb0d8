//! Prometheus metrics

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use perception::FrameAnalysis;

pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "navassist_frames_processed_total";
    pub const DETECTIONS_TOTAL: &str = "navassist_detections_total";
    pub const CRITICAL_ALERTS_TOTAL: &str = "navassist_critical_alerts_total";
    pub const FRAME_LATENCY_SECONDS: &str = "navassist_frame_latency_seconds";
    pub const QUERIES_TOTAL: &str = "navassist_queries_total";
    pub const ANNOUNCEMENTS_TOTAL: &str = "navassist_announcements_total";
}

/// Install the global recorder; call once, from the binary
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub fn record_frame(analysis: &FrameAnalysis) {
    let scene = &analysis.scene;
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    counter!(names::DETECTIONS_TOTAL).increment(scene.num_objects as u64);
    counter!(names::CRITICAL_ALERTS_TOTAL).increment(scene.critical_alerts.len() as u64);
    histogram!(names::FRAME_LATENCY_SECONDS).record(analysis.latency_ms / 1000.0);
}

/// Count a query by the backend that answered it
pub fn record_query(backend: &'static str) {
    counter!(names::QUERIES_TOTAL, "backend" => backend).increment(1);
}

pub fn record_announcement() {
    counter!(names::ANNOUNCEMENTS_TOTAL).increment(1);
}
