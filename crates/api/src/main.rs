//! Vision Navigation Assistant - Main Entry Point

use std::sync::Arc;

use api::{ingest_frame, init_logging, metrics, run_server, AppSettings, AppState};
use camera_capture::{CameraConfig, FrameSource, StillImageSource};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = AppSettings::load()?;
    init_logging(&settings.log_level, settings.log_json)?;

    info!("=== Vision Navigation Assistant v{} ===", env!("CARGO_PKG_VERSION"));
    let features = settings.feature_status();
    info!(
        "Features: gemini={} remote_agent={} speech_input={} mock_mode={}",
        features.use_gemini, features.use_remote_agent, features.speech_input, features.mock_mode
    );

    let metrics_handle = match metrics::install_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics enabled at /metrics");
            Some(handle)
        }
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    let demo_image = settings.demo_image.clone();
    let state = AppState::from_settings(settings);

    if state.tts.is_available() {
        if let Err(e) = state.tts.speak_blocking("Navigation assistant ready.").await {
            warn!("Startup announcement failed: {}", e);
        }
    }

    let state = Arc::new(RwLock::new(state));

    if let Some(path) = demo_image {
        let mut source = StillImageSource::open(&path, &CameraConfig::default())?;
        let analysis = ingest_frame(&state, source.next_frame()?).await?;
        info!(
            "Demo image {}: {} objects, {}",
            path, analysis.scene.num_objects, analysis.scene.safety_status
        );
    }

    run_server(state, metrics_handle).await
}
