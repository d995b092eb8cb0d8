//! Navigation Assistant API Server
//!
//! HTTP front end for the vision navigation assistant: frame upload,
//! scene retrieval, spoken and typed queries, calibration and history.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use agent::{AgentFactory, NavigationAgent};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use camera_capture::VideoFrame;
use feedback::AlertAnnouncer;
use metrics_exporter_prometheus::PrometheusHandle;
use perception::{FrameAnalysis, PerceptionModule, PerceptionStats, RawDetection};
use serde::Serialize;
use speech::{build_recognizer, build_tts, SpeechInput, SpeechOutput};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

pub mod error;
pub mod metrics;
pub mod rate_limit;
mod routes;
pub mod settings;

pub use error::{ApiError, ApiResult};
pub use rate_limit::RateLimitConfig;
pub use settings::{AppSettings, FeatureStatus};

/// Uploaded frames are full camera images
const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

/// Most recently processed frame and its analysis
pub struct LatestFrame {
    pub frame: Arc<VideoFrame>,
    pub analysis: FrameAnalysis,
}

/// Application state shared across handlers
pub struct AppState {
    /// Detector plus calibration state
    pub perception: PerceptionModule,
    /// Published after each processed frame
    pub latest: Option<LatestFrame>,
    /// Held across the (slow) agent call without blocking frame uploads
    pub agent: Arc<Mutex<Box<dyn NavigationAgent>>>,
    pub tts: Arc<dyn SpeechOutput>,
    pub stt: Arc<dyn SpeechInput>,
    pub announcer: AlertAnnouncer,
    pub settings: AppSettings,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    next_sequence: u32,
}

pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    /// Create state from already constructed backends
    pub fn new(
        settings: AppSettings,
        perception: PerceptionModule,
        agent: Box<dyn NavigationAgent>,
        tts: Arc<dyn SpeechOutput>,
        stt: Arc<dyn SpeechInput>,
    ) -> Self {
        Self {
            perception,
            latest: None,
            agent: Arc::new(Mutex::new(agent)),
            tts,
            stt,
            announcer: AlertAnnouncer::new(settings.announcer_config()),
            settings,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            next_sequence: 0,
        }
    }

    /// Build every backend the settings select
    pub fn from_settings(settings: AppSettings) -> Self {
        let perception = PerceptionModule::from_config(settings.perception_config());
        let agent = AgentFactory::create_agent(&settings.agent_config());
        let tts = build_tts(&settings.tts_config());
        let stt = build_recognizer(&settings.stt_config());
        Self::new(settings, perception, agent, tts, stt)
    }

    /// Estimate and aggregate detections for a frame, then publish it as the
    /// latest one.
    ///
    /// Speaks the announcer's alert, if any.
    fn publish(&mut self, mut frame: VideoFrame, raw: Vec<RawDetection>, started: Instant) -> &FrameAnalysis {
        frame.sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let analysis = self.perception.analyze(&frame, raw, started);
        metrics::record_frame(&analysis);

        if let Some(message) = self.announcer.check(&analysis.scene) {
            info!("Announcing: {}", message);
            self.tts.speak(&message);
            metrics::record_announcement();
        }

        let latest = self.latest.insert(LatestFrame {
            frame: Arc::new(frame),
            analysis,
        });
        &latest.analysis
    }
}

/// Run perception on a frame and publish it as the latest one.
///
/// Inference runs on a blocking thread; the state lock is only taken to read
/// the detector and to publish the result.
pub async fn ingest_frame(state: &SharedState, frame: VideoFrame) -> ApiResult<FrameAnalysis> {
    let started = Instant::now();
    let detector = state.read().await.perception.detector();

    let (frame, raw) = tokio::task::spawn_blocking(move || {
        perception::detect(detector.as_ref(), &frame).map(|raw| (frame, raw))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("detection task failed: {}", e)))??;

    let mut state = state.write().await;
    Ok(state.publish(frame, raw, started).clone())
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub stats: PerceptionStats,
    pub features: FeatureStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub detector: &'static str,
    pub model_loaded: bool,
    pub vlm: bool,
    pub agent_type: &'static str,
    pub available_agents: Vec<&'static str>,
    pub tts: &'static str,
    pub tts_available: bool,
    pub stt: &'static str,
    pub stt_available: bool,
    pub has_frame: bool,
}

/// Create the application router
pub fn create_router(
    state: SharedState,
    rate_limit: &RateLimitConfig,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let mut limited = Router::new()
        .route("/api/v1/query", post(routes::query::post_query))
        .route("/api/v1/voice", post(routes::voice::post_voice));
    match rate_limit::governor_layer(rate_limit) {
        Some(layer) => limited = limited.layer(layer),
        None => warn!("Rate limiting disabled for query routes"),
    }

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/frames", post(routes::frames::post_frame))
        .route("/api/v1/scene", get(routes::scene::get_scene))
        .route("/api/v1/scene/overlay", get(routes::scene::get_overlay))
        .route("/api/v1/calibrate", post(routes::calibrate::post_calibrate))
        .route(
            "/api/v1/history",
            get(routes::history::get_history).delete(routes::history::clear_history),
        )
        .route("/api/v1/navigation/location", get(routes::navigation::get_location))
        .route("/api/v1/navigation/route", post(routes::navigation::post_route))
        .route("/api/v1/navigation/memory", get(routes::navigation::get_memory))
        .merge(limited)
        .with_state(state)
        .merge(metrics_routes)
        .layer(DefaultBodyLimit::max(MAX_FRAME_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let (agent, mut response) = {
        let state = state.read().await;
        let response = HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            version: state.version.clone(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            components: ComponentStatus {
                detector: state.perception.detector_name(),
                model_loaded: state.perception.model_loaded(),
                vlm: false,
                agent_type: "",
                available_agents: AgentFactory::available_agents(&state.settings.agent_config()),
                tts: state.tts.name(),
                tts_available: state.tts.is_available(),
                stt: state.stt.name(),
                stt_available: state.stt.is_available(),
                has_frame: state.latest.is_some(),
            },
            stats: state.perception.stats(),
            features: state.settings.feature_status(),
        };
        (state.agent.clone(), response)
    };

    let agent = agent.lock().await;
    response.components.vlm = agent.vlm_available();
    response.components.agent_type = agent.agent_type();

    Json(response)
}

/// Initialize logging
pub fn init_logging(level: &str, json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level: tracing::Level = level.parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}', using info", level);
        tracing::Level::INFO
    });

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Run the server
pub async fn run_server(
    state: SharedState,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (addr, rate_limit) = {
        let state = state.read().await;
        let settings = &state.settings;
        (
            settings.bind_addr.clone(),
            RateLimitConfig {
                per_second: settings.rate_limit_per_second,
                burst_size: settings.rate_limit_burst,
            },
        )
    };
    let app = create_router(state, &rate_limit, metrics_handle);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
