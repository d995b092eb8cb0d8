//! Application settings
//!
//! Layered as: built-in defaults, then `config/nav-assistant.toml` if it
//! exists, then `NAVASSIST_*` environment variables.

use std::path::Path;

use agent::AgentConfig;
use config::{Config, ConfigError, Environment, File, FileFormat};
use feedback::AnnouncerConfig;
use perception::{LensSpec, PerceptionConfig};
use serde::{Deserialize, Serialize};
use speech::{SttConfig, TtsConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/nav-assistant.toml";
const ENV_PREFIX: &str = "NAVASSIST";

/// All runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub bind_addr: String,
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,

    // Perception
    pub model_path: Option<String>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Explicit focal length in pixels, overrides the lens specs
    pub focal_length_px: Option<f64>,
    pub focal_length_mm: Option<f64>,
    pub sensor_height_mm: Option<f64>,
    pub calibration_factor: f64,
    /// Image processed once at startup
    pub demo_image: Option<String>,

    // Agent
    pub use_gemini: bool,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub use_remote_agent: bool,
    pub agent_endpoint: Option<String>,
    pub agent_api_key: Option<String>,
    pub mock_mode: bool,
    pub request_timeout_secs: u64,

    // Speech
    pub tts_enabled: bool,
    pub tts_command: String,
    pub tts_rate: u32,
    pub tts_volume: f32,
    pub stt_endpoint: Option<String>,
    pub stt_api_key: Option<String>,

    // Alerts
    pub announce_cooldown_secs: u64,

    // Rate limiting for query and voice routes
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        let perception = PerceptionConfig::default();
        let agent = AgentConfig::default();
        let tts = TtsConfig::default();
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            model_path: None,
            confidence_threshold: perception.confidence_threshold,
            iou_threshold: perception.iou_threshold,
            focal_length_px: None,
            focal_length_mm: None,
            sensor_height_mm: None,
            calibration_factor: perception.calibration_factor,
            demo_image: None,
            use_gemini: agent.use_gemini,
            gemini_api_key: agent.gemini_api_key,
            gemini_model: agent.gemini_model,
            use_remote_agent: agent.use_remote_agent,
            agent_endpoint: None,
            agent_api_key: None,
            mock_mode: agent.mock_mode,
            request_timeout_secs: agent.request_timeout_secs,
            tts_enabled: tts.enabled,
            tts_command: tts.command,
            tts_rate: tts.rate,
            tts_volume: tts.volume,
            stt_endpoint: None,
            stt_api_key: None,
            announce_cooldown_secs: AnnouncerConfig::default().cooldown_seconds,
            rate_limit_per_second: 2,
            rate_limit_burst: 5,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

impl AppSettings {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from a specific (optional) file and the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_layered(path, environment())
    }

    /// File first, then `env` on top
    fn load_layered(path: &Path, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn has_gemini_key(&self) -> bool {
        self.agent_config().has_gemini_key()
    }

    pub fn perception_config(&self) -> PerceptionConfig {
        let lens = match (self.focal_length_mm, self.sensor_height_mm) {
            (Some(focal_length_mm), Some(sensor_height_mm)) => Some(LensSpec {
                focal_length_mm,
                sensor_height_mm,
            }),
            _ => None,
        };
        PerceptionConfig {
            model_path: self.model_path.clone(),
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            lens,
            focal_length_px: self.focal_length_px,
            calibration_factor: self.calibration_factor,
            ..Default::default()
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            use_gemini: self.use_gemini,
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_model: self.gemini_model.clone(),
            use_remote_agent: self.use_remote_agent,
            agent_endpoint: self.agent_endpoint.clone(),
            agent_api_key: self.agent_api_key.clone(),
            mock_mode: self.mock_mode,
            request_timeout_secs: self.request_timeout_secs,
            ..Default::default()
        }
    }

    pub fn tts_config(&self) -> TtsConfig {
        TtsConfig {
            enabled: self.tts_enabled,
            command: self.tts_command.clone(),
            rate: self.tts_rate,
            volume: self.tts_volume,
        }
    }

    pub fn stt_config(&self) -> SttConfig {
        SttConfig {
            endpoint: self.stt_endpoint.clone(),
            api_key: self.stt_api_key.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn announcer_config(&self) -> AnnouncerConfig {
        AnnouncerConfig {
            cooldown_seconds: self.announce_cooldown_secs,
        }
    }

    /// Which optional features the settings turn on
    pub fn feature_status(&self) -> FeatureStatus {
        let agent = self.agent_config();
        FeatureStatus {
            gemini_api: agent.has_gemini_key(),
            remote_agent: agent.has_remote_agent(),
            use_gemini: agent.vlm_enabled(),
            use_remote_agent: agent.remote_enabled(),
            speech_input: self.stt_endpoint.as_deref().is_some_and(|e| !e.is_empty()),
            mock_mode: self.mock_mode,
        }
    }
}

/// Feature flags as resolved from settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub gemini_api: bool,
    pub remote_agent: bool,
    pub use_gemini: bool,
    pub use_remote_agent: bool,
    pub speech_input: bool,
    pub mock_mode: bool,
}
