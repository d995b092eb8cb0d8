//! Text-to-speech output

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::SpeechError;

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub enabled: bool,
    /// Synthesis command, invoked as `<command> -s <rate> -a <amplitude> <text>`
    pub command: String,
    /// Words per minute
    pub rate: u32,
    /// 0.0 - 1.0
    pub volume: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "espeak".to_string(),
            rate: 150,
            volume: 0.9,
        }
    }
}

/// Spoken output backend
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak on a background task and return immediately
    fn speak(&self, text: &str);

    /// Speak and wait until synthesis finishes
    async fn speak_blocking(&self, text: &str) -> Result<(), SpeechError>;

    fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Offline synthesis through a system command such as `espeak`
pub struct CommandTts {
    config: TtsConfig,
    available: bool,
}

impl CommandTts {
    pub fn new(config: TtsConfig) -> Self {
        // Resolves PATH lookups and explicit paths, requiring an executable
        let available = which::which(&config.command).is_ok();
        if available {
            info!("TTS engine initialized ({}, {} wpm)", config.command, config.rate);
        } else {
            warn!("TTS command '{}' not found; spoken output disabled", config.command);
        }
        Self { config, available }
    }

    fn command(&self, text: &str) -> Command {
        // espeak amplitude runs 0-200
        let amplitude = (self.config.volume.clamp(0.0, 1.0) * 200.0).round() as u32;
        let mut cmd = Command::new(&self.config.command);
        cmd.arg("-s")
            .arg(self.config.rate.to_string())
            .arg("-a")
            .arg(amplitude.to_string())
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

async fn run(mut cmd: Command) -> Result<(), SpeechError> {
    let output = cmd.output().await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(SpeechError::Synthesis(format!(
            "exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

#[async_trait]
impl SpeechOutput for CommandTts {
    fn speak(&self, text: &str) {
        if text.is_empty() || !self.available {
            return;
        }
        debug!("Speaking: {}", text);

        let cmd = self.command(text);
        tokio::spawn(async move {
            if let Err(e) = run(cmd).await {
                error!("Error in background TTS: {}", e);
            }
        });
    }

    async fn speak_blocking(&self, text: &str) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Unavailable(self.config.command.clone()));
        }
        if text.is_empty() {
            return Ok(());
        }
        debug!("Speaking (blocking): {}", text);
        run(self.command(text)).await
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Drops everything; used when TTS is disabled or missing
#[derive(Debug, Default)]
pub struct SilentTts;

#[async_trait]
impl SpeechOutput for SilentTts {
    fn speak(&self, text: &str) {
        debug!("TTS disabled, not speaking: {}", text);
    }

    async fn speak_blocking(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable("tts disabled".to_string()))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// Pick the output backend once at startup
pub fn build_tts(config: &TtsConfig) -> Arc<dyn SpeechOutput> {
    if !config.enabled {
        info!("TTS disabled by configuration");
        return Arc::new(SilentTts);
    }
    let tts = CommandTts::new(config.clone());
    if tts.is_available() {
        Arc::new(tts)
    } else {
        Arc::new(SilentTts)
    }
}
