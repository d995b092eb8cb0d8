//! Speech-to-text input

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::SpeechError;

/// Speech recognition configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SttConfig {
    /// Recognition endpoint accepting WAV bodies; `None` disables voice input
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Request timeout (seconds); 0 means the default of 10
    pub timeout_secs: u64,
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Spoken input backend
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Transcribe one WAV clip; `None` when nothing was recognized
    async fn transcribe(&self, audio_wav: &[u8]) -> Option<String>;

    fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    #[serde(default)]
    transcript: Option<String>,
}

/// Posts audio to an HTTP recognition service
pub struct HttpRecognizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpRecognizer {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, SpeechError> {
        let client = Client::builder().timeout(timeout).build()?;
        info!("Speech recognition via {}", endpoint);
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    async fn recognize(&self, audio_wav: &[u8]) -> Result<String, SpeechError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(audio_wav.to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::Recognition(format!(
                "service returned {}: {}",
                status, error_text
            )));
        }

        let body: RecognitionResponse = response.json().await?;
        body.transcript
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SpeechError::Recognition("could not understand audio".to_string()))
    }
}

#[async_trait]
impl SpeechInput for HttpRecognizer {
    async fn transcribe(&self, audio_wav: &[u8]) -> Option<String> {
        if audio_wav.is_empty() {
            debug!("Empty audio clip");
            return None;
        }

        match self.recognize(audio_wav).await {
            Ok(text) => {
                info!("Recognized text: '{}'", text);
                Some(text)
            }
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                None
            }
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Voice input turned off
#[derive(Debug, Default)]
pub struct DisabledRecognizer;

#[async_trait]
impl SpeechInput for DisabledRecognizer {
    async fn transcribe(&self, _audio_wav: &[u8]) -> Option<String> {
        debug!("Speech recognition not available");
        None
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Pick the input backend once at startup
pub fn build_recognizer(config: &SttConfig) -> Arc<dyn SpeechInput> {
    let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) else {
        info!("No speech recognition endpoint configured; voice input disabled");
        return Arc::new(DisabledRecognizer);
    };

    let timeout_secs = if config.timeout_secs == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        config.timeout_secs
    };

    match HttpRecognizer::new(endpoint, config.api_key.clone(), Duration::from_secs(timeout_secs)) {
        Ok(recognizer) => Arc::new(recognizer),
        Err(e) => {
            warn!("Could not initialize speech recognition: {}", e);
            Arc::new(DisabledRecognizer)
        }
    }
}
