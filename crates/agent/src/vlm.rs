//! Gemini vision-language client

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use camera_capture::VideoFrame;
use perception::SceneRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AgentConfig, AgentError};

const JPEG_QUALITY: u8 = 85;

const SYSTEM_PROMPT: &str = "You are an AI assistant helping visually impaired users navigate their environment safely.

Your role is to:
1. Provide clear, concise descriptions of the scene
2. Prioritize safety-critical information (obstacles, hazards)
3. Use spatial language (left, right, ahead, behind, distance in meters)
4. Be respectful and empowering - never patronizing
5. Focus on actionable information

When describing objects, always include:
- What the object is
- Where it is located (position and distance)
- Any immediate hazards or navigation concerns

Keep responses under 3 sentences unless asked for more detail.";

/// Scene description backend
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Describe the frame, grounded on the detections
    async fn describe(&self, frame: &VideoFrame, scene: &SceneRecord, query: &str) -> Result<String, AgentError>;

    fn name(&self) -> &'static str;
}

/// Detection list as prompt text
pub fn format_cv_context(scene: &SceneRecord) -> String {
    if scene.num_objects == 0 {
        return "No objects detected.".to_string();
    }

    let mut lines: Vec<String> = scene
        .objects
        .iter()
        .map(|o| {
            let distance = if o.has_known_distance() {
                format!("{:.1} meters", o.distance_m)
            } else {
                "unknown distance".to_string()
            };
            format!("- {} at {}, positioned to your {}", o.class_name, distance, o.position)
        })
        .collect();

    if !scene.critical_alerts.is_empty() {
        lines.push("\nCRITICAL ALERTS (very close objects):".to_string());
        for alert in &scene.critical_alerts {
            lines.push(format!("⚠ {} only {:.1}m away!", alert.class_name, alert.distance_m));
        }
    }

    lines.join("\n")
}

fn build_prompt(scene: &SceneRecord, query: &str) -> String {
    format!(
        "{}\n\nDETECTED OBJECTS (from computer vision):\n{}\n\nUSER QUERY: {}\n\n\
         Provide a natural, conversational response that helps the user understand \
         their environment and navigate safely.",
        SYSTEM_PROMPT,
        format_cv_context(scene),
        query
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` client
pub struct GeminiVlm {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiVlm {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        if !config.has_gemini_key() {
            return Err(AgentError::VlmUnavailable("no Gemini API key configured".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!("Gemini vision model '{}' enabled", config.gemini_model);
        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(frame: &VideoFrame, scene: &SceneRecord, query: &str) -> Result<GenerateRequest, AgentError> {
        let jpeg = frame.encode_jpeg(JPEG_QUALITY)?;
        Ok(GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_prompt(scene, query),
                    },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: BASE64.encode(jpeg),
                        },
                    },
                ],
            }],
        })
    }
}

#[async_trait]
impl VisionModel for GeminiVlm {
    async fn describe(&self, frame: &VideoFrame, scene: &SceneRecord, query: &str) -> Result<String, AgentError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = Self::request(frame, scene, query)?;

        debug!("Gemini request for query '{}'", query);
        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Vlm(format!("Gemini API returned {}: {}", status, error_text)));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AgentError::Vlm("No content in Gemini response".to_string()))?;

        Ok(text.to_string())
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use perception::{safety_level, BoundingBox, Detection, Position};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn detection(class_name: &str, distance_m: f64, position: Position) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            class_id: None,
            confidence: 0.9,
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            distance_m,
            position,
            safety_level: safety_level(distance_m),
        }
    }

    fn config(base_url: &str) -> AgentConfig {
        AgentConfig {
            use_gemini: true,
            gemini_api_key: "test-key".to_string(),
            gemini_model: "test-model".to_string(),
            gemini_base_url: base_url.to_string(),
            request_timeout_secs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_cv_context() {
        assert_eq!(format_cv_context(&SceneRecord::empty(Utc::now())), "No objects detected.");

        let scene = SceneRecord::aggregate(
            vec![
                detection("chair", 0.8, Position::Left),
                detection("box", -1.0, Position::Right),
            ],
            Utc::now(),
        );
        assert_eq!(
            format_cv_context(&scene),
            "- chair at 0.8 meters, positioned to your left\n\
             - box at unknown distance, positioned to your right\n\
             \nCRITICAL ALERTS (very close objects):\n\
             ⚠ chair only 0.8m away!"
        );
    }

    #[test]
    fn test_requires_key() {
        let config = AgentConfig::default();
        assert!(matches!(GeminiVlm::new(&config), Err(AgentError::VlmUnavailable(_))));
    }

    #[tokio::test]
    async fn test_describe_sends_prompt_and_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": " A chair is close on your left. " }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vlm = GeminiVlm::new(&config(&server.uri())).unwrap();
        let frame = VideoFrame::solid(32, 24, [10, 20, 30]);
        let scene = SceneRecord::aggregate(vec![detection("chair", 0.8, Position::Left)], Utc::now());

        let text = vlm.describe(&frame, &scene, "what is around me").await.unwrap();
        assert_eq!(text, "A chair is close on your left.");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("USER QUERY: what is around me"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        let jpeg = BASE64.decode(parts[1]["inlineData"]["data"].as_str().unwrap()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_describe_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let vlm = GeminiVlm::new(&config(&server.uri())).unwrap();
        let frame = VideoFrame::solid(8, 8, [0, 0, 0]);
        let err = vlm
            .describe(&frame, &SceneRecord::empty(Utc::now()), "describe")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Vlm(_)));
    }

    #[tokio::test]
    async fn test_describe_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let vlm = GeminiVlm::new(&config(&server.uri())).unwrap();
        let frame = VideoFrame::solid(8, 8, [0, 0, 0]);
        assert!(vlm
            .describe(&frame, &SceneRecord::empty(Utc::now()), "describe")
            .await
            .is_err());
    }
}
