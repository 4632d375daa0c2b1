//! Vision-model flight extraction
//!
//! Sends the image with a fixed prompt to an OpenAI-compatible chat
//! completions endpoint and reads the model's JSON reply.

use crate::imaging::{prepare_image, ImageOptions};
use crate::submit::timeout_from_secs;
use async_trait::async_trait;
use intake_core::{
    ExtractError, ExtractedFlightData, FlightExtractor, ImageUpload, IntakeConfig, IntakeError,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};

/// Prompt sent alongside every image
pub const EXTRACTION_PROMPT: &str = r#"Extract flight info from boarding pass image. Return only JSON:
{
  "airline": "airline name",
  "flightNumber": "flight code",
  "arrivalDate": "YYYY-MM-DD",
  "arrivalTime": "HH:MM AM/PM",
  "confidence": 0.9
}"#;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?").expect("valid code fence pattern"));

/// Extractor backed by a chat completions endpoint
#[derive(Clone)]
pub struct VisionExtractor {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    image: ImageOptions,
}

impl std::fmt::Debug for VisionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionExtractor")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("image", &self.image)
            .finish_non_exhaustive()
    }
}

impl VisionExtractor {
    /// Build from configuration, checking the API key is present
    pub fn from_config(config: &IntakeConfig) -> Result<Self, IntakeError> {
        config.validate_for_extraction()?;
        let extraction = &config.extraction;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout_from_secs(config.http.timeout_secs) {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ExtractError::failed(format!("cannot build http client: {e}")))?;

        Ok(Self {
            client,
            url: extraction.url.clone(),
            api_key: extraction.api_key.clone().unwrap_or_default(),
            model: extraction.model.clone(),
            max_tokens: extraction.max_tokens,
            image: ImageOptions {
                compress_threshold: extraction.compress_threshold_bytes,
                max_dimension: extraction.max_dimension,
                ..ImageOptions::default()
            },
        })
    }

    /// Request body for one image
    #[must_use]
    pub fn request_body(&self, data_url: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": EXTRACTION_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url, "detail": "low" } }
                ]
            }],
            "max_tokens": self.max_tokens,
            "temperature": 0
        })
    }
}

#[async_trait]
impl FlightExtractor for VisionExtractor {
    async fn extract(&self, image: ImageUpload) -> Result<ExtractedFlightData, ExtractError> {
        let prepared = prepare_image(&image, self.image).await?;
        let body = self.request_body(&prepared.data_url());

        tracing::info!("Requesting extraction from {} ({})", self.model, image.file_name);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::classify(None, &e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExtractError::classify(None, &e.to_string()))?;

        if !status.is_success() {
            let message = api_error_message(&text);
            tracing::warn!("Extraction endpoint returned {}: {}", status.as_u16(), message);
            return Err(ExtractError::classify(Some(status.as_u16()), &message));
        }

        let content = reply_content(&text)?;
        tracing::debug!("Extraction reply: {}", content);
        parse_extraction(&content)
    }
}

/// Error text from an API error body, or the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// `choices[0].message.content` of a completion
fn reply_content(body: &str) -> Result<String, ExtractError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractError::failed(format!("completion is not JSON: {e}")))?;
    value["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ExtractError::failed("completion has no message content"))
}

/// Remove markdown code fences around a model reply
#[must_use]
pub fn strip_code_fences(content: &str) -> String {
    CODE_FENCE.replace_all(content, "").trim().to_string()
}

/// Parse the model's JSON answer
///
/// Prose around the object is tolerated.
pub fn parse_extraction(content: &str) -> Result<ExtractedFlightData, ExtractError> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str(&cleaned).or_else(|first| {
        let start = cleaned.find('{');
        let end = cleaned.rfind('}');
        match (start, end) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&cleaned[start..=end])
                .map_err(|e| ExtractError::failed(format!("reply is not flight JSON: {e}"))),
            _ => Err(ExtractError::failed(format!(
                "reply is not flight JSON: {first}"
            ))),
        }
    })
}
