use std::error::Error as _;
use std::time::Duration;

use mashup_contracts::assets::{GenerationResult, ImageAsset};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::GenerationRequester;
use crate::config::RequesterConfig;
use crate::error::GenerationError;

const ERROR_BODY_MAX_CHARS: usize = 512;

pub struct GeminiRequester {
    api_base: String,
    api_key: Option<String>,
    model: String,
    prompt: String,
    http: HttpClient,
}

impl GeminiRequester {
    /// The client timeout is disabled; a hung call is bounded only by the
    /// service and the transport.
    pub fn new(config: &RequesterConfig) -> Result<Self, GenerationError> {
        let http = HttpClient::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| {
                GenerationError::new(format!(
                    "failed to build HTTP client: {}",
                    error_chain_text(&err)
                ))
            })?;
        Ok(Self {
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            http,
        })
    }

    pub fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    pub fn build_payload(&self, character: &ImageAsset, product: &ImageAsset) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    inline_part(character),
                    inline_part(product),
                    { "text": self.prompt },
                ],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"],
            },
        })
    }

    /// Takes the first inline image of the first candidate that has one.
    pub fn extract_image(response_payload: &Value) -> Result<GenerationResult, GenerationError> {
        let candidates = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut model_text = Vec::new();

        for candidate in candidates {
            let parts = candidate
                .get("content")
                .and_then(|content| content.get("parts"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for part in parts {
                if let Some(text) = part
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                {
                    model_text.push(text.to_string());
                }
                let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data"))
                else {
                    continue;
                };
                let data = inline
                    .get("data")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if data.trim().is_empty() {
                    continue;
                }
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(Value::as_str);
                return Ok(GenerationResult::from_inline(mime_type, data));
            }
        }

        let mut message = "The model did not return an image.".to_string();
        if let Some(reason) = response_payload
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
        {
            message.push_str(&format!(" Request blocked: {reason}."));
        }
        if !model_text.is_empty() {
            message.push_str(&format!(" Model response: {}", model_text.join(" ")));
        }
        Err(GenerationError::new(message))
    }

    fn post(&self, api_key: &str, payload: &Value) -> Result<HttpResponse, GenerationError> {
        self.http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(payload)
            .send()
            .map_err(|err| {
                GenerationError::new(format!("Gemini request failed: {}", error_chain_text(&err)))
            })
    }
}

impl GenerationRequester for GeminiRequester {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(
        &self,
        character: &ImageAsset,
        product: &ImageAsset,
    ) -> Result<GenerationResult, GenerationError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerationError::new(RequesterConfig::missing_key_message()));
        };
        let payload = self.build_payload(character, product);
        info!(model = %self.model, "sending generation request");
        let response = self.post(api_key, &payload)?;
        let response_payload = response_json_or_error(response)?;
        let result = Self::extract_image(&response_payload)?;
        debug!(mime = result.mime_type(), "generation returned an image");
        Ok(result)
    }
}

fn inline_part(asset: &ImageAsset) -> Value {
    json!({
        "inlineData": {
            "mimeType": asset.mime_type(),
            "data": asset.base64(),
        }
    })
}

fn response_json_or_error(response: HttpResponse) -> Result<Value, GenerationError> {
    let status = response.status();
    let code = status.as_u16();
    let body = response.text().map_err(|err| {
        GenerationError::new(format!(
            "Gemini response body read failed: {}",
            error_chain_text(&err)
        ))
    })?;
    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| truncate_text(body.trim(), ERROR_BODY_MAX_CHARS));
        return Err(GenerationError::new(format!(
            "Gemini request failed ({code}): {detail}"
        )));
    }
    serde_json::from_str(&body)
        .map_err(|_| GenerationError::new("Gemini returned an invalid JSON payload"))
}

fn error_chain_text(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        source = cause.source();
    }
    parts.join(": ")
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
