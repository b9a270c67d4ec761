//! Google Gemini backend for [`StructuredModel`].
//!
//! Calls `models/{model}:generateContent` with `responseMimeType =
//! application/json` and the plan schema as `responseJsonSchema`. The API
//! key is sent in the `x-goog-api-key` header and never logged.

use std::env;
use std::fmt;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::trait_def::StructuredModel;
use super::types::{
    ContentPart, ModelError, ModelOutput, ModelRequest, TokenUsage, UpstreamCategory,
};

/// Environment variable holding the API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Cheap model for simple requests.
pub const FAST_MODEL: &str = "gemini-2.5-flash";

/// Model for everything else.
pub const QUALITY_MODEL: &str = "gemini-2.5-pro";

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest body excerpt kept in error details.
const DETAIL_EXCERPT: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    system_instruction: WireContent,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    /// Anything else the API may send back (thought signatures, tool calls).
    Other(Value),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_json_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<Value>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Gemini over HTTPS.
pub struct GeminiModel {
    api_key: String,
    client: Client,
    default_model: String,
    base_url: String,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiModel {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            default_model: FAST_MODEL.to_owned(),
            base_url: API_BASE_URL.to_owned(),
        }
    }

    /// Build from `GEMINI_API_KEY`, or `None` when it is unset or empty.
    pub fn from_env() -> Option<Self> {
        env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Point at a different API root (proxies, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn build_request(request: &ModelRequest) -> GenerateContentRequest {
        let parts = request
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => WirePart::Text { text: text.clone() },
                ContentPart::InlineData { mime_type, data } => WirePart::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: BASE64.encode(data),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![WireContent {
                role: Some("user".to_owned()),
                parts,
            }],
            system_instruction: WireContent {
                role: None,
                parts: vec![WirePart::Text {
                    text: request.system_instructions.clone(),
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: request.response_schema.clone(),
                thinking_config: request
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        }
    }

    /// Concatenated text parts of the first candidate.
    fn extract_output(
        response: GenerateContentResponse,
        model: &str,
    ) -> Result<ModelOutput, ModelError> {
        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count.unwrap_or(0),
            completion_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count.unwrap_or(0),
        });
        let prompt_feedback = response.prompt_feedback;

        let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
            return Err(ModelError::EmptyResponse {
                detail: format!("no candidates; prompt feedback: {prompt_feedback:?}"),
            });
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match part {
                WirePart::Text { text } => Some(text),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse {
                detail: format!("finish reason {:?}", candidate.finish_reason),
            });
        }

        Ok(ModelOutput {
            text,
            model: model.to_owned(),
            finish_reason: candidate.finish_reason,
            usage,
        })
    }

    /// Classify a non-success HTTP status.
    pub(crate) fn map_api_error(status: u16, body: &str) -> ModelError {
        let message = serde_json::from_str::<GenerateContentResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| excerpt(body), |e| e.message);
        let detail = format!("HTTP {status}: {message}");

        let category = match status {
            401 | 403 => UpstreamCategory::InvalidCredentials,
            400 if message.to_lowercase().contains("schema") => {
                return ModelError::SchemaRejected { detail };
            }
            400 | 404 | 413 | 422 => UpstreamCategory::MalformedRequest,
            408 | 504 => UpstreamCategory::Timeout,
            _ => UpstreamCategory::Unavailable,
        };
        ModelError::upstream(category, detail)
    }

    fn map_transport_error(e: &reqwest::Error) -> ModelError {
        let category = if e.is_timeout() {
            UpstreamCategory::Timeout
        } else {
            UpstreamCategory::Unavailable
        };
        ModelError::upstream(category, format!("transport: {e}"))
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(DETAIL_EXCERPT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

#[async_trait]
impl StructuredModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.default_model)))]
    async fn generate(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let body = Self::build_request(request);

        debug!(parts = request.content.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Self::map_transport_error(&e))?;

        if !status.is_success() {
            let err = Self::map_api_error(status.as_u16(), &text);
            error!(status = %status, detail = err.detail(), "Gemini API error");
            return Err(err);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, "failed to parse Gemini response envelope");
            ModelError::EmptyResponse {
                detail: format!("unreadable response envelope: {e}"),
            }
        })?;

        if let Some(api_error) = parsed.error {
            return Err(ModelError::upstream(
                UpstreamCategory::Unavailable,
                api_error.message,
            ));
        }

        let output = Self::extract_output(parsed, model)?;
        debug!(
            finish_reason = output.finish_reason.as_deref().unwrap_or("unknown"),
            chars = output.text.len(),
            "received Gemini response"
        );
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request() -> ModelRequest {
        ModelRequest::new("SYSTEM", json!({"type": "object"}))
            .with_part(ContentPart::text("chest today"))
            .with_part(ContentPart::InlineData {
                mime_type: "application/pdf".into(),
                data: b"hello".to_vec(),
            })
            .with_thinking_budget(Some(1024))
    }

    #[test]
    fn request_uses_camel_case_wire_names() {
        let body = serde_json::to_value(GeminiModel::build_request(&sample_request())).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "SYSTEM");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "chest today");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "aGVsbG8=");
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseJsonSchema"], json!({"type": "object"}));
        assert_eq!(config["thinkingConfig"]["thinkingBudget"], 1024);
    }

    #[test]
    fn thinking_config_is_omitted_by_default() {
        let request = ModelRequest::new("S", json!({}));
        let body = serde_json::to_value(GeminiModel::build_request(&request)).unwrap();
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn maps_statuses_to_categories() {
        let category = |status, body| match GeminiModel::map_api_error(status, body) {
            ModelError::Upstream { category, .. } => Some(category),
            _ => None,
        };
        assert_eq!(category(401, ""), Some(UpstreamCategory::InvalidCredentials));
        assert_eq!(category(403, ""), Some(UpstreamCategory::InvalidCredentials));
        assert_eq!(category(429, ""), Some(UpstreamCategory::Unavailable));
        assert_eq!(category(503, ""), Some(UpstreamCategory::Unavailable));
        assert_eq!(category(504, ""), Some(UpstreamCategory::Timeout));
        assert_eq!(category(400, "bad field"), Some(UpstreamCategory::MalformedRequest));
    }

    #[test]
    fn schema_complaints_are_schema_rejections() {
        let body = r#"{"error": {"message": "Invalid JSON payload: response_json_schema is too deep"}}"#;
        let err = GeminiModel::map_api_error(400, body);
        assert!(matches!(err, ModelError::SchemaRejected { .. }), "got {err:?}");
        assert!(err.detail().contains("too deep"));
    }

    #[test]
    fn extracts_text_from_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"name\":"}, {"text": "\"x\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
        }))
        .unwrap();
        let output = GeminiModel::extract_output(response, FAST_MODEL).unwrap();
        assert_eq!(output.text, "{\"name\":\"x\"}");
        assert_eq!(output.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(output.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn blocked_prompt_is_an_empty_response() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = GeminiModel::extract_output(response, FAST_MODEL).unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse { .. }));
        assert!(err.detail().contains("SAFETY"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let model = GeminiModel::new("super-secret").with_base_url("http://localhost:9/");
        let debug = format!("{model:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("http://localhost:9"));
        assert_eq!(model.url("m"), "http://localhost:9/models/m:generateContent");
    }
}
