//! Types passed across the [`super::StructuredModel`] boundary.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One part of the user content sent to a model.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Raw file bytes; backends encode them as their wire format requires.
    InlineData { mime_type: String, data: Vec<u8> },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// A single structured-output call.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Fixed instructions, plus corrective feedback on retries.
    pub system_instructions: String,
    pub content: Vec<ContentPart>,
    /// JSON Schema the response must conform to.
    pub response_schema: Value,
    /// Model override; `None` uses the backend default.
    pub model: Option<String>,
    /// Token budget for internal reasoning, when the backend supports it.
    pub thinking_budget: Option<u32>,
}

impl ModelRequest {
    pub fn new(system_instructions: impl Into<String>, response_schema: Value) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            content: Vec::new(),
            response_schema,
            model: None,
            thinking_budget: None,
        }
    }

    #[must_use]
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.content.push(part);
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_thinking_budget(mut self, budget: Option<u32>) -> Self {
        self.thinking_budget = budget;
        self
    }
}

/// Raw text returned by a model, before JSON extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub text: String,
    /// The model that actually served the call.
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Coarse failure classes of the upstream model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamCategory {
    InvalidCredentials,
    Unavailable,
    Timeout,
    MalformedRequest,
}

impl fmt::Display for UpstreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidCredentials => {
                "The AI service rejected the configured credentials. Check the API key."
            }
            Self::Unavailable => "The AI service is temporarily unavailable. Please try again shortly.",
            Self::Timeout => "The AI service took too long to respond. Please try again.",
            Self::MalformedRequest => "The AI service could not process this request.",
        };
        f.write_str(s)
    }
}

/// A failed model call.
///
/// `Display` is meant for end users; `detail` carries the technical context
/// (status, body excerpt) for logs.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{category}")]
    Upstream {
        category: UpstreamCategory,
        detail: String,
    },

    /// The call succeeded but produced no text (blocked, truncated, empty).
    #[error("The AI service returned an empty answer.")]
    EmptyResponse { detail: String },

    /// The service refused the response schema itself.
    #[error("The AI service could not produce output in the required format.")]
    SchemaRejected { detail: String },
}

impl ModelError {
    pub fn upstream(category: UpstreamCategory, detail: impl Into<String>) -> Self {
        Self::Upstream {
            category,
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Upstream { detail, .. }
            | Self::EmptyResponse { detail }
            | Self::SchemaRejected { detail } => detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder_accumulates_parts() {
        let request = ModelRequest::new("be terse", json!({"type": "object"}))
            .with_part(ContentPart::text("chest today"))
            .with_part(ContentPart::InlineData {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3],
            })
            .with_model(Some("gemini-2.5-pro".into()))
            .with_thinking_budget(Some(2048));
        assert_eq!(request.content.len(), 2);
        assert_eq!(request.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(request.thinking_budget, Some(2048));
    }

    #[test]
    fn error_display_hides_detail() {
        let err = ModelError::upstream(UpstreamCategory::InvalidCredentials, "HTTP 401: API key not valid");
        assert!(!err.to_string().contains("401"));
        assert_eq!(err.detail(), "HTTP 401: API key not valid");
    }
}
