//! Live adapter for the Gemini `generateContent` image-editing API.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use super::{build_client, send_with_retry, truncate};
use crate::config::HttpConfig;
use crate::error::EditError;
use crate::ports::image_editor::{EditFuture, EditRequest, ImageEditor, ImagePayload};

/// Default API base; the model path is appended per request.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Live Gemini image editor that calls the Google AI API.
pub struct GeminiEditor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    http: HttpConfig,
}

impl GeminiEditor {
    /// Create a new Gemini editor for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, http: HttpConfig) -> Result<Self, EditError> {
        Ok(Self {
            client: build_client(&http)?,
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
            http,
        })
    }

    /// Point the editor at a different API base.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl ImageEditor for GeminiEditor {
    fn edit(&self, request: &EditRequest) -> EditFuture<'_> {
        let body = request_body(request);
        Box::pin(async move {
            let url = self.url();
            tracing::debug!(%url, model = %self.model, "sending Gemini edit request");

            let response_text = send_with_retry(&self.http, "gemini", || {
                Ok(self.client.post(&url).header("x-goog-api-key", &self.api_key).json(&body))
            })
            .await?;

            parse_response(&response_text)
        })
    }
}

/// One user turn: the inline source image followed by the directive.
fn request_body(request: &EditRequest) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": request.image.mime_type,
                        "data": request.image.to_base64(),
                    }
                },
                { "text": request.directive() }
            ]
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"]
        }
    })
}

/// Return the first inline image among the first candidate's parts.
fn parse_response(response_text: &str) -> Result<ImagePayload, EditError> {
    let parsed: GeminiResponse = serde_json::from_str(response_text)
        .map_err(|e| EditError::MalformedResponse(format!("Failed to parse response: {e}")))?;

    let parts = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut commentary = Vec::new();
    for part in parts {
        if let Some(inline) = part.inline_data {
            let data = base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|e| EditError::MalformedResponse(format!("Failed to decode base64: {e}")))?;
            return Ok(ImagePayload::new(data, inline.mime_type));
        }
        if let Some(text) = part.text {
            commentary.push(text);
        }
    }

    let mut message = "No image data returned from Gemini.".to_string();
    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        message.push_str(&format!(" Prompt blocked: {reason}."));
    }
    if !commentary.is_empty() {
        message.push_str(&format!(" Model said: {}", truncate(commentary.join(" ").trim())));
    }
    Err(EditError::MalformedResponse(message))
}

// --- Gemini API response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}
