//! Live adapter for the `OpenAI` Images edit API.

use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::{build_client, send_with_retry, truncate};
use crate::config::HttpConfig;
use crate::error::EditError;
use crate::ports::image_editor::{EditFuture, EditRequest, ImageEditor, ImagePayload};

/// Default API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// `gpt-image-*` models answer in PNG unless told otherwise.
const OPENAI_OUTPUT_MIME: &str = "image/png";

/// Live `OpenAI` image editor that calls `POST /images/edits`.
pub struct OpenAiEditor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    http: HttpConfig,
}

impl OpenAiEditor {
    /// Create a new `OpenAI` editor for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, http: HttpConfig) -> Result<Self, EditError> {
        Ok(Self {
            client: build_client(&http)?,
            api_key,
            model,
            base_url: OPENAI_API_BASE.to_string(),
            http,
        })
    }

    /// Point the editor at a different API base.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn form(&self, request: &EditRequest) -> Result<Form, EditError> {
        let image = Part::bytes(request.image.data.clone())
            .file_name(upload_file_name(&request.image.mime_type))
            .mime_str(&request.image.mime_type)?;
        Ok(Form::new()
            .text("model", self.model.clone())
            .text("prompt", request.directive())
            .part("image", image))
    }
}

impl ImageEditor for OpenAiEditor {
    fn edit(&self, request: &EditRequest) -> EditFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{}/images/edits", self.base_url);
            tracing::debug!(%url, model = %self.model, "sending OpenAI edit request");

            let response_text = send_with_retry(&self.http, "openai", || {
                Ok(self.client.post(&url).bearer_auth(&self.api_key).multipart(self.form(&request)?))
            })
            .await?;

            parse_response(&response_text)
        })
    }
}

/// The API infers the upload format from the file name.
fn upload_file_name(mime_type: &str) -> String {
    let ext = match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    };
    format!("image.{ext}")
}

fn parse_response(response_text: &str) -> Result<ImagePayload, EditError> {
    let parsed: OpenAiResponse = serde_json::from_str(response_text)
        .map_err(|e| EditError::MalformedResponse(format!("Failed to parse response: {e}")))?;

    let Some(encoded) = parsed.data.into_iter().find_map(|item| item.b64_json) else {
        return Err(EditError::MalformedResponse(format!(
            "No image data returned from OpenAI. Body: {}",
            truncate(response_text)
        )));
    };

    let data = base64::engine::general_purpose::STANDARD
        .decode(&encoded)
        .map_err(|e| EditError::MalformedResponse(format!("Failed to decode base64: {e}")))?;
    Ok(ImagePayload::new(data, OPENAI_OUTPUT_MIME))
}

// --- OpenAI API response types ---

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    b64_json: Option<String>,
}
