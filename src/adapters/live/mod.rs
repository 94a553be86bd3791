//! Live adapters that call real provider APIs, plus the HTTP plumbing they
//! share: client construction, bounded retry, and error-body summaries.

pub mod gemini;
pub mod openai;

use reqwest::{Client, RequestBuilder};

use crate::config::HttpConfig;
use crate::error::EditError;

/// Longest upstream error body quoted verbatim in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Build an HTTP client honoring the configured timeout.
pub(crate) fn build_client(http: &HttpConfig) -> Result<Client, EditError> {
    Ok(Client::builder().timeout(http.timeout()).build()?)
}

/// Send a request, retrying transient failures with exponential backoff.
///
/// `build` is called once per attempt because request bodies (multipart
/// forms in particular) cannot be replayed. Returns the body of the first
/// successful response.
pub(crate) async fn send_with_retry<F>(
    http: &HttpConfig,
    provider: &str,
    mut build: F,
) -> Result<String, EditError>
where
    F: FnMut() -> Result<RequestBuilder, EditError> + Send,
{
    let mut attempt = 0;
    loop {
        match send_once(build()?).await {
            Err(e) if e.is_transient() && attempt < http.retries => {
                attempt += 1;
                let delay = http.backoff(attempt);
                tracing::warn!(provider, attempt, ?delay, error = %e, "transient failure, retrying");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

async fn send_once(request: RequestBuilder) -> Result<String, EditError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(EditError::Api { status: status.as_u16(), message: summarize_error_body(&body) });
    }
    Ok(body)
}

/// Reduce an upstream error body to something fit for a message: the
/// `error.message` field both providers use, or the truncated raw body.
pub(crate) fn summarize_error_body(body: &str) -> String {
    let structured = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
        v.get("error").and_then(|e| e.get("message")).and_then(|m| m.as_str()).map(str::to_string)
    });
    structured.unwrap_or_else(|| truncate(body))
}

pub(crate) fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_ERROR_BODY {
        let head: String = text.chars().take(MAX_ERROR_BODY).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
