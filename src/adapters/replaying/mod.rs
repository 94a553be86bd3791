//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_editor;

use std::sync::{Arc, Mutex, PoisonError};

use crate::cassette::replayer::CassetteReplayer;
use crate::error::{EditError, FailureCategory};

/// Take the next recorded output for a given port and method.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, EditError> {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).map(|i| i.output).map_err(EditError::Config)
}

/// Deserialize a replayed output as `Result<T, EditError>`.
///
/// Accepts both `{"Err": {"category", "message"}}` and a bare `{"Err": "..."}`
/// string, which replays as an upstream failure.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, EditError> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        return Err(replayed_error(err_val));
    }
    let ok_val = output.get("Ok").or_else(|| output.get("ok")).cloned().unwrap_or(output);
    serde_json::from_value(ok_val)
        .map_err(|e| EditError::Config(format!("Unreadable cassette output: {e}")))
}

fn replayed_error(err_val: &serde_json::Value) -> EditError {
    let message = err_val
        .get("message")
        .or(Some(err_val))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("replayed error")
        .to_string();
    let category = err_val
        .get("category")
        .and_then(|c| serde_json::from_value::<FailureCategory>(c.clone()).ok())
        .unwrap_or(FailureCategory::Upstream);
    EditError::Replayed { category, message }
}
