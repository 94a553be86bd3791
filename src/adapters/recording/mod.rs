//! Recording adapters that capture interactions to cassettes.

pub mod image_editor;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;
use crate::error::EditError;

/// Record a `Result<T, EditError>` interaction.
///
/// Successes are stored as `{"Ok": <value>}`, failures as
/// `{"Err": {"category": .., "message": ..}}` so replay can restore the
/// failure category. Values that fail to serialize are recorded as `null`.
pub(crate) fn record_result<T, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, EditError>,
) where
    T: Serialize,
    I: Serialize,
{
    let input_json = serde_json::to_value(input).unwrap_or_else(|e| {
        tracing::warn!(port, method, error = %e, "failed to serialize recording input");
        serde_json::Value::Null
    });

    let output_json = match result {
        Ok(v) => serde_json::json!({ "Ok": serde_json::to_value(v).unwrap_or_default() }),
        Err(e) => serde_json::json!({
            "Err": { "category": e.category(), "message": e.to_string() }
        }),
    };

    recorder
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .record(port, method, input_json, output_json);
}
