//! Service context that bundles all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::gemini::GeminiEditor;
use crate::adapters::live::openai::OpenAiEditor;
use crate::adapters::recording::image_editor::RecordingImageEditor;
use crate::adapters::replaying::image_editor::ReplayingImageEditor;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::Config;
use crate::error::EditError;
use crate::model::Provider;
use crate::ports::ImageEditor;

/// Where `SNAPEDIT_REC` recordings are written, relative to the working
/// directory.
pub const CASSETTE_ROOT: &str = ".snapedit/cassettes";

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Image editor port.
    pub editor: Box<dyn ImageEditor>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write cassette files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create a live context for `model` served by `provider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured or the HTTP client
    /// cannot be built.
    pub fn live(provider: Provider, model: &str, config: &Config) -> Result<Self, EditError> {
        let http = config.http.clone();
        let editor: Box<dyn ImageEditor> = match provider {
            Provider::Gemini => {
                let key = config.gemini_key().ok_or(EditError::MissingApiKey {
                    provider: provider.to_string(),
                    env_var: "GEMINI_API_KEY".into(),
                })?;
                let mut editor = GeminiEditor::new(key, model.to_string(), http)?;
                if let Some(ref base) = config.endpoints.gemini {
                    editor = editor.with_base_url(base.as_str());
                }
                Box::new(editor)
            }
            Provider::OpenAi => {
                let key = config.openai_key().ok_or(EditError::MissingApiKey {
                    provider: provider.to_string(),
                    env_var: "OPENAI_API_KEY".into(),
                })?;
                let mut editor = OpenAiEditor::new(key, model.to_string(), http)?;
                if let Some(ref base) = config.endpoints.openai {
                    editor = editor.with_base_url(base.as_str());
                }
                Box::new(editor)
            }
        };
        tracing::debug!(%provider, model, "live editor ready");
        Ok(Self { editor })
    }

    /// Create a recording context that wraps a live adapter with a recorder.
    ///
    /// The cassette lands in `<root>/<timestamp>/`. The context must be
    /// dropped before [`RecordingSession::finish`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the live adapter cannot be created.
    pub fn recording(
        provider: Provider,
        model: &str,
        config: &Config,
        root: &Path,
    ) -> Result<(Self, RecordingSession), EditError> {
        let live_ctx = Self::live(provider, model, config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = root
            .join(&timestamp)
            .join("image_editor.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-image_editor"),
            get_commit_hash(),
        )));

        let editor = RecordingImageEditor::new(live_ctx.editor, Arc::clone(&recorder));
        Ok((Self { editor: Box::new(editor) }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, EditError> {
        let replayer = load_cassette(path)
            .map_err(|e| EditError::Config(format!("Failed to load cassette: {e}")))?;
        let editor = ReplayingImageEditor::new(Arc::new(Mutex::new(replayer)));
        Ok(Self { editor: Box::new(editor) })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
