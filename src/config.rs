//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::output::DEFAULT_OUTPUT_FILENAME;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Default values used when the matching CLI flag is absent.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP client behavior.
    #[serde(default)]
    pub http: HttpConfig,

    /// Base URL overrides for the provider APIs.
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API key.
    pub gemini: Option<String>,
    /// `OpenAI` API key.
    pub openai: Option<String>,
}

/// Default parameter values from config file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Default model name or alias.
    pub model: String,
    /// Default export path.
    pub output: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { model: "nano-banana".to_string(), output: DEFAULT_OUTPUT_FILENAME.to_string() }
    }
}

/// Timeout and retry settings shared by the live adapters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure. `0` means a single attempt.
    pub retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub retry_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 120, retries: 0, retry_backoff_ms: 500 }
    }
}

impl HttpConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

/// Provider base URL overrides.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointsConfig {
    /// Gemini API base, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub gemini: Option<String>,
    /// `OpenAI` API base, e.g. `https://api.openai.com/v1`.
    pub openai: Option<String>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the Gemini API key, preferring `GEMINI_API_KEY`, then `API_KEY`.
    #[must_use]
    pub fn gemini_key(&self) -> Option<String> {
        non_empty_env("GEMINI_API_KEY")
            .or_else(|| non_empty_env("API_KEY"))
            .or_else(|| non_blank(self.keys.gemini.as_deref()))
    }

    /// Get the `OpenAI` API key, preferring environment variable.
    #[must_use]
    pub fn openai_key(&self) -> Option<String> {
        non_empty_env("OPENAI_API_KEY").or_else(|| non_blank(self.keys.openai.as_deref()))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok().as_deref())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `SNAPEDIT_CONFIG` environment variable
/// 3. `~/.config/snapedit/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("SNAPEDIT_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/snapedit/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/snapedit/config.toml")
    } else {
        PathBuf::from("snapedit.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.gemini.is_none());
        assert!(config.keys.openai.is_none());
        assert_eq!(config.defaults.model, "nano-banana");
        assert_eq!(config.defaults.output, "snapedit-ai-result.png");
        assert_eq!(config.http.timeout_secs, 120);
        assert_eq!(config.http.retries, 0);
        assert!(config.endpoints.gemini.is_none());
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.defaults.model, "nano-banana");
    }

    #[test]
    fn load_valid_toml() {
        let dir = std::env::temp_dir().join("snapedit_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
gemini = "test-gemini-key"
openai = "test-openai-key"

[defaults]
model = "gpt-1"
output = "out.jpg"

[http]
timeout_secs = 30
retries = 2

[endpoints]
gemini = "http://localhost:9999/v1beta"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.gemini.as_deref(), Some("test-gemini-key"));
        assert_eq!(config.keys.openai.as_deref(), Some("test-openai-key"));
        assert_eq!(config.defaults.model, "gpt-1");
        assert_eq!(config.defaults.output, "out.jpg");
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert_eq!(config.http.retries, 2);
        assert_eq!(config.http.retry_backoff_ms, 500);
        assert_eq!(config.endpoints.gemini.as_deref(), Some("http://localhost:9999/v1beta"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config: Config = toml::from_str("[defaults]\nmodel = \"gpt-1\"\n").unwrap();
        assert_eq!(config.defaults.model, "gpt-1");
        assert_eq!(config.defaults.output, "snapedit-ai-result.png");
    }

    #[test]
    fn load_invalid_toml() {
        let dir = std::env::temp_dir().join("snapedit_config_bad_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn openai_key_from_file() {
        let config = Config {
            keys: KeysConfig { gemini: None, openai: Some("from-file".into()) },
            ..Config::default()
        };

        // Without env var, returns file value
        std::env::remove_var("OPENAI_API_KEY");
        assert_eq!(config.openai_key().as_deref(), Some("from-file"));
    }

    #[test]
    fn blank_file_keys_are_ignored() {
        let config: Config = toml::from_str("[keys]\ngemini = \"\"\nopenai = \"  \"\n").unwrap();

        std::env::remove_var("GEMINI_API_KEY");
        std::env::remove_var("API_KEY");
        std::env::remove_var("OPENAI_API_KEY");
        assert_eq!(config.gemini_key(), None);
        assert_eq!(config.openai_key(), None);
    }

    #[test]
    fn backoff_doubles() {
        let http = HttpConfig { retry_backoff_ms: 100, ..HttpConfig::default() };
        assert_eq!(http.backoff(1), Duration::from_millis(100));
        assert_eq!(http.backoff(2), Duration::from_millis(200));
        assert_eq!(http.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
