use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{GruntyError, GruntyResult};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Response-size ceiling sent with every request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Optional key stored in config.toml (the `ANTHROPIC_API_KEY` env var wins).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound on one model call, connect to last byte.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.anthropic.com/v1/messages".into()
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".into()
}

fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Index into the monitor list; out of range falls back to the primary monitor.
    #[serde(default)]
    pub screen_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// Appended to the fixed system instruction when non-empty.
    #[serde(default)]
    pub additional_system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub max_steps: Option<u32>,
    #[serde(default)]
    pub max_duration_minutes: Option<u32>,
    /// Pause after every performed action, giving the desktop time to settle.
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_duration_minutes: None,
            action_delay_ms: default_action_delay_ms(),
        }
    }
}

fn default_action_delay_ms() -> u64 {
    500
}

impl AppConfig {
    /// The API key to use: environment first, then config.toml.
    pub fn resolve_api_key(&self) -> GruntyResult<String> {
        let from_env = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        let from_file = self.model.api_key.clone().filter(|k| !k.trim().is_empty());
        from_env.or(from_file).ok_or_else(|| {
            GruntyError::Config(format!(
                "{API_KEY_ENV} not found in environment variables or config.toml"
            ))
        })
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    let candidate = dirs::config_dir()?.join("grunty").join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in user config dir");
        return Some(candidate);
    }
    None
}

/// Load configuration from `explicit` or the usual search locations.
///
/// An explicit path must exist. Without one, a missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> GruntyResult<AppConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match resolve_config_path() {
            Some(p) => p,
            None => {
                tracing::warn!("config.toml not found; using defaults");
                return Ok(AppConfig::default());
            }
        },
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> GruntyResult<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        GruntyError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(
        path = %path.display(),
        model = %config.model.model,
        screen = config.display.screen_index,
        "config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.model.api_version, "2023-06-01");
        assert_eq!(config.model.request_timeout_secs, 120);
        assert_eq!(config.display.screen_index, 0);
        assert_eq!(config.run.action_delay_ms, 500);
        assert!(config.run.max_steps.is_none());
        assert!(config.prompt.additional_system_prompt.is_empty());
    }

    #[test]
    fn loads_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[model]
model = "claude-test"
max_tokens = 2048
api_key = "file-key"
request_timeout_secs = 30

[display]
screen_index = 2

[prompt]
additional_system_prompt = "Prefer Firefox."

[run]
max_steps = 40
action_delay_ms = 0
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.model.model, "claude-test");
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.model.request_timeout_secs, 30);
        assert_eq!(config.model.api_base, "https://api.anthropic.com/v1/messages");
        assert_eq!(config.display.screen_index, 2);
        assert_eq!(config.prompt.additional_system_prompt, "Prefer Firefox.");
        assert_eq!(config.run.max_steps, Some(40));
        assert_eq!(config.run.action_delay_ms, 0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nscreen_index = \"first\"").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, GruntyError::TomlDe(_)));
    }

    #[test]
    fn explicit_missing_path_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, GruntyError::Config(_)));
    }
}
