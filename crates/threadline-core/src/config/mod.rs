use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::defaults;
use crate::error::{Result, ThreadlineError};
use crate::llm::{create_gateway, GatewayOptions, LlmGateway};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub usage: UsageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub backend: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub stream: bool,
    pub base_url: Option<String>,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSettings {
    pub token_tracking: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: defaults::BACKEND.to_string(),
            model: None,
            max_tokens: defaults::MAX_TOKENS,
            stream: true,
            base_url: None,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            token_tracking: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::CONFIG_DIR)
            .join(defaults::CONFIG_FILE)
    }

    /// Settings from the default path, or defaults if it is missing or bad.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ThreadlineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Record `model` as the starting model for `backend` in the file at
    /// `path`, leaving every other stored setting as it was.
    pub fn remember_model(path: &Path, backend: &str, model: &str) -> Result<()> {
        let mut stored = Self::load_from(path);
        stored.llm.backend = backend.to_string();
        stored.llm.model = Some(model.to_string());
        stored.save_to(path)?;
        tracing::debug!(path = %path.display(), backend, model, "saved model choice");
        Ok(())
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        let mut options = GatewayOptions::default()
            .with_connect_timeout(Duration::from_secs(self.llm.connect_timeout_secs));
        if let Some(model) = &self.llm.model {
            options = options.with_model(model.clone());
        }
        if let Some(url) = &self.llm.base_url {
            options = options.with_base_url(url.clone());
        }
        options
    }

    /// Build the configured gateway; the credential comes from the
    /// backend's environment variable.
    pub fn build_gateway(&self) -> Result<Box<dyn LlmGateway>> {
        create_gateway(&self.llm.backend, &self.gateway_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = Settings::default();
        assert_eq!(settings.llm.backend, "claude");
        assert_eq!(settings.llm.max_tokens, 1024);
        assert!(settings.llm.stream);
        assert!(settings.llm.model.is_none());
        assert!(settings.usage.token_tracking);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: Settings = toml::from_str("[llm]\nmodel = \"claude-3-opus-latest\"\n").unwrap();
        assert_eq!(settings.llm.model.as_deref(), Some("claude-3-opus-latest"));
        assert_eq!(settings.llm.max_tokens, 1024);
        assert!(settings.usage.token_tracking);
    }

    #[test]
    fn gateway_options_carry_overrides() {
        let mut settings = Settings::default();
        settings.llm.base_url = Some("http://localhost:8080".into());
        settings.llm.connect_timeout_secs = 5;
        let options = settings.gateway_options();
        assert_eq!(options.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert!(options.model.is_none());
    }

    #[test]
    fn remember_model_keeps_other_settings() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("threadline").join("config.toml");

        let mut settings = Settings::default();
        settings.llm.max_tokens = 512;
        settings.usage.token_tracking = false;
        settings.save_to(&path).unwrap();

        Settings::remember_model(&path, "openai", "gpt-4o").unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.llm.backend, "openai");
        assert_eq!(loaded.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(loaded.llm.max_tokens, 512);
        assert!(!loaded.usage.token_tracking);
    }

    #[test]
    fn remember_model_creates_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        Settings::remember_model(&path, "claude", "claude-3-opus-latest").unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.llm.model.as_deref(), Some("claude-3-opus-latest"));
        assert_eq!(loaded.llm.max_tokens, 1024);
    }
}
