use crate::constants::{env, models};
use crate::error::{Result, ThreadlineError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

/// Identifies a remote LLM provider that has a gateway implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Claude,
    OpenAI,
}

impl BackendKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Claude => "Claude (Anthropic)",
            Self::OpenAI => "OpenAI",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Claude => env::ANTHROPIC_API_KEY,
            Self::OpenAI => env::OPENAI_API_KEY,
        }
    }

    pub fn all() -> Vec<BackendKind> {
        vec![Self::Claude, Self::OpenAI]
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = ThreadlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "openai" => Ok(Self::OpenAI),
            _ => Err(ThreadlineError::UnknownBackend(s.to_string())),
        }
    }
}

/// Static pricing and description for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub display_name: String,
    /// Cost per million input tokens (USD)
    pub input_cost_per_m: f64,
    /// Cost per million output tokens (USD)
    pub output_cost_per_m: f64,
    pub description: String,
}

impl ModelProfile {
    pub fn new(
        display_name: impl Into<String>,
        input_cost_per_m: f64,
        output_cost_per_m: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            input_cost_per_m,
            output_cost_per_m,
            description: description.into(),
        }
    }
}

/// Construction-time knobs shared by every adapter.
#[derive(Debug, Clone, Default)]
pub struct GatewayOptions {
    /// Model to start with instead of the catalog's cheapest tier.
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub connect_timeout: Option<Duration>,
}

impl GatewayOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Hard-coded catalog for a backend, flagship to economy.
pub fn known_models(backend: BackendKind) -> BTreeMap<String, ModelProfile> {
    let entries = match backend {
        BackendKind::Claude => vec![
            (
                models::CLAUDE_OPUS,
                ModelProfile::new(
                    "Claude 3 Opus",
                    15.0,
                    75.0,
                    "Most powerful model for complex tasks",
                ),
            ),
            (
                models::CLAUDE_SONNET,
                ModelProfile::new(
                    "Claude 3.5 Sonnet",
                    3.0,
                    15.0,
                    "Balanced performance and cost",
                ),
            ),
            (
                models::CLAUDE_HAIKU,
                ModelProfile::new(
                    "Claude 3 Haiku",
                    0.25,
                    1.25,
                    "Fastest and most cost-effective",
                ),
            ),
        ],
        BackendKind::OpenAI => vec![
            (
                models::O1,
                ModelProfile::new("o1", 15.0, 60.0, "Reasoning model for hard problems"),
            ),
            (
                models::GPT_4O,
                ModelProfile::new("GPT-4o", 2.50, 10.0, "Balanced multimodal flagship"),
            ),
            (
                models::GPT_4O_MINI,
                ModelProfile::new("GPT-4o Mini", 0.15, 0.60, "Small, fast and cheap"),
            ),
        ],
    };

    entries
        .into_iter()
        .map(|(id, profile)| (id.to_string(), profile))
        .collect()
}

/// Build the gateway registered under `name`, reading its credential from
/// the environment.
pub fn create_gateway(
    name: &str,
    options: &GatewayOptions,
) -> Result<Box<dyn super::LlmGateway>> {
    let backend: BackendKind = name.parse()?;
    let api_key = std::env::var(backend.api_key_env()).unwrap_or_default();
    create_gateway_with_key(backend, api_key, options)
}

/// Same as [`create_gateway`] with an explicit credential.
pub fn create_gateway_with_key(
    backend: BackendKind,
    api_key: impl Into<String>,
    options: &GatewayOptions,
) -> Result<Box<dyn super::LlmGateway>> {
    tracing::debug!(backend = %backend, model = ?options.model, "building gateway");
    match backend {
        BackendKind::Claude => Ok(Box::new(super::ClaudeGateway::new(api_key, options)?)),
        BackendKind::OpenAI => Ok(Box::new(super::OpenAiGateway::new(api_key, options)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!("Claude".parse::<BackendKind>().unwrap(), BackendKind::Claude);
        assert_eq!("anthropic".parse::<BackendKind>().unwrap(), BackendKind::Claude);
        assert_eq!("OPENAI".parse::<BackendKind>().unwrap(), BackendKind::OpenAI);
    }

    #[test]
    fn unknown_backend_name_is_rejected() {
        let err = create_gateway("gemini", &GatewayOptions::default()).err().unwrap();
        assert!(matches!(err, ThreadlineError::UnknownBackend(ref n) if n == "gemini"));
    }

    #[test]
    fn every_catalog_has_three_price_tiers() {
        for backend in BackendKind::all() {
            let catalog = known_models(backend);
            assert_eq!(catalog.len(), 3, "{backend}");
            let mut inputs: Vec<f64> = catalog.values().map(|p| p.input_cost_per_m).collect();
            inputs.sort_by(f64::total_cmp);
            inputs.dedup();
            assert_eq!(inputs.len(), 3, "{backend} tiers must differ in price");
        }
    }

    #[test]
    fn default_models_are_the_cheapest_tier() {
        for (backend, default) in [
            (BackendKind::Claude, models::DEFAULT_CLAUDE_MODEL),
            (BackendKind::OpenAI, models::DEFAULT_OPENAI_MODEL),
        ] {
            let catalog = known_models(backend);
            let cheapest = catalog
                .iter()
                .min_by(|a, b| a.1.input_cost_per_m.total_cmp(&b.1.input_cost_per_m))
                .map(|(id, _)| id.as_str());
            assert_eq!(cheapest, Some(default));
        }
    }
}
