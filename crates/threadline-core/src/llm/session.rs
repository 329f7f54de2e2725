use crate::error::{Result, ThreadlineError};
use crate::llm::provider::{GatewayOptions, ModelProfile};
use std::collections::BTreeMap;
use std::fmt;

/// Runtime state shared by every backend adapter: the model catalog, the
/// active model, and what is needed to reach the remote service.
#[derive(Clone)]
pub struct GatewaySession {
    models: BTreeMap<String, ModelProfile>,
    current_model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl fmt::Debug for GatewaySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySession")
            .field("current_model", &self.current_model)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GatewaySession {
    /// Fails with `MissingCredential` for a blank key and `UnknownModel` for
    /// an override the catalog does not contain.
    pub fn new(
        api_key_env: &str,
        api_key: impl Into<String>,
        models: BTreeMap<String, ModelProfile>,
        default_model: &str,
        default_base_url: &str,
        options: &GatewayOptions,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ThreadlineError::missing_credential(api_key_env));
        }

        let current_model = options
            .model
            .clone()
            .unwrap_or_else(|| default_model.to_string());
        if !models.contains_key(&current_model) {
            return Err(ThreadlineError::UnknownModel(current_model));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            models,
            current_model,
            api_key,
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: builder.build()?,
        })
    }

    pub fn models(&self) -> &BTreeMap<String, ModelProfile> {
        &self.models
    }

    pub fn current_model(&self) -> &str {
        &self.current_model
    }

    pub fn select_model(&mut self, model: &str) -> Result<()> {
        if !self.models.contains_key(model) {
            return Err(ThreadlineError::UnknownModel(model.to_string()));
        }
        tracing::debug!(from = %self.current_model, to = model, "switching model");
        self.current_model = model.to_string();
        Ok(())
    }

    pub fn profile(&self, model: &str) -> Result<&ModelProfile> {
        self.models
            .get(model)
            .ok_or_else(|| ThreadlineError::UnknownModel(model.to_string()))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
