use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreadlineError {
    #[error("No valid indices provided")]
    InvalidSelection,

    #[error("Invalid role: {0} (expected user, assistant or system)")]
    InvalidRole(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown LLM backend: {0}")]
    UnknownBackend(String),

    #[error("{env_var} environment variable is required")]
    MissingCredential { env_var: String },

    /// Only ever surfaced in-band as `Error: ...` text by the gateways.
    #[error("{0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ThreadlineError {
    pub fn missing_credential(env_var: impl Into<String>) -> Self {
        Self::MissingCredential {
            env_var: env_var.into(),
        }
    }

    /// Renders the error the way gateways report remote failures to callers.
    pub fn inline_text(&self) -> String {
        format!("Error: {self}")
    }
}

pub type Result<T> = std::result::Result<T, ThreadlineError>;
