pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod llm;

// Re-export key types
pub use config::Settings;
pub use context::{ConversationStore, Role, Selection, Turn};
pub use error::{Result, ThreadlineError};
pub use llm::{
    create_gateway, BackendKind, FragmentStream, GatewayOptions, LlmGateway, ModelProfile, Reply,
    TokenDirection, TokenInput, UsageTracker,
};
