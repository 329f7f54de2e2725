mod traits;
mod claude;
mod openai;
pub mod provider;
pub mod session;
pub mod sse;
pub mod tokenizer;
pub mod usage;

pub use traits::*;
pub use claude::ClaudeGateway;
pub use openai::OpenAiGateway;
pub use provider::{
    create_gateway, create_gateway_with_key, known_models, BackendKind, GatewayOptions,
    ModelProfile,
};
pub use session::GatewaySession;
pub use usage::UsageTracker;
