/// Centralized constants for Threadline.
/// Endpoints, model ids, credential variables and defaults live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const CLAUDE_OPUS: &str = "claude-3-opus-latest";
    pub const CLAUDE_SONNET: &str = "claude-3-5-sonnet-latest";
    pub const CLAUDE_HAIKU: &str = "claude-3-haiku-latest";

    pub const GPT_4O: &str = "gpt-4o";
    pub const GPT_4O_MINI: &str = "gpt-4o-mini";
    pub const O1: &str = "o1";

    /// Cheapest tier of each catalog is the default.
    pub const DEFAULT_CLAUDE_MODEL: &str = CLAUDE_HAIKU;
    pub const DEFAULT_OPENAI_MODEL: &str = GPT_4O_MINI;
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
    pub const CLAUDE_MESSAGES_PATH: &str = "/v1/messages";
    pub const CLAUDE_API_VERSION: &str = "2023-06-01";

    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const OPENAI_CHAT_PATH: &str = "/v1/chat/completions";
}

// ─── Credentials ──────────────────────────────────────────────────────────────

pub mod env {
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub mod defaults {
    pub const BACKEND: &str = "claude";
    pub const MAX_TOKENS: u32 = 1024;
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    pub const CONFIG_DIR: &str = "threadline";
    pub const CONFIG_FILE: &str = "config.toml";
}
