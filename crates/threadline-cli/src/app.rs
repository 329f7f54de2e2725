use anyhow::Result;
use crossterm::style::Stylize;
use futures::StreamExt;
use std::io::{self, Write};
use std::path::PathBuf;
use threadline_core::{
    ConversationStore, LlmGateway, Reply, Settings, TokenDirection, TokenInput, UsageTracker,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{self, CommandResult};

/// Wires a conversation store to a gateway for one terminal session.
pub struct ChatSession {
    store: ConversationStore,
    gateway: Box<dyn LlmGateway>,
    usage: UsageTracker,
    settings: Settings,
    /// Where a `/model` switch is saved; `None` keeps it in memory only.
    settings_path: Option<PathBuf>,
}

impl ChatSession {
    pub fn new(gateway: Box<dyn LlmGateway>, settings: &Settings) -> Self {
        Self {
            store: ConversationStore::new(),
            gateway,
            usage: UsageTracker::default(),
            settings: settings.clone(),
            settings_path: None,
        }
    }

    /// Save model switches to the settings file at `path`.
    pub fn persist_model_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn gateway(&self) -> &dyn LlmGateway {
        self.gateway.as_ref()
    }

    /// Append `input`, send the active context, echo the reply to `out`
    /// as it arrives and record it.
    ///
    /// Inline `Error:` replies are shown but not kept as assistant turns.
    pub async fn exchange<W: Write>(&mut self, input: &str, out: &mut W) -> Result<String> {
        self.store.add_user_message(input);
        let context = self.store.active_context();

        let reply = self
            .gateway
            .send(&context, self.settings.llm.stream, self.settings.llm.max_tokens)
            .await;

        // Failures arrive in-band as a whole reply or a trailing fragment
        // starting with "Error:". A model reply that itself begins a fragment
        // with that prefix is treated the same way.
        let (text, failed) = match reply {
            Reply::Complete(text) => {
                write!(out, "{text}")?;
                let failed = is_inline_error(&text);
                (text, failed)
            }
            Reply::Stream(mut fragments) => {
                let mut full = String::new();
                let mut failed = false;
                while let Some(fragment) = fragments.next().await {
                    write!(out, "{fragment}")?;
                    out.flush()?;
                    failed |= is_inline_error(&fragment);
                    full.push_str(&fragment);
                }
                (full, failed)
            }
        };
        writeln!(out)?;

        if failed {
            tracing::debug!("reply failed, not recording it");
            return Ok(text);
        }

        if self.settings.usage.token_tracking {
            let input_tokens = self.gateway.count_tokens(TokenInput::from(&context));
            let output_tokens = self.gateway.count_tokens(TokenInput::from(&text));
            self.usage.track(input_tokens, output_tokens);
        }
        self.store.add_assistant_message(text.clone());
        Ok(text)
    }

    /// Apply a parsed slash command and return the text to show.
    pub fn apply(&mut self, command: CommandResult) -> String {
        match command {
            CommandResult::Message(msg) => msg,
            CommandResult::Clear => {
                self.store.clear();
                "Conversation cleared.".into()
            }
            CommandResult::ResetSelection => {
                self.store.reset_selection();
                format!("All {} turns active.", self.store.len())
            }
            CommandResult::Select(indices) => match self.store.select_context(&indices) {
                Ok(()) => self.store.describe(),
                Err(e) => e.to_string(),
            },
            CommandResult::ShowContext => self.store.describe(),
            CommandResult::ShowTurn(index) => match self.store.turn_at(index) {
                Some(turn) => format!("[{index}] {}:\n{}", turn.role(), turn.content()),
                None => format!("No turn at index {index}."),
            },
            CommandResult::ListModels => self.list_models(),
            CommandResult::ShowModel => self.show_model(),
            CommandResult::ModelChanged(model) => match self.gateway.set_model(&model) {
                Ok(()) => match self.remember_model(&model) {
                    Ok(()) => format!("Model set to {model}."),
                    Err(e) => {
                        tracing::warn!(error = %e, "could not save model choice");
                        format!("Model set to {model} (not saved: {e}).")
                    }
                },
                Err(e) => e.to_string(),
            },
            CommandResult::ShowCost => self.show_cost(),
            CommandResult::ShowTokens => self.show_tokens(),
            CommandResult::Quit | CommandResult::NotACommand => String::new(),
        }
    }

    fn remember_model(&mut self, model: &str) -> threadline_core::Result<()> {
        self.settings.llm.model = Some(model.to_string());
        match &self.settings_path {
            Some(path) => Settings::remember_model(path, &self.settings.llm.backend, model),
            None => Ok(()),
        }
    }

    fn list_models(&self) -> String {
        let current = self.gateway.current_model();
        self.gateway
            .available_models()
            .iter()
            .map(|(id, p)| {
                let marker = if id == current { '*' } else { ' ' };
                format!(
                    "{marker} {id} - {} (${:.2} in / ${:.2} out per 1M) {}",
                    p.display_name, p.input_cost_per_m, p.output_cost_per_m, p.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn show_model(&self) -> String {
        let current = self.gateway.current_model();
        match self.gateway.model_info(None) {
            Ok(p) => format!("{} · {current} - {}", self.gateway.backend(), p.description),
            Err(e) => e.to_string(),
        }
    }

    fn show_cost(&self) -> String {
        let cost = match self.usage.estimated_cost(self.gateway.as_ref()) {
            Ok(cost) => format!("${cost:.6}"),
            Err(e) => e.to_string(),
        };
        format!(
            "Requests: {}\nInput tokens: {}\nOutput tokens: {}\nEstimated cost ({}): {cost}",
            self.usage.request_count,
            self.usage.total_input_tokens,
            self.usage.total_output_tokens,
            self.gateway.current_model(),
        )
    }

    fn show_tokens(&self) -> String {
        let context = self.store.active_context();
        let tokens = self.gateway.count_tokens(TokenInput::from(&context));
        match self.gateway.token_cost(tokens as u64, TokenDirection::Input) {
            Ok(cost) => format!(
                "Active context: {} turns, ~{tokens} tokens (~${cost:.6} as input)",
                context.len()
            ),
            Err(e) => e.to_string(),
        }
    }
}

fn is_inline_error(text: &str) -> bool {
    text.starts_with("Error:")
}

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(settings: &Settings, prompt: &str) -> Result<()> {
    let gateway = settings.build_gateway()?;
    let mut session = ChatSession::new(gateway, settings);
    session.exchange(prompt, &mut io::stdout()).await?;
    Ok(())
}

// ── Interactive loop ────────────────────────────────────────────────────

pub async fn run_interactive(settings: &Settings) -> Result<()> {
    let gateway = settings.build_gateway()?;
    let mut session =
        ChatSession::new(gateway, settings).persist_model_to(Settings::config_path());
    let mut stdout = io::stdout();

    println!(
        "{} ({} · {}) - /help for commands, /quit to exit",
        "Threadline".bold(),
        session.gateway().backend(),
        session.gateway().current_model()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".cyan().bold());
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match commands::handle_command(line) {
            CommandResult::Quit => break,
            CommandResult::NotACommand => {
                print!("{} ", "ai>".green().bold());
                stdout.flush()?;
                session.exchange(line, &mut stdout).await?;
            }
            command => println!("{}", session.apply(command)),
        }
    }

    tracing::debug!(requests = session.usage().request_count, "session ended");
    Ok(())
}
