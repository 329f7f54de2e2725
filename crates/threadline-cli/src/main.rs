use anyhow::Result;
use clap::Parser;
use threadline_cli::app;

#[derive(Parser)]
#[command(name = "threadline")]
#[command(about = "Threadline - chat with an LLM, choosing which turns it sees")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// LLM backend (claude, openai)
    #[arg(short, long)]
    backend: Option<String>,

    /// Model to start with (defaults to the backend's cheapest)
    #[arg(short, long)]
    model: Option<String>,

    /// Upper bound on generated tokens per reply
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Wait for whole replies instead of streaming them
    #[arg(long)]
    no_stream: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = threadline_core::Settings::load();

    if let Some(backend) = cli.backend {
        settings.llm.backend = backend;
    }
    if let Some(model) = cli.model {
        settings.llm.model = Some(model);
    }
    if let Some(max_tokens) = cli.max_tokens {
        settings.llm.max_tokens = max_tokens;
    }
    if cli.no_stream {
        settings.llm.stream = false;
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, &prompt).await?;
    } else {
        app::run_interactive(&settings).await?;
    }

    Ok(())
}
