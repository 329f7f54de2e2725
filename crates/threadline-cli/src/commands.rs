/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Drop the whole conversation.
    Clear,
    /// Make every turn active again.
    ResetSelection,
    /// Restrict the context to these turn indices, in this order.
    Select(Vec<usize>),
    /// Show the conversation with active markers.
    ShowContext,
    /// Show one turn in full.
    ShowTurn(usize),
    /// List the backend's models.
    ListModels,
    /// Show the active model.
    ShowModel,
    /// Change the model.
    ModelChanged(String),
    /// Show token usage and estimated cost.
    ShowCost,
    /// Show the token estimate for the active context.
    ShowTokens,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        // Context commands
        "/clear" => CommandResult::Clear,
        "/reset" => CommandResult::ResetSelection,
        "/context" | "/ctx" => CommandResult::ShowContext,
        "/select" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /select <index> [index...]\nExample: /select 0 2 3".into())
            } else {
                match parse_indices(arg) {
                    Ok(indices) => CommandResult::Select(indices),
                    Err(bad) => CommandResult::Message(format!("Invalid index: {bad}")),
                }
            }
        }
        "/show" => match arg.parse::<usize>() {
            Ok(index) => CommandResult::ShowTurn(index),
            Err(_) if arg.is_empty() => CommandResult::Message("Usage: /show <index>".into()),
            Err(_) => CommandResult::Message(format!("Invalid index: {arg}")),
        },

        // Model commands
        "/models" => CommandResult::ListModels,
        "/model" => {
            if arg.is_empty() {
                CommandResult::ShowModel
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/cost" | "/status" => CommandResult::ShowCost,
        "/tokens" => CommandResult::ShowTokens,

        "/version" => CommandResult::Message(format!("Threadline v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

/// Indices may be separated by spaces, commas, or both.
fn parse_indices(arg: &str) -> Result<Vec<usize>, String> {
    arg.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| s.to_string()))
        .collect()
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ Threadline Commands ──────────────────────────────────────────╮

  CONTEXT
    /context, /ctx            Show turns (* marks active ones)
    /select <i> [j ...]       Send only these turns next time
    /reset                    Make every turn active again
    /show <i>                 Print one turn in full
    /clear                    Drop the whole conversation

  MODEL
    /models                   List models with pricing
    /model [name]             Show or change the active model
    /tokens                   Token estimate for the active context
    /cost, /status            Token usage and estimated cost

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
