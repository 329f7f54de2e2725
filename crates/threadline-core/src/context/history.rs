use crate::context::turn::{Role, Turn};
use crate::error::{Result, ThreadlineError};

const PREVIEW_LIMIT: usize = 50;
const PREVIEW_KEEP: usize = 47;

/// Which turns are sent as context on the next model call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    /// Indices in the caller's order; duplicates are kept.
    Indices(Vec<usize>),
}

impl Selection {
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Indices(indices) => indices.contains(&index),
        }
    }
}

/// Ordered conversation history plus the active selection over it.
///
/// Turns are addressed by zero-based position. Any append resets the
/// selection to [`Selection::All`] so a new turn is never silently left out.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    history: Vec<Turn>,
    selection: Selection,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Turn::new(role, content));
        self.selection = Selection::All;
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.append(Role::User, content);
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.append(Role::Assistant, content);
    }

    /// Turns designated by the current selection, in selection order.
    ///
    /// Indices that no longer point into the history are skipped.
    pub fn active_context(&self) -> Vec<Turn> {
        match &self.selection {
            Selection::All => self.history.clone(),
            Selection::Indices(indices) => indices
                .iter()
                .filter_map(|&i| self.history.get(i))
                .cloned()
                .collect(),
        }
    }

    /// Restricts the active context to `indices`, dropping out-of-range ones.
    ///
    /// Fails without touching the current selection if nothing valid remains.
    pub fn select_context(&mut self, indices: &[usize]) -> Result<()> {
        let valid: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.history.len())
            .collect();

        if valid.is_empty() {
            return Err(ThreadlineError::InvalidSelection);
        }

        tracing::debug!(?valid, "context selection restricted");
        self.selection = Selection::Indices(valid);
        Ok(())
    }

    pub fn reset_selection(&mut self) {
        self.selection = Selection::All;
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.selection = Selection::All;
    }

    /// One line per turn: `* [i] role: preview`, with a blank marker for
    /// turns outside the selection.
    pub fn describe(&self) -> String {
        if self.history.is_empty() {
            return "No conversation history.".to_string();
        }

        self.history
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                let marker = if self.selection.includes(i) { '*' } else { ' ' };
                format!("{marker} [{i}] {}: {}", turn.role(), preview(turn.content()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn turn_at(&self, index: usize) -> Option<&Turn> {
        self.history.get(index)
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self.selection, Selection::Indices(_))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_LIMIT {
        let head: String = content.chars().take(PREVIEW_KEEP).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(contents: &[&str]) -> ConversationStore {
        let mut store = ConversationStore::new();
        for (i, c) in contents.iter().enumerate() {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.append(role, *c);
        }
        store
    }

    #[test]
    fn preview_truncates_past_limit() {
        let long = "x".repeat(51);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 50);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn preview_keeps_exactly_fifty_chars() {
        let exact = "y".repeat(50);
        assert_eq!(preview(&exact), exact);
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        let wide = "é".repeat(50);
        assert_eq!(preview(&wide), wide);
    }

    #[test]
    fn selection_includes_everything_when_unrestricted() {
        assert!(Selection::All.includes(42));
        assert!(!Selection::Indices(vec![1]).includes(0));
    }

    #[test]
    fn failed_selection_keeps_prior_restriction() {
        let mut store = store_with(&["a", "b", "c"]);
        store.select_context(&[2]).unwrap();
        assert!(store.select_context(&[7, 8]).is_err());
        assert_eq!(store.selection(), &Selection::Indices(vec![2]));
    }

    #[test]
    fn describe_marks_inactive_turns_with_blank() {
        let mut store = store_with(&["first", "second"]);
        store.select_context(&[1]).unwrap();
        let lines: Vec<String> = store.describe().lines().map(String::from).collect();
        assert_eq!(lines[0], "  [0] user: first");
        assert_eq!(lines[1], "* [1] assistant: second");
    }
}
