pub mod history;
pub mod turn;

pub use history::{ConversationStore, Selection};
pub use turn::{Role, Turn};
