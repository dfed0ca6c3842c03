pub mod api;
pub mod events;
pub mod models;

pub use events::{ClientEvent, ServerEvent};
pub use models::{ChatMessage, ConversationScope, LocalUser, UserId};
