//! Tandem chat client: the realtime conversation core of the matching app.
//!
//! - `channel`: the capability-scoped channel abstraction plus an in-memory factory
//! - `gateway`: the WebSocket channel factory used against a real server
//! - `session`: per-pair connection state machine
//! - `message_log`, `surface`, `gate`, `history`: transcript, transient errors,
//!   composer validation and history seeding
//! - `view`: one mounted chat view wiring all of the above on a single task

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod history;
pub mod message_log;
pub mod session;
pub mod surface;
pub mod view;

pub use api::ApiClient;
pub use channel::{Channel, ChannelFactory, MemoryChannelFactory, MemoryPeer, MemoryServer};
pub use config::ClientConfig;
pub use error::{ApiError, ChannelError, ConfigError, SubmitError};
pub use gate::{MAX_MESSAGE_CHARS, MessageSink, OutboundGate};
pub use gateway::WsChannelFactory;
pub use history::{HistoryLoader, HistorySource};
pub use message_log::MessageLog;
pub use session::{ConversationSession, SessionState};
pub use surface::{ERROR_TTL, ErrorSurface, PendingError};
pub use view::{ChatView, ViewUpdate};
