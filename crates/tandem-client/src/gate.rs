use tracing::debug;

use crate::error::SubmitError;
use crate::surface::ErrorSurface;

/// Longest message body accepted, in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 1000;

pub const TOO_LONG_MESSAGE: &str = "Message too long (max 1000 characters)";

/// The narrow capability the composer needs from a conversation.
pub trait MessageSink {
    fn is_connected(&self) -> bool;

    /// Transmit a validated message body. Fire-and-forget.
    fn send_text(&self, text: String) -> Result<(), SubmitError>;
}

/// Holds the composer draft and decides whether it may be sent.
///
/// Sent messages are not appended locally; they show up when the server
/// echoes them back as `messageReceived`.
#[derive(Debug, Default)]
pub struct OutboundGate {
    draft: String,
}

impl OutboundGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Validate and transmit the draft. The draft is cleared only on success.
    ///
    /// Empty drafts and a missing channel are rejected quietly; an
    /// over-long draft is also reported on `errors`.
    pub fn submit(
        &mut self,
        sink: &impl MessageSink,
        errors: &mut ErrorSurface,
    ) -> Result<(), SubmitError> {
        let text = self.draft.trim();
        if text.is_empty() {
            return Err(SubmitError::Empty);
        }
        if !sink.is_connected() {
            debug!("dropping submit, no active channel");
            return Err(SubmitError::NotConnected);
        }

        let len = text.chars().count();
        if len > MAX_MESSAGE_CHARS {
            errors.report(TOO_LONG_MESSAGE);
            return Err(SubmitError::TooLong { len });
        }

        sink.send_text(text.to_string())?;
        self.draft.clear();
        Ok(())
    }
}
