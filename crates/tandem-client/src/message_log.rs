use tandem_types::ChatMessage;

/// Append-only transcript for the active conversation.
///
/// Entries are never reordered or deduplicated. History is prepended once
/// when it arrives; everything else is appended in arrival order.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Put previously stored messages ahead of anything already received.
    pub fn seed(&mut self, history: Vec<ChatMessage>) {
        self.messages.splice(0..0, history);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discard the transcript when its session ends.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
