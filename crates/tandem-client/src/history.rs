use std::future::Future;

use tracing::{info, warn};

use tandem_types::api::HistoryResponse;
use tandem_types::{ChatMessage, UserId};

use crate::error::ApiError;

/// Request/response access to stored messages of a conversation.
pub trait HistorySource: Send + Sync {
    fn fetch_history(
        &self,
        target_user_id: &UserId,
    ) -> impl Future<Output = Result<HistoryResponse, ApiError>> + Send;
}

/// Loads prior messages for a conversation, never failing the caller.
pub struct HistoryLoader<H> {
    source: H,
}

impl<H: HistorySource> HistoryLoader<H> {
    pub fn new(source: H) -> Self {
        Self { source }
    }

    /// Prior messages with placeholders for missing sender data. Any
    /// transport or decode failure yields an empty history.
    pub async fn load(&self, target_user_id: &UserId) -> Vec<ChatMessage> {
        match self.source.fetch_history(target_user_id).await {
            Ok(response) => {
                let messages = response.into_messages();
                info!("loaded {} messages with {}", messages.len(), target_user_id);
                messages
            }
            Err(e) => {
                warn!("history for {} unavailable: {}", target_user_id, e);
                Vec::new()
            }
        }
    }
}
