use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// How long a reported error stays visible.
pub const ERROR_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingError {
    pub message: String,
    pub expires_at: Instant,
}

/// Holds at most one transient, user-visible error.
///
/// A new report replaces the old one and restarts the clock. The owner's
/// event loop awaits [`ErrorSurface::expired`] and then calls
/// [`ErrorSurface::expire`]; dropping or clearing the surface cancels the
/// pending expiry with it.
#[derive(Debug, Default)]
pub struct ErrorSurface {
    pending: Option<PendingError>,
}

impl ErrorSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("error surfaced: {}", message);
        self.pending = Some(PendingError {
            message,
            expires_at: Instant::now() + ERROR_TTL,
        });
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// The visible error, if any and not yet past its deadline.
    pub fn current(&self) -> Option<&str> {
        self.pending
            .as_ref()
            .filter(|p| Instant::now() < p.expires_at)
            .map(|p| p.message.as_str())
    }

    pub fn pending(&self) -> Option<&PendingError> {
        self.pending.as_ref()
    }

    /// Drop the error if its deadline has passed. Returns whether it did.
    pub fn expire(&mut self) -> bool {
        match &self.pending {
            Some(p) if Instant::now() >= p.expires_at => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Resolves at the current error's deadline; pends forever when empty.
    pub async fn expired(&self) {
        match &self.pending {
            Some(p) => tokio::time::sleep_until(p.expires_at).await,
            None => std::future::pending().await,
        }
    }
}
