use tracing::{debug, info, warn};

use tandem_types::{ClientEvent, ConversationScope, LocalUser, ServerEvent, UserId};

use crate::channel::{Channel, ChannelFactory};
use crate::error::SubmitError;
use crate::gate::MessageSink;

/// Connection lifecycle of one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No channel exists.
    Idle,
    /// A channel was requested and has not opened (or failed to open).
    Connecting,
    /// The channel opened and the join event is being sent.
    Joined,
    /// Joined; inbound events are flowing.
    Active,
    /// Torn down. Connecting again restarts from `Idle`.
    Closed,
}

/// Owns the chat channel for one (local user, target user) pair.
///
/// The channel handle never leaves the session; other components reach it
/// only through [`MessageSink`].
pub struct ConversationSession<F> {
    factory: F,
    local_user: Option<LocalUser>,
    target_user_id: Option<UserId>,
    state: SessionState,
    channel: Option<Channel>,
}

impl<F: ChannelFactory> ConversationSession<F> {
    pub fn new(factory: F, local_user: Option<LocalUser>, target_user_id: Option<UserId>) -> Self {
        Self {
            factory,
            local_user,
            target_user_id,
            state: SessionState::Idle,
            channel: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_user(&self) -> Option<&LocalUser> {
        self.local_user.as_ref()
    }

    pub fn target_user_id(&self) -> Option<&UserId> {
        self.target_user_id.as_ref()
    }

    /// The pair this session is scoped to, once both ends are known.
    pub fn scope(&self) -> Option<ConversationScope> {
        let user = self.local_user.as_ref()?;
        let target = self.target_user_id.clone()?;
        Some(ConversationScope::new(user.id.clone(), target))
    }

    /// Whether a channel handle is currently held.
    pub fn is_live(&self) -> bool {
        self.channel.is_some()
    }

    /// Whether the session lacks what it needs to start connecting.
    pub fn is_waiting_for_pair(&self) -> bool {
        self.scope().is_none()
    }

    /// Drive `Idle -> Connecting -> Joined -> Active`.
    ///
    /// Stays `Idle` while the local profile or target is unknown, and stays
    /// `Connecting` if the channel cannot be opened. Does nothing if a
    /// channel is already live.
    pub async fn connect(&mut self) -> SessionState {
        if self.channel.is_some() {
            return self.state;
        }
        if self.state == SessionState::Closed {
            self.state = SessionState::Idle;
        }

        let (Some(user), Some(scope)) = (self.local_user.clone(), self.scope()) else {
            debug!("conversation pair incomplete, staying idle");
            self.state = SessionState::Idle;
            return self.state;
        };

        self.state = SessionState::Connecting;
        info!("connecting chat channel for {}", scope);

        let channel = match self.factory.open(&scope).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!("could not open chat channel for {}: {}", scope, e);
                return self.state;
            }
        };

        self.state = SessionState::Joined;
        if let Err(e) = channel.send(ClientEvent::join(&user, &scope)) {
            warn!("join for {} not sent: {}", scope, e);
        }

        self.channel = Some(channel);
        self.state = SessionState::Active;
        info!("joined conversation {}", scope);
        self.state
    }

    /// Next inbound event. Pends forever while no channel is live, so it
    /// can sit in a `select!` next to timers and input.
    ///
    /// If the remote side drops the channel the session moves to `Closed`
    /// and `None` is returned.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        let Some(channel) = self.channel.as_mut() else {
            return std::future::pending().await;
        };

        match channel.recv().await {
            Some(event) => Some(event),
            None => {
                info!("chat channel dropped by server");
                self.channel = None;
                self.state = SessionState::Closed;
                None
            }
        }
    }

    /// Release the channel. Safe to call in any state.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
            match self.scope() {
                Some(scope) => info!("closed chat channel for {}", scope),
                None => info!("closed chat channel"),
            }
        }
        if self.state != SessionState::Idle {
            self.state = SessionState::Closed;
        }
    }

    /// Switch to a different pair. The old channel is fully released before
    /// a new one is requested. A no-op when the pair is unchanged and live.
    pub async fn change_pair(
        &mut self,
        local_user: Option<LocalUser>,
        target_user_id: Option<UserId>,
    ) -> SessionState {
        let same_local = self.local_user.as_ref().map(|u| &u.id) == local_user.as_ref().map(|u| &u.id);
        let same_target = self.target_user_id == target_user_id;
        if same_local && same_target && self.channel.is_some() {
            self.local_user = local_user;
            return self.state;
        }

        self.close();
        self.local_user = local_user;
        self.target_user_id = target_user_id;
        self.state = SessionState::Idle;
        self.connect().await
    }
}

impl<F: ChannelFactory> MessageSink for ConversationSession<F> {
    fn is_connected(&self) -> bool {
        self.state == SessionState::Active && self.channel.is_some()
    }

    fn send_text(&self, text: String) -> Result<(), SubmitError> {
        let (Some(channel), Some(user), Some(scope)) =
            (self.channel.as_ref(), self.local_user.as_ref(), self.scope())
        else {
            return Err(SubmitError::NotConnected);
        };

        channel
            .send(ClientEvent::send_message(user, &scope, text))
            .map_err(|_| SubmitError::NotConnected)
    }
}
