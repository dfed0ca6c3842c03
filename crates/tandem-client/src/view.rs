use tracing::{debug, info};

use tandem_types::{ChatMessage, LocalUser, ServerEvent, UserId};

use crate::channel::ChannelFactory;
use crate::error::SubmitError;
use crate::gate::OutboundGate;
use crate::history::{HistoryLoader, HistorySource};
use crate::message_log::MessageLog;
use crate::session::{ConversationSession, SessionState};
use crate::surface::ErrorSurface;

/// Something the renderer should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// A message was appended to the transcript.
    Message(ChatMessage),
    /// An error became visible.
    Error(String),
    /// The visible error expired.
    ErrorCleared,
    /// The server dropped the channel.
    Disconnected,
}

/// One mounted chat screen.
///
/// All state lives here and is only touched from the task that drives
/// [`ChatView::next_update`], so channel events, error expiry and user
/// input never interleave mid-update.
pub struct ChatView<F, H> {
    session: ConversationSession<F>,
    history: HistoryLoader<H>,
    log: MessageLog,
    errors: ErrorSurface,
    composer: OutboundGate,
    seeded: bool,
}

impl<F: ChannelFactory, H: HistorySource> ChatView<F, H> {
    pub fn new(
        factory: F,
        history: H,
        local_user: Option<LocalUser>,
        target_user_id: Option<UserId>,
    ) -> Self {
        Self {
            session: ConversationSession::new(factory, local_user, target_user_id),
            history: HistoryLoader::new(history),
            log: MessageLog::new(),
            errors: ErrorSurface::new(),
            composer: OutboundGate::new(),
            seeded: false,
        }
    }

    /// Enter the conversation: fetch history and open the channel together.
    ///
    /// History goes in front of the transcript; the two sources are not
    /// deduplicated against each other.
    pub async fn mount(&mut self) -> SessionState {
        let Some(target) = self.session.target_user_id().cloned() else {
            debug!("no target user, nothing to mount");
            return self.session.state();
        };
        if self.seeded {
            debug!("history already loaded for {}", target);
            return self.session.connect().await;
        }

        let (history, state) = tokio::join!(self.history.load(&target), self.session.connect());
        self.seed(history);
        state
    }

    fn seed(&mut self, history: Vec<ChatMessage>) {
        self.log.seed(history);
        self.seeded = true;
    }

    /// Tear the view down: release the channel, cancel any pending error
    /// expiry and discard the transcript.
    pub fn unmount(&mut self) {
        self.session.close();
        self.errors.clear();
        self.log.clear();
        self.seeded = false;
        info!("chat view unmounted");
    }

    /// Switch the counterparty while mounted. Retargeting to the current
    /// counterparty reconnects if the channel was lost.
    pub async fn retarget(&mut self, target_user_id: UserId) -> SessionState {
        if self.session.target_user_id() == Some(&target_user_id) && self.session.is_live() {
            return self.session.state();
        }
        self.unmount();
        let local_user = self.session.local_user().cloned();
        self.session.change_pair(local_user, Some(target_user_id.clone())).await;
        let history = self.history.load(&target_user_id).await;
        self.seed(history);
        self.session.state()
    }

    /// Provide the local profile once it resolves. Connects if the pair is
    /// now complete; a different user restarts the conversation.
    pub async fn set_local_user(&mut self, user: LocalUser) -> SessionState {
        let changed = self.session.local_user().map(|u| &u.id) != Some(&user.id);
        if !changed {
            let target = self.session.target_user_id().cloned();
            return self.session.change_pair(Some(user), target).await;
        }

        self.unmount();
        let target = self.session.target_user_id().cloned();
        self.session.change_pair(Some(user), target).await;
        if let Some(target) = self.session.target_user_id().cloned() {
            let history = self.history.load(&target).await;
            self.seed(history);
        }
        self.session.state()
    }

    /// Wait for the next inbound event or error expiry and apply it.
    pub async fn next_update(&mut self) -> ViewUpdate {
        loop {
            tokio::select! {
                event = self.session.recv() => {
                    return match event {
                        Some(event) => self.apply(event),
                        None => ViewUpdate::Disconnected,
                    };
                }
                () = self.errors.expired() => {
                    if self.errors.expire() {
                        return ViewUpdate::ErrorCleared;
                    }
                }
            }
        }
    }

    /// Route one inbound event into the transcript or the error surface.
    pub fn apply(&mut self, event: ServerEvent) -> ViewUpdate {
        match event {
            ServerEvent::MessageReceived {
                first_name,
                last_name,
                text,
            } => {
                let message = ChatMessage {
                    sender_first_name: first_name,
                    sender_last_name: last_name,
                    text,
                };
                self.log.append(message.clone());
                ViewUpdate::Message(message)
            }
            ServerEvent::MessageError { error } => {
                self.errors.report(error.clone());
                ViewUpdate::Error(error)
            }
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.composer.set_draft(text);
    }

    pub fn draft(&self) -> &str {
        self.composer.draft()
    }

    /// Send the current draft.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        self.composer.submit(&self.session, &mut self.errors)
    }

    pub fn submit_text(&mut self, text: impl Into<String>) -> Result<(), SubmitError> {
        self.set_draft(text);
        self.submit()
    }

    /// True while the local profile or target is unknown; render a loading
    /// state instead of the conversation.
    pub fn is_loading(&self) -> bool {
        self.session.is_waiting_for_pair()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.messages()
    }

    pub fn error(&self) -> Option<&str> {
        self.errors.current()
    }

    pub fn local_user(&self) -> Option<&LocalUser> {
        self.session.local_user()
    }

    pub fn target_user_id(&self) -> Option<&UserId> {
        self.session.target_user_id()
    }
}
