use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use tandem_types::{ClientEvent, ConversationScope, ServerEvent};

use crate::error::ChannelError;

/// Opens one channel per conversation pair.
pub trait ChannelFactory: Send + Sync {
    fn open(
        &self,
        scope: &ConversationScope,
    ) -> impl Future<Output = Result<Channel, ChannelError>> + Send;
}

/// An open, exclusively owned chat channel.
///
/// Dropping or closing it releases the underlying transport: the outbound
/// queue closes (the transport task says goodbye and exits) and no further
/// inbound events can be observed.
#[derive(Debug)]
pub struct Channel {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Channel {
    pub fn new(
        outbound: mpsc::UnboundedSender<ClientEvent>,
        inbound: mpsc::UnboundedReceiver<ServerEvent>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Fire-and-forget transmit.
    pub fn send(&self, event: ClientEvent) -> Result<(), ChannelError> {
        self.outbound.send(event).map_err(|_| ChannelError::Closed)
    }

    /// Next inbound event, or `None` once the remote side has gone away.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.inbound.recv().await
    }

    pub fn close(self) {
        let Self {
            outbound,
            mut inbound,
        } = self;
        inbound.close();
        drop(outbound);
    }
}

// -- In-memory channels --

/// Channel factory backed by in-process queues. Every successful `open`
/// hands the server half to the paired [`MemoryServer`].
#[derive(Clone)]
pub struct MemoryChannelFactory {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    accepted: mpsc::UnboundedSender<MemoryPeer>,
    unavailable: AtomicBool,
}

/// Receives the server half of each channel a [`MemoryChannelFactory`] opens.
pub struct MemoryServer {
    accepted: mpsc::UnboundedReceiver<MemoryPeer>,
}

/// Server half of one in-memory channel.
pub struct MemoryPeer {
    pub scope: ConversationScope,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    replies: mpsc::UnboundedSender<ServerEvent>,
}

impl MemoryChannelFactory {
    pub fn new() -> (Self, MemoryServer) {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        let factory = Self {
            inner: Arc::new(MemoryInner {
                accepted: accepted_tx,
                unavailable: AtomicBool::new(false),
            }),
        };
        (
            factory,
            MemoryServer {
                accepted: accepted_rx,
            },
        )
    }

    /// While unavailable, every `open` fails as if the server were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::Release);
    }
}

impl ChannelFactory for MemoryChannelFactory {
    async fn open(&self, scope: &ConversationScope) -> Result<Channel, ChannelError> {
        if self.inner.unavailable.load(Ordering::Acquire) {
            return Err(ChannelError::Unavailable);
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        self.inner
            .accepted
            .send(MemoryPeer {
                scope: scope.clone(),
                events: outbound_rx,
                replies: inbound_tx,
            })
            .map_err(|_| ChannelError::Unavailable)?;

        debug!("memory channel opened for {}", scope);
        Ok(Channel::new(outbound_tx, inbound_rx))
    }
}

impl MemoryServer {
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accepted.recv().await
    }

    /// The next already-opened channel, without waiting.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.accepted.try_recv().ok()
    }
}

impl MemoryPeer {
    /// Next event the client transmitted; `None` once the client released the channel.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<ClientEvent> {
        self.events.try_recv().ok()
    }

    /// Deliver an event to the client. Returns false if the client is gone.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        self.replies.send(event).is_ok()
    }

    /// Whether the client has released its half.
    pub fn is_closed(&self) -> bool {
        self.replies.is_closed()
    }
}
