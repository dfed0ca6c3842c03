use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use tandem_types::{ClientEvent, ConversationScope, ServerEvent};

use crate::channel::{Channel, ChannelFactory};
use crate::config::ClientConfig;
use crate::error::ChannelError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens chat channels as WebSocket connections to the realtime gateway.
#[derive(Debug, Clone)]
pub struct WsChannelFactory {
    gateway_url: Url,
    session_token: Option<String>,
}

impl WsChannelFactory {
    pub fn new(gateway_url: Url, session_token: Option<String>) -> Self {
        Self {
            gateway_url,
            session_token,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.gateway_url.clone(), config.session_token.clone())
    }

    /// Gateway URL with the conversation pair in the query string.
    pub fn channel_url(&self, scope: &ConversationScope) -> Url {
        let mut url = self.gateway_url.clone();
        url.query_pairs_mut()
            .append_pair("userId", scope.local_user_id.as_str())
            .append_pair("targetUserId", scope.target_user_id.as_str());
        url
    }
}

impl ChannelFactory for WsChannelFactory {
    async fn open(&self, scope: &ConversationScope) -> Result<Channel, ChannelError> {
        let url = self.channel_url(scope);
        let mut request = url.as_str().into_client_request()?;

        if let Some(token) = &self.session_token {
            let cookie = HeaderValue::from_str(&format!("token={}", token))
                .map_err(|_| ChannelError::InvalidCookie)?;
            request.headers_mut().insert(COOKIE, cookie);
        }

        let (socket, _) = connect_async(request).await?;
        info!("chat channel open for {}", scope);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_channel_loop(
            socket,
            outbound_rx,
            inbound_tx,
            scope.clone(),
        ));

        Ok(Channel::new(outbound_tx, inbound_rx))
    }
}

/// Shuttles events between the socket and the channel's queues until
/// either side goes away. Releasing the `Channel` closes the outbound
/// queue, which sends a Close frame and ends the loop.
async fn run_channel_loop(
    socket: Socket,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    inbound: mpsc::UnboundedSender<ServerEvent>,
    scope: ConversationScope,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };

                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("{}: could not encode {}: {}", scope, event.name(), e);
                        continue;
                    }
                };
                debug!("{}: -> {}", scope, event.name());
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(text.as_str()) {
                            Ok(event) => {
                                debug!("{}: <- {}", scope, event.name());
                                if inbound.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                let raw: String = text.as_str().chars().take(200).collect();
                                warn!("{}: dropped bad frame: {} -- raw: {}", scope, e, raw);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("{}: channel error: {}", scope, e);
                        break;
                    }
                }
            }
        }
    }

    info!("chat channel closed for {}", scope);
}
