//! End-to-end runs against loopback servers: an axum app for the REST
//! endpoints and a bare tokio-tungstenite relay for the chat channel.

use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode, header::COOKIE};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use url::Url;

use tandem_client::{
    ApiClient, ChatView, ClientConfig, HistoryLoader, HistorySource, SessionState, ViewUpdate,
    WsChannelFactory,
};
use tandem_types::{ChatMessage, ClientEvent, ServerEvent, UserId};

const WAIT: Duration = Duration::from_secs(5);

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "token=secret")
}

async fn profile(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "_id": "ada",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "about": "first programmer"
    })))
}

async fn history(
    Path(target): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    match target.as_str() {
        "bob" => Ok(Json(json!({
            "messages": [
                { "senderId": { "firstName": "Bob", "lastName": "Builder" }, "text": "hey" },
                { "senderId": null, "text": "deleted account" }
            ]
        }))),
        "broken" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Ok(Json(json!({ "unexpected": true }))),
    }
}

async fn spawn_api() -> Url {
    let app = Router::new()
        .route("/profile/view", get(profile))
        .route("/chat/{target}", get(history));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

#[derive(Debug)]
enum Seen {
    Handshake { uri: String, cookie: Option<String> },
    Event(ClientEvent),
    Closed,
}

/// Accepts one connection, reports what it sees and echoes every
/// `sendMessage` back as `messageReceived`, preceded by a junk frame.
async fn spawn_gateway() -> (Url, mpsc::UnboundedReceiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();

        let mut handshake = None;
        let callback = |req: &Request, resp: Response| {
            handshake = Some(Seen::Handshake {
                uri: req.uri().to_string(),
                cookie: req
                    .headers()
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from),
            });
            Ok::<_, ErrorResponse>(resp)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();
        if let Some(handshake) = handshake {
            let _ = seen_tx.send(handshake);
        }

        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Text(text) => {
                    let event: ClientEvent = serde_json::from_str(text.as_str()).unwrap();
                    if let ClientEvent::SendMessage {
                        first_name,
                        last_name,
                        text,
                        ..
                    } = &event
                    {
                        let echo = ServerEvent::MessageReceived {
                            first_name: first_name.clone(),
                            last_name: last_name.clone(),
                            text: text.clone(),
                        };
                        ws.send(Message::Text("{not json".to_string().into())).await.unwrap();
                        ws.send(Message::Text(serde_json::to_string(&echo).unwrap().into()))
                            .await
                            .unwrap();
                    }
                    let _ = seen_tx.send(Seen::Event(event));
                }
                Message::Close(_) => {
                    let _ = seen_tx.send(Seen::Closed);
                    break;
                }
                _ => {}
            }
        }
    });

    (
        Url::parse(&format!("ws://{}/chat/socket", addr)).unwrap(),
        seen_rx,
    )
}

async fn next_seen(seen: &mut mpsc::UnboundedReceiver<Seen>) -> Seen {
    timeout(WAIT, seen.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn chat_round_trip_over_websocket() {
    let api_url = spawn_api().await;
    let (gateway_url, mut seen) = spawn_gateway().await;

    let mut config = ClientConfig::new(api_url).unwrap();
    config.gateway_url = gateway_url;
    config.session_token = Some("secret".into());

    let api = ApiClient::new(&config).unwrap();
    let me = api.fetch_profile().await.unwrap();
    assert_eq!(me.first_name, "Ada");

    let mut view = ChatView::new(
        WsChannelFactory::from_config(&config),
        api,
        Some(me.clone()),
        Some(UserId::new("bob")),
    );
    assert_eq!(view.mount().await, SessionState::Active);
    assert_eq!(
        view.messages(),
        [
            ChatMessage::new("Bob", "Builder", "hey"),
            ChatMessage::new("Unknown", "User", "deleted account"),
        ]
    );

    match next_seen(&mut seen).await {
        Seen::Handshake { uri, cookie } => {
            assert_eq!(uri, "/chat/socket?userId=ada&targetUserId=bob");
            assert_eq!(cookie.as_deref(), Some("token=secret"));
        }
        other => panic!("expected handshake, got {:?}", other),
    }
    match next_seen(&mut seen).await {
        Seen::Event(ClientEvent::JoinChat {
            first_name,
            user_id,
            target_user_id,
        }) => {
            assert_eq!(first_name, "Ada");
            assert_eq!(user_id, UserId::new("ada"));
            assert_eq!(target_user_id, UserId::new("bob"));
        }
        other => panic!("expected joinChat, got {:?}", other),
    }

    view.submit_text("  hi  ").unwrap();
    match next_seen(&mut seen).await {
        Seen::Event(ClientEvent::SendMessage { text, .. }) => assert_eq!(text, "hi"),
        other => panic!("expected sendMessage, got {:?}", other),
    }

    // The junk frame is dropped; the echo lands in the transcript.
    let update = timeout(WAIT, view.next_update()).await.unwrap();
    let own = ChatMessage::new("Ada", "Lovelace", "hi");
    assert_eq!(update, ViewUpdate::Message(own.clone()));
    assert!(own.is_from(&me));
    assert_eq!(view.messages().len(), 3);

    view.unmount();
    assert!(matches!(next_seen(&mut seen).await, Seen::Closed));
}

#[tokio::test]
async fn history_endpoint_failures_are_empty() {
    let api_url = spawn_api().await;
    let mut config = ClientConfig::new(api_url.clone()).unwrap();
    config.session_token = Some("secret".into());
    let loader = HistoryLoader::new(ApiClient::new(&config).unwrap());

    assert_eq!(loader.load(&UserId::new("bob")).await.len(), 2);
    assert!(loader.load(&UserId::new("broken")).await.is_empty());
    assert!(loader.load(&UserId::new("nobody")).await.is_empty());

    let anonymous = ApiClient::new(&ClientConfig::new(api_url).unwrap()).unwrap();
    assert!(anonymous.fetch_history(&UserId::new("bob")).await.is_err());
    assert!(anonymous.fetch_profile().await.is_err());
}

#[tokio::test]
async fn unreachable_services_degrade_quietly() {
    // Nothing listens on the discard port.
    let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
    config.http_timeout = Duration::from_secs(2);
    let api = ApiClient::new(&config).unwrap();

    let mut view = ChatView::new(
        WsChannelFactory::from_config(&config),
        api,
        Some(tandem_types::LocalUser {
            id: UserId::new("ada"),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }),
        Some(UserId::new("bob")),
    );

    assert_eq!(view.mount().await, SessionState::Connecting);
    assert!(view.messages().is_empty());
    assert!(view.error().is_none());
}
