use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures opening or writing to a chat channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tungstenite::Error>),

    #[error("session token is not a valid cookie value")]
    InvalidCookie,

    #[error("channel unavailable")]
    Unavailable,

    #[error("channel closed")]
    Closed,
}

impl From<tungstenite::Error> for ChannelError {
    fn from(e: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

/// Why a composed message was not transmitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("message is empty")]
    Empty,

    #[error("no active chat channel")]
    NotConnected,

    #[error("message too long ({len} characters)")]
    TooLong { len: usize },
}

/// Failures talking to the REST side of the service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api url cannot carry a path: {0}")]
    BaseUrl(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid url: {source}")]
    Url {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("{var} must be a whole number of seconds, got {value:?}")]
    Number { var: &'static str, value: String },

    #[error("cannot derive a websocket url from {0}")]
    GatewayScheme(String),
}
