use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://localhost:7777";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const GATEWAY_PATH: &str = "/chat/socket";

/// Where the client talks to and with which credentials.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub gateway_url: Url,
    /// Value of the `token` session cookie issued at login.
    pub session_token: Option<String>,
    pub http_timeout: Duration,
}

impl ClientConfig {
    /// Config pointing at `api_url`, with the gateway derived from it.
    pub fn new(api_url: Url) -> Result<Self, ConfigError> {
        let gateway_url = derive_gateway_url(&api_url)?;
        Ok(Self {
            api_url,
            gateway_url,
            session_token: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }

    /// Load from `TANDEM_*` environment variables, honouring a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_url(
            "TANDEM_API_URL",
            &lookup("TANDEM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
        )?;

        let mut config = Self::new(api_url)?;

        if let Some(raw) = lookup("TANDEM_GATEWAY_URL") {
            config.gateway_url = parse_url("TANDEM_GATEWAY_URL", &raw)?;
        }

        config.session_token = lookup("TANDEM_SESSION_TOKEN").filter(|t| !t.is_empty());

        if let Some(raw) = lookup("TANDEM_HTTP_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Number {
                var: "TANDEM_HTTP_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }

        debug!(
            "config: api={} gateway={} token={}",
            config.api_url,
            config.gateway_url,
            if config.session_token.is_some() { "set" } else { "unset" }
        );
        Ok(config)
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::Url { var, source })
}

fn derive_gateway_url(api_url: &Url) -> Result<Url, ConfigError> {
    let scheme = match api_url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(ConfigError::GatewayScheme(other.to_string())),
    };
    let mut gateway = api_url.clone();
    gateway
        .set_scheme(scheme)
        .map_err(|_| ConfigError::GatewayScheme(api_url.to_string()))?;
    gateway.set_path(GATEWAY_PATH);
    gateway.set_query(None);
    Ok(gateway)
}
