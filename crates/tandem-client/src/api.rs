use reqwest::header::COOKIE;
use tracing::debug;
use url::Url;

use tandem_types::api::{HistoryResponse, ProfileResponse};
use tandem_types::{LocalUser, UserId};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::history::HistorySource;

/// REST client for the parts of the service the chat depends on.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            session_token: config.session_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match &self.session_token {
            Some(token) => request.header(COOKIE, format!("token={}", token)),
            None => request,
        }
    }

    /// The signed-in user's profile, which the chat needs before joining.
    pub async fn fetch_profile(&self) -> Result<LocalUser, ApiError> {
        let url = self.endpoint(&["profile", "view"])?;
        debug!("GET {}", url);
        let profile = self
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<ProfileResponse>()
            .await?;
        Ok(profile.into())
    }
}

impl HistorySource for ApiClient {
    async fn fetch_history(&self, target_user_id: &UserId) -> Result<HistoryResponse, ApiError> {
        let url = self.endpoint(&["chat", target_user_id.as_str()])?;
        debug!("GET {}", url);
        let history = self
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<HistoryResponse>()
            .await?;
        Ok(history)
    }
}
