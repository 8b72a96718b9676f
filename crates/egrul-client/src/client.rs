//! Two-step register search over HTTP

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::EgrulConfig;
use crate::error::{EgrulError, EgrulResult};
use crate::model::{SearchResult, SearchToken};

/// Range of the cache-busting `r` query parameter (14 digits)
const RANDOM_PARAM_MIN: u64 = 10_000_000_000_000;
const RANDOM_PARAM_MAX: u64 = 99_999_999_999_999;

/// Anything that can resolve an INN to the full name of the organisation's head
#[async_trait]
pub trait DirectorLookup: Send + Sync {
    /// `Ok(None)` when the register has no usable answer for this INN
    async fn find_director(&self, inn: &str) -> EgrulResult<Option<String>>;
}

#[async_trait]
impl<T: DirectorLookup + ?Sized> DirectorLookup for &T {
    async fn find_director(&self, inn: &str) -> EgrulResult<Option<String>> {
        (**self).find_director(inn).await
    }
}

/// HTTP client for the register search
pub struct EgrulClient {
    client: Client,
    config: EgrulConfig,
}

impl EgrulClient {
    /// Create a new client
    pub fn new(config: EgrulConfig) -> EgrulResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Client configuration
    pub fn config(&self) -> &EgrulConfig {
        &self.config
    }

    /// Submit the search form and return the result token, if one was issued
    pub async fn search_token(&self, inn: &str) -> EgrulResult<Option<String>> {
        let url = format!("{}/", self.config.base_url);
        let form = [
            ("vyp3CaptchaToken", ""),
            ("page", ""),
            ("query", inn),
            ("region", ""),
            ("PreventChromeAutocomplete", ""),
        ];

        debug!(%inn, %url, "requesting search token");
        let response = self.client.post(&url).form(&form).send().await?;
        let body: SearchToken = Self::decode(response).await?;

        Ok(body.token().map(str::to_string))
    }

    /// Fetch the result page for a token
    pub async fn search_result(&self, token: &str, inn: &str) -> EgrulResult<SearchResult> {
        let url = format!("{}/search-result/{}", self.config.base_url, token);
        let random_param = rand::thread_rng().gen_range(RANDOM_PARAM_MIN..=RANDOM_PARAM_MAX);

        debug!(%inn, %url, "requesting search result");
        let response = self
            .client
            .get(&url)
            .query(&[("r", random_param.to_string().as_str()), ("_", inn)])
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> EgrulResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(EgrulError::Status {
                status,
                url: response.url().to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DirectorLookup for EgrulClient {
    async fn find_director(&self, inn: &str) -> EgrulResult<Option<String>> {
        let Some(token) = self.search_token(inn).await? else {
            info!(%inn, "register issued no search token");
            return Ok(None);
        };

        if !self.config.token_delay.is_zero() {
            tokio::time::sleep(self.config.token_delay).await;
        }

        let result = self.search_result(&token, inn).await?;
        let Some(first_row) = result.rows.first() else {
            info!(%inn, "register returned no rows");
            return Ok(None);
        };

        Ok(first_row.g.as_deref().and_then(parse_director))
    }
}

/// Extract the person from a `"POSITION: Surname Name Patronymic"` string.
///
/// Only the first colon separates; anything after it is the name.
pub fn parse_director(head: &str) -> Option<String> {
    let (_, name) = head.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
