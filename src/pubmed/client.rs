//! Rate-limited E-utilities HTTP transport.

use async_trait::async_trait;
use std::time::Duration;

use super::{Endpoint, Params, SearchError, Transport};
use crate::config::Config;
use crate::utils::{HttpClient, RateLimiter, DEFAULT_USER_AGENT};

/// NCBI E-utilities base URL
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Production [`Transport`] talking to NCBI E-utilities.
///
/// Every request first waits on the shared [`RateLimiter`], then carries the
/// configured `api_key`, `tool` and `email` parameters. Clones share both the
/// HTTP connection pool and the limiter state.
#[derive(Debug, Clone)]
pub struct EutilsClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    tool: Option<String>,
    email: Option<String>,
    limiter: RateLimiter,
}

impl EutilsClient {
    pub fn builder() -> EutilsClientBuilder {
        EutilsClientBuilder::default()
    }

    /// Build a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, SearchError> {
        let api_key = config.eutils.api_key().map(str::to_string);
        let spacing = config.rate_limits.spacing(api_key.is_some());

        let mut builder = Self::builder()
            .base_url(&config.eutils.base_url)
            .timeout(config.eutils.timeout())
            .rate_limiter(RateLimiter::new(spacing));
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        if let Some(tool) = &config.eutils.tool {
            builder = builder.tool(tool);
        }
        if let Some(email) = &config.eutils.email {
            builder = builder.email(email);
        }
        if let Some(user_agent) = &config.eutils.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.path()
        )
    }

    fn with_credentials(&self, mut params: Params) -> Params {
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        if let Some(tool) = &self.tool {
            params.push(("tool", tool.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
        params
    }
}

#[async_trait]
impl Transport for EutilsClient {
    async fn request(&self, endpoint: Endpoint, params: Params) -> Result<String, SearchError> {
        self.limiter.acquire().await;

        let url = self.url(endpoint);
        let params = self.with_credentials(params);
        tracing::debug!(endpoint = %endpoint, url = %url, "Issuing E-utilities request");

        let response = self
            .http
            .client()
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Transport {
                endpoint,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                "E-utilities request failed"
            );
            return Err(SearchError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| SearchError::Transport {
            endpoint,
            message: format!("Failed to read response: {}", e),
        })
    }
}

/// Builder for [`EutilsClient`]
#[derive(Debug, Clone)]
pub struct EutilsClientBuilder {
    base_url: String,
    api_key: Option<String>,
    tool: Option<String>,
    email: Option<String>,
    timeout: Duration,
    user_agent: String,
    limiter: Option<RateLimiter>,
}

impl Default for EutilsClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            tool: None,
            email: None,
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            limiter: None,
        }
    }
}

impl EutilsClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use an explicit limiter; by default one is chosen from the API key
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn build(self) -> Result<EutilsClient, SearchError> {
        let http = HttpClient::with_settings(&self.user_agent, self.timeout)
            .map_err(|e| SearchError::Client(e.to_string()))?;
        let api_key = self.api_key.filter(|k| !k.trim().is_empty());
        let limiter = self
            .limiter
            .unwrap_or_else(|| RateLimiter::for_api_key(api_key.is_some()));

        Ok(EutilsClient {
            http,
            base_url: self.base_url,
            api_key,
            tool: self.tool,
            email: self.email,
            limiter,
        })
    }
}
