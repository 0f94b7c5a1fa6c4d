use crate::resolver::{Result, ResolverError, manager::ResolverConfig};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header};
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// Which header set a request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderProfile {
    /// Short user agent only
    #[default]
    Plain,
    /// Short user agent plus an HTML `Accept`
    Html,
    /// Full desktop browser headers and the site cookie
    Browser,
    /// `Accept: application/json`
    Json,
}

/// Per-request options for [`PageFetcher::get_text`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub profile: HeaderProfile,
    /// Overrides the profile's `Referer`
    pub referer: Option<String>,
    /// Treat non-2xx responses as errors
    pub require_success: bool,
}

impl PageRequest {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn html() -> Self {
        Self {
            profile: HeaderProfile::Html,
            ..Self::default()
        }
    }

    pub fn browser() -> Self {
        Self {
            profile: HeaderProfile::Browser,
            ..Self::default()
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn require_success(mut self) -> Self {
        self.require_success = true;
        self
    }
}

/// Network capability the resolver depends on
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET a page and return its body
    async fn get_text(&self, url: &str, request: &PageRequest) -> Result<String>;

    /// HEAD a URL, following redirects, and return the final URL
    async fn head_final_url(&self, url: &str) -> Result<String>;

    /// GET a JSON document
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// Header values applied by each [`HeaderProfile`]
#[derive(Debug, Clone)]
struct HeaderSet {
    user_agent: String,
    browser_user_agent: String,
    accept: String,
    accept_language: String,
    referer: String,
    cookie: String,
}

/// reqwest-backed [`PageFetcher`]
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    headers: HeaderSet,
}

impl HttpFetcher {
    /// Create a fetcher from resolver configuration
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ResolverError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            headers: HeaderSet {
                user_agent: config.user_agent.clone(),
                browser_user_agent: config.browser_user_agent.clone(),
                accept: config.accept.clone(),
                accept_language: config.accept_language.clone(),
                referer: config.referer.clone(),
                cookie: config.cookie.clone(),
            },
        })
    }

    fn apply_profile(&self, builder: RequestBuilder, request: &PageRequest) -> RequestBuilder {
        let h = &self.headers;
        let builder = match request.profile {
            HeaderProfile::Plain => builder.header(header::USER_AGENT, &h.user_agent),
            HeaderProfile::Html => builder
                .header(header::USER_AGENT, &h.user_agent)
                .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            HeaderProfile::Browser => {
                let builder = builder
                    .header(header::USER_AGENT, &h.browser_user_agent)
                    .header(header::ACCEPT, &h.accept)
                    .header(header::ACCEPT_LANGUAGE, &h.accept_language)
                    .header(header::UPGRADE_INSECURE_REQUESTS, "1")
                    .header(header::COOKIE, &h.cookie);
                if request.referer.is_none() {
                    builder.header(header::REFERER, &h.referer)
                } else {
                    builder
                }
            }
            HeaderProfile::Json => builder.header(header::ACCEPT, "application/json"),
        };

        match &request.referer {
            Some(referer) => builder.header(header::REFERER, referer),
            None => builder,
        }
    }

    fn check_status(response: &reqwest::Response, url: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ResolverError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get_text(&self, url: &str, request: &PageRequest) -> Result<String> {
        trace!("GET {url} ({:?})", request.profile);
        let response = self
            .apply_profile(self.client.get(url), request)
            .send()
            .await?;

        if request.require_success {
            Self::check_status(&response, url)?;
        }

        Ok(response.text().await?)
    }

    async fn head_final_url(&self, url: &str) -> Result<String> {
        trace!("HEAD {url}");
        let response = self
            .apply_profile(self.client.head(url), &PageRequest::browser())
            .send()
            .await?;

        Ok(response.url().to_string())
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        trace!("GET {url} (json)");
        let request = PageRequest {
            profile: HeaderProfile::Json,
            ..PageRequest::default()
        };
        let response = self
            .apply_profile(self.client.get(url), &request)
            .send()
            .await?;

        Self::check_status(&response, url)?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ResolverError::Decode(format!("JSON parse error: {e}")))
    }
}
