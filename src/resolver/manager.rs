use crate::resolver::{
    Result, ResolverError,
    classifier::LinkClassifier,
    extractor::{DriveLocator, HdHubExtractor, HubCloudExtractor},
    fetch::{HttpFetcher, PageFetcher},
    redirect::RedirectResolver,
    types::{Provider, ResolutionRequest, StreamLink},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ResolverConfig {
    /// User agent for plain page fetches
    pub user_agent: String,
    /// User agent for the browser header profile
    pub browser_user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Default `Referer` of the browser profile
    #[validate(url)]
    pub referer: String,
    /// Cookie sent with the browser profile
    pub cookie: String,
    /// `Referer` for `pixel.hubcdn.fans` pages
    #[validate(url)]
    pub pixel_referer: String,
    /// Redirect microservice endpoint for `gpdl` hosts
    #[validate(url)]
    pub redirect_api: String,
    /// Per-request timeout
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    /// Ceiling on a whole resolution
    #[validate(range(min = 1))]
    pub resolve_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            browser_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            referer: "https://hubcloud.lol/".to_string(),
            cookie: "xyt=2; ads-counter-97455=0-1".to_string(),
            pixel_referer: "https://gamerxyt.com/".to_string(),
            redirect_api: "https://net-cookie-kacj.vercel.app/api/redirect".to_string(),
            request_timeout_secs: 30,
            resolve_timeout_secs: 60,
        }
    }
}

/// Entry point: intermediate link in, stream links out
#[derive(Clone)]
pub struct LinkResolver {
    hubcloud: HubCloudExtractor,
    hdhub: HdHubExtractor,
    resolve_timeout: Duration,
}

impl LinkResolver {
    /// Create a resolver backed by a reqwest client
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::with_fetcher(Arc::new(fetcher), config))
    }

    /// Create a resolver over any [`PageFetcher`]
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, config: &ResolverConfig) -> Self {
        let redirects = RedirectResolver::new(fetcher.clone());
        let locator = DriveLocator::new(fetcher.clone(), redirects);
        let classifier = LinkClassifier::new(
            fetcher.clone(),
            config.redirect_api.clone(),
            config.pixel_referer.clone(),
        );

        Self {
            hubcloud: HubCloudExtractor::new(fetcher.clone(), locator.clone(), classifier),
            hdhub: HdHubExtractor::new(fetcher, locator),
            resolve_timeout: Duration::from_secs(config.resolve_timeout_secs),
        }
    }

    /// Ceiling on a whole resolution
    pub fn resolve_timeout(&self) -> Duration {
        self.resolve_timeout
    }

    /// Resolve a link; failures and timeouts yield an empty list
    pub async fn resolve(&self, request: &ResolutionRequest) -> Vec<StreamLink> {
        match self.try_resolve(request).await {
            Ok(links) => links,
            Err(e) => {
                warn!("Resolution of {} ({}) failed: {e}", request.url, request.provider);
                Vec::new()
            }
        }
    }

    /// Resolve a link, surfacing the failure cause
    pub async fn try_resolve(&self, request: &ResolutionRequest) -> Result<Vec<StreamLink>> {
        info!("Resolving {} ({})", request.url, request.provider);

        let work = async {
            match request.provider {
                Provider::HubCloud => self.hubcloud.extract(&request.url).await,
                Provider::HdHub => self.hdhub.extract(&request.url).await,
            }
        };

        let links = tokio::time::timeout(self.resolve_timeout, work)
            .await
            .map_err(|_| ResolverError::Timeout(self.resolve_timeout))??;

        info!("Resolved {} link(s) from {}", links.len(), request.url);
        Ok(links)
    }
}
