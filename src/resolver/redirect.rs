use crate::resolver::{
    Result, ResolverError,
    cipher::decode_token,
    fetch::{PageFetcher, PageRequest},
    patterns::PATTERNS,
    payload::RedirectPayload,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Body text the blog page serves while the countdown is not accepted yet
pub const INVALID_REQUEST_SENTINEL: &str = "Invalid Request";
/// Total fetches of the intermediate URL
pub const MAX_ATTEMPTS: u32 = 5;
/// Pause between rejected fetches
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// What a blog page body says
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyVerdict {
    /// The page carries a `reurl` target
    Accepted(String),
    /// The site rejected the request for now
    TransientReject,
    /// Neither a target nor the sentinel
    Malformed,
}

impl BodyVerdict {
    /// Classify a blog page body
    pub fn of(body: &str) -> Self {
        if body.contains(INVALID_REQUEST_SENTINEL) {
            return Self::TransientReject;
        }

        match PATTERNS.find_reurl(body) {
            Some(reurl) => Self::Accepted(reurl.to_string()),
            None => Self::Malformed,
        }
    }
}

/// Outcome of a single hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    Accepted,
    TransientReject,
    Malformed,
    NetworkError,
}

/// One fetch of the intermediate URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectCandidate {
    /// 1-based attempt number
    pub hop: u32,
    pub url: String,
    pub outcome: HopOutcome,
}

/// Result of a redirect resolution with the hops it took
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectTrace {
    pub resolved: String,
    pub hops: Vec<RedirectCandidate>,
}

impl RedirectTrace {
    fn unresolved(original: &str) -> Self {
        Self {
            resolved: original.to_string(),
            hops: Vec::new(),
        }
    }
}

/// Follows the `_wp_http` redirect chain of the blog pages
#[derive(Clone)]
pub struct RedirectResolver {
    fetcher: Arc<dyn PageFetcher>,
}

impl RedirectResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch a redirect page, decode its payload and resolve it.
    ///
    /// Returns `link` unchanged when the chain cannot be followed.
    pub async fn resolve_page(&self, link: &str) -> String {
        match self.fetch_payload(link).await {
            Ok(payload) => self.resolve_redirect(&payload, link).await,
            Err(e) => {
                warn!("Could not read redirect payload from {link}: {e}");
                link.to_string()
            }
        }
    }

    /// Resolve a decoded payload; `original` is returned on failure
    pub async fn resolve_redirect(&self, payload: &RedirectPayload, original: &str) -> String {
        self.resolve_redirect_traced(payload, original).await.resolved
    }

    /// Resolve a decoded payload, keeping every hop
    pub async fn resolve_redirect_traced(
        &self,
        payload: &RedirectPayload,
        original: &str,
    ) -> RedirectTrace {
        let Some(intermediate) = payload.intermediate_url() else {
            warn!("Redirect payload for {original} lacks data or redirect base");
            return RedirectTrace::unresolved(original);
        };

        let wait = payload.wait_duration();
        debug!("Waiting {wait:?} before fetching {intermediate}");
        sleep(wait).await;

        let mut hops = Vec::with_capacity(MAX_ATTEMPTS as usize);

        for hop in 1..=MAX_ATTEMPTS {
            let body = match self.fetcher.get_text(&intermediate, &PageRequest::plain()).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Redirect hop {hop} to {intermediate} failed: {e}");
                    hops.push(candidate(hop, &intermediate, HopOutcome::NetworkError));
                    return RedirectTrace {
                        resolved: original.to_string(),
                        hops,
                    };
                }
            };

            match BodyVerdict::of(&body) {
                BodyVerdict::Accepted(reurl) => {
                    hops.push(candidate(hop, &intermediate, HopOutcome::Accepted));
                    info!("Redirect resolved after {hop} hop(s): {reurl}");
                    return RedirectTrace {
                        resolved: reurl,
                        hops,
                    };
                }
                BodyVerdict::Malformed => {
                    hops.push(candidate(hop, &intermediate, HopOutcome::Malformed));
                    debug!("No reurl on {intermediate}, using it as the target");
                    break;
                }
                BodyVerdict::TransientReject => {
                    hops.push(candidate(hop, &intermediate, HopOutcome::TransientReject));
                    if hop < MAX_ATTEMPTS {
                        debug!("Invalid request on hop {hop}, retrying in {RETRY_BACKOFF:?}");
                        sleep(RETRY_BACKOFF).await;
                    } else {
                        warn!("Giving up on {intermediate} after {MAX_ATTEMPTS} rejections");
                    }
                }
            }
        }

        RedirectTrace {
            resolved: intermediate,
            hops,
        }
    }

    async fn fetch_payload(&self, link: &str) -> Result<RedirectPayload> {
        let body = self.fetcher.get_text(link, &PageRequest::html()).await?;
        let token = PATTERNS.collect_wp_http_token(&body);

        if token.is_empty() {
            return Err(ResolverError::MissingToken("_wp_http".to_string()));
        }

        decode_token(&token)
    }
}

fn candidate(hop: u32, url: &str, outcome: HopOutcome) -> RedirectCandidate {
    RedirectCandidate {
        hop,
        url: url.to_string(),
        outcome,
    }
}
