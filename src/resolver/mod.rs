mod cipher;
mod classifier;
mod extractor;
mod fetch;
mod manager;
mod patterns;
mod payload;
mod redirect;
mod types;

#[cfg(test)]
mod tests;

pub use cipher::{base64_decode, base64_decode_str, decode_token, encode_token, obfuscate, rot13};
pub use classifier::{Anchor, Classification, LinkClassifier, classify_anchor, extract_anchors};
pub use extractor::{DriveLocator, HdHubExtractor, HubCloudExtractor};
pub use fetch::{HeaderProfile, HttpFetcher, PageFetcher, PageRequest};
pub use manager::{LinkResolver, ResolverConfig};
pub use payload::{LinkEnvelope, RedirectPayload};
pub use redirect::{BodyVerdict, HopOutcome, RedirectCandidate, RedirectResolver, RedirectTrace};
pub use types::{Provider, ResolutionRequest, StreamLink};

use std::time::Duration;

/// Resolver result type
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Resolver error types
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Token not found: {0}")]
    MissingToken(String),

    #[error("Resolution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}
