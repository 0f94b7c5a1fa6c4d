use serde::{Deserialize, Serialize};

/// Site family an intermediate link was published by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    HubCloud,
    HdHub,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HubCloud => write!(f, "hubcloud"),
            Self::HdHub => write!(f, "hdhub"),
        }
    }
}

/// An intermediate URL together with the family it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub url: String,
    pub provider: Provider,
}

impl ResolutionRequest {
    pub fn new(url: impl Into<String>, provider: Provider) -> Self {
        Self {
            url: url.into(),
            provider,
        }
    }

    pub fn hubcloud(url: impl Into<String>) -> Self {
        Self::new(url, Provider::HubCloud)
    }

    pub fn hdhub(url: impl Into<String>) -> Self {
        Self::new(url, Provider::HdHub)
    }
}

/// Terminal output of a resolution: one direct link tagged by hosting server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamLink {
    /// Hosting server name (e.g., "Pixeldrain", "Cf Worker")
    pub server: String,
    /// Direct URL
    pub link: String,
    /// File extension or category ("mkv", "mp4", "zip", "redirect")
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether clients may offer the link for copying
    #[serde(default)]
    pub copyable: bool,
}

impl StreamLink {
    pub fn new(server: impl Into<String>, link: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            link: link.into(),
            kind: kind.into(),
            copyable: false,
        }
    }

    /// Shorthand for the common `mkv` download
    pub fn mkv(server: impl Into<String>, link: impl Into<String>) -> Self {
        Self::new(server, link, "mkv")
    }

    /// Builder pattern: mark as copyable
    #[must_use]
    pub fn copyable(mut self) -> Self {
        self.copyable = true;
        self
    }
}
