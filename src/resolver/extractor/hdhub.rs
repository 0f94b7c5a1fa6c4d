use super::DriveLocator;
use crate::resolver::{
    Result, ResolverError,
    cipher::base64_decode_str,
    fetch::{PageFetcher, PageRequest},
    patterns::PATTERNS,
    types::StreamLink,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const HUBCDN_HOST: &str = "hubcdn.fans";

/// Direct video URL hidden in a hubcdn page's `reurl`
pub fn hubcdn_direct_link(html: &str) -> Option<String> {
    let reurl = PATTERNS.find_reurl(html)?;
    let encoded = PATTERNS.reurl_param.captures(reurl)?.get(1)?.as_str();

    let decoded = match base64_decode_str(encoded) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("reurl parameter is not base64: {e}");
            return None;
        }
    };

    let link = PATTERNS
        .link_param
        .captures(&decoded)
        .and_then(|c| c.get(1))
        .map(|m| {
            urlencoding::decode(m.as_str())
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| m.as_str().to_string())
        })
        .unwrap_or(decoded);

    Some(link)
}

/// Stream links for HDHub episode links
#[derive(Clone)]
pub struct HdHubExtractor {
    fetcher: Arc<dyn PageFetcher>,
    locator: DriveLocator,
}

impl HdHubExtractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, locator: DriveLocator) -> Self {
        Self { fetcher, locator }
    }

    pub async fn extract(&self, link: &str) -> Result<Vec<StreamLink>> {
        info!("Extracting HDHub stream from {link}");

        if link.contains(HUBCDN_HOST) {
            let page = self.fetcher.get_text(link, &PageRequest::plain()).await?;
            if let Some(direct) = hubcdn_direct_link(&page) {
                return Ok(vec![StreamLink::new("HDHub4u Direct", direct, "mp4").copyable()]);
            }
            warn!("No direct link on {link}, trying the drive route");
        }

        let drive = if link.contains("hubdrive") || link.contains("hubcloud") {
            link.to_string()
        } else {
            self.locator
                .locate(link)
                .await?
                .ok_or_else(|| ResolverError::MissingToken("drive link".to_string()))?
        };
        debug!("Drive link: {drive}");

        let body = self.fetcher.get_text(&drive, &PageRequest::plain()).await?;
        if let Some(source) = PATTERNS.find_video_source(&body) {
            return Ok(vec![StreamLink::new("HDHub4u Stream", source, "mp4").copyable()]);
        }

        Ok(vec![StreamLink::new("HDHub4u Hubcloud", drive, "redirect").copyable()])
    }
}
