use super::{DriveLocator, absolutize, origin_of};
use crate::resolver::{
    Result,
    cipher::base64_decode_str,
    classifier::LinkClassifier,
    fetch::{PageFetcher, PageRequest},
    patterns::PATTERNS,
    types::StreamLink,
};
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

const TOKEN_LINK_MARKER: &str = "/?id=";
const GAMERXYT_PAGE: &str = "gamerxyt.com/hubcloud.php";

static DOWNLOAD_ICON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".fa-file-download.fa-lg").expect("Invalid download icon selector")
});

/// Next hop out of a HubCloud file page.
///
/// Order: base64 of the `r=` part of `var url`, the raw `var url`, the parent
/// link of the download icon. Relative results are joined onto `origin`.
pub fn next_hop(html: &str, origin: &str) -> Option<String> {
    let hop = PATTERNS
        .var_url
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .map(|raw| {
            raw.split_once("r=")
                .and_then(|(_, encoded)| base64_decode_str(encoded).ok())
                .filter(|decoded| !decoded.is_empty())
                .unwrap_or_else(|| raw.to_string())
        })
        .or_else(|| download_icon_link(html))?;

    Some(absolutize(&hop, origin))
}

fn download_icon_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&DOWNLOAD_ICON_SELECTOR)
        .filter_map(|icon| icon.parent())
        .filter_map(|parent| parent.value().as_element()?.attr("href"))
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

/// Stream links out of a HubCloud file page
#[derive(Clone)]
pub struct HubCloudExtractor {
    fetcher: Arc<dyn PageFetcher>,
    locator: DriveLocator,
    classifier: LinkClassifier,
}

impl HubCloudExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        locator: DriveLocator,
        classifier: LinkClassifier,
    ) -> Self {
        Self {
            fetcher,
            locator,
            classifier,
        }
    }

    pub async fn extract(&self, link: &str) -> Result<Vec<StreamLink>> {
        info!("Extracting HubCloud links from {link}");
        let origin = origin_of(link);

        if link.contains(TOKEN_LINK_MARKER) {
            match self.locator.locate(link).await {
                Ok(Some(drive)) => return Ok(vec![StreamLink::mkv("HubCloud", drive)]),
                Ok(None) => debug!("No drive link behind {link}, reading the page directly"),
                Err(e) => warn!("Token link {link} could not be followed: {e}"),
            }
        }

        let page = self
            .fetcher
            .get_text(link, &PageRequest::browser().require_success())
            .await?;
        let hop = next_hop(&page, &origin).unwrap_or_else(|| link.to_string());
        debug!("Next hop for {link}: {hop}");

        if hop.contains(GAMERXYT_PAGE) {
            let request = PageRequest::browser()
                .with_referer(origin.clone())
                .require_success();
            match self.fetcher.get_text(&hop, &request).await {
                Ok(body) => return Ok(self.classifier.classify_links(&body).await),
                Err(e) => warn!("Download page {hop} failed, trying it as a plain page: {e}"),
            }
        }

        let landing = self
            .fetcher
            .get_text(&hop, &PageRequest::browser().require_success())
            .await?;

        Ok(self.classifier.classify_links(&landing).await)
    }
}
