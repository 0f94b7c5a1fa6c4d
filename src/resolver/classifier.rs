//! Landing page anchor classification.
//!
//! Each anchor is matched against a fixed rule list, first match wins.
//! Anchors that need another network call are resolved concurrently and
//! appended once their call settles, so only the directly classified links
//! keep page order.

use crate::resolver::{
    fetch::{PageFetcher, PageRequest},
    types::StreamLink,
};
use futures::{FutureExt, StreamExt, future::BoxFuture, stream::FuturesUnordered};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};
use url::Url;

const EXCLUDED_HREF_MARKERS: [&str; 3] = ["telegram", "bloggingvector", "ampproject"];
const GPDL_HOSTS: [&str; 2] = ["gpdl.hubcdn.fans", "gpdl2.hubcdn.fans"];
const PIXEL_HUBCDN_HOST: &str = "pixel.hubcdn.fans";
const GAMERXYT_DL_PREFIX: &str = "gamerxyt.com/dl.php?link=";

static BUTTON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "a.btn[href], .btn-success.btn-lg.h6[href], .btn-danger[href], .btn-secondary[href]",
    )
    .expect("Invalid button selector")
});
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid anchor selector"));
static VIDEO_ANCHOR_SELECTORS: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        Selector::parse("a#vd").expect("Invalid a#vd selector"),
        Selector::parse("div.vd a").expect("Invalid div.vd selector"),
    ]
});

/// A download anchor as found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Trimmed visible text
    pub text: String,
}

impl Anchor {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// How a single anchor is handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Never emitted (Telegram, ad redirectors)
    Excluded,
    /// Emitted as is
    Direct(StreamLink),
    /// HEAD probe; the `link=` value of the final URL is the target
    HubCloudProbe(String),
    /// Resolved through the redirect microservice
    HubCdnRedirect(String),
    /// Resolved by reading the player anchor of the landing page
    HubCdnPage(String),
    /// No rule matched
    Miss,
}

/// Download candidates of a page, in document order.
///
/// Only download buttons count when the page has any; otherwise every
/// absolute http(s) anchor does.
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);

    let buttons = absolute_anchors(document.select(&BUTTON_SELECTOR));
    if !buttons.is_empty() {
        return buttons;
    }
    absolute_anchors(document.select(&ANCHOR_SELECTOR))
}

fn absolute_anchors<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<Anchor> {
    elements
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if !(href.starts_with("http://") || href.starts_with("https://")) {
                return None;
            }
            Some(Anchor::new(href, element_text(&element)))
        })
        .collect()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Apply the rule list to one anchor
pub fn classify_anchor(anchor: &Anchor) -> Classification {
    let href = anchor.href.as_str();
    let text = anchor.text.as_str();
    let text_lower = text.to_lowercase();

    if EXCLUDED_HREF_MARKERS.iter().any(|m| href.contains(m)) || text_lower.contains("telegram") {
        return Classification::Excluded;
    }

    // Button labels name the server outright
    if text.contains("PixeLServer") {
        return Classification::Direct(StreamLink::mkv("Pixeldrain", pixeldrain_api_link(href)));
    }
    if text.contains("FSL Server") || text.contains("FSLv2 Server") {
        return Classification::Direct(StreamLink::mkv("Cf Worker", href));
    }

    if href.contains(".dev") && !href.contains("/?id=") {
        return Classification::Direct(StreamLink::mkv("Cf Worker", href));
    }

    if href.contains("pixeld") {
        return Classification::Direct(StreamLink::mkv("Pixeldrain", pixeldrain_api_link(href)));
    }

    if href.contains("hubcloud") || href.contains("/?id=") {
        return Classification::HubCloudProbe(href.to_string());
    }

    if href.contains("cloudflarestorage") {
        return Classification::Direct(StreamLink::mkv("CfStorage", href));
    }

    if href.contains("fastdl") {
        return Classification::Direct(StreamLink::mkv("FastDl", href));
    }

    if href.contains("hubcdn") {
        if GPDL_HOSTS.iter().any(|host| href.contains(host)) {
            return Classification::HubCdnRedirect(href.to_string());
        }
        if href.contains(PIXEL_HUBCDN_HOST) {
            return Classification::HubCdnPage(href.to_string());
        }
        return Classification::Direct(StreamLink::mkv("HubCdn", href));
    }

    if href.contains("mega.hubcloud") || text_lower.contains("mega") {
        return Classification::Direct(StreamLink::mkv("Mega", href));
    }

    if href.contains("cloudserver") || text_lower.contains("zipdisk") {
        return Classification::Direct(StreamLink::new("ZipDisk", href, "zip"));
    }

    Classification::Miss
}

/// Rewrite a Pixeldrain share link to its `/api/file/<token>` download form.
///
/// The token is the last non-empty path segment; the query is dropped.
pub fn pixeldrain_api_link(href: &str) -> String {
    let Ok(url) = Url::parse(href) else {
        return href.to_string();
    };
    if url.path().starts_with("/api/") {
        return href.to_string();
    }

    let token = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last());
    let (Some(host), Some(token)) = (url.host_str(), token) else {
        return href.to_string();
    };

    match url.port() {
        Some(port) => format!("{}://{host}:{port}/api/file/{token}", url.scheme()),
        None => format!("{}://{host}/api/file/{token}", url.scheme()),
    }
}

/// Final URL out of the redirect microservice response.
///
/// Lookup order: `data.finalUrl`, `finalUrl`, `url`, then the document itself
/// when it is a bare string.
pub fn redirect_api_final_url(response: &Value) -> Option<String> {
    let url = response
        .pointer("/data/finalUrl")
        .and_then(Value::as_str)
        .or_else(|| response.get("finalUrl").and_then(Value::as_str))
        .or_else(|| response.get("url").and_then(Value::as_str))
        .or_else(|| response.as_str())
        .filter(|url| !url.is_empty())?;

    Some(match url.split_once(GAMERXYT_DL_PREFIX) {
        Some((_, target)) => target.to_string(),
        None => url.to_string(),
    })
}

/// Player anchor on a `pixel.hubcdn.fans` landing page
pub fn find_video_anchor(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    VIDEO_ANCHOR_SELECTORS.iter().find_map(|selector| {
        document
            .select(selector)
            .find_map(|element| element.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    })
}

/// Turns landing pages into [`StreamLink`]s
#[derive(Clone)]
pub struct LinkClassifier {
    fetcher: Arc<dyn PageFetcher>,
    redirect_api: String,
    pixel_referer: String,
}

impl LinkClassifier {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        redirect_api: impl Into<String>,
        pixel_referer: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            redirect_api: redirect_api.into(),
            pixel_referer: pixel_referer.into(),
        }
    }

    /// Classify every anchor of a landing page. Never fails.
    pub async fn classify_links(&self, html: &str) -> Vec<StreamLink> {
        let anchors = extract_anchors(html);
        let total = anchors.len();

        let mut links = Vec::new();
        let mut pending: FuturesUnordered<BoxFuture<'_, Option<StreamLink>>> =
            FuturesUnordered::new();
        let mut excluded = 0usize;
        let mut misses = 0usize;

        for anchor in anchors {
            match classify_anchor(&anchor) {
                Classification::Excluded => {
                    debug!("Skipping excluded link: {} ({})", anchor.text, anchor.href);
                    excluded += 1;
                }
                Classification::Direct(link) => {
                    debug!("Added {} link: {}", link.server, link.link);
                    links.push(link);
                }
                Classification::HubCloudProbe(href) => {
                    pending.push(self.probe_hubcloud(href).boxed());
                }
                Classification::HubCdnRedirect(href) => {
                    pending.push(self.resolve_hubcdn_redirect(href).boxed());
                }
                Classification::HubCdnPage(href) => {
                    pending.push(self.resolve_hubcdn_page(href).boxed());
                }
                Classification::Miss => misses += 1,
            }
        }

        let spawned = pending.len();
        while let Some(resolved) = pending.next().await {
            if let Some(link) = resolved {
                links.push(link);
            }
        }

        info!(
            "Classified {total} anchors: {} links, {spawned} secondary lookups, {excluded} excluded, {misses} unmatched",
            links.len()
        );

        links
    }

    async fn probe_hubcloud(&self, href: String) -> Option<StreamLink> {
        match self.fetcher.head_final_url(&href).await {
            Ok(final_url) => {
                let target = final_url
                    .split("link=")
                    .nth(1)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .unwrap_or(href);
                Some(StreamLink::mkv("hubcloud", target))
            }
            Err(e) => {
                debug!("HEAD probe of {href} failed: {e}");
                None
            }
        }
    }

    async fn resolve_hubcdn_redirect(&self, href: String) -> Option<StreamLink> {
        let api_url = format!("{}?url={}", self.redirect_api, urlencoding::encode(&href));

        match self.fetcher.get_json(&api_url).await {
            Ok(response) => {
                let target = redirect_api_final_url(&response);
                if target.is_none() {
                    debug!("Redirect API returned no URL for {href}");
                }
                target.map(|url| StreamLink::mkv("HubCdn", url))
            }
            Err(e) => {
                debug!("Redirect API failed for {href}: {e}");
                None
            }
        }
    }

    async fn resolve_hubcdn_page(&self, href: String) -> Option<StreamLink> {
        let request = PageRequest::browser()
            .with_referer(self.pixel_referer.clone())
            .require_success();

        match self.fetcher.get_text(&href, &request).await {
            Ok(body) => {
                let target = find_video_anchor(&body);
                if target.is_none() {
                    debug!("No player anchor on {href}");
                }
                target.map(|url| StreamLink::mkv("HubCdn", url))
            }
            Err(e) => {
                debug!("Could not load {href}: {e}");
                None
            }
        }
    }
}
