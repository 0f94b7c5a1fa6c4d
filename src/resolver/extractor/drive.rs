use crate::resolver::{
    Result, ResolverError,
    cipher::decode_token,
    fetch::{PageFetcher, PageRequest},
    patterns::{PATTERNS, extract_link_token},
    payload::LinkEnvelope,
    redirect::RedirectResolver,
};
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

static H3_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("Invalid h3 selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Invalid anchor selector"));
static HREF_SELECTORS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        Selector::parse(r#"a[href*="hubdrive"]"#).expect("Invalid hubdrive selector"),
        Selector::parse(r#"a[href*="hubcloud"]"#).expect("Invalid hubcloud selector"),
        Selector::parse(r#"a[href*="drive"]"#).expect("Invalid drive selector"),
    ]
});

/// Whether a redirect target already is a drive page
pub fn is_drive_link(link: &str) -> bool {
    link.contains("hubcloud") && link.contains("/drive/")
}

/// Locate the drive link on a redirect landing page.
///
/// Tries the 1080p heading first, then hubdrive, hubcloud and generic drive
/// anchors, then raw markup patterns (last occurrence wins).
pub fn find_drive_link(html: &str) -> Option<String> {
    if let Some(link) = find_drive_anchor(html) {
        return Some(link);
    }

    PATTERNS.drive_links.iter().find_map(|pattern| {
        pattern
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .last()
            .map(|m| m.as_str().to_string())
    })
}

fn find_drive_anchor(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let from_heading = document
        .select(&H3_SELECTOR)
        .filter(|h3| h3.text().collect::<String>().contains("1080p"))
        .find_map(|h3| {
            h3.select(&ANCHOR_SELECTOR)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
        })
        .filter(|link| !link.is_empty());

    from_heading.or_else(|| {
        HREF_SELECTORS.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .filter(|link| !link.is_empty())
                .map(str::to_string)
        })
    })
}

/// Follows an obfuscated link page through the blog redirect to a drive link
#[derive(Clone)]
pub struct DriveLocator {
    fetcher: Arc<dyn PageFetcher>,
    redirects: RedirectResolver,
}

impl DriveLocator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, redirects: RedirectResolver) -> Self {
        Self { fetcher, redirects }
    }

    /// Decode the `s('o', …)` token on `link` and follow it to a drive link.
    ///
    /// `Ok(None)` means the chain completed but no drive link was on the
    /// final page.
    pub async fn locate(&self, link: &str) -> Result<Option<String>> {
        let body = self.fetcher.get_text(link, &PageRequest::plain()).await?;
        let token = extract_link_token(&body)
            .ok_or_else(|| ResolverError::MissingToken("s('o', …)".to_string()))?;

        let envelope: LinkEnvelope = decode_token(token)?;
        let next_hop = envelope.next_hop()?;
        debug!("Link token of {link} points to {next_hop}");

        let redirect = self.redirects.resolve_page(&next_hop).await;
        if is_drive_link(&redirect) {
            info!("Redirect landed on drive link {redirect}");
            return Ok(Some(redirect));
        }

        let landing = self.fetcher.get_text(&redirect, &PageRequest::plain()).await?;
        let drive = find_drive_link(&landing);
        match &drive {
            Some(drive) => info!("Found drive link {drive} on {redirect}"),
            None => debug!("No drive link on {redirect}"),
        }

        Ok(drive)
    }
}
