use regex::Regex;
use std::sync::LazyLock;

/// Marker preceding the link-page token
pub const LINK_TOKEN_START: &str = "s('o','";
/// Marker following the link-page token
pub const LINK_TOKEN_END: &str = "',180";

/// Pre-compiled regex patterns for the redirect and landing pages
pub struct Patterns {
    // Redirect pages
    pub wp_http_token: Regex, // ck('_wp_http_1','…')
    pub reurl: Regex,         // var reurl = "…"
    pub var_url: Regex,       // var url = '…';

    // Query fragments
    pub reurl_param: Regex, // ?r=<base64>
    pub link_param: Regex,  // &link=<encoded url>

    // Drive link fallbacks, tried in order (last match wins)
    pub drive_links: Vec<Regex>,

    // Player sources on drive pages, tried in order
    pub video_sources: Vec<Regex>,
}

impl Patterns {
    pub fn new() -> Self {
        Self {
            wp_http_token: Regex::new(r"ck\('_wp_http_\d+','([^']+)'")
                .expect("Invalid wp_http_token regex"),
            reurl: Regex::new(r#"var reurl = "([^"]+)""#).expect("Invalid reurl regex"),
            var_url: Regex::new(r"var\s+url\s*=\s*'([^']+)';").expect("Invalid var_url regex"),

            reurl_param: Regex::new(r"\?r=(.+)$").expect("Invalid reurl_param regex"),
            link_param: Regex::new(r"[?&]link=(.+)$").expect("Invalid link_param regex"),

            drive_links: vec![
                Regex::new(r#"href="(https://hubcloud\.[^/]+/drive/[^"]+)""#)
                    .expect("Invalid hubcloud drive regex"),
                Regex::new(r#"href="(https://[^"]*hubdrive[^"]*)""#)
                    .expect("Invalid hubdrive regex"),
                Regex::new(r#"href="(https://[^"]*drive[^"]*[a-zA-Z0-9]+)""#)
                    .expect("Invalid drive regex"),
            ],

            video_sources: vec![
                Regex::new(r#"sources:\s*\[\s*\{\s*file:\s*"([^"]+)""#)
                    .expect("Invalid sources regex"),
                Regex::new(r#"file:\s*"([^"]+\.mp4[^"]*)""#).expect("Invalid file regex"),
                Regex::new(r#"src:\s*"([^"]+\.mp4[^"]*)""#).expect("Invalid src regex"),
                Regex::new(r#""file":"([^"]+\.mp4[^"]*)""#).expect("Invalid json file regex"),
                Regex::new(r#""src":"([^"]+\.mp4[^"]*)""#).expect("Invalid json src regex"),
                Regex::new(r#"video[^>]*src="([^"]+\.mp4[^"]*)""#)
                    .expect("Invalid video tag regex"),
            ],
        }
    }

    /// Concatenate every `_wp_http_N` argument in page order
    pub fn collect_wp_http_token(&self, body: &str) -> String {
        self.wp_http_token
            .captures_iter(body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect()
    }

    /// `var reurl = "…"` value, if present
    pub fn find_reurl<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.reurl
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// First player source found on a drive page
    pub fn find_video_source<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.video_sources.iter().find_map(|pattern| {
            pattern
                .captures(body)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
        })
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global singleton for patterns
pub static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

/// Token between `s('o','` and `',180` on link pages
pub fn extract_link_token(body: &str) -> Option<&str> {
    body.split(LINK_TOKEN_START)
        .nth(1)?
        .split(LINK_TOKEN_END)
        .next()
        .filter(|token| !token.is_empty())
}
