//! Resolver integration tests

#[cfg(test)]
mod support {
    use crate::resolver::{
        PageFetcher, PageRequest, Result, ResolverError,
        cipher::{encode_token, obfuscate},
    };
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Canned responses keyed by URL; repeated GETs walk through the bodies
    /// registered for a URL and then keep returning the last one.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: HashMap<String, Vec<String>>,
        heads: HashMap<String, String>,
        json: HashMap<String, Value>,
        stalled: HashSet<String>,
        calls: Mutex<Vec<(String, PageRequest)>>,
    }

    impl StubFetcher {
        pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages
                .entry(url.to_string())
                .or_default()
                .push(body.into());
            self
        }

        pub fn head(mut self, url: &str, final_url: &str) -> Self {
            self.heads.insert(url.to_string(), final_url.to_string());
            self
        }

        pub fn json(mut self, url: &str, value: Value) -> Self {
            self.json.insert(url.to_string(), value);
            self
        }

        pub fn stall(mut self, url: &str) -> Self {
            self.stalled.insert(url.to_string());
            self
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(called, _)| called == url)
                .count()
        }

        pub fn requests_to(&self, url: &str) -> Vec<PageRequest> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(called, _)| called == url)
                .map(|(_, request)| request.clone())
                .collect()
        }

        fn record(&self, url: &str, request: PageRequest) -> usize {
            let mut calls = self.calls.lock().unwrap();
            let previous = calls.iter().filter(|(called, _)| called == url).count();
            calls.push((url.to_string(), request));
            previous
        }

        fn not_found(url: &str) -> ResolverError {
            ResolverError::Status {
                status: 404,
                url: url.to_string(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn get_text(&self, url: &str, request: &PageRequest) -> Result<String> {
            let previous = self.record(url, request.clone());

            if self.stalled.contains(url) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }

            let bodies = self.pages.get(url).ok_or_else(|| Self::not_found(url))?;
            Ok(bodies[previous.min(bodies.len() - 1)].clone())
        }

        async fn head_final_url(&self, url: &str) -> Result<String> {
            self.record(url, PageRequest::browser());
            self.heads.get(url).cloned().ok_or_else(|| Self::not_found(url))
        }

        async fn get_json(&self, url: &str) -> Result<Value> {
            self.record(url, PageRequest::default());
            self.json.get(url).cloned().ok_or_else(|| Self::not_found(url))
        }
    }

    /// Wrap a JSON document the way the sites do
    pub fn site_token(value: &Value) -> String {
        encode_token(&encode_token(&obfuscate(value.to_string().as_bytes())))
    }

    /// Redirect page carrying `value` split across two `ck()` calls
    pub fn redirect_page(value: &Value) -> String {
        let token = site_token(value);
        let (head, tail) = token.split_at(token.len() / 2);
        format!("<script>ck('_wp_http_1','{head}');ck('_wp_http_2','{tail}');</script>")
    }

    /// Link page whose envelope points at `next_hop`
    pub fn link_page(next_hop: &str) -> String {
        let envelope = serde_json::json!({ "o": encode_token(next_hop) });
        format!("<script>s('o','{}',180);</script>", site_token(&envelope))
    }

    pub fn reurl_page(target: &str) -> String {
        format!(r#"<script>var reurl = "{target}";</script>"#)
    }
}

#[cfg(test)]
mod redirect_tests {
    use super::support::{StubFetcher, redirect_page, reurl_page};
    use crate::resolver::{
        HopOutcome, RedirectPayload, RedirectResolver, redirect::INVALID_REQUEST_SENTINEL,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const BLOG: &str = "https://blog.example/post";
    // "abc" under one base64 layer
    const INTERMEDIATE: &str = "https://blog.example/r?re=YWJj";

    fn payload(total_time: i64) -> RedirectPayload {
        serde_json::from_value(json!({
            "data": "abc",
            "wp_http1": "https://blog.example/r",
            "total_time": total_time,
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_five_rejections() {
        let stub = Arc::new(StubFetcher::default().page(INTERMEDIATE, INVALID_REQUEST_SENTINEL));
        let resolver = RedirectResolver::new(stub.clone());

        let started = Instant::now();
        let trace = resolver.resolve_redirect_traced(&payload(0), BLOG).await;
        let elapsed = started.elapsed();

        assert_eq!(stub.calls_to(INTERMEDIATE), 5);
        assert_eq!(trace.hops.len(), 5);
        assert!(trace.hops.iter().all(|h| h.outcome == HopOutcome::TransientReject));
        assert_eq!(trace.resolved, INTERMEDIATE);

        // 3s wait, then four 2s pauses; none after the last rejection
        assert!(elapsed >= Duration::from_secs(11));
        assert!(elapsed < Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepts_reurl_after_rejections() {
        let stub = Arc::new(
            StubFetcher::default()
                .page(INTERMEDIATE, INVALID_REQUEST_SENTINEL)
                .page(INTERMEDIATE, INVALID_REQUEST_SENTINEL)
                .page(INTERMEDIATE, reurl_page("https://vcloud.example/abc")),
        );
        let resolver = RedirectResolver::new(stub.clone());

        let trace = resolver.resolve_redirect_traced(&payload(0), BLOG).await;

        assert_eq!(trace.resolved, "https://vcloud.example/abc");
        let outcomes: Vec<_> = trace.hops.iter().map(|h| h.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                HopOutcome::TransientReject,
                HopOutcome::TransientReject,
                HopOutcome::Accepted
            ]
        );
        assert_eq!(trace.hops[2].hop, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_stops_the_loop() {
        let stub = Arc::new(StubFetcher::default().page(INTERMEDIATE, "<html>moved</html>"));
        let resolver = RedirectResolver::new(stub.clone());

        let trace = resolver.resolve_redirect_traced(&payload(0), BLOG).await;

        assert_eq!(stub.calls_to(INTERMEDIATE), 1);
        assert_eq!(trace.hops[0].outcome, HopOutcome::Malformed);
        assert_eq!(trace.resolved, INTERMEDIATE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_returns_original() {
        let stub = Arc::new(StubFetcher::default());
        let resolver = RedirectResolver::new(stub.clone());

        let trace = resolver.resolve_redirect_traced(&payload(0), BLOG).await;

        assert_eq!(trace.resolved, BLOG);
        assert_eq!(trace.hops.len(), 1);
        assert_eq!(trace.hops[0].outcome, HopOutcome::NetworkError);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_never_skipped() {
        for (total_time, expected) in [(-10, 3), (0, 3), (5, 8)] {
            let stub = Arc::new(
                StubFetcher::default().page(INTERMEDIATE, reurl_page("https://vcloud.example/x")),
            );
            let resolver = RedirectResolver::new(stub.clone());

            let started = Instant::now();
            resolver.resolve_redirect(&payload(total_time), BLOG).await;
            let elapsed = started.elapsed();

            assert!(elapsed >= Duration::from_secs(expected), "total_time {total_time}");
            assert!(elapsed < Duration::from_secs(expected + 1), "total_time {total_time}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_payload_is_not_fetched() {
        let stub = Arc::new(StubFetcher::default());
        let resolver = RedirectResolver::new(stub.clone());
        let payload: RedirectPayload =
            serde_json::from_value(json!({ "wp_http1": "https://blog.example/r" })).unwrap();

        assert_eq!(resolver.resolve_redirect(&payload, BLOG).await, BLOG);
        assert_eq!(stub.calls_to(INTERMEDIATE), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_page_decodes_wp_http_token() {
        let page = redirect_page(&json!({
            "data": "abc",
            "wp_http1": "https://blog.example/r",
            "total_time": "2",
        }));
        let stub = Arc::new(
            StubFetcher::default()
                .page(BLOG, page)
                .page(INTERMEDIATE, reurl_page("https://hubcloud.one/drive/xyz")),
        );
        let resolver = RedirectResolver::new(stub.clone());

        assert_eq!(
            resolver.resolve_page(BLOG).await,
            "https://hubcloud.one/drive/xyz"
        );
    }

    #[tokio::test]
    async fn test_resolve_page_without_token_returns_link() {
        let stub = Arc::new(StubFetcher::default().page(BLOG, "<html></html>"));
        let resolver = RedirectResolver::new(stub.clone());

        assert_eq!(resolver.resolve_page(BLOG).await, BLOG);
        assert_eq!(stub.calls_to(INTERMEDIATE), 0);
    }
}

#[cfg(test)]
mod classifier_tests {
    use super::support::StubFetcher;
    use crate::resolver::{
        Anchor, Classification, LinkClassifier, StreamLink, classify_anchor,
        classifier::{find_video_anchor, pixeldrain_api_link, redirect_api_final_url},
        extract_anchors,
    };
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    const REDIRECT_API: &str = "https://redirect.example/api/redirect";
    const PIXEL_REFERER: &str = "https://gamerxyt.com/";

    fn classifier(stub: Arc<StubFetcher>) -> LinkClassifier {
        LinkClassifier::new(stub, REDIRECT_API, PIXEL_REFERER)
    }

    fn server_of(href: &str, text: &str) -> Option<String> {
        match classify_anchor(&Anchor::new(href, text)) {
            Classification::Direct(link) => Some(link.server),
            Classification::HubCloudProbe(_) => Some("probe".to_string()),
            Classification::HubCdnRedirect(_) => Some("hubcdn-redirect".to_string()),
            Classification::HubCdnPage(_) => Some("hubcdn-page".to_string()),
            Classification::Excluded => Some("excluded".to_string()),
            Classification::Miss => None,
        }
    }

    fn api_url(href: &str) -> String {
        format!("{REDIRECT_API}?url={}", urlencoding::encode(href))
    }

    #[test]
    fn test_rule_priority_pairs() {
        let cases = [
            // .dev before pixeld, unless it is a token link
            ("https://pixeldrain.dev/file/1", "Download", "Cf Worker"),
            ("https://x.dev/?id=1", "Download", "probe"),
            // .dev before hubcloud, cloudflarestorage, fastdl and hubcdn
            ("https://x.dev/hubcloud", "Download", "Cf Worker"),
            ("https://x.dev/cloudflarestorage", "Download", "Cf Worker"),
            ("https://fastdl.dev/a", "Download", "Cf Worker"),
            ("https://hubcdn.dev/a", "Download", "Cf Worker"),
            // pixeld before hubcloud, cloudflarestorage and fastdl
            ("https://pixeldrain.com/u/a?via=hubcloud", "Download", "Pixeldrain"),
            ("https://pixeldrain.com/u/a?s=cloudflarestorage", "Download", "Pixeldrain"),
            ("https://pixeldrain.com/u/a?fastdl=1", "Download", "Pixeldrain"),
            ("https://pixeldrain.com/u/a?hubcdn", "Download", "Pixeldrain"),
            // hubcloud before cloudflarestorage, fastdl and hubcdn
            ("https://hubcloud.one/cloudflarestorage", "Download", "probe"),
            ("https://hubcloud.one/fastdl", "Download", "probe"),
            ("https://hubcloud.one/hubcdn", "Download", "probe"),
            // cloudflarestorage before fastdl and hubcdn
            ("https://r2.cloudflarestorage.com/fastdl", "Download", "CfStorage"),
            ("https://r2.cloudflarestorage.com/hubcdn", "Download", "CfStorage"),
            // fastdl before hubcdn
            ("https://fastdl.hubcdn.fans/a", "Download", "FastDl"),
            // hubcdn before mega and zipdisk
            ("https://cdn.hubcdn.fans/a", "Mega", "HubCdn"),
            ("https://cdn.hubcdn.fans/cloudserver", "Download", "HubCdn"),
            ("https://gpdl.hubcdn.fans/a", "Download", "hubcdn-redirect"),
            ("https://gpdl2.hubcdn.fans/a", "Download", "hubcdn-redirect"),
            ("https://pixel.hubcdn.fans/a", "Download", "hubcdn-page"),
            // mega before zipdisk
            ("https://files.example/cloudserver", "Mega Download", "Mega"),
            ("https://files.example/cloudserver", "Download", "ZipDisk"),
            ("https://files.example/a", "ZipDisk", "ZipDisk"),
        ];

        for (href, text, expected) in cases {
            assert_eq!(
                server_of(href, text).as_deref(),
                Some(expected),
                "{href} ({text})"
            );
        }
    }

    #[test]
    fn test_button_labels_override_href() {
        assert_eq!(
            server_of("https://pixeldrain.dev/u/abc", "PixeLServer").as_deref(),
            Some("Pixeldrain")
        );
        assert_eq!(
            server_of("https://fsl.example/a.mkv", "FSLv2 Server").as_deref(),
            Some("Cf Worker")
        );
    }

    #[test]
    fn test_exclusion_wins_over_everything() {
        let cases = [
            ("https://telegram.pixeldrain.dev/u/a", "PixeLServer"),
            ("https://fastdl.example/a", "Join Telegram"),
            ("https://bloggingvector.shop/hubcloud", "Download"),
            ("https://cdn.ampproject.org/c/s/hubcdn.fans", "Download"),
        ];

        for (href, text) in cases {
            assert_eq!(
                classify_anchor(&Anchor::new(href, text)),
                Classification::Excluded,
                "{href}"
            );
        }
    }

    #[test]
    fn test_unmatched_anchor_is_a_miss() {
        assert_eq!(
            classify_anchor(&Anchor::new("https://example.com/about", "About")),
            Classification::Miss
        );
    }

    #[test]
    fn test_extract_anchors_skips_relative_links() {
        let html = r##"
            <a href="/relative">Rel</a>
            <a href="#top">Top</a>
            <a href=" https://a.example/x "> Spaced </a>
            <a>No href</a>
        "##;
        assert_eq!(
            extract_anchors(html),
            vec![Anchor::new("https://a.example/x", "Spaced")]
        );
    }

    #[test]
    fn test_pixeldrain_api_link() {
        assert_eq!(
            pixeldrain_api_link("https://pixeldrain.dev/u/abc123?x=1"),
            "https://pixeldrain.dev/api/file/abc123"
        );
        assert_eq!(
            pixeldrain_api_link("https://pixeldrain.com/api/file/abc"),
            "https://pixeldrain.com/api/file/abc"
        );
        assert_eq!(
            pixeldrain_api_link("https://pixeldrain.com/l/abc"),
            "https://pixeldrain.com/api/file/abc"
        );
        assert_eq!(
            pixeldrain_api_link("https://pixeldrain.com/abc123"),
            "https://pixeldrain.com/api/file/abc123"
        );
        assert_eq!(
            pixeldrain_api_link("https://pixeldrain.com/l/abc?x=1"),
            "https://pixeldrain.com/api/file/abc"
        );
        assert_eq!(
            pixeldrain_api_link("https://pixeldrain.com/u/abc/"),
            "https://pixeldrain.com/api/file/abc"
        );
    }

    #[test]
    fn test_redirect_api_final_url_lookup_order() {
        assert_eq!(
            redirect_api_final_url(&json!({
                "data": { "finalUrl": "https://a.example/1" },
                "finalUrl": "https://b.example/2",
            }))
            .as_deref(),
            Some("https://a.example/1")
        );
        assert_eq!(
            redirect_api_final_url(&json!({ "url": "https://c.example/3" })).as_deref(),
            Some("https://c.example/3")
        );
        assert_eq!(
            redirect_api_final_url(&json!("https://gamerxyt.com/dl.php?link=https://d.example/4"))
                .as_deref(),
            Some("https://d.example/4")
        );
        assert_eq!(redirect_api_final_url(&json!({ "ok": false })), None);
    }

    #[test]
    fn test_find_video_anchor() {
        assert_eq!(
            find_video_anchor(r#"<a id="vd" href="https://cdn.example/a.mkv">Play</a>"#).as_deref(),
            Some("https://cdn.example/a.mkv")
        );
        assert_eq!(
            find_video_anchor(r#"<div class="vd"><a href="https://cdn.example/b.mkv">b</a></div>"#)
                .as_deref(),
            Some("https://cdn.example/b.mkv")
        );
        assert_eq!(find_video_anchor("<a href=\"https://x.example\">x</a>"), None);
    }

    #[test]
    fn test_extract_anchors_prefers_download_buttons() {
        let html = r#"
            <nav><a href="https://hubcloud.one/">HubCloud</a></nav>
            <a href="https://blog.example/megathread">Megathread</a>
            <a class="btn btn-success" href="https://fastdl.example/x.mkv">Download [FastDl]</a>
            <span class="btn-danger" href="https://r2.cloudflarestorage.com/x">Download</span>
            <footer><a href="https://t.example/about">About</a></footer>
        "#;

        assert_eq!(
            extract_anchors(html),
            vec![
                Anchor::new("https://fastdl.example/x.mkv", "Download [FastDl]"),
                Anchor::new("https://r2.cloudflarestorage.com/x", "Download"),
            ]
        );
    }

    #[tokio::test]
    async fn test_navigation_links_are_not_classified() {
        let html = r#"
            <a href="https://hubcloud.one/">HubCloud</a>
            <a href="https://blog.example/megathread">Megathread</a>
            <a class="btn" href="https://fastdl.example/x.mkv">Download [FastDl]</a>
        "#;
        let stub = Arc::new(StubFetcher::default());

        let links = classifier(stub.clone()).classify_links(html).await;

        assert_eq!(
            links,
            vec![StreamLink::mkv("FastDl", "https://fastdl.example/x.mkv")]
        );
        assert_eq!(stub.calls_to("https://hubcloud.one/"), 0);
    }

    #[tokio::test]
    async fn test_landing_page_fixture() {
        let html = r#"
            <a class="btn" href="https://pixeldrain.dev/u/abc123?x=1">PixeLServer</a>
            <a class="btn" href="https://x.workers.dev/foo">Cf Worker</a>
            <a class="btn" href="https://telegram.me/chan">Join Telegram</a>
        "#;
        let stub = Arc::new(StubFetcher::default());

        let links = classifier(stub).classify_links(html).await;

        assert_eq!(
            links,
            vec![
                StreamLink::mkv("Pixeldrain", "https://pixeldrain.dev/api/file/abc123"),
                StreamLink::mkv("Cf Worker", "https://x.workers.dev/foo"),
            ]
        );
    }

    #[tokio::test]
    async fn test_hubcloud_probe_takes_link_parameter() {
        let href = "https://hubcloud.one/dl/abc";
        let stub = Arc::new(StubFetcher::default().head(
            href,
            "https://gamerxyt.com/dl.php?link=https://cdn.example/a.mkv",
        ));
        let html = format!(r#"<a href="{href}">Download [Server : 10Gbps]</a>"#);

        let links = classifier(stub).classify_links(&html).await;

        assert_eq!(links, vec![StreamLink::mkv("hubcloud", "https://cdn.example/a.mkv")]);
    }

    #[tokio::test]
    async fn test_hubcloud_probe_without_link_parameter_keeps_href() {
        let href = "https://hubcloud.one/dl/abc";
        let stub = Arc::new(StubFetcher::default().head(href, "https://cdn.example/a.mkv"));
        let html = format!(r#"<a href="{href}">Download</a>"#);

        let links = classifier(stub).classify_links(&html).await;

        assert_eq!(links, vec![StreamLink::mkv("hubcloud", href)]);
    }

    #[tokio::test]
    async fn test_failed_lookup_drops_only_its_candidate() {
        let good = "https://gpdl.hubcdn.fans/good";
        let bad = "https://gpdl2.hubcdn.fans/bad";
        let stub = Arc::new(StubFetcher::default().json(
            &api_url(good),
            json!({ "data": { "finalUrl": "https://gamerxyt.com/dl.php?link=https://cdn.example/g.mkv" } }),
        ));
        let html = format!(
            r#"<a href="{good}">Server 1</a>
               <a href="{bad}">Server 2</a>
               <a href="https://fastdl.example/f.mkv">Server 3</a>"#
        );

        let links = classifier(stub.clone()).classify_links(&html).await;

        let found: HashSet<_> = links.iter().map(|l| (l.server.as_str(), l.link.as_str())).collect();
        let expected: HashSet<_> = [
            ("HubCdn", "https://cdn.example/g.mkv"),
            ("FastDl", "https://fastdl.example/f.mkv"),
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
        assert_eq!(stub.calls_to(&api_url(bad)), 1);
    }

    #[tokio::test]
    async fn test_pixel_hubcdn_page_uses_player_anchor() {
        let href = "https://pixel.hubcdn.fans/v/1";
        let stub = Arc::new(
            StubFetcher::default().page(href, r#"<a id="vd" href="https://cdn.example/p.mkv">Play</a>"#),
        );
        let html = format!(r#"<a href="{href}">Instant</a>"#);

        let links = classifier(stub.clone()).classify_links(&html).await;

        assert_eq!(links, vec![StreamLink::mkv("HubCdn", "https://cdn.example/p.mkv")]);
        let requests = stub.requests_to(href);
        assert_eq!(requests[0].referer.as_deref(), Some(PIXEL_REFERER));
        assert!(requests[0].require_success);
    }
}

#[cfg(test)]
mod extractor_tests {
    use super::support::{StubFetcher, link_page, redirect_page, reurl_page};
    use crate::resolver::{
        LinkResolver, ResolutionRequest, ResolverConfig, ResolverError, StreamLink,
        cipher::encode_token,
    };
    use serde_json::json;
    use std::sync::Arc;

    const TOKEN_LINK: &str = "https://gadgetsweb.xyz/?id=abc";
    const BLOG: &str = "https://blog.example/post";
    const INTERMEDIATE: &str = "https://blog.example/r?re=YWJj";

    fn resolver(stub: Arc<StubFetcher>) -> LinkResolver {
        LinkResolver::with_fetcher(stub, &ResolverConfig::default())
    }

    fn token_chain(stub: StubFetcher, target: &str) -> StubFetcher {
        stub.page(TOKEN_LINK, link_page(BLOG))
            .page(
                BLOG,
                redirect_page(&json!({
                    "data": "abc",
                    "wp_http1": "https://blog.example/r",
                    "total_time": 0,
                })),
            )
            .page(INTERMEDIATE, reurl_page(target))
    }

    #[tokio::test(start_paused = true)]
    async fn test_hubcloud_token_link_to_drive() {
        let stub = Arc::new(token_chain(
            StubFetcher::default(),
            "https://hubcloud.one/drive/xyz",
        ));

        let links = resolver(stub)
            .resolve(&ResolutionRequest::hubcloud(TOKEN_LINK))
            .await;

        assert_eq!(
            links,
            vec![StreamLink::mkv("HubCloud", "https://hubcloud.one/drive/xyz")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hubcloud_token_link_searches_landing_page() {
        let landing = "https://landing.example/ep1";
        let stub = Arc::new(
            token_chain(StubFetcher::default(), landing).page(
                landing,
                r#"<h3>720p <a href="https://hubcloud.one/drive/720">x</a></h3>
                   <h3>1080p <a href="https://hubcloud.one/drive/1080">x</a></h3>"#,
            ),
        );

        let links = resolver(stub)
            .resolve(&ResolutionRequest::hubcloud(TOKEN_LINK))
            .await;

        assert_eq!(
            links,
            vec![StreamLink::mkv("HubCloud", "https://hubcloud.one/drive/1080")]
        );
    }

    #[tokio::test]
    async fn test_hubcloud_download_page_flow() {
        let file_page = "https://hubcloud.one/drive/xyz";
        let download = "https://gamerxyt.com/hubcloud.php?host=hubcloud&id=xyz";
        let probe = "https://hubcloud.one/dl/xyz";
        let stub = Arc::new(
            StubFetcher::default()
                .page(
                    file_page,
                    format!(
                        "<script>var url = 'https://hubcloud.one/go?r={}';</script>",
                        encode_token(download)
                    ),
                )
                .page(
                    download,
                    format!(
                        r#"<a class="btn" href="https://fsl.example/a.mkv">Download [FSL Server]</a>
                           <a class="btn" href="{probe}">Download [Server : 10Gbps]</a>
                           <a class="btn" href="https://pixeldrain.dev/u/tok">Download [PixeLServer : 2]</a>
                           <a class="btn" href="https://t.me/telegram">Telegram</a>"#
                    ),
                )
                .head(probe, "https://carnewz.site/?link=https://cdn.example/v.mkv"),
        );

        let links = resolver(stub.clone())
            .resolve(&ResolutionRequest::hubcloud(file_page))
            .await;

        assert_eq!(
            links,
            vec![
                StreamLink::mkv("Cf Worker", "https://fsl.example/a.mkv"),
                StreamLink::mkv("Pixeldrain", "https://pixeldrain.dev/api/file/tok"),
                StreamLink::mkv("hubcloud", "https://cdn.example/v.mkv"),
            ]
        );

        let requests = stub.requests_to(download);
        assert_eq!(requests[0].referer.as_deref(), Some("https://hubcloud.one"));
        assert!(stub.requests_to(file_page)[0].require_success);
    }

    #[tokio::test]
    async fn test_hubcloud_relative_next_hop() {
        let file_page = "https://hubcloud.one/drive/xyz";
        let stub = Arc::new(
            StubFetcher::default()
                .page(file_page, "<script>var url = '/video/xyz';</script>")
                .page(
                    "https://hubcloud.one/video/xyz",
                    r#"<a href="https://fastdl.example/v.mkv">Download</a>"#,
                ),
        );

        let links = resolver(stub)
            .resolve(&ResolutionRequest::hubcloud(file_page))
            .await;

        assert_eq!(links, vec![StreamLink::mkv("FastDl", "https://fastdl.example/v.mkv")]);
    }

    #[tokio::test]
    async fn test_hubcloud_failed_page_yields_nothing() {
        let stub = Arc::new(StubFetcher::default());
        let resolver = resolver(stub);
        let request = ResolutionRequest::hubcloud("https://hubcloud.one/drive/missing");

        assert!(resolver.resolve(&request).await.is_empty());
        assert!(matches!(
            resolver.try_resolve(&request).await,
            Err(ResolverError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_hdhub_hubcdn_direct() {
        let link = "https://hubcdn.fans/file/abc";
        let inner = "https://gamerxyt.com/dl.php?link=https%3A%2F%2Fcdn.example%2Fep.mp4";
        let stub = Arc::new(StubFetcher::default().page(
            link,
            reurl_page(&format!("https://hubcdn.fans/go?r={}", encode_token(inner))),
        ));

        let links = resolver(stub).resolve(&ResolutionRequest::hdhub(link)).await;

        assert_eq!(
            links,
            vec![StreamLink::new("HDHub4u Direct", "https://cdn.example/ep.mp4", "mp4").copyable()]
        );
    }

    #[tokio::test]
    async fn test_hdhub_drive_with_player_source() {
        let drive = "https://hubdrive.example/file/1";
        let stub = Arc::new(StubFetcher::default().page(
            drive,
            r#"<script>jwplayer().setup({ file: "https://cdn.example/ep1.mp4?t=9" });</script>"#,
        ));

        let links = resolver(stub).resolve(&ResolutionRequest::hdhub(drive)).await;

        assert_eq!(
            links,
            vec![StreamLink::new("HDHub4u Stream", "https://cdn.example/ep1.mp4?t=9", "mp4").copyable()]
        );
    }

    #[tokio::test]
    async fn test_hdhub_drive_without_player_source() {
        let drive = "https://hubcloud.one/drive/2";
        let stub = Arc::new(StubFetcher::default().page(drive, "<html>download page</html>"));

        let links = resolver(stub).resolve(&ResolutionRequest::hdhub(drive)).await;

        assert_eq!(
            links,
            vec![StreamLink::new("HDHub4u Hubcloud", drive, "redirect").copyable()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hdhub_token_link_without_drive_fails() {
        let landing = "https://landing.example/empty";
        let stub = Arc::new(
            token_chain(StubFetcher::default(), landing).page(landing, "<html>nothing</html>"),
        );
        let resolver = resolver(stub);
        let request = ResolutionRequest::hdhub(TOKEN_LINK);

        assert!(matches!(
            resolver.try_resolve(&request).await,
            Err(ResolverError::MissingToken(_))
        ));
        assert!(resolver.resolve(&request).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_times_out() {
        let link = "https://hubcloud.one/drive/slow";
        let stub = Arc::new(StubFetcher::default().stall(link).page(link, "<html></html>"));
        let resolver = resolver(stub);
        let request = ResolutionRequest::hubcloud(link);

        assert!(matches!(
            resolver.try_resolve(&request).await,
            Err(ResolverError::Timeout(d)) if d == resolver.resolve_timeout()
        ));
        assert!(resolver.resolve(&request).await.is_empty());
    }
}
