use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    ApiResult, AppError, Ctx,
    auth::KeyGrant,
    resolver::{ResolutionRequest, StreamLink},
};

/// `?url=` query shared by the extractor routes
#[derive(Debug, Deserialize, Validate)]
pub struct LinkQuery {
    #[validate(url)]
    pub url: Option<String>,
}

impl LinkQuery {
    /// The validated target URL
    fn target(&self, missing: &str, hint: &str) -> ApiResult<String> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::bad_request(missing, hint))?;

        self.validate()
            .map_err(|e| AppError::bad_request("Invalid URL parameter", e.to_string()))?;

        Ok(url.to_string())
    }
}

/// Link entry of the HubCloud response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubCloudLink {
    pub name: String,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub server: String,
    pub is_direct: bool,
}

impl From<StreamLink> for HubCloudLink {
    fn from(link: StreamLink) -> Self {
        Self {
            name: link.server.clone(),
            link: link.link,
            kind: link.kind,
            server: link.server,
            is_direct: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HubCloudResponse {
    pub success: bool,
    pub links: Vec<HubCloudLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamData {
    pub episode_url: String,
    pub stream_links: Vec<StreamLink>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StreamData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub remaining_requests: u64,
}

// ============ Handlers ============

/// Resolve a HubCloud link
/// GET /api/extractors/hubcloud?url=...
async fn hubcloud(
    State(ctx): State<Ctx>,
    Query(query): Query<LinkQuery>,
) -> ApiResult<Json<HubCloudResponse>> {
    let url = query.target(
        "URL parameter is required",
        "Please provide a url query parameter",
    )?;
    info!("Processing HubCloud URL: {url}");

    let links = ctx.resolver.resolve(&ResolutionRequest::hubcloud(url)).await;
    if links.is_empty() {
        return Ok(Json(HubCloudResponse {
            success: false,
            links: Vec::new(),
            error: Some("No stream links found".to_string()),
        }));
    }

    Ok(Json(HubCloudResponse {
        success: true,
        links: links.into_iter().map(Into::into).collect(),
        error: None,
    }))
}

/// Resolve an HDHub episode link
/// GET /api/4khdhub/stream?url=...
async fn stream(
    State(ctx): State<Ctx>,
    grant: KeyGrant,
    Query(query): Query<LinkQuery>,
) -> ApiResult<Json<StreamResponse>> {
    let episode_url = query.target(
        "Episode URL is required",
        "Please provide an episode URL parameter",
    )?;
    info!("Processing HDHub stream request for {episode_url} ({})", grant.name);

    let stream_links = ctx
        .resolver
        .resolve(&ResolutionRequest::hdhub(episode_url.clone()))
        .await;

    if stream_links.is_empty() {
        return Ok(Json(StreamResponse {
            success: false,
            data: None,
            error: Some("No stream links found".to_string()),
            message: Some(
                "No streaming links could be extracted from the provided URL".to_string(),
            ),
            remaining_requests: grant.remaining,
        }));
    }

    Ok(Json(StreamResponse {
        success: true,
        data: Some(StreamData {
            episode_url,
            stream_links,
        }),
        error: None,
        message: None,
        remaining_requests: grant.remaining,
    }))
}

pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/api/extractors/hubcloud", get(hubcloud))
        .route("/api/4khdhub/stream", get(stream))
}
