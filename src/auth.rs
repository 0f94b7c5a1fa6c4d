//! API key gate.
//!
//! Keys and their request limits come from [`AuthConfig`]. Usage is counted
//! in memory and resets when the process restarts.

use crate::{
    Ctx,
    error::AppError,
    settings::{ApiKeyEntry, AuthConfig},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use dashmap::DashMap;
use tracing::{debug, warn};

/// Header carrying the key
pub const API_KEY_HEADER: &str = "x-api-key";
/// Query parameter carrying the key
pub const API_KEY_PARAM: &str = "api_key";

/// Why a key was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    Missing,
    Invalid,
    Exhausted,
}

impl From<KeyRejection> for AppError {
    fn from(rejection: KeyRejection) -> Self {
        match rejection {
            KeyRejection::Missing => Self::Unauthorized(
                "API key is required. Provide it in x-api-key header, authorization header, or api_key query parameter."
                    .to_string(),
            ),
            KeyRejection::Invalid => Self::Unauthorized(
                "Invalid API key. Please check your API key and try again.".to_string(),
            ),
            KeyRejection::Exhausted => {
                Self::QuotaExceeded("API key request limit reached".to_string())
            }
        }
    }
}

/// Accepted request: who made it and how many requests are left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGrant {
    pub name: String,
    pub remaining: u64,
}

#[derive(Debug)]
struct KeyUsage {
    name: String,
    limit: u64,
    used: u64,
    active: bool,
}

impl From<&ApiKeyEntry> for KeyUsage {
    fn from(entry: &ApiKeyEntry) -> Self {
        Self {
            name: entry.name.clone(),
            limit: entry.limit,
            used: 0,
            active: entry.active,
        }
    }
}

/// In-memory key registry with per-key counters
#[derive(Debug, Default)]
pub struct ApiKeyStore {
    enabled: bool,
    keys: DashMap<String, KeyUsage>,
}

impl ApiKeyStore {
    pub fn from_config(config: &AuthConfig) -> Self {
        let keys = config
            .keys
            .iter()
            .map(|entry| (entry.key.clone(), KeyUsage::from(entry)))
            .collect();

        Self {
            enabled: config.enabled,
            keys,
        }
    }

    /// Store that lets every request through
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check a key and count the request against it
    pub fn validate_and_increment(&self, key: &str) -> Result<KeyGrant, KeyRejection> {
        let mut usage = self.keys.get_mut(key).ok_or(KeyRejection::Invalid)?;

        if !usage.active {
            return Err(KeyRejection::Invalid);
        }
        if usage.used >= usage.limit {
            return Err(KeyRejection::Exhausted);
        }

        usage.used += 1;
        Ok(KeyGrant {
            name: usage.name.clone(),
            remaining: usage.limit - usage.used,
        })
    }

    /// `(used, limit)` for a key
    pub fn usage(&self, key: &str) -> Option<(u64, u64)> {
        self.keys.get(key).map(|usage| (usage.used, usage.limit))
    }

    /// Gate a request described by its headers and query string
    pub fn authorize(&self, headers: &HeaderMap, query: Option<&str>) -> Result<KeyGrant, KeyRejection> {
        if !self.enabled {
            return Ok(KeyGrant {
                name: "anonymous".to_string(),
                remaining: 0,
            });
        }

        let key = extract_api_key(headers, query).ok_or(KeyRejection::Missing)?;
        let grant = self.validate_and_increment(&key);
        match &grant {
            Ok(grant) => debug!("Key {} accepted, {} request(s) left", grant.name, grant.remaining),
            Err(rejection) => warn!("Key {}… rejected: {rejection:?}", preview(&key)),
        }
        grant
    }
}

/// Key from `x-api-key`, then `Authorization`, then the `api_key` query parameter
pub fn extract_api_key(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
        })
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        url::form_urlencoded::parse(query?.as_bytes())
            .find(|(name, _)| name == API_KEY_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|key| !key.is_empty())
    })
}

fn preview(key: &str) -> String {
    key.chars().take(8).collect()
}

impl FromRequestParts<Ctx> for KeyGrant {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &Ctx) -> Result<Self, Self::Rejection> {
        Ok(ctx.api_keys.authorize(&parts.headers, parts.uri.query())?)
    }
}
