use crate::resolver::{
    Result, ResolverError,
    cipher::{base64_decode_str, encode_token},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

/// Seconds added on top of the page's own countdown
pub const WAIT_MARGIN_SECS: f64 = 3.0;

/// Payload embedded as `s('o','…',180)` on link pages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkEnvelope {
    /// Base64 encoded next-hop URL
    #[serde(default, deserialize_with = "lenient_string")]
    pub o: Option<String>,
}

impl LinkEnvelope {
    /// Decode the next-hop URL
    pub fn next_hop(&self) -> Result<String> {
        let encoded = self
            .o
            .as_deref()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| ResolverError::MissingToken("envelope field `o`".to_string()))?;

        base64_decode_str(encoded)
    }
}

/// Payload assembled from the `ck('_wp_http_N', …)` calls on redirect pages.
///
/// The redirect base is read from `wp_http1` first and `wp_http` second.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectPayload {
    /// Token forwarded as `?re=` after one more base64 layer
    #[serde(default, deserialize_with = "lenient_string")]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wp_http1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wp_http: Option<String>,
    /// Countdown shown by the page, in seconds
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub total_time: Option<f64>,
}

impl RedirectPayload {
    /// Redirect base following the documented fallback order
    pub fn redirect_base(&self) -> Option<&str> {
        self.wp_http1
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.wp_http.as_deref().filter(|s| !s.is_empty()))
    }

    /// `<redirect base>?re=<base64(data)>`, if both parts are present
    pub fn intermediate_url(&self) -> Option<String> {
        let base = self.redirect_base()?;
        let data = self.data.as_deref().filter(|d| !d.is_empty())?;
        Some(format!("{base}?re={}", encode_token(data)))
    }

    /// Mandatory wait before the intermediate URL is fetched.
    ///
    /// Negative, missing or non-finite countdowns count as zero, so the wait
    /// is never shorter than the margin.
    pub fn wait_duration(&self) -> Duration {
        let countdown = self
            .total_time
            .filter(|t| t.is_finite())
            .unwrap_or(0.0)
            .max(0.0);

        Duration::try_from_secs_f64(countdown + WAIT_MARGIN_SECS).unwrap_or(Duration::MAX)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
