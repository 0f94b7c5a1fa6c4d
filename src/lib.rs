//! Resolves HubCloud and HDHub intermediate links into direct stream links.

pub mod auth;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod routes;
pub mod settings;

pub use error::{ApiResult, AppError};

use auth::ApiKeyStore;
use resolver::LinkResolver;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct Ctx {
    pub resolver: Arc<LinkResolver>,
    pub api_keys: Arc<ApiKeyStore>,
}

impl Ctx {
    pub fn new(resolver: LinkResolver, api_keys: ApiKeyStore) -> Self {
        Self {
            resolver: Arc::new(resolver),
            api_keys: Arc::new(api_keys),
        }
    }
}
