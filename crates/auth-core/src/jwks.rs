//! JWKS (JSON Web Key Set) retrieval
//!
//! The validator only depends on the [`JwksProvider`] capability. Retrying,
//! caching and locking are the provider's business; validations may call it
//! concurrently.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use moka::future::Cache;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::context::domain_host;

/// Failures of the key-set retrieval collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwksError {
    #[error("Invalid JWKS URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Invalid JWKS document: {0}")]
    Parse(String),
}

/// Capability returning the provider's signing keys
#[async_trait]
pub trait JwksProvider: Send + Sync {
    async fn fetch_jwks(&self) -> Result<JwkSet, JwksError>;
}

/// Default time a fetched key set is reused
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

const USER_AGENT: &str = concat!("oidc-auth-core/", env!("CARGO_PKG_VERSION"));

/// Fetches the key set over HTTPS and caches it for a TTL
pub struct HttpJwksProvider {
    url: Url,
    client: reqwest::Client,
    cache: Cache<String, JwkSet>,
}

impl HttpJwksProvider {
    /// Provider for an explicit JWKS URL
    pub fn new(url: &str, cache_ttl: Duration) -> Result<Self, JwksError> {
        let url = Url::parse(url).map_err(|e| JwksError::InvalidUrl(format!("{}: {}", url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| JwksError::Http(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self { url, client, cache })
    }

    /// Provider for the well-known JWKS endpoint of a domain,
    /// `https://{domain}/.well-known/jwks.json`
    pub fn for_domain(domain: &str, cache_ttl: Duration) -> Result<Self, JwksError> {
        Self::new(&format!("https://{}/.well-known/jwks.json", domain_host(domain)), cache_ttl)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Drop the cached key set so the next call fetches again (key rotation)
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    async fn download(&self) -> Result<JwkSet, JwksError> {
        debug!(url = %self.url, "Fetching JWKS");

        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| JwksError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "JWKS endpoint returned an error");
            return Err(JwksError::Status(status.as_u16()));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| JwksError::Parse(e.to_string()))?;

        debug!(url = %self.url, keys = jwks.keys.len(), "Fetched JWKS");
        Ok(jwks)
    }
}

#[async_trait]
impl JwksProvider for HttpJwksProvider {
    async fn fetch_jwks(&self) -> Result<JwkSet, JwksError> {
        // Concurrent misses share a single download
        self.cache
            .try_get_with(self.url.to_string(), self.download())
            .await
            .map_err(|e: Arc<JwksError>| (*e).clone())
    }
}

/// Serves a fixed key set (pinned keys, tests)
#[derive(Debug, Clone)]
pub struct StaticJwksProvider {
    jwks: JwkSet,
}

impl StaticJwksProvider {
    pub fn new(jwks: JwkSet) -> Self {
        Self { jwks }
    }

    pub fn empty() -> Self {
        Self::new(JwkSet { keys: Vec::new() })
    }

    /// Parse a JWKS JSON document
    pub fn from_json(json: &str) -> Result<Self, JwksError> {
        let jwks: JwkSet = serde_json::from_str(json).map_err(|e| JwksError::Parse(e.to_string()))?;
        Ok(Self::new(jwks))
    }
}

#[async_trait]
impl JwksProvider for StaticJwksProvider {
    async fn fetch_jwks(&self) -> Result<JwkSet, JwksError> {
        Ok(self.jwks.clone())
    }
}
