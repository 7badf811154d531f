//! Configuration for ID token validation

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::context::{issuer_for_domain, ValidationContext};
use crate::jwks::{HttpJwksProvider, JwksError, JwksProvider};

/// Validator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Identity provider domain, e.g. "tokens-test.auth0.com"
    pub domain: String,
    /// Client identifier the tokens must be issued for
    pub client_id: String,
    /// Clock-skew tolerance for time based claims
    pub leeway_secs: u64,
    /// Maximum time since the end-user last authenticated
    pub max_age_secs: Option<u64>,
    /// Upper bound on key-set retrieval
    pub jwks_timeout_secs: u64,
    /// How long a fetched key set is reused
    pub jwks_cache_ttl_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            leeway_secs: 60,
            max_age_secs: None,
            jwks_timeout_secs: 10,
            jwks_cache_ttl_secs: 600,
        }
    }
}

impl ValidatorConfig {
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Expected issuer, `https://{domain}/`
    pub fn issuer(&self) -> String {
        issuer_for_domain(&self.domain)
    }

    /// HTTP key-set provider for the domain's well-known JWKS endpoint
    pub fn jwks_provider(&self) -> Result<HttpJwksProvider, JwksError> {
        HttpJwksProvider::for_domain(&self.domain, Duration::from_secs(self.jwks_cache_ttl_secs))
    }

    /// Validation context for one token; add a nonce with
    /// [`ValidationContext::with_nonce`] when the flow used one
    pub fn context(&self, jwks: Arc<dyn JwksProvider>) -> ValidationContext {
        let context = ValidationContext::new(self.issuer(), self.client_id.clone(), jwks)
            .with_leeway(Duration::from_secs(self.leeway_secs))
            .with_jwks_timeout(Duration::from_secs(self.jwks_timeout_secs));

        match self.max_age_secs {
            Some(max_age) => context.with_max_age(Duration::from_secs(max_age)),
            None => context,
        }
    }
}
