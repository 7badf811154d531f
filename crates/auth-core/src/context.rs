//! Validation context
//!
//! Everything a validation run compares the token against: the expected
//! issuer and audience, the key-set retrieval capability, optional nonce and
//! max-age, the clock-skew leeway and the reference clock. A context is built
//! once per validation and never mutated afterwards.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::jwks::JwksProvider;

/// Default tolerance for clock skew between issuer and verifier
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

/// Default upper bound on key-set retrieval
pub const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the current time (enables testing with deterministic timestamps)
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock frozen at `secs` seconds since the Unix epoch
    pub fn from_timestamp(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Expected values and collaborators for one ID token validation
#[derive(Clone)]
pub struct ValidationContext {
    issuer: String,
    audience: String,
    jwks: Arc<dyn JwksProvider>,
    nonce: Option<String>,
    leeway: Duration,
    max_age: Option<Duration>,
    clock: Arc<dyn Clock>,
    shared_secret: Option<Vec<u8>>,
    jwks_timeout: Duration,
}

impl ValidationContext {
    /// Create a context expecting `issuer` and `audience`, with default
    /// leeway, system clock and no nonce or max-age
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        jwks: Arc<dyn JwksProvider>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            jwks,
            nonce: None,
            leeway: DEFAULT_LEEWAY,
            max_age: None,
            clock: Arc::new(SystemClock),
            shared_secret: None,
            jwks_timeout: DEFAULT_JWKS_TIMEOUT,
        }
    }

    /// Create a context for a provider domain; the expected issuer is
    /// `https://{domain}/`
    pub fn for_domain(domain: &str, client_id: impl Into<String>, jwks: Arc<dyn JwksProvider>) -> Self {
        Self::new(issuer_for_domain(domain), client_id, jwks)
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allow HMAC-signed tokens verified with `secret`.
    ///
    /// A public client cannot keep a provider secret, so only enable this for
    /// confidential deployments.
    pub fn with_shared_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    pub fn with_jwks_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_timeout = timeout;
        self
    }

    /// Expected `iss` claim
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Expected `aud` / `azp` value (the client identifier)
    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn jwks(&self) -> &Arc<dyn JwksProvider> {
        &self.jwks
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_deref()
    }

    pub fn jwks_timeout(&self) -> Duration {
        self.jwks_timeout
    }

    /// Current time from the reference clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("nonce", &self.nonce)
            .field("leeway", &self.leeway)
            .field("max_age", &self.max_age)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .field("jwks_timeout", &self.jwks_timeout)
            .finish_non_exhaustive()
    }
}

/// Issuer identifier for a provider domain
pub fn issuer_for_domain(domain: &str) -> String {
    format!("https://{}/", domain_host(domain))
}

/// Bare host of a configured domain, without scheme or trailing slash
pub(crate) fn domain_host(domain: &str) -> &str {
    domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}
