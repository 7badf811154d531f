//! Test doubles and fixtures shared by the unit tests

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::claims::ClaimsVerifier;
use crate::context::{FixedClock, ValidationContext};
use crate::error::{ClaimsError, SignatureError};
use crate::jwks::{JwksError, JwksProvider, StaticJwksProvider};
use crate::signature::SignatureVerifier;
use crate::token::DecodedToken;

pub const ISSUER: &str = "https://tokens-test.auth0.com/";
pub const CLIENT_ID: &str = "tokens-test-123";
pub const NONCE: &str = "a1b2c3d4e5";
pub const NOW: i64 = 1_700_000_000;
pub const TEST_SECRET: &[u8] = b"tokens-test-shared-secret-0123456789";

/// Context with the test issuer/audience and a clock frozen at `now`
pub fn context_at(now: i64) -> ValidationContext {
    ValidationContext::new(ISSUER, CLIENT_ID, Arc::new(StaticJwksProvider::empty()))
        .with_clock(Arc::new(FixedClock::from_timestamp(now)))
}

/// Context at [`NOW`] retrieving keys from `jwks`
pub fn context_with(jwks: Arc<dyn JwksProvider>) -> ValidationContext {
    ValidationContext::new(ISSUER, CLIENT_ID, jwks).with_clock(Arc::new(FixedClock::from_timestamp(NOW)))
}

/// HS256-signed token carrying `claims`
pub fn hs256_token(claims: &Value, secret: &[u8]) -> String {
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret)).unwrap()
}

/// Token with an arbitrary header and a signature that verifies nothing
pub fn forged_token_with_header(header: &Value) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap()),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"sub": "auth0|123456789"})).unwrap()),
        URL_SAFE_NO_PAD.encode(b"not-a-signature")
    )
}

/// Key-set provider that always fails
pub struct FailingJwksProvider;

#[async_trait]
impl JwksProvider for FailingJwksProvider {
    async fn fetch_jwks(&self) -> Result<JwkSet, JwksError> {
        Err(JwksError::Status(503))
    }
}

/// Key-set provider that answers only after a delay
pub struct SlowJwksProvider(pub Duration);

#[async_trait]
impl JwksProvider for SlowJwksProvider {
    async fn fetch_jwks(&self) -> Result<JwkSet, JwksError> {
        tokio::time::sleep(self.0).await;
        Ok(JwkSet { keys: Vec::new() })
    }
}

/// Signature verifier returning a canned result
pub struct MockSignatureVerifier {
    result: Result<(), SignatureError>,
    calls: AtomicUsize,
}

impl MockSignatureVerifier {
    pub fn new(result: Result<(), SignatureError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignatureVerifier for MockSignatureVerifier {
    async fn verify(&self, _token: &DecodedToken, _context: &ValidationContext) -> Result<(), SignatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Claims verifier returning a canned result and recording whether it ran
pub struct RecordingClaimsVerifier {
    result: Result<(), ClaimsError>,
    calls: AtomicUsize,
}

impl RecordingClaimsVerifier {
    pub fn new(result: Result<(), ClaimsError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ran(&self) -> bool {
        self.calls() > 0
    }
}

impl ClaimsVerifier for RecordingClaimsVerifier {
    fn verify(&self, _token: &DecodedToken, _context: &ValidationContext) -> Result<(), ClaimsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
