//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use oidc_auth_core::{FixedClock, JwksProvider, StaticJwksProvider, ValidationContext};
use serde_json::{json, Value};

pub const DOMAIN: &str = "tokens-test.auth0.com";
pub const ISSUER: &str = "https://tokens-test.auth0.com/";
pub const CLIENT_ID: &str = "tokens-test-123";
pub const NONCE: &str = "a1b2c3d4e5";
pub const KID: &str = "key123";
pub const LEEWAY: Duration = Duration::from_secs(60);
pub const MAX_AGE: Duration = Duration::from_secs(1000);
pub const NOW: i64 = 1_700_000_000;

pub const JWKS_JSON: &str = include_str!("../fixtures/jwks.json");
pub const PRIVATE_KEY_PEM: &[u8] = include_bytes!("../fixtures/rs256_private.pem");

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Claims that satisfy [`context`]
pub fn valid_claims() -> Value {
    json!({
        "iss": ISSUER,
        "sub": "auth0|123456789",
        "aud": CLIENT_ID,
        "exp": NOW + 3600,
        "iat": NOW - 10,
        "nonce": NONCE,
        "auth_time": NOW - 100,
        "email": "support@auth0.com"
    })
}

pub fn with(mut claims: Value, name: &str, value: Value) -> Value {
    claims[name] = value;
    claims
}

/// Token signed with the fixture RSA key
pub fn rs256_token(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).expect("fixture key is valid");
    encode(&header, claims, &key).expect("token encodes")
}

pub fn static_jwks() -> Arc<dyn JwksProvider> {
    Arc::new(StaticJwksProvider::from_json(JWKS_JSON).expect("fixture JWKS is valid"))
}

/// Context matching [`valid_claims`], with a clock frozen at [`NOW`]
pub fn context_with(jwks: Arc<dyn JwksProvider>) -> ValidationContext {
    ValidationContext::for_domain(DOMAIN, CLIENT_ID, jwks)
        .with_nonce(NONCE)
        .with_leeway(LEEWAY)
        .with_max_age(MAX_AGE)
        .with_clock(Arc::new(FixedClock::from_timestamp(NOW)))
}

pub fn context() -> ValidationContext {
    context_with(static_jwks())
}
