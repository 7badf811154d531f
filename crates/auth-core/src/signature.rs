//! ID token signature verification
//!
//! The signature is checked over the exact `header.payload` bytes that were
//! received. Asymmetric algorithms use the JWK matching the header's `kid`
//! from the context's key set; HMAC algorithms need a shared secret in the
//! context and are refused otherwise.

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tracing::{debug, warn};

use crate::context::ValidationContext;
use crate::error::SignatureError;
use crate::token::DecodedToken;

/// Capability verifying a decoded token's signature
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Succeeds only when the signature is valid for the declared algorithm
    async fn verify(&self, token: &DecodedToken, context: &ValidationContext) -> Result<(), SignatureError>;
}

/// Production signature verifier backed by `jsonwebtoken`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdTokenSignatureValidator;

impl IdTokenSignatureValidator {
    pub fn new() -> Self {
        Self
    }

    async fn asymmetric_key(
        &self,
        token: &DecodedToken,
        algorithm: Algorithm,
        context: &ValidationContext,
    ) -> Result<DecodingKey, SignatureError> {
        let kid = token
            .header()
            .kid
            .as_deref()
            .ok_or(SignatureError::MissingKeyId)?;

        let jwks = fetch_key_set(context).await?;
        let jwk = jwks.find(kid).ok_or_else(|| SignatureError::KeyNotFound { kid: kid.to_string() })?;

        if !jwk_usable_for(jwk, algorithm) {
            debug!(
                kid,
                alg = ?algorithm,
                key_alg = ?jwk.common.key_algorithm,
                key_use = ?jwk.common.public_key_use,
                "JWK cannot verify this token"
            );
            return Err(SignatureError::KeyNotFound { kid: kid.to_string() });
        }

        DecodingKey::from_jwk(jwk).map_err(|e| SignatureError::InvalidKey {
            kid: kid.to_string(),
            reason: e.to_string(),
        })
    }

    fn symmetric_key(&self, alg: &str, context: &ValidationContext) -> Result<DecodingKey, SignatureError> {
        context
            .shared_secret()
            .map(DecodingKey::from_secret)
            .ok_or_else(|| SignatureError::MissingSecret { alg: alg.to_string() })
    }
}

#[async_trait]
impl SignatureVerifier for IdTokenSignatureValidator {
    async fn verify(&self, token: &DecodedToken, context: &ValidationContext) -> Result<(), SignatureError> {
        let alg = token
            .header()
            .alg
            .as_deref()
            .ok_or(SignatureError::MissingAlgorithm)?;

        let algorithm = parse_algorithm(alg)?;
        debug!(alg, kid = ?token.header().kid, "Verifying ID token signature");

        let key = if is_symmetric(algorithm) {
            self.symmetric_key(alg, context)?
        } else {
            self.asymmetric_key(token, algorithm, context).await?
        };

        match jsonwebtoken::crypto::verify(token.signature_segment(), token.signing_input(), &key, algorithm) {
            Ok(true) => Ok(()),
            Ok(false) => Err(SignatureError::InvalidSignature),
            Err(e) => {
                debug!(alg, error = %e, "Signature verification errored");
                Err(SignatureError::InvalidSignature)
            }
        }
    }
}

/// Retrieve the context's key set, bounded by its JWKS timeout
pub async fn fetch_key_set(context: &ValidationContext) -> Result<JwkSet, SignatureError> {
    let timeout = context.jwks_timeout();
    match tokio::time::timeout(timeout, context.jwks().fetch_jwks()).await {
        Ok(Ok(jwks)) => Ok(jwks),
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to retrieve JWKS");
            Err(SignatureError::JwksFetch(e.to_string()))
        }
        Err(_) => {
            warn!(?timeout, "Timed out retrieving JWKS");
            Err(SignatureError::JwksTimeout(timeout))
        }
    }
}

fn parse_algorithm(alg: &str) -> Result<Algorithm, SignatureError> {
    alg.parse::<Algorithm>()
        .map_err(|_| SignatureError::UnsupportedAlgorithm { alg: alg.to_string() })
}

fn is_symmetric(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// A JWK verifies `algorithm` only if it is a signing key of the matching
/// key type, and its declared `alg` (when present) is that algorithm
fn jwk_usable_for(jwk: &Jwk, algorithm: Algorithm) -> bool {
    if matches!(&jwk.common.public_key_use, Some(key_use) if *key_use != PublicKeyUse::Signature) {
        return false;
    }
    if let Some(key_alg) = &jwk.common.key_algorithm {
        if signing_algorithm(key_alg) != Some(algorithm) {
            return false;
        }
    }
    key_type_fits(&jwk.algorithm, algorithm)
}

fn signing_algorithm(key_alg: &KeyAlgorithm) -> Option<Algorithm> {
    match key_alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        // Encryption algorithms
        _ => None,
    }
}

fn key_type_fits(params: &AlgorithmParameters, algorithm: Algorithm) -> bool {
    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => matches!(params, AlgorithmParameters::RSA(_)),
        Algorithm::ES256 | Algorithm::ES384 => matches!(params, AlgorithmParameters::EllipticCurve(_)),
        Algorithm::EdDSA => matches!(params, AlgorithmParameters::OctetKeyPair(_)),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => false,
    }
}
