//! Error types for ID token validation
//!
//! Each validation stage owns its own error enum so callers can tell apart a
//! malformed token, an untrusted signature and a claim that does not hold.
//! [`IdTokenError`] wraps all three and is what the orchestrator returns.

use thiserror::Error;

/// Failures produced while splitting and parsing the compact token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingError {
    #[error("ID token is required but missing")]
    MissingToken,

    #[error("ID token could not be decoded")]
    CannotDecode,
}

/// Failures produced while verifying the token signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Signature algorithm (alg) is missing from the ID token header")]
    MissingAlgorithm,

    #[error("Signature algorithm of \"{alg}\" is not supported")]
    UnsupportedAlgorithm { alg: String },

    #[error("Key ID (kid) is missing from the ID token header")]
    MissingKeyId,

    #[error("Could not find a public key for Key ID (kid) \"{kid}\"")]
    KeyNotFound { kid: String },

    #[error("Public key for Key ID (kid) \"{kid}\" is not usable: {reason}")]
    InvalidKey { kid: String, reason: String },

    #[error("Failed to retrieve the JSON Web Key Set: {0}")]
    JwksFetch(String),

    #[error("Timed out after {0:?} retrieving the JSON Web Key Set")]
    JwksTimeout(std::time::Duration),

    #[error("Signature algorithm of \"{alg}\" requires a shared secret, none was configured")]
    MissingSecret { alg: String },

    #[error("Invalid ID token signature")]
    InvalidSignature,
}

/// Failures produced while checking the payload claims
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("Issuer (iss) claim must be a string present in the ID token")]
    MissingIssuer,

    #[error("Issuer (iss) claim mismatch in the ID token, expected \"{expected}\", found \"{actual}\"")]
    IssuerMismatch { expected: String, actual: String },

    #[error("Subject (sub) claim must be a non-empty string present in the ID token")]
    MissingSubject,

    #[error("Audience (aud) claim must be a string or array of strings present in the ID token")]
    MissingAudience,

    #[error("Audience (aud) claim mismatch in the ID token, expected \"{expected}\", found {actual:?}")]
    AudienceMismatch { expected: String, actual: Vec<String> },

    #[error("Authorized Party (azp) claim must be a string present in the ID token when Audience (aud) claim has multiple values")]
    MissingAuthorizedParty,

    #[error("Authorized Party (azp) claim mismatch in the ID token, expected \"{expected}\", found \"{actual}\"")]
    AuthorizedPartyMismatch { expected: String, actual: String },

    #[error("Expiration time (exp) claim must be a number present in the ID token")]
    MissingExpiration,

    #[error("Expiration time (exp) claim error in the ID token; current time ({now}) is after expiration time ({exp})")]
    TokenExpired { now: i64, exp: i64 },

    #[error("Issued At (iat) claim must be a number present in the ID token")]
    MissingIssuedAt,

    #[error("Nonce (nonce) claim must be a string present in the ID token")]
    MissingNonce,

    #[error("Nonce (nonce) claim value mismatch in the ID token, expected \"{expected}\", found \"{actual}\"")]
    NonceMismatch { expected: String, actual: String },

    #[error("Authentication Time (auth_time) claim must be a number present in the ID token when Max Age (max_age) is specified")]
    MissingAuthTime,

    #[error("Authentication Time (auth_time) claim indicates that too much time has passed since the last end-user authentication; current time ({now}) is after last auth time ({last_auth})")]
    AuthenticationExpired { now: i64, last_auth: i64 },
}

/// Validation stage that produced an [`IdTokenError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decoding,
    Signature,
    Claims,
}

/// Any failure of the ID token validation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdTokenError {
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Claims(#[from] ClaimsError),
}

impl IdTokenError {
    /// Stage of the pipeline where validation stopped
    pub fn stage(&self) -> Stage {
        match self {
            Self::Decoding(_) => Stage::Decoding,
            Self::Signature(_) => Stage::Signature,
            Self::Claims(_) => Stage::Claims,
        }
    }
}

pub type Result<T> = std::result::Result<T, IdTokenError>;
