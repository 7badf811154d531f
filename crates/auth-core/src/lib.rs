//! # OIDC Auth-Core - ID token validation
//!
//! Validates OpenID Connect ID tokens before any identity claim inside them
//! is trusted. Validation is a short-circuiting pipeline:
//!
//! - **Decoding**: split the compact JWT and parse header and payload
//! - **Signature**: verify the signature over the received `header.payload`
//!   bytes, with a key from the provider's JWKS or a shared secret
//! - **Claims**: check issuer, subject, audience, authorized party,
//!   expiration, issued-at, nonce and authentication age
//!
//! Claims are never checked unless the signature verified.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oidc_auth_core::{IdTokenValidator, ValidatorConfig};
//!
//! # async fn run(id_token: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ValidatorConfig::new("tokens-test.auth0.com", "tokens-test-123");
//! let jwks = Arc::new(config.jwks_provider()?);
//! let context = config.context(jwks).with_nonce("a1b2c3d4e5");
//!
//! IdTokenValidator::new().validate(id_token, &context).await?;
//! # Ok(())
//! # }
//! ```

pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod jwks;
pub mod signature;
pub mod token;
pub mod validator;

pub use claims::{ClaimsVerifier, IdTokenClaimsValidator};
pub use config::ValidatorConfig;
pub use context::{Clock, FixedClock, SystemClock, ValidationContext};
pub use error::{ClaimsError, DecodingError, IdTokenError, Result, SignatureError, Stage};
pub use jwks::{HttpJwksProvider, JwksError, JwksProvider, StaticJwksProvider};
pub use signature::{IdTokenSignatureValidator, SignatureVerifier};
pub use token::{decode, Audience, Claims, DecodedToken, Header};
pub use validator::{validate, IdTokenValidator};

#[cfg(test)]
pub(crate) mod test_support;
