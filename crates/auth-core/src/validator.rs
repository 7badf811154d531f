//! ID token validation orchestrator
//!
//! Runs decoding, signature verification and claims verification in sequence
//! as a small state machine:
//!
//! ```text
//! Decoding -> VerifyingSignature -> VerifyingClaims -> Done(Ok)
//!     \               \                    \
//!      +-> Done(Err)   +-> Done(Err)        +-> Done(Err)
//! ```
//!
//! Claims are only looked at once the signature of the same decoded token has
//! been verified, and every call ends in exactly one `Done`.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::claims::{ClaimsVerifier, IdTokenClaimsValidator};
use crate::context::ValidationContext;
use crate::error::Result;
use crate::signature::{IdTokenSignatureValidator, SignatureVerifier};
use crate::token::{decode, DecodedToken};

enum ValidationState {
    Decoding,
    VerifyingSignature(DecodedToken),
    VerifyingClaims(DecodedToken),
    Done(Result<()>),
}

impl ValidationState {
    fn name(&self) -> &'static str {
        match self {
            Self::Decoding => "decoding",
            Self::VerifyingSignature(_) => "verifying_signature",
            Self::VerifyingClaims(_) => "verifying_claims",
            Self::Done(Ok(())) => "done_ok",
            Self::Done(Err(_)) => "done_err",
        }
    }
}

/// Validate an ID token with the given verifiers
///
/// Stops at the first failing stage and returns its error.
#[instrument(skip_all, fields(issuer = %context.issuer(), audience = %context.audience()))]
pub async fn validate(
    id_token: Option<&str>,
    context: &ValidationContext,
    signature_verifier: &dyn SignatureVerifier,
    claims_verifier: &dyn ClaimsVerifier,
) -> Result<()> {
    let mut state = ValidationState::Decoding;

    loop {
        state = match state {
            ValidationState::Decoding => match decode(id_token) {
                Ok(token) => ValidationState::VerifyingSignature(token),
                Err(e) => ValidationState::Done(Err(e.into())),
            },
            ValidationState::VerifyingSignature(token) => {
                match signature_verifier.verify(&token, context).await {
                    Ok(()) => ValidationState::VerifyingClaims(token),
                    Err(e) => ValidationState::Done(Err(e.into())),
                }
            }
            ValidationState::VerifyingClaims(token) => {
                ValidationState::Done(claims_verifier.verify(&token, context).map_err(Into::into))
            }
            ValidationState::Done(result) => {
                if let Err(e) = &result {
                    debug!(stage = ?e.stage(), error = %e, "ID token rejected");
                }
                return result;
            }
        };
        debug!(state = state.name(), "ID token validation advanced");
    }
}

/// ID token validator holding its signature and claims verifiers
#[derive(Clone)]
pub struct IdTokenValidator {
    signature_verifier: Arc<dyn SignatureVerifier>,
    claims_verifier: Arc<dyn ClaimsVerifier>,
}

impl IdTokenValidator {
    /// Validator using the production verifiers
    pub fn new() -> Self {
        Self::with_verifiers(
            Arc::new(IdTokenSignatureValidator::new()),
            Arc::new(IdTokenClaimsValidator::new()),
        )
    }

    /// Validator using custom verifiers
    pub fn with_verifiers(
        signature_verifier: Arc<dyn SignatureVerifier>,
        claims_verifier: Arc<dyn ClaimsVerifier>,
    ) -> Self {
        Self {
            signature_verifier,
            claims_verifier,
        }
    }

    /// Validate `id_token` against `context`
    pub async fn validate(&self, id_token: Option<&str>, context: &ValidationContext) -> Result<()> {
        validate(
            id_token,
            context,
            self.signature_verifier.as_ref(),
            self.claims_verifier.as_ref(),
        )
        .await
    }

    /// Validate and hand the outcome to `on_complete`, which runs exactly once
    pub async fn validate_then<F>(&self, id_token: Option<&str>, context: &ValidationContext, on_complete: F)
    where
        F: FnOnce(Result<()>),
    {
        on_complete(self.validate(id_token, context).await);
    }

    /// Run a validation as a tokio task
    pub fn spawn_validation(
        self: &Arc<Self>,
        id_token: Option<String>,
        context: ValidationContext,
    ) -> JoinHandle<Result<()>> {
        let validator = Arc::clone(self);
        tokio::spawn(async move { validator.validate(id_token.as_deref(), &context).await })
    }
}

impl Default for IdTokenValidator {
    fn default() -> Self {
        Self::new()
    }
}
