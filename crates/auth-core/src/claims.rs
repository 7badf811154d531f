//! ID token claims verification
//!
//! Pure comparison of the decoded payload against the validation context.
//! Checks run in a fixed order and the first violation is reported:
//!
//! 1. `iss` equals the expected issuer
//! 2. `sub` is a non-empty string
//! 3. `aud` is, or contains, the client identifier
//! 4. `azp` equals the client identifier when `aud` has several values
//! 5. `exp` is after the current time minus leeway
//! 6. `iat` is a number
//! 7. `nonce` equals the expected nonce, when one is expected
//! 8. `auth_time` plus max-age is not before the current time minus leeway,
//!    when a max-age is set

use tracing::debug;

use crate::context::ValidationContext;
use crate::error::ClaimsError;
use crate::token::{Claims, DecodedToken};

/// Capability verifying a decoded token's claims
pub trait ClaimsVerifier: Send + Sync {
    fn verify(&self, token: &DecodedToken, context: &ValidationContext) -> Result<(), ClaimsError>;
}

/// Production claims verifier implementing the OpenID Connect ID token rules
#[derive(Debug, Clone, Copy, Default)]
pub struct IdTokenClaimsValidator;

impl IdTokenClaimsValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ClaimsVerifier for IdTokenClaimsValidator {
    fn verify(&self, token: &DecodedToken, context: &ValidationContext) -> Result<(), ClaimsError> {
        let claims = token.claims();
        let now = context.now().timestamp();
        let leeway = i64::try_from(context.leeway().as_secs()).unwrap_or(i64::MAX);

        let result = verify_issuer(claims, context)
            .and_then(|_| verify_subject(claims))
            .and_then(|_| verify_audience(claims, context))
            .and_then(|_| verify_authorized_party(claims, context))
            .and_then(|_| verify_expiration(claims, now, leeway))
            .and_then(|_| verify_issued_at(claims))
            .and_then(|_| verify_nonce(claims, context))
            .and_then(|_| verify_auth_time(claims, context, now, leeway));

        if let Err(e) = &result {
            debug!(error = %e, "ID token claims rejected");
        }
        result
    }
}

fn verify_issuer(claims: &Claims, context: &ValidationContext) -> Result<(), ClaimsError> {
    let actual = claims.issuer().ok_or(ClaimsError::MissingIssuer)?;
    if actual != context.issuer() {
        return Err(ClaimsError::IssuerMismatch {
            expected: context.issuer().to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn verify_subject(claims: &Claims) -> Result<(), ClaimsError> {
    match claims.subject() {
        Some(sub) if !sub.is_empty() => Ok(()),
        _ => Err(ClaimsError::MissingSubject),
    }
}

fn verify_audience(claims: &Claims, context: &ValidationContext) -> Result<(), ClaimsError> {
    let audience = claims.audience().ok_or(ClaimsError::MissingAudience)?;
    if !audience.contains(context.audience()) {
        return Err(ClaimsError::AudienceMismatch {
            expected: context.audience().to_string(),
            actual: audience.values(),
        });
    }
    Ok(())
}

fn verify_authorized_party(claims: &Claims, context: &ValidationContext) -> Result<(), ClaimsError> {
    // Audience was checked just before, so it is present here
    let multiple = claims.audience().map_or(false, |aud| aud.len() > 1);
    if !multiple {
        return Ok(());
    }

    let actual = claims.authorized_party().ok_or(ClaimsError::MissingAuthorizedParty)?;
    if actual != context.audience() {
        return Err(ClaimsError::AuthorizedPartyMismatch {
            expected: context.audience().to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn verify_expiration(claims: &Claims, now: i64, leeway: i64) -> Result<(), ClaimsError> {
    let exp = claims.expiration().ok_or(ClaimsError::MissingExpiration)?;
    if now.saturating_sub(leeway) >= exp {
        return Err(ClaimsError::TokenExpired { now, exp });
    }
    Ok(())
}

fn verify_issued_at(claims: &Claims) -> Result<(), ClaimsError> {
    claims.issued_at().map(|_| ()).ok_or(ClaimsError::MissingIssuedAt)
}

fn verify_nonce(claims: &Claims, context: &ValidationContext) -> Result<(), ClaimsError> {
    let Some(expected) = context.nonce() else {
        return Ok(());
    };

    let actual = claims.nonce().ok_or(ClaimsError::MissingNonce)?;
    if actual != expected {
        return Err(ClaimsError::NonceMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

fn verify_auth_time(
    claims: &Claims,
    context: &ValidationContext,
    now: i64,
    leeway: i64,
) -> Result<(), ClaimsError> {
    let Some(max_age) = context.max_age() else {
        return Ok(());
    };

    let auth_time = claims.auth_time().ok_or(ClaimsError::MissingAuthTime)?;
    let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
    let last_auth = auth_time.saturating_add(max_age);
    if now.saturating_sub(leeway) > last_auth {
        return Err(ClaimsError::AuthenticationExpired { now, last_auth });
    }
    Ok(())
}
