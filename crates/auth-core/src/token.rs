//! Compact JWT decoding
//!
//! Splits a compact-serialized ID token into its three segments and parses the
//! header and payload JSON objects. No cryptographic work happens here; the
//! decoded token keeps the exact bytes it was built from so the signature can
//! later be checked over the received `header.payload` span.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::DecodingError;

/// Parsed JOSE header of an ID token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    /// Signature algorithm (`alg`)
    pub alg: Option<String>,
    /// Key identifier (`kid`)
    pub kid: Option<String>,
    /// Token type (`typ`)
    pub typ: Option<String>,
}

impl Header {
    fn from_object(object: &Map<String, Value>) -> Self {
        let field = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_owned);
        Self {
            alg: field("alg"),
            kid: field("kid"),
            typ: field("typ"),
        }
    }
}

/// Audience claim, either a single value or a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `client_id` is one of the intended audiences
    pub fn contains(&self, client_id: &str) -> bool {
        match self {
            Self::Single(aud) => aud == client_id,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
        }
    }

    /// All audience values as a list
    pub fn values(&self) -> Vec<String> {
        match self {
            Self::Single(aud) => vec![aud.clone()],
            Self::Multiple(auds) => auds.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(auds) => auds.len(),
        }
    }
}

/// Payload claims of an ID token
///
/// Wraps the raw JSON object; typed accessors return `None` both when a claim
/// is absent and when it has the wrong JSON type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String claim value
    pub fn string(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// NumericDate claim value in whole seconds since the Unix epoch
    pub fn timestamp(&self, name: &str) -> Option<i64> {
        let value = self.0.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|secs| secs.is_finite()).map(|secs| secs as i64))
    }

    /// Audience claim; `None` when absent or not a string / array of strings
    pub fn audience(&self) -> Option<Audience> {
        match self.0.get("aud")? {
            Value::String(aud) => Some(Audience::Single(aud.clone())),
            Value::Array(values) => values
                .iter()
                .map(|value| value.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .map(Audience::Multiple),
            _ => None,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        self.string("iss")
    }

    pub fn subject(&self) -> Option<&str> {
        self.string("sub")
    }

    pub fn authorized_party(&self) -> Option<&str> {
        self.string("azp")
    }

    pub fn nonce(&self) -> Option<&str> {
        self.string("nonce")
    }

    pub fn expiration(&self) -> Option<i64> {
        self.timestamp("exp")
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.timestamp("iat")
    }

    pub fn auth_time(&self) -> Option<i64> {
        self.timestamp("auth_time")
    }

    pub fn email(&self) -> Option<&str> {
        self.string("email")
    }

    /// Underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// An ID token split into its segments with header and payload parsed
///
/// Immutable once produced by [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    raw: String,
    header_end: usize,
    payload_end: usize,
    header: Header,
    claims: Claims,
}

impl DecodedToken {
    /// Parsed JOSE header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Parsed payload claims
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Encoded header segment as received
    pub fn header_segment(&self) -> &str {
        &self.raw[..self.header_end]
    }

    /// Encoded payload segment as received
    pub fn payload_segment(&self) -> &str {
        &self.raw[self.header_end + 1..self.payload_end]
    }

    /// Encoded signature segment as received
    pub fn signature_segment(&self) -> &str {
        &self.raw[self.payload_end + 1..]
    }

    /// The exact `header.payload` bytes the signature was computed over
    pub fn signing_input(&self) -> &[u8] {
        self.raw[..self.payload_end].as_bytes()
    }
}

/// Decode a compact ID token
///
/// Exactly three non-empty base64url segments are required, so unsigned
/// (`alg: none`) tokens with an empty signature are rejected as malformed.
pub fn decode(token: Option<&str>) -> Result<DecodedToken, DecodingError> {
    let token = token.ok_or(DecodingError::MissingToken)?;

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        debug!(segments = segments.len(), "ID token does not have three segments");
        return Err(DecodingError::CannotDecode);
    }
    if segments.iter().any(|segment| segment.is_empty()) {
        debug!("ID token has an empty segment");
        return Err(DecodingError::CannotDecode);
    }

    let header = parse_object(segments[0])?;
    let payload = parse_object(segments[1])?;
    base64_url_decode(segments[2])?;

    let header_end = segments[0].len();
    let payload_end = header_end + 1 + segments[1].len();

    Ok(DecodedToken {
        raw: token.to_owned(),
        header_end,
        payload_end,
        header: Header::from_object(&header),
        claims: Claims(payload),
    })
}

fn parse_object(segment: &str) -> Result<Map<String, Value>, DecodingError> {
    let bytes = base64_url_decode(segment)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => {
            debug!("ID token segment is not a JSON object");
            Err(DecodingError::CannotDecode)
        }
        Err(e) => {
            debug!(error = %e, "ID token segment is not valid JSON");
            Err(DecodingError::CannotDecode)
        }
    }
}

/// Base64 URL decode, tolerating trailing padding
fn base64_url_decode(segment: &str) -> Result<Vec<u8>, DecodingError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| URL_SAFE.decode(segment))
        .map_err(|e| {
            debug!(error = %e, "ID token segment is not valid base64url");
            DecodingError::CannotDecode
        })
}
