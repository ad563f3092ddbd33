//! Login-session state for the SelectLine API client.
//!
//! SelectLine installations differ in how the login response names the
//! token and its lifetime, so extraction is an ordered list of candidate
//! probes tried in sequence; the first hit wins. The lists below are the
//! central record of observed field-name variance — extend them here
//! rather than special-casing call sites.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::error::ClientError;

/// Token lifetime assumed when the login response carries no TTL field.
const DEFAULT_TTL_SECS: i64 = 3_600;

/// A session is renewed this many seconds before its recorded expiry so a
/// request never goes out with a token that dies in flight.
const EXPIRY_MARGIN_SECS: i64 = 10;

/// Field names observed to carry the login token, in probe order.
const TOKEN_FIELDS: [&str; 4] = ["AccessToken", "access_token", "Token", "token"];

/// Field names observed to carry the token lifetime in seconds, in probe
/// order.
const TTL_FIELDS: [&str; 4] = [
    "ExpiresIn",
    "expires_in",
    "ValidFor",
    "TokenLifetimeSeconds",
];

/// An authenticated SelectLine session: the bearer token and the instant
/// it stops being trusted.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Builds a session from a raw login response body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Auth`] if none of the known token fields is
    /// present. A missing TTL is not an error; the default lifetime applies.
    pub fn from_login_response(body: &Value, now: DateTime<Utc>) -> Result<Self, ClientError> {
        let token = extract_token(body).ok_or_else(|| {
            ClientError::Auth("login response contains no recognizable token field".to_string())
        })?;
        let ttl_secs = extract_ttl_secs(body).unwrap_or(DEFAULT_TTL_SECS);
        Ok(Self {
            token,
            expires_at: now + Duration::seconds(ttl_secs),
        })
    }

    /// Returns `true` while the token can still be attached to a request,
    /// i.e. `now` is more than the safety margin away from the expiry.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Probes the candidate token fields in order; first non-blank string wins.
fn extract_token(body: &Value) -> Option<String> {
    TOKEN_FIELDS.iter().find_map(|field| {
        body.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}

/// Probes the candidate TTL fields in order; accepts integers and numeric
/// strings, rejects zero and negatives.
fn extract_ttl_secs(body: &Value) -> Option<i64> {
    TTL_FIELDS.iter().find_map(|field| {
        let raw = body.get(field)?;
        let secs = raw
            .as_i64()
            .or_else(|| raw.as_str().and_then(|s| s.trim().parse::<i64>().ok()))?;
        (secs > 0).then_some(secs)
    })
}
