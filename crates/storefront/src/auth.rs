//! Authentication gate.
//!
//! The backend issues JWT-shaped bearer tokens. The client reads the payload
//! claims to decide which surface to show and whether the session is still
//! live. Signatures are never checked here: claims drive routing and UX
//! only, and every authorization decision stays with the backend.

use std::sync::Arc;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use campick_core::{Role, UserId};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{Storage, keys};

/// Token payloads are base64url; padding is optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Some issuers use the standard alphabet.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while reading a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token does not have three dot-separated segments.
    #[error("token is not a three-part JWT")]
    Malformed,

    /// The payload segment is not valid base64.
    #[error("token payload is not valid base64")]
    Encoding,

    /// The payload is not a JSON claims object.
    #[error("token payload is not valid JSON: {0}")]
    Payload(String),

    /// The token has no `exp` claim or it is in the past.
    #[error("token is expired")]
    Expired,
}

/// Claims carried in the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub role: Option<Role>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Claims {
    /// Whether the token is still live at `now`.
    ///
    /// A token without `exp` is never valid.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp > now.timestamp())
    }

    /// Expiry as a timestamp, if present and representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the claims of a bearer token without verifying its signature.
///
/// # Errors
///
/// Returns `TokenError` if the token is not a JWT or its payload cannot be
/// decoded. Never panics on garbage input.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|_| TokenError::Encoding)?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Which top-level surface a session lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Shop-owner console.
    OwnerDashboard,
    /// Shared student/teacher storefront.
    Storefront,
    /// Not signed in, or a role this client cannot serve.
    SignIn,
}

impl Surface {
    /// Route a role claim to its surface.
    #[must_use]
    pub const fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::ShopOwner) => Self::OwnerDashboard,
            Some(Role::Student | Role::Teacher) => Self::Storefront,
            Some(Role::Unknown) | None => Self::SignIn,
        }
    }
}

/// A live, decoded session.
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: Claims,
    token: SecretString,
}

impl Session {
    /// The bearer token for HTTP requests.
    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// The surface this session routes to.
    #[must_use]
    pub const fn surface(&self) -> Surface {
        Surface::for_role(self.claims.role)
    }
}

/// Outcome of checking the stored token.
#[derive(Debug, Clone)]
pub enum AuthState {
    SignedIn(Session),
    SignedOut,
}

impl AuthState {
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Gate over the token persisted in client storage.
///
/// An expired or undecodable token is treated as signed out and removed
/// from storage the first time it is seen.
#[derive(Clone)]
pub struct AuthGate {
    storage: Arc<dyn Storage>,
}

impl AuthGate {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validate `token` and store it.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token cannot be decoded or is already
    /// expired. Nothing is stored in that case.
    pub fn sign_in(&self, token: &str) -> Result<Session, TokenError> {
        let token = token.trim();
        let claims = decode_claims(token)?;
        if !claims.is_valid_at(Utc::now()) {
            return Err(TokenError::Expired);
        }

        if let Err(e) = self.storage.set(keys::TOKEN, token) {
            warn!(error = %e, "Failed to persist token, session will not survive restart");
        }
        debug!(role = ?claims.role, "Signed in");

        Ok(Session {
            claims,
            token: SecretString::from(token.to_string()),
        })
    }

    /// Current session state.
    #[must_use]
    pub fn session(&self) -> AuthState {
        self.session_at(Utc::now())
    }

    /// Session state as of `now`.
    #[must_use]
    pub fn session_at(&self, now: DateTime<Utc>) -> AuthState {
        let token = match self.storage.get(keys::TOKEN) {
            Ok(Some(token)) => token,
            Ok(None) => return AuthState::SignedOut,
            Err(e) => {
                warn!(error = %e, "Token storage unreadable, treating as signed out");
                return AuthState::SignedOut;
            }
        };

        match decode_claims(&token) {
            Ok(claims) if claims.is_valid_at(now) => AuthState::SignedIn(Session {
                claims,
                token: SecretString::from(token),
            }),
            Ok(_) => {
                debug!("Stored token expired");
                self.sign_out();
                AuthState::SignedOut
            }
            Err(e) => {
                debug!(error = %e, "Stored token unreadable");
                self.sign_out();
                AuthState::SignedOut
            }
        }
    }

    /// The surface the current session routes to.
    #[must_use]
    pub fn route(&self) -> Surface {
        match self.session() {
            AuthState::SignedIn(session) => session.surface(),
            AuthState::SignedOut => Surface::SignIn,
        }
    }

    /// The current bearer token, if signed in.
    #[must_use]
    pub fn bearer(&self) -> Option<SecretString> {
        match self.session() {
            AuthState::SignedIn(session) => Some(session.token),
            AuthState::SignedOut => None,
        }
    }

    /// Forget the stored token.
    pub fn sign_out(&self) {
        if let Err(e) = self.storage.remove(keys::TOKEN) {
            warn!(error = %e, "Failed to remove stored token");
        }
    }
}

/// Build an unsigned token carrying `claims`, for tests and local tooling.
#[cfg(test)]
pub(crate) fn unsigned_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_LENIENT.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_LENIENT.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
