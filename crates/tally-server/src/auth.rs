//! Password hashing and JWT issuance.
//!
//! Access tokens are short-lived and verified on every protected request.
//! Refresh tokens are long-lived, carry a `jti`, and can be revoked by
//! inserting that `jti` into the `revoked_tokens` denylist.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Iterations for the salted password digest. Slows brute force while
/// keeping login latency negligible.
const PBKDF_ITERATIONS: u32 = 10_000;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Token issuance settings.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. Must be overridden in production
    /// (`TALLY_JWT_SECRET`).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

fn default_jwt_secret() -> String {
    "dev-secret-change-me".to_string()
}

fn default_access_ttl_minutes() -> i64 {
    30
}

fn default_refresh_ttl_days() -> i64 {
    7
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_ttl_minutes: default_access_ttl_minutes(),
            refresh_ttl_days: default_refresh_ttl_days(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

/// Errors from token verification.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signature, expiry, or shape problems from the JWT library.
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// A refresh token was presented where an access token was expected,
    /// or vice versa.
    #[error("wrong token kind: expected {expected:?}")]
    WrongKind { expected: TokenKind },
}

/// What a token is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims for both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Token id; refresh tokens are revoked by this.
    pub jti: String,
    /// Access or refresh.
    pub kind: TokenKind,
}

/// An access/refresh token pair, issued at signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Hashes a password as `salt$digest` (both hex).
///
/// The digest is SHA-256 over `salt || password`, iterated
/// [`PBKDF_ITERATIONS`] times.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = iterate_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verifies a password against a stored `salt$digest` string.
///
/// Returns `false` for malformed stored values rather than erroring: a
/// corrupt hash row behaves like a wrong password.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };

    let actual = iterate_digest(&salt, password);
    constant_time_eq(&actual, &expected)
}

fn iterate_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest: [u8; 32] = hasher.finalize().into();

    for _ in 1..PBKDF_ITERATIONS {
        digest = Sha256::digest(digest).into();
    }
    digest
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Issues a fresh access/refresh pair for `user_id`.
pub fn issue_token_pair(config: &AuthConfig, user_id: i64) -> Result<TokenPair, AuthError> {
    let now = chrono::Utc::now();
    let access = issue_token(
        config,
        user_id,
        TokenKind::Access,
        now + chrono::Duration::minutes(config.access_ttl_minutes),
    )?;
    let refresh = issue_token(
        config,
        user_id,
        TokenKind::Refresh,
        now + chrono::Duration::days(config.refresh_ttl_days),
    )?;
    Ok(TokenPair { access, refresh })
}

/// Issues a single access token (used by the refresh endpoint).
pub fn issue_access_token(config: &AuthConfig, user_id: i64) -> Result<String, AuthError> {
    issue_token(
        config,
        user_id,
        TokenKind::Access,
        chrono::Utc::now() + chrono::Duration::minutes(config.access_ttl_minutes),
    )
}

fn issue_token(
    config: &AuthConfig,
    user_id: i64,
    kind: TokenKind,
    expires_at: chrono::DateTime<chrono::Utc>,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp(),
        iat: chrono::Utc::now().timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
        kind,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verifies signature and expiry, and that the token is of `expected` kind.
pub fn verify_token(
    config: &AuthConfig,
    token: &str,
    expected: TokenKind,
) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    if data.claims.kind != expected {
        return Err(AuthError::WrongKind { expected });
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("x", "no-dollar-sign"));
        assert!(!verify_password("x", "nothex$alsonothex"));
        assert!(!verify_password("x", ""));
    }

    #[test]
    fn token_pair_round_trips() {
        let config = AuthConfig::default();
        let pair = issue_token_pair(&config, 42).unwrap();

        let access = verify_token(&config, &pair.access, TokenKind::Access).unwrap();
        assert_eq!(access.sub, 42);

        let refresh = verify_token(&config, &pair.refresh, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.sub, 42);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let config = AuthConfig::default();
        let pair = issue_token_pair(&config, 7).unwrap();

        let err = verify_token(&config, &pair.refresh, TokenKind::Access).unwrap_err();
        assert!(matches!(
            err,
            AuthError::WrongKind {
                expected: TokenKind::Access
            }
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = AuthConfig::default();
        let pair = issue_token_pair(&config, 7).unwrap();

        let other = AuthConfig {
            jwt_secret: "different".to_string(),
            ..AuthConfig::default()
        };
        assert!(verify_token(&other, &pair.access, TokenKind::Access).is_err());
    }
}
