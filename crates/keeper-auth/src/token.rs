// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HS256 bearer tokens.
//!
//! A token is a JWT whose claims carry the user id (`uid`), issue time and
//! expiry. Tokens are stateless: validation is a pure function of the
//! signing secret and the clock.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keeper_config::model::AuthConfig;
use keeper_config::validation::MIN_TOKEN_SECRET_LEN;
use keeper_core::{AuthError, KeeperError, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Issues tokens at login.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: UserId) -> Result<String, KeeperError>;
}

/// Resolves a presented token to the user it was issued for.
pub trait TokenValidator: Send + Sync {
    /// Fails with `AuthError::InvalidToken` when the token is malformed,
    /// carries a bad signature, or has expired.
    fn validate(&self, token: &str) -> Result<UserId, KeeperError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    uid: i64,
    iat: i64,
    exp: i64,
}

/// Signs and verifies tokens with one process-wide HMAC secret.
pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for JwtAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthority")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl JwtAuthority {
    /// Build from a signing secret of at least 32 bytes.
    pub fn new(secret: &SecretString, ttl_secs: u64) -> Result<Self, KeeperError> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.len() < MIN_TOKEN_SECRET_LEN {
            return Err(KeeperError::Internal(format!(
                "token signing secret must be at least {MIN_TOKEN_SECRET_LEN} bytes"
            )));
        }
        let ttl_secs = i64::try_from(ttl_secs)
            .ok()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| KeeperError::Internal("token lifetime out of range".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl_secs,
        })
    }

    /// Build from `[auth]` configuration. A missing secret is fatal.
    pub fn from_config(config: &AuthConfig) -> Result<Self, KeeperError> {
        let secret = config.token_secret.clone().ok_or_else(|| {
            KeeperError::Internal(
                "auth.token_secret is not configured (set KEEPER_AUTH_TOKEN_SECRET)".to_string(),
            )
        })?;
        Self::new(&SecretString::from(secret), config.token_ttl_secs)
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(&self, user: UserId, issued_at: DateTime<Utc>) -> Result<String, KeeperError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            uid: user.0,
            iat,
            exp: iat + self.ttl_secs,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| KeeperError::Internal(format!("failed to sign token: {e}")))
    }
}

impl TokenIssuer for JwtAuthority {
    fn issue(&self, user: UserId) -> Result<String, KeeperError> {
        self.issue_at(user, Utc::now())
    }
}

impl TokenValidator for JwtAuthority {
    fn validate(&self, token: &str) -> Result<UserId, KeeperError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                debug!(reason = ?e.kind(), "token rejected");
                AuthError::InvalidToken
            })?;
        if data.claims.uid <= 0 {
            debug!(uid = data.claims.uid, "token rejected: non-positive uid");
            return Err(AuthError::InvalidToken.into());
        }
        Ok(UserId(data.claims.uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-hs256-signing-secret-of-32-bytes!";

    fn authority() -> JwtAuthority {
        JwtAuthority::new(&SecretString::from(SECRET.to_string()), 3 * 60 * 60).unwrap()
    }

    fn is_invalid_token(result: Result<UserId, KeeperError>) -> bool {
        matches!(result, Err(KeeperError::Auth(AuthError::InvalidToken)))
    }

    #[test]
    fn issued_token_validates_to_same_user() {
        let auth = authority();
        let token = auth.issue(UserId(42)).unwrap();
        assert_eq!(auth.validate(&token).unwrap(), UserId(42));
    }

    #[test]
    fn token_is_a_three_part_jwt() {
        let token = authority().issue(UserId(1)).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = authority();
        let four_hours_ago = Utc::now() - chrono::Duration::hours(4);
        let token = auth.issue_at(UserId(1), four_hours_ago).unwrap();
        assert!(is_invalid_token(auth.validate(&token)));
    }

    #[test]
    fn token_just_inside_lifetime_is_accepted() {
        let auth = authority();
        let almost_three_hours_ago = Utc::now() - chrono::Duration::minutes(179);
        let token = auth.issue_at(UserId(1), almost_three_hours_ago).unwrap();
        assert_eq!(auth.validate(&token).unwrap(), UserId(1));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = JwtAuthority::new(
            &SecretString::from("a-completely-different-secret-value".to_string()),
            3600,
        )
        .unwrap();
        let token = other.issue(UserId(1)).unwrap();
        assert!(is_invalid_token(authority().validate(&token)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let auth = authority();
        let token = auth.issue(UserId(1)).unwrap();
        let forged_claims = auth.issue(UserId(2)).unwrap();

        // Splice user 2's payload under user 1's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged: Vec<&str> = forged_claims.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged[1], parts[2]);
        assert!(is_invalid_token(auth.validate(&spliced)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let auth = authority();
        for token in ["", "not-a-token", "a.b.c", "eyJhbGciOiJIUzI1NiJ9..", "...."] {
            assert!(is_invalid_token(auth.validate(token)), "accepted {token:?}");
        }
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let auth = authority();
        let token = auth.issue(UserId(1)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        // {"alg":"none","typ":"JWT"}
        let none_header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let unsigned = format!("{none_header}.{}.", parts[1]);
        assert!(is_invalid_token(auth.validate(&unsigned)));
    }

    #[test]
    fn non_positive_uid_is_rejected() {
        let auth = authority();
        let token = auth.issue(UserId(0)).unwrap();
        assert!(is_invalid_token(auth.validate(&token)));
    }

    #[test]
    fn short_secret_is_an_internal_error() {
        let result = JwtAuthority::new(&SecretString::from("short".to_string()), 60);
        assert!(matches!(result, Err(KeeperError::Internal(_))));
    }

    #[test]
    fn missing_configured_secret_is_an_internal_error() {
        let result = JwtAuthority::from_config(&AuthConfig::default());
        assert!(matches!(result, Err(KeeperError::Internal(m)) if m.contains("token_secret")));
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", authority());
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("[REDACTED]"));
    }
}
