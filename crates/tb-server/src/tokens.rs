//! HS256 bearer tokens.
//!
//! Tokens carry the caller's [`UserId`] as `sub` and are issued by the
//! `issue-token` CLI command for development and tests.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tb_core::{Error, Result, UserId};

/// Issuer claim stamped on and required of every token.
pub const ISSUER: &str = "tubely";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from one shared secret.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_hours: u64,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_hours,
        }
    }

    /// Mint a token for `user_id`.
    pub fn issue(&self, user_id: UserId) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX / 2);
        let claims = Claims {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify `token` and return the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {e}");
            match e.kind() {
                ErrorKind::ExpiredSignature => Error::Unauthorized("token has expired".into()),
                ErrorKind::InvalidIssuer => Error::Unauthorized("invalid token issuer".into()),
                _ => Error::Unauthorized("invalid token".into()),
            }
        })?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| Error::Unauthorized("token subject is not a user id".into()))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify() {
        let keys = TokenKeys::new("a-test-secret-of-some-length", 1);
        let user = UserId::new();
        let token = keys.issue(user).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenKeys::new("first-secret-value", 1)
            .issue(UserId::new())
            .unwrap();
        let err = TokenKeys::new("second-secret-value", 1)
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("a-test-secret-of-some-length", 1);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().to_string(),
            iss: ISSUER.into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let keys = TokenKeys::new("a-test-secret-of-some-length", 1);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().to_string(),
            iss: "someone-else".into(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
