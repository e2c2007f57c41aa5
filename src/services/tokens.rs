// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! JWT issuing and verification.
//!
//! Two token kinds share one signing key: short-lived access tokens carried
//! as bearer headers, and long-lived session tokens carried in a cookie.
//! The `kind` claim keeps one from standing in for the other.

use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Access token lifetime (10 minutes).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 600;
/// Session token lifetime (30 days). Matches the cookie Max-Age.
pub const SESSION_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Session,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Which credential this token is
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Well-formed and correctly signed, but past `exp`.
    #[error("token expired")]
    Expired,
    /// Anything else: garbage, bad signature, wrong algorithm.
    #[error("token invalid")]
    Invalid,
}

/// Signs and verifies the application's JWTs.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(signing_key: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(signing_key),
            decoding: DecodingKey::from_secret(signing_key),
        }
    }

    /// Sign a token for `user_id` expiring `ttl_secs` from now. A negative
    /// TTL produces an already-expired token, which tests rely on.
    pub fn issue(&self, kind: TokenKind, user_id: &str, ttl_secs: i64) -> anyhow::Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now,
            exp: now + ttl_secs,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify signature and expiry. Expiry is checked with zero leeway so
    /// a token is rejected the second it lapses.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-signing-key-not-for-production")
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = issuer();
        let token = issuer
            .issue(TokenKind::Access, "user-1", ACCESS_TOKEN_TTL_SECS)
            .unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_expired_token_is_distinguished_from_garbage() {
        let issuer = issuer();
        let expired = issuer.issue(TokenKind::Access, "user-1", -30).unwrap();
        assert_eq!(issuer.verify(&expired), Err(TokenError::Expired));
        assert_eq!(
            issuer.verify("not.a.jwt"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let token = issuer()
            .issue(TokenKind::Session, "user-1", SESSION_TOKEN_TTL_SECS)
            .unwrap();
        let other = TokenIssuer::new(b"a-different-signing-key-entirely");
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_kind_claim_round_trips() {
        let issuer = issuer();
        let token = issuer
            .issue(TokenKind::Session, "user-1", SESSION_TOKEN_TTL_SECS)
            .unwrap();
        assert_eq!(issuer.verify(&token).unwrap().kind, TokenKind::Session);
    }
}
