//! Token service - issues, validates, and refreshes JWTs.
//!
//! Stateless by design: issuance is a pure computation over the injected
//! clock and signing secret, and no revocation list exists. A token remains
//! valid until natural expiry regardless of logout; the short access-token
//! lifetime is the mitigation. Adding revocation later means adding a `jti`
//! claim and a server-side denylist, which is a claims-schema change.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::{Config, TOKEN_TYPE_BEARER};
use crate::domain::{Claims, TokenError, TokenType};
use crate::errors::{AppError, AppResult};
use crate::infra::Clock;

/// Access/refresh token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// JWT refresh token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
    /// Token type (always "bearer")
    #[schema(example = "bearer")]
    pub token_type: String,
}

/// Issues and validates signed tokens.
///
/// Pure and stateless per call: no locking, safe to share across request
/// handlers. The only shared resource is the signing secret, read-only
/// after construction.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a token service over a symmetric secret (HS256).
    pub fn new(
        secret: &[u8],
        access_lifetime: Duration,
        refresh_lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // Expiry is checked against the injected clock, not the library's
        // system-time check, so expiry behavior is deterministic in tests
        // and the boundary is exactly `now < exp` with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_lifetime,
            refresh_lifetime,
            clock,
        }
    }

    /// Create a token service from application configuration.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.jwt_secret_bytes(),
            Duration::minutes(config.access_token_expire_minutes),
            Duration::days(config.refresh_token_expire_days),
            clock,
        )
    }

    /// Issue a signed token for `subject` with the lifetime of `token_type`.
    ///
    /// No side effects beyond the pure computation; issuance never touches
    /// persistent storage.
    pub fn issue(&self, subject: &str, token_type: TokenType) -> AppResult<String> {
        if subject.is_empty() {
            return Err(AppError::validation("Token subject must not be empty"));
        }

        let now = self.clock.now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };

        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token encoding failed: {}", e)))
    }

    /// Issue an access/refresh pair for the same subject.
    pub fn issue_pair(&self, subject: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenType::Access)?,
            refresh_token: self.issue(subject, TokenType::Refresh)?,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        })
    }

    /// Decode and validate a token, checking signature, then expiry, then
    /// type, in that order.
    ///
    /// The expiry boundary is exclusive: a token whose `exp` equals the
    /// current second is already expired.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        // Signature/shape first: a forged or malformed token must fail
        // before any semantic check runs.
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidSignature)?;
        let claims = data.claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }

        if claims.token_type != expected {
            return Err(TokenError::WrongTokenType {
                expected,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// No rotation: the returned pair carries the incoming refresh token
    /// unchanged, so a stolen refresh token stays valid for its full
    /// lifetime. Rotation would require tracking used-token state, which
    /// conflicts with the stateless design; this trade-off is deliberate.
    pub fn refresh(&self, refresh_token: &str) -> AppResult<(TokenPair, Claims)> {
        let claims = self.validate(refresh_token, TokenType::Refresh)?;

        let access_token = self.issue(&claims.sub, TokenType::Access)?;

        let pair = TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
        };

        Ok((pair, claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ManualClock;
    use base64::Engine;
    use chrono::Utc;

    const TEST_SECRET: &[u8] = b"test-secret-key-for-testing-only-32chars";

    fn service_with_clock() -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = TokenService::new(
            TEST_SECRET,
            Duration::minutes(30),
            Duration::days(7),
            clock.clone(),
        );
        (service, clock)
    }

    #[test]
    fn test_issue_and_validate_round_trip() {
        let (service, _clock) = service_with_clock();

        for token_type in [TokenType::Access, TokenType::Refresh] {
            let token = service.issue("42", token_type).unwrap();
            let claims = service.validate(&token, token_type).unwrap();

            assert_eq!(claims.sub, "42");
            assert_eq!(claims.token_type, token_type);
            assert!(claims.exp > claims.iat);
        }
    }

    #[test]
    fn test_issue_rejects_empty_subject() {
        let (service, _clock) = service_with_clock();
        assert!(service.issue("", TokenType::Access).is_err());
    }

    #[test]
    fn test_type_discrimination_both_directions() {
        let (service, _clock) = service_with_clock();

        let access = service.issue("1", TokenType::Access).unwrap();
        let refresh = service.issue("1", TokenType::Refresh).unwrap();

        assert_eq!(
            service.validate(&access, TokenType::Refresh).unwrap_err(),
            TokenError::WrongTokenType {
                expected: TokenType::Refresh,
                actual: TokenType::Access,
            }
        );
        assert_eq!(
            service.validate(&refresh, TokenType::Access).unwrap_err(),
            TokenError::WrongTokenType {
                expected: TokenType::Access,
                actual: TokenType::Refresh,
            }
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let (service, clock) = service_with_clock();
        let token = service.issue("42", TokenType::Access).unwrap();

        // One second before the lifetime elapses: still valid
        clock.advance(Duration::minutes(30) - Duration::seconds(1));
        assert!(service.validate(&token, TokenType::Access).is_ok());

        // At exactly the lifetime: expired (exclusive boundary)
        clock.advance(Duration::seconds(1));
        assert_eq!(
            service.validate(&token, TokenType::Access).unwrap_err(),
            TokenError::Expired
        );

        // One second past: still expired
        clock.advance(Duration::seconds(1));
        assert_eq!(
            service.validate(&token, TokenType::Access).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_expiry_checked_before_type() {
        let (service, clock) = service_with_clock();
        let token = service.issue("42", TokenType::Access).unwrap();

        clock.advance(Duration::minutes(31));
        // An expired token of the wrong type reports Expired, not type
        assert_eq!(
            service.validate(&token, TokenType::Refresh).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let (service, _clock) = service_with_clock();
        let token = service.issue("42", TokenType::Access).unwrap();

        let signature_start = token.rfind('.').unwrap() + 1;
        let signature_len = token.len() - signature_start;

        // Flip every character of the signature segment, one at a time
        for i in 0..signature_len {
            let mut bytes = token.clone().into_bytes();
            let pos = signature_start + i;
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            if tampered == token {
                continue;
            }
            assert_eq!(
                service.validate(&tampered, TokenType::Access).unwrap_err(),
                TokenError::InvalidSignature,
                "flipping signature byte {} must invalidate the token",
                i
            );
        }
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let (service, _clock) = service_with_clock();

        for garbage in ["", "not-a-token", "a.b", "a.b.c", "eyJhbGciOiJIUzI1NiJ9"] {
            assert_eq!(
                service.validate(garbage, TokenType::Access).unwrap_err(),
                TokenError::InvalidSignature
            );
        }
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let (service, _clock) = service_with_clock();
        let other = TokenService::new(
            b"another-secret-key-for-testing-32chars!!",
            Duration::minutes(30),
            Duration::days(7),
            Arc::new(ManualClock::new(Utc::now())),
        );

        let token = other.issue("42", TokenType::Access).unwrap();
        assert_eq!(
            service.validate(&token, TokenType::Access).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn test_wire_claim_names() {
        // Consumers verifying tokens independently depend on these exact
        // payload field names.
        let (service, _clock) = service_with_clock();
        let token = service.issue("42", TokenType::Refresh).unwrap();

        let payload_segment = token.split('.').nth(1).unwrap();
        let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_segment)
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).unwrap();

        assert_eq!(payload["sub"], "42");
        assert_eq!(payload["type"], "refresh");
        assert!(payload["iat"].is_i64());
        assert!(payload["exp"].is_i64());
    }

    #[test]
    fn test_refresh_returns_same_refresh_token() {
        let (service, clock) = service_with_clock();
        let pair = service.issue_pair("7").unwrap();

        // Advance so the new access token differs from the original
        clock.advance(Duration::seconds(5));
        let (refreshed, claims) = service.refresh(&pair.refresh_token).unwrap();

        assert_eq!(claims.sub, "7");
        // No rotation: the refresh token comes back unchanged
        assert_eq!(refreshed.refresh_token, pair.refresh_token);
        assert_ne!(refreshed.access_token, pair.access_token);

        let access_claims = service
            .validate(&refreshed.access_token, TokenType::Access)
            .unwrap();
        assert_eq!(access_claims.sub, "7");

        // The returned refresh token still validates as refresh
        assert!(service
            .validate(&refreshed.refresh_token, TokenType::Refresh)
            .is_ok());
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let (service, _clock) = service_with_clock();
        let access = service.issue("7", TokenType::Access).unwrap();

        let err = service.refresh(&access).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::AppError::Token(TokenError::WrongTokenType {
                expected: TokenType::Refresh,
                actual: TokenType::Access,
            })
        ));
    }

    #[test]
    fn test_issue_pair_has_bearer_type() {
        let (service, _clock) = service_with_clock();
        let pair = service.issue_pair("1").unwrap();
        assert_eq!(pair.token_type, "bearer");
    }
}
