//! Token domain types - claims, token kinds, and validation failures.
//!
//! These types define the wire contract of the token service: the claim
//! field names (`sub`, `iat`, `exp`, `type`) are fixed, and any consumer
//! verifying tokens independently must use the same names and algorithm.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token kind discriminator carried inside the signed payload.
///
/// Embedding the kind in the payload (rather than using separate signing
/// keys) is what prevents a stolen access token from being replayed
/// against the refresh endpoint and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived credential authorizing API calls directly
    Access,
    /// Longer-lived credential used only to mint new access tokens
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Decoded JWT claims payload.
///
/// `sub` is the stringified user id: the signing format mandates string
/// subjects even though the underlying id is numeric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (stringified user id)
    pub sub: String,
    /// Expiry, integer seconds since epoch (UTC)
    pub exp: i64,
    /// Issued-at, integer seconds since epoch (UTC)
    pub iat: i64,
    /// Token kind discriminator
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Token validation failures.
///
/// The check order is fixed: signature integrity first, then expiry, then
/// type. A forged token must fail before any semantic check runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token bytes do not verify under the service secret, or the token is
    /// malformed. Treated identically to a fabricated token.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The token's `exp` has passed. The remedy is the refresh flow (for
    /// access tokens) or re-authentication (for refresh tokens).
    #[error("Token has expired")]
    Expired,

    /// Token kind does not match what the calling operation expected.
    /// Indicates either a client bug or an attempted confusion attack.
    #[error("Invalid token type. Expected {expected}, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenType::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
    }

    #[test]
    fn test_claims_wire_field_names() {
        let claims = Claims {
            sub: "42".to_string(),
            exp: 1704067200,
            iat: 1704063600,
            token_type: TokenType::Access,
        };

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "42");
        assert_eq!(json["exp"], 1704067200);
        assert_eq!(json["iat"], 1704063600);
        assert_eq!(json["type"], "access");
    }

    #[test]
    fn test_wrong_token_type_message() {
        let err = TokenError::WrongTokenType {
            expected: TokenType::Access,
            actual: TokenType::Refresh,
        };
        assert_eq!(
            err.to_string(),
            "Invalid token type. Expected access, got refresh"
        );
    }
}
