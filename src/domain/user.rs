//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User domain entity.
///
/// The authentication core treats this as a read-only credential record:
/// it reads `password_hash` and `is_active` during verification and never
/// mutates the record. Only registration writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Administratively disabled accounts cannot authenticate
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user record
    pub fn new(id: i64, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User response (safe to return to clients)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = 1)]
    pub id: i64,
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Whether the account is active
    #[schema(example = true)]
    pub is_active: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_active() {
        let user = User::new(1, "test@example.com".to_string(), "hashed".to_string());
        assert!(user.is_active);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User::new(1, "test@example.com".to_string(), "hashed".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "test@example.com");
    }

    #[test]
    fn test_user_response_from_user() {
        let user = User::new(7, "test@example.com".to_string(), "hashed".to_string());
        let response = UserResponse::from(user);
        assert_eq!(response.id, 7);
        assert!(response.is_active);
    }
}
