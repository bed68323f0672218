//! Authentication service - credential verification and token flows.
//!
//! Orchestrates the user repository (credential store), the Password value
//! object, and the token service. All failures surface as typed `AppError`
//! values for the HTTP layer to map; repository faults propagate unchanged
//! rather than being folded into authentication failures.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Password, TokenError, TokenType, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;
use crate::services::{TokenPair, TokenService};

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user
    async fn register(&self, email: String, password: String) -> AppResult<User>;

    /// Verify credentials and return an access/refresh token pair
    async fn login(&self, email: String, password: String) -> AppResult<TokenPair>;

    /// Exchange a refresh token for a new access token (no rotation)
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Resolve the user behind an access token.
    ///
    /// The single shared claim-extraction path: every call site that needs
    /// "the current user from a bearer token" goes through here.
    async fn user_from_token(&self, token: &str) -> AppResult<User>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl Authenticator {
    /// Create new auth service instance
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, email: String, password: String) -> AppResult<User> {
        // Email format is validated by the handler's ValidatedJson extractor
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User"));
        }

        let password_hash = Password::new(&password)?.into_string();
        self.users.create(email, password_hash).await
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenPair> {
        let user_result = self.users.find_by_email(&email).await?;

        // SECURITY: Verify against a dummy hash when the email is unknown,
        // so "no such user" and "wrong password" stay in the same timing
        // class and return byte-identical errors.
        let stored_password = match &user_result {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::dummy(),
        };

        let password_valid = stored_password.verify(&password);

        let user = match user_result {
            Some(user) if password_valid => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        // Correct password on a disabled account gets its own error. This
        // leaks that the account exists, a known, accepted trade-off: the
        // branch is only reachable after a successful password match.
        if !user.is_active {
            return Err(AppError::InactiveAccount);
        }

        tracing::info!(user_id = user.id, "User logged in");
        self.tokens.issue_pair(&user.id.to_string())
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let (pair, claims) = self.tokens.refresh(refresh_token)?;

        // The subject must still exist and be active; a refresh token
        // outliving its account must not mint new access tokens.
        match self.lookup_subject(&claims.sub).await? {
            Some(user) if user.is_active => {}
            _ => return Err(AppError::Unauthorized),
        }

        tracing::debug!(subject = %claims.sub, "Access token refreshed");
        Ok(pair)
    }

    async fn user_from_token(&self, token: &str) -> AppResult<User> {
        let claims = self.tokens.validate(token, TokenType::Access)?;

        let user = self
            .lookup_subject(&claims.sub)
            .await?
            .ok_or(AppError::NotFound)?;

        if !user.is_active {
            return Err(AppError::InactiveAccount);
        }

        Ok(user)
    }
}

impl Authenticator {
    /// Parse a token subject back to the numeric user id and look it up.
    /// A non-numeric subject cannot come from this service's issuer, so it
    /// is treated as a malformed token.
    async fn lookup_subject(&self, sub: &str) -> AppResult<Option<User>> {
        let user_id: i64 = sub
            .parse()
            .map_err(|_| AppError::Token(TokenError::InvalidSignature))?;
        self.users.find_by_id(user_id).await
    }
}
