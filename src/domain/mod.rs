//! Domain layer - Core business entities and logic
//!
//! Contains the domain models that represent authentication concepts
//! independent of infrastructure concerns: the token claims contract,
//! the password value object, and the user credential record.

pub mod password;
pub mod token;
pub mod user;

pub use password::Password;
pub use token::{Claims, TokenError, TokenType};
pub use user::{User, UserResponse};
