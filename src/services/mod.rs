//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill the
//! authentication use cases. They depend on abstractions (traits) for
//! dependency inversion: the clock, the counter store, and the user
//! repository are all injected.

mod auth_service;
mod throttle;
mod token_service;

pub use auth_service::{AuthService, Authenticator};
pub use throttle::{LoginThrottle, ThrottleDecision};
pub use token_service::{TokenPair, TokenService};
