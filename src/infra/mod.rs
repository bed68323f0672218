//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection and the user repository
//! - Rate-limit counter stores (in-memory and Redis)
//! - The clock abstraction used by the token service and throttle

pub mod clock;
pub mod counter;
pub mod db;
pub mod repositories;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{CounterStore, MemoryCounterStore, RedisCounterStore, WindowCount};
pub use db::{Database, Migrator};
pub use repositories::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockUserRepository;
