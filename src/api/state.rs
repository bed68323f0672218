//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Clock, CounterStore, Database, SystemClock, UserStore};
use crate::services::{AuthService, Authenticator, LoginThrottle, TokenService};

/// Application state containing all services.
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// Login throttle applied before credential verification
    pub throttle: Arc<LoginThrottle>,
    /// Database connection (health checks)
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire services from the database, a counter store, and configuration.
    pub fn from_config(
        database: Arc<Database>,
        counter_store: Arc<dyn CounterStore>,
        config: &Config,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let tokens = TokenService::from_config(config, clock);
        let users = Arc::new(UserStore::new(database.get_connection()));
        let auth_service = Arc::new(Authenticator::new(users, tokens));
        let throttle = Arc::new(LoginThrottle::new(
            counter_store,
            config.login_rate_limit_attempts,
            config.login_rate_limit_window_seconds(),
        ));

        Self {
            auth_service,
            throttle,
            database,
        }
    }
}
