//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BackendConfig;
use crate::services::AppNotifier;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BackendConfig,
    pool: PgPool,
    notifier: AppNotifier,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: BackendConfig, pool: PgPool, notifier: AppNotifier) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                notifier,
            }),
        }
    }

    /// Get a reference to the backend configuration.
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the order notifier.
    #[must_use]
    pub fn notifier(&self) -> &AppNotifier {
        &self.inner.notifier
    }
}
