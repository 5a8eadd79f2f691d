//! State for the health routes. Domain routes carry their own service as
//! state instead.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::DbPool;

/// Optional outbound integrations that were configured at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Integrations {
    pub mail: bool,
    pub ai: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<AppConfig>,
    pub integrations: Integrations,
    started: Instant,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, integrations: Integrations) -> Self {
        Self {
            db,
            config: Arc::new(config),
            integrations,
            started: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
