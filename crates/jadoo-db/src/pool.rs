//! Connection pool for the `images` database.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use jadoo_core::defaults::{
    DB_ACQUIRE_TIMEOUT_SECS, DB_IDLE_TIMEOUT_SECS, DB_MAX_CONNECTIONS, DB_MAX_LIFETIME_SECS,
    DB_MIN_CONNECTIONS,
};
use jadoo_core::{Error, Result};

/// Pool sizing and connection lifetimes.
///
/// Every request touches the database at most twice (lookup, then one
/// write or one vector search), so a small pool goes a long way.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            min_connections: DB_MIN_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DB_IDLE_TIMEOUT_SECS),
            max_lifetime: Some(Duration::from_secs(DB_MAX_LIFETIME_SECS)),
        }
    }
}

impl PoolConfig {
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// sqlx pool options for this configuration.
    ///
    /// `min_connections` never exceeds `max_connections`.
    pub fn options(&self) -> PgPoolOptions {
        let options = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout);
        match self.max_lifetime {
            Some(lifetime) => options.max_lifetime(lifetime),
            None => options,
        }
    }
}

/// Connect a pool to `database_url`.
pub async fn create_pool(database_url: &str, config: &PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = config
        .options()
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool connected"
    );
    Ok(pool)
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

impl PoolStats {
    /// Every open connection is checked out.
    pub fn is_exhausted(&self) -> bool {
        self.size > 0 && self.idle == 0
    }
}

/// Log pool occupancy, warning when no connection is idle.
pub fn log_pool_metrics(pool: &PgPool) -> PoolStats {
    let stats = PoolStats {
        size: pool.size(),
        idle: pool.num_idle(),
    };

    debug!(
        subsystem = "db",
        component = "pool",
        op = "metrics",
        pool_size = stats.size,
        pool_idle = stats.idle,
        "Pool occupancy"
    );
    if stats.is_exhausted() {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = stats.size,
            "No idle database connections"
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DB_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DB_MIN_CONNECTIONS);
        assert_eq!(
            config.max_lifetime,
            Some(Duration::from_secs(DB_MAX_LIFETIME_SECS))
        );
    }

    #[test]
    fn test_options_carry_sizing() {
        let options = PoolConfig::default()
            .max_connections(4)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(3))
            .options();

        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_min_connections_capped_at_max() {
        let options = PoolConfig::default()
            .max_connections(2)
            .min_connections(8)
            .options();
        assert_eq!(options.get_min_connections(), 2);
    }

    #[test]
    fn test_pool_stats_exhaustion() {
        assert!(PoolStats { size: 3, idle: 0 }.is_exhausted());
        assert!(!PoolStats { size: 3, idle: 1 }.is_exhausted());
        assert!(!PoolStats { size: 0, idle: 0 }.is_exhausted());
    }
}
