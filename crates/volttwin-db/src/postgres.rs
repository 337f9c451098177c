//! `PostgreSQL` connection pool.
//!
//! The whole durable state of the system is one row in the `vehicle`
//! table, written once per simulation tick and read once per subscriber
//! join. Pool sizing reflects that: a handful of connections covers the
//! tick writer, the REST reads, and snapshot fetches for new
//! subscribers, so the pool takes no tuning knobs beyond the URL.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time
//! checked) to avoid requiring a live database at build time. All
//! queries are parameterized.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::DbError;

/// One writer (the tick loop) plus a few concurrent readers.
const MAX_CONNECTIONS: u32 = 5;

/// How long to wait for a free connection before the tick fails.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection pool handle to `PostgreSQL`.
///
/// Wraps a [`sqlx::PgPool`]; the vehicle store borrows it to run its
/// queries.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Connect to `PostgreSQL` at the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed and
    /// [`DbError::Postgres`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let connect_options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("invalid database URL: {e}")))?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(connect_options)
            .await?;

        tracing::info!(max_connections = MAX_CONNECTIONS, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run all pending migrations from the `migrations/` directory.
    ///
    /// The initial migration creates the `vehicle` table and seeds the
    /// single record the simulator drives.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if any migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("database migrations completed");
        Ok(())
    }

    /// Return a reference to the underlying [`PgPool`].
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections in the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}
