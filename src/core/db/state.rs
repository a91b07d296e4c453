use std::{
    ops::{Deref, DerefMut},
    time::Duration,
};

use sqlx::{
    Any, AnyPool,
    any::{AnyPoolOptions, install_default_drivers},
    pool::PoolConnection,
};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::info;

use super::model::Backend;
use crate::error::StoreError;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) struct DbState {
    backend: Backend,
    pool: RwLock<AnyPool>,
}

// The url may carry credentials, so only the backend is printed.
impl std::fmt::Debug for DbState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbState")
            .field("backend", &self.backend)
            .finish()
    }
}

impl DbState {
    /// Connect to `url` and bring the `counter` schema up to date.
    pub(super) async fn new(url: &str) -> Result<Self, StoreError> {
        let backend = Backend::try_from(url)?;
        install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;

        match backend {
            Backend::Sqlite => sqlx::migrate!("./migrations/sqlite").run(&pool).await?,
            Backend::Postgres => sqlx::migrate!("./migrations/postgres").run(&pool).await?,
        }
        info!(?backend, "count store ready");

        Ok(Self {
            backend,
            pool: RwLock::new(pool),
        })
    }

    /// Acquire a pooled connection and hold the pool read lock for the entire lifetime
    /// of the returned guard.
    pub(super) async fn conn(&self) -> Result<DbConnGuard<'_>, StoreError> {
        let pool_guard = self.pool.read().await;
        let conn = pool_guard.acquire().await?;

        Ok(DbConnGuard {
            _pool_guard: pool_guard,
            conn,
        })
    }

    /// Waits for in-flight queries, then closes every connection.
    pub(super) async fn close(&self) {
        let pool_guard = self.pool.write().await;
        pool_guard.close().await;
        info!(backend = ?self.backend, "count store closed");
    }
}

pub(super) struct DbConnGuard<'a> {
    _pool_guard: RwLockReadGuard<'a, AnyPool>,
    conn: PoolConnection<Any>,
}

impl<'a> Deref for DbConnGuard<'a> {
    type Target = PoolConnection<Any>;
    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<'a> DerefMut for DbConnGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
