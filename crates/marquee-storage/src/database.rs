// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded pool of `tokio-rusqlite` connections.
//!
//! Each pooled connection owns its own background thread. At most
//! `max_open_conns` connections are checked out at once; returned connections
//! are kept for reuse up to `max_idle_conns` and are closed once they have
//! sat idle for longer than `max_idle_time`.
//!
//! The database must be a file: every connection opens the same path, so an
//! in-memory database would give each connection its own empty schema.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use marquee_config::model::StorageConfig;
use marquee_core::MarqueeError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// How long SQLite waits on a locked database before returning `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

struct IdleConn {
    conn: Connection,
    since: Instant,
}

struct Pool {
    path: PathBuf,
    slots: Arc<Semaphore>,
    idle: Mutex<Vec<IdleConn>>,
    max_idle: usize,
    max_idle_time: Duration,
}

impl Pool {
    /// Takes the most recently returned connection that has not expired.
    fn take_idle(&self) -> Option<Connection> {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        let max_idle_time = self.max_idle_time;
        idle.retain(|c| c.since.elapsed() < max_idle_time);
        idle.pop().map(|c| c.conn)
    }

    fn put_idle(&self, conn: Connection) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(IdleConn {
                conn,
                since: Instant::now(),
            });
        }
    }
}

/// Handle to the database. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool>,
}

impl Database {
    /// Applies pending migrations and prepares the pool. No pooled connection
    /// is opened until first use.
    pub async fn open(config: &StorageConfig) -> Result<Self, MarqueeError> {
        let path = PathBuf::from(&config.dsn);
        migrate(path.clone()).await?;

        info!(dsn = %path.display(), max_open = config.max_open_conns, "database ready");
        Ok(Self {
            pool: Arc::new(Pool {
                path,
                slots: Arc::new(Semaphore::new(config.max_open_conns.max(1))),
                idle: Mutex::new(Vec::new()),
                max_idle: config.max_idle_conns,
                max_idle_time: config.max_idle_time(),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.pool.path
    }

    /// Checks out a connection, waiting while the pool is at capacity.
    pub async fn acquire(&self) -> Result<PooledConn, MarqueeError> {
        let permit = self
            .pool
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MarqueeError::Internal("connection pool closed".into()))?;

        let conn = match self.pool.take_idle() {
            Some(conn) => conn,
            None => open_connection(&self.pool.path).await?,
        };

        Ok(PooledConn {
            conn: Some(conn),
            pool: self.pool.clone(),
            _permit: permit,
        })
    }

    /// Round-trips a trivial query, failing with `Timeout` after `timeout`.
    pub async fn ping(&self, timeout: Duration) -> Result<(), MarqueeError> {
        let check = async {
            let conn = self.acquire().await?;
            conn.call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
                .await
                .map_err(map_tr_err)
        };
        tokio::time::timeout(timeout, check)
            .await
            .map_err(|_| MarqueeError::Timeout { duration: timeout })??;
        Ok(())
    }

    /// Number of connections currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.pool
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drops every idle connection. Checked-out connections close when returned
    /// only if the pool is already full.
    pub fn close_idle(&self) {
        let drained: Vec<IdleConn> = self
            .pool
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        debug!(closed = drained.len(), "closed idle database connections");
    }
}

/// A checked-out connection. Returned to the pool on drop.
pub struct PooledConn {
    conn: Option<Connection>,
    pool: Arc<Pool>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("connection is only taken in drop"),
        }
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put_idle(conn);
        }
    }
}

async fn open_connection(path: &Path) -> Result<Connection, MarqueeError> {
    let conn = Connection::open(path)
        .await
        .map_err(|e| MarqueeError::Storage {
            source: Box::new(e),
        })?;
    conn.call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)?;
    debug!(path = %path.display(), "opened database connection");
    Ok(conn)
}

/// Switches the file to WAL and applies migrations on a short-lived
/// blocking connection.
async fn migrate(path: PathBuf) -> Result<(), MarqueeError> {
    tokio::task::spawn_blocking(move || {
        let mut conn = rusqlite::Connection::open(&path).map_err(MarqueeError::storage)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(MarqueeError::storage)?;
        crate::migrations::run_migrations(&mut conn)
    })
    .await
    .map_err(|e| MarqueeError::Internal(format!("migration task failed: {e}")))?
}

/// Maps a `tokio-rusqlite` call error into [`MarqueeError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MarqueeError {
    match e {
        tokio_rusqlite::Error::Error(inner) => MarqueeError::storage(inner),
        other => MarqueeError::Internal(format!("database connection failure: {other}")),
    }
}

/// True if `e` is a UNIQUE constraint violation.
pub fn is_unique_violation(e: &tokio_rusqlite::Error<rusqlite::Error>) -> bool {
    matches!(
        e,
        tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
