//! Pool registry: a base set of pre-warmed connections plus on-demand
//! overflow connections.
//!
//! INVARIANTS:
//! - Every registry mutation happens inside one `registry` critical section;
//!   the lock is never held across an `.await`.
//! - A physical handle is owned either by its idle entry or by exactly one
//!   `Lease`. Entries appear in the registry only once their handle is open.
//! - Base entries (`is_overflow == false`) are never removed except by shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, error, info, warn};

use crate::config::PoolConfig;
use crate::connection::{ConnectionFactory, SqliteConnectionFactory};
use crate::error::PoolError;
use crate::reaper::IdleReaper;

/// Identity of a pooled connection; never reused within one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct PooledConnection {
    pub(crate) id: ConnectionId,
    /// `Some` while idle; moved into the lease while borrowed
    handle: Option<SqliteConnection>,
    pub(crate) in_use: bool,
    pub(crate) last_used_at: Instant,
    pub(crate) is_overflow: bool,
}

#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) entries: Vec<PooledConnection>,
    initialized: bool,
    /// Bumped on every shutdown so in-flight overflow opens can tell
    /// the registry they reserved against is gone
    generation: u64,
    /// Overflow connections currently being opened
    opening_overflow: usize,
}

impl Registry {
    fn idle_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.in_use).count()
    }

    fn overflow_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_overflow).count()
    }

    /// Removes idle overflow entries unused for longer than `timeout`.
    pub(crate) fn take_expired(
        &mut self,
        now: Instant,
        timeout: std::time::Duration,
    ) -> Vec<(ConnectionId, SqliteConnection)> {
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for mut entry in self.entries.drain(..) {
            let stale = !entry.in_use
                && entry.is_overflow
                && now.saturating_duration_since(entry.last_used_at) > timeout;
            match (stale, entry.handle.take()) {
                (true, Some(handle)) => expired.push((entry.id, handle)),
                (_, handle) => {
                    entry.handle = handle;
                    kept.push(entry);
                }
            }
        }
        self.entries = kept;
        expired
    }
}

/// Point-in-time view of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub initialized: bool,
    pub size: usize,
    pub idle: usize,
    pub in_use: usize,
    pub overflow: usize,
}

pub(crate) struct PoolInner {
    pub(crate) config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    pub(crate) registry: Mutex<Registry>,
    /// Serializes initialize/shutdown
    lifecycle: tokio::sync::Mutex<()>,
    reaper: Mutex<Option<IdleReaper>>,
    next_id: AtomicU64,
}

impl PoolInner {
    fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn is_initialized(&self) -> bool {
        self.registry.lock().initialized
    }

    /// Returns a handle to its entry. Yields a handle back when the caller
    /// must close it: eager shrink-back, or an id no longer registered.
    pub(crate) fn release(
        &self,
        id: ConnectionId,
        handle: SqliteConnection,
    ) -> Option<SqliteConnection> {
        let mut reg = self.registry.lock();

        let Some(pos) = reg.entries.iter().position(|e| e.id == id) else {
            // Released after shutdown (or never registered): nothing to update
            debug!("pool=release_unknown id={}", id);
            return Some(handle);
        };

        let entry = &mut reg.entries[pos];
        if !entry.in_use || entry.handle.is_some() {
            warn!("pool=release_not_borrowed id={}", id);
            return Some(handle);
        }
        entry.in_use = false;
        entry.last_used_at = Instant::now();
        entry.handle = Some(handle);
        let is_overflow = entry.is_overflow;

        if is_overflow && reg.idle_count() > self.config.pool_size {
            let removed = reg.entries.remove(pos);
            info!(
                "pool=shrink id={} size={} idle={}",
                id,
                reg.entries.len(),
                reg.idle_count()
            );
            return removed.handle;
        }
        None
    }

    pub(crate) fn status(&self) -> PoolStatus {
        let reg = self.registry.lock();
        let idle = reg.idle_count();
        PoolStatus {
            initialized: reg.initialized,
            size: reg.entries.len(),
            idle,
            in_use: reg.entries.len() - idle,
            overflow: reg.overflow_count(),
        }
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.get_mut().take() {
            reaper.cancel();
        }
    }
}

/// Close a handle, logging instead of failing.
pub(crate) async fn close_quietly(id: Option<ConnectionId>, handle: SqliteConnection) -> bool {
    match handle.close().await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                id = ?id.map(|i| i.0),
                error = %e,
                "connection=close_failed"
            );
            false
        }
    }
}

/// Tracks an overflow open in flight so the cap counts it, even if the
/// acquiring future is dropped mid-open.
struct OverflowSlot<'a> {
    registry: &'a Mutex<Registry>,
    armed: bool,
}

impl OverflowSlot<'_> {
    fn disarm(mut self, reg: &mut Registry) {
        reg.opening_overflow = reg.opening_overflow.saturating_sub(1);
        self.armed = false;
    }
}

impl Drop for OverflowSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut reg = self.registry.lock();
            reg.opening_overflow = reg.opening_overflow.saturating_sub(1);
        }
    }
}

/// A borrowed connection. Releasing is exactly-once: either through
/// [`Lease::release`] or, if the owner is dropped first, through `Drop`.
pub(crate) struct Lease {
    pool: Arc<PoolInner>,
    id: ConnectionId,
    conn: Option<SqliteConnection>,
}

const LEASE_INVARIANT: &str = "lease holds its connection until released";

impl Lease {
    #[cfg(test)]
    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        self.conn.as_mut().expect(LEASE_INVARIANT)
    }

    pub(crate) async fn release(mut self) {
        if let Some(handle) = self.conn.take() {
            if let Some(to_close) = self.pool.release(self.id, handle) {
                close_quietly(Some(self.id), to_close).await;
            }
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let Some(handle) = self.conn.take() else {
            return;
        };
        debug!("pool=release_on_drop id={}", self.id);
        if let Some(to_close) = self.pool.release(self.id, handle) {
            let id = self.id;
            match tokio::runtime::Handle::try_current() {
                Ok(rt) => {
                    rt.spawn(async move {
                        close_quietly(Some(id), to_close).await;
                    });
                }
                // No runtime to close on; dropping the handle closes it
                Err(_) => drop(to_close),
            }
        }
    }
}

/// Process-wide connection pool. Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct ConnectionPool {
    pub(crate) inner: Arc<PoolInner>,
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("location", &self.inner.config.location)
            .field("status", &self.status())
            .finish()
    }
}

impl ConnectionPool {
    /// Build an uninitialized pool backed by SQLite.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let factory = SqliteConnectionFactory::new(&config)?;
        Self::with_factory(config, Arc::new(factory))
    }

    pub fn with_factory(
        config: PoolConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Self, PoolError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                factory,
                registry: Mutex::new(Registry::default()),
                lifecycle: tokio::sync::Mutex::new(()),
                reaper: Mutex::new(None),
                next_id: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn status(&self) -> PoolStatus {
        self.inner.status()
    }

    /// Open the base connections and start the idle reaper.
    /// Calling this on an initialized pool does nothing.
    pub async fn initialize(&self) -> Result<(), PoolError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.inner.is_initialized() {
            return Ok(());
        }

        let size = self.inner.config.pool_size;
        let target = self.inner.factory.describe();
        info!(
            "pool=init size={} idle_timeout_ms={} path={}",
            size,
            self.inner.config.idle_timeout.as_millis(),
            target
        );

        let mut opened = Vec::with_capacity(size);
        for _ in 0..size {
            match self.inner.factory.open().await {
                Ok(conn) => opened.push(conn),
                Err(e) => {
                    error!(
                        "pool=init_failed opened={} size={} path={} err={}",
                        opened.len(),
                        size,
                        target,
                        e
                    );
                    for conn in opened {
                        close_quietly(None, conn).await;
                    }
                    return Err(PoolError::init(e));
                }
            }
        }

        {
            let mut reg = self.inner.registry.lock();
            let now = Instant::now();
            for conn in opened {
                let id = self.inner.next_id();
                reg.entries.push(PooledConnection {
                    id,
                    handle: Some(conn),
                    in_use: false,
                    last_used_at: now,
                    is_overflow: false,
                });
            }
            reg.initialized = true;
        }

        let reaper = IdleReaper::spawn(
            Arc::downgrade(&self.inner),
            self.inner.config.idle_timeout,
        );
        if let Some(previous) = self.inner.reaper.lock().replace(reaper) {
            previous.cancel();
        }

        info!("pool=ready size={}", size);
        Ok(())
    }

    /// Borrow a connection: first idle entry in registry order, else a new
    /// overflow connection. Never waits for a release.
    pub(crate) async fn acquire(&self) -> Result<Lease, PoolError> {
        loop {
            if !self.inner.is_initialized() {
                self.initialize().await?;
            }

            let (slot, generation) = {
                let mut reg = self.inner.registry.lock();
                if !reg.initialized {
                    // Shut down between the check and the lock; start over
                    continue;
                }

                if let Some(entry) = reg
                    .entries
                    .iter_mut()
                    .find(|e| !e.in_use && e.handle.is_some())
                {
                    if let Some(conn) = entry.handle.take() {
                        entry.in_use = true;
                        entry.last_used_at = Instant::now();
                        return Ok(Lease {
                            pool: Arc::clone(&self.inner),
                            id: entry.id,
                            conn: Some(conn),
                        });
                    }
                }

                if let Some(max_overflow) = self.inner.config.max_overflow {
                    let overflow = reg.overflow_count() + reg.opening_overflow;
                    if overflow >= max_overflow {
                        warn!(
                            "pool=exhausted size={} overflow={} max_overflow={}",
                            reg.entries.len(),
                            overflow,
                            max_overflow
                        );
                        return Err(PoolError::Exhausted {
                            overflow,
                            max_overflow,
                        });
                    }
                }

                reg.opening_overflow += 1;
                (
                    OverflowSlot {
                        registry: &self.inner.registry,
                        armed: true,
                    },
                    reg.generation,
                )
            };

            let opened = self.inner.factory.open().await;

            let mut reg = self.inner.registry.lock();
            slot.disarm(&mut reg);
            let conn = opened?;
            let id = self.inner.next_id();

            if !reg.initialized || reg.generation != generation {
                // The pool was shut down mid-open: hand out an unregistered
                // lease whose handle is closed on release
                debug!("pool=overflow_detached id={}", id);
                return Ok(Lease {
                    pool: Arc::clone(&self.inner),
                    id,
                    conn: Some(conn),
                });
            }

            reg.entries.push(PooledConnection {
                id,
                handle: None,
                in_use: true,
                last_used_at: Instant::now(),
                is_overflow: true,
            });
            info!(
                "pool=overflow_open id={} size={} overflow={}",
                id,
                reg.entries.len(),
                reg.overflow_count()
            );
            return Ok(Lease {
                pool: Arc::clone(&self.inner),
                id,
                conn: Some(conn),
            });
        }
    }

    /// Stop the reaper, close every idle connection and clear the registry.
    /// Close failures are logged and skipped. Connections still borrowed are
    /// closed when their leases come back.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        let _lifecycle = self.inner.lifecycle.lock().await;

        let reaper = self.inner.reaper.lock().take();
        let reaper_result = match reaper {
            Some(reaper) => reaper.stop().await,
            None => Ok(()),
        };

        let (idle, borrowed) = {
            let mut reg = self.inner.registry.lock();
            let entries = std::mem::take(&mut reg.entries);
            reg.initialized = false;
            reg.generation += 1;
            let borrowed = entries.iter().filter(|e| e.in_use).count();
            let idle: Vec<_> = entries
                .into_iter()
                .filter_map(|e| e.handle.map(|h| (e.id, h)))
                .collect();
            (idle, borrowed)
        };

        let mut closed = 0usize;
        let mut failed = 0usize;
        for (id, handle) in idle {
            if close_quietly(Some(id), handle).await {
                closed += 1;
            } else {
                failed += 1;
            }
        }

        info!(
            "pool=shutdown closed={} close_failures={} borrowed={}",
            closed, failed, borrowed
        );

        if let Err(ref e) = reaper_result {
            error!("pool=shutdown_error err={}", e);
        }
        reaper_result
    }
}
