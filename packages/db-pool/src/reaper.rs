//! Background task that closes overflow connections left idle past the
//! configured timeout. Base connections are never touched.

use std::sync::Weak;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::PoolError;
use crate::pool::{close_quietly, PoolInner};

pub(crate) struct IdleReaper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl IdleReaper {
    /// Start ticking every `period`. The task holds only a weak reference,
    /// so it ends on its own once the pool is dropped.
    pub(crate) fn spawn(pool: Weak<PoolInner>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = pool.upgrade() else { break };
                        reap_idle(&inner).await;
                    }
                }
            }
            debug!("reaper=stopped");
        });

        Self { cancel, handle }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the task to finish.
    pub(crate) async fn stop(self) -> Result<(), PoolError> {
        self.cancel.cancel();
        match self.handle.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(PoolError::Shutdown {
                message: format!("idle reaper task failed: {e}"),
            }),
        }
    }
}

/// One reaper pass: detach expired idle overflow entries under the lock,
/// then close them outside it. Returns how many were closed.
pub(crate) async fn reap_idle(inner: &PoolInner) -> usize {
    let timeout = inner.config.idle_timeout;
    let expired = inner.registry.lock().take_expired(Instant::now(), timeout);
    if expired.is_empty() {
        return 0;
    }

    let mut closed = 0;
    for (id, handle) in expired {
        if close_quietly(Some(id), handle).await {
            closed += 1;
        }
    }

    let size = inner.registry.lock().entries.len();
    info!("reaper=reaped closed={} size={}", closed, size);
    closed
}
