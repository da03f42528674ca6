#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use db_pool::{ConnectionPool, DbError, PoolConfig, PoolStatus};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[ctor::ctor]
fn init_logging() {
    habits_test_support::logging::init();
}

pub fn memory_pool(size: usize, idle: Duration) -> ConnectionPool {
    ConnectionPool::new(
        PoolConfig::in_memory()
            .with_pool_size(size)
            .with_idle_timeout(idle),
    )
    .expect("valid pool config")
}

/// A task that holds one connection until its sender fires.
pub struct Holder {
    release: oneshot::Sender<()>,
    task: JoinHandle<Result<(), DbError>>,
}

impl Holder {
    pub async fn finish(self) {
        let _ = self.release.send(());
        self.task.await.expect("holder task").expect("holder work");
    }
}

pub fn hold(pool: &ConnectionPool) -> Holder {
    let (tx, rx) = oneshot::channel::<()>();
    let pool = pool.clone();
    let task = tokio::spawn(async move {
        pool.with_connection(move |_conn| {
            Box::pin(async move {
                let _ = rx.await;
                Ok::<_, DbError>(())
            })
        })
        .await
    });
    Holder { release: tx, task }
}

/// Poll `status()` until `pred` holds; panics after two seconds.
pub async fn wait_for<F>(pool: &ConnectionPool, pred: F) -> PoolStatus
where
    F: Fn(&PoolStatus) -> bool,
{
    let poll = async {
        loop {
            let status = pool.status();
            if pred(&status) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    match tokio::time::timeout(Duration::from_secs(2), poll).await {
        Ok(status) => status,
        Err(_) => panic!("pool never reached expected state: {:?}", pool.status()),
    }
}

pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("operation timed out")
}
