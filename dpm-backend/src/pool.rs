// The pool's semaphore is never explicitly closed, so `acquire_owned` only
// errors if the pool itself has been dropped out from under an in-flight
// checkout, which cannot happen while `self` is borrowed.
#![allow(clippy::expect_used)]

use std::ops::Deref;
use std::sync::Arc;

use devnet_core::Result;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;

use crate::connection::DpmConnection;

/// A connection checked out of the pool. Releases its permit back to the
/// pool when dropped.
pub struct PooledConnection {
    connection: Arc<DpmConnection>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = DpmConnection;

    fn deref(&self) -> &DpmConnection {
        &self.connection
    }
}

impl PooledConnection {
    /// A clone of the checked-out connection's `Arc`, outliving the permit
    /// this handle holds. Callers that need to address the same physical
    /// connection again later (a standing subscription, say) should keep
    /// this instead of re-acquiring from the pool, since a fresh acquire
    /// round-robins to whichever connection is next, not necessarily the
    /// one a given subscription lives on.
    pub fn connection_arc(&self) -> Arc<DpmConnection> {
        self.connection.clone()
    }
}

/// A fixed-size pool of data-pool connections, drawn from via a semaphore
/// of the pool's own capacity — the same bounded-concurrency shape used
/// for fan-out elsewhere in this workspace, just over persistent
/// connections instead of one-shot tasks.
pub struct DpmPool {
    connections: Vec<Arc<DpmConnection>>,
    semaphore: Arc<Semaphore>,
    next: std::sync::atomic::AtomicUsize,
}

impl DpmPool {
    pub async fn connect(url: &str, size: usize) -> Result<Self> {
        let size = size.max(1);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            connections.push(Arc::new(DpmConnection::connect(url).await?));
        }
        Ok(DpmPool {
            connections,
            semaphore: Arc::new(Semaphore::new(size)),
            next: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    /// Acquire a permit and hand back one pooled connection, round-robin.
    pub async fn acquire(&self) -> PooledConnection {
        let permit = self.semaphore.clone().acquire_owned().await.expect("semaphore never closed");
        let idx = self.next.fetch_add(1, std::sync::atomic::Ordering::SeqCst) % self.connections.len();
        PooledConnection { connection: self.connections[idx].clone(), _permit: permit }
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}
