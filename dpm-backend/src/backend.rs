use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devnet_core::async_subscription_channel;
use devnet_core::AsyncBackend;
use devnet_core::AsyncSubscriptionHandle;
use devnet_core::BackendCapability;
use devnet_core::CoreError;
use devnet_core::Reading;
use devnet_core::Result;
use devnet_core::Setting;
use devnet_core::SubscriptionId;
use devnet_core::SubscriptionMode;
use devnet_core::Value;
use devnet_core::WriteResult;
use tokio::sync::Mutex;

use crate::connection::DpmConnection;
use crate::envelope::Request;
use crate::envelope::Response;
use crate::pool::DpmPool;

const DEFAULT_POOL_SIZE: usize = 4;
const SUBSCRIPTION_BUFFER: usize = 256;

/// Async data-pool backend: read/write/subscribe multiplexed over a pool
/// of long-lived duplex WebSocket connections.
pub struct DpmBackend {
    pool: DpmPool,
    write_role: Option<String>,
    /// Which physical connection each live subscription was registered on.
    /// A fresh `pool.acquire()` round-robins to whichever connection is
    /// next, not necessarily the one holding a given subscription's
    /// dispatcher, so `remove`/`stop_streaming` address the connection
    /// recorded here instead of re-acquiring from the pool.
    subscriptions: Mutex<HashMap<u64, Arc<DpmConnection>>>,
}

impl DpmBackend {
    pub async fn connect(url: &str, write_role: Option<String>) -> Result<Self> {
        Self::connect_with_pool_size(url, write_role, DEFAULT_POOL_SIZE).await
    }

    pub async fn connect_with_pool_size(url: &str, write_role: Option<String>, pool_size: usize) -> Result<Self> {
        let pool = DpmPool::connect(url, pool_size)
            .await
            .map_err(|e| CoreError::Other(format!("dpm pool connect failed: {e}")))?;
        Ok(DpmBackend { pool, write_role, subscriptions: Mutex::new(HashMap::new()) })
    }
}

#[async_trait]
impl AsyncBackend for DpmBackend {
    fn capabilities(&self) -> BackendCapability {
        let mut caps = BackendCapability::READ | BackendCapability::STREAM | BackendCapability::BATCH;
        if self.write_role.is_some() {
            caps |= BackendCapability::WRITE | BackendCapability::AUTH;
        }
        caps
    }

    async fn get(&self, drf: &str, timeout: Option<Duration>) -> Result<Reading> {
        let conn = self.pool.acquire().await;
        let id = conn.next_correlation_id();
        let call = conn.call(Request::Get { correlation_id: id, drf: drf.to_string() });
        let response = match timeout {
            Some(t) => tokio::time::timeout(t, call).await.map_err(|_| CoreError::Timeout { drf: drf.to_string() })??,
            None => call.await?,
        };
        match response {
            Response::Reading { drf, facility, error_code, message, value, .. } => {
                let now = chrono::Local::now();
                Ok(match value {
                    Some(v) if error_code == 0 => Reading::ok(drf, v, now),
                    _ => Reading::error(drf, facility, error_code, message.unwrap_or_default(), now),
                })
            }
            _ => Err(CoreError::Other("unexpected response to get()".to_string())),
        }
    }

    async fn get_many(&self, drfs: &[String], timeout: Option<Duration>) -> Result<Vec<Reading>> {
        let conn = self.pool.acquire().await;
        let id = conn.next_correlation_id();
        let call = conn.call(Request::GetMany { correlation_id: id, drfs: drfs.to_vec() });
        let response = match timeout {
            Some(t) => tokio::time::timeout(t, call).await.map_err(|_| CoreError::Other("dpm batch timeout".to_string()))??,
            None => call.await?,
        };
        match response {
            Response::ReadingBatch { readings, .. } => {
                let now = chrono::Local::now();
                Ok(readings
                    .into_iter()
                    .map(|r| match r.value {
                        Some(v) if r.error_code == 0 => Reading::ok(r.drf, v, now),
                        _ => Reading::error(r.drf, r.facility, r.error_code, r.message.unwrap_or_default(), now),
                    })
                    .collect())
            }
            _ => Err(CoreError::Other("unexpected response to get_many()".to_string())),
        }
    }

    async fn write(&self, drf: &str, value: Value, timeout: Option<Duration>) -> Result<WriteResult> {
        if self.write_role.is_none() {
            return Err(CoreError::UnsupportedOperation("dpm backend was not configured with a write role"));
        }
        let conn = self.pool.acquire().await;
        let id = conn.next_correlation_id();
        let call = conn.call(Request::Write { correlation_id: id, drf: drf.to_string(), value });
        let response = match timeout {
            Some(t) => tokio::time::timeout(t, call).await.map_err(|_| CoreError::Timeout { drf: drf.to_string() })??,
            None => call.await?,
        };
        match response {
            Response::WriteResult { drf, facility, error_code, message, attempts, .. } => Ok(WriteResult {
                drf,
                facility,
                error_code,
                message,
                verified: None,
                attempts,
            }),
            _ => Err(CoreError::Other("unexpected response to write()".to_string())),
        }
    }

    async fn write_many(&self, settings: &[Setting], timeout: Option<Duration>) -> Result<Vec<WriteResult>> {
        let mut out = Vec::with_capacity(settings.len());
        for setting in settings {
            out.push(self.write(&setting.drf, setting.value.clone(), timeout).await?);
        }
        Ok(out)
    }

    async fn subscribe(&self, drfs: &[String]) -> Result<(SubscriptionId, AsyncSubscriptionHandle)> {
        let conn = self.pool.acquire().await;
        let id = conn.next_correlation_id();
        let (dispatcher, handle) = async_subscription_channel(SUBSCRIPTION_BUFFER, vec![id.to_string()], SubscriptionMode::Iterator);
        conn.register_subscription(id, dispatcher).await;
        conn.send(Request::Subscribe { correlation_id: id, drfs: drfs.to_vec() }).await?;
        self.subscriptions.lock().await.insert(id, conn.connection_arc());
        Ok((SubscriptionId(id), handle))
    }

    async fn remove(&self, id: SubscriptionId) -> Result<()> {
        let conn = self.subscriptions.lock().await.remove(&id.0);
        let Some(conn) = conn else {
            return Ok(());
        };
        conn.unregister(id.0).await;
        conn.send(Request::Unsubscribe { correlation_id: id.0 }).await?;
        Ok(())
    }

    async fn stop_streaming(&self) -> Result<()> {
        let ids: Vec<u64> = self.subscriptions.lock().await.keys().copied().collect();
        for id in ids {
            self.remove(SubscriptionId(id)).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.stop_streaming().await
    }
}
