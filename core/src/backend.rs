use std::time::Duration;

use async_trait::async_trait;

use crate::capability::BackendCapability;
use crate::errors::CoreError;
use crate::errors::Result;
use crate::reading::Reading;
use crate::subscription::AsyncSubscriptionHandle;
use crate::subscription::SubscriptionHandle;
use crate::value::Value;
use crate::write_result::WriteResult;

/// A `(drf, value)` pair for `writeMany`.
#[derive(Debug, Clone)]
pub struct Setting {
    pub drf: String,
    pub value: Value,
}

/// An opaque token identifying a live subscription, returned by
/// `subscribe` and accepted by `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A blocking device-access backend. Every backend advertises an immutable
/// `capabilities` set; calling an operation it does not support must fail
/// with [`CoreError::UnsupportedOperation`] rather than silently no-op.
pub trait Backend: Send + Sync {
    fn capabilities(&self) -> BackendCapability;

    /// Unwraps `get()`'s reading, failing with
    /// [`CoreError::Device`] if its error code is negative.
    fn read(&self, drf: &str, timeout: Option<Duration>) -> Result<Value> {
        let reading = self.get(drf, timeout)?;
        if reading.is_error() {
            return Err(CoreError::Device {
                drf: reading.drf.clone(),
                facility: reading.facility,
                error_code: reading.error_code,
                message: reading.status_text().unwrap_or_default(),
            });
        }
        reading
            .value
            .ok_or_else(|| CoreError::Other(format!("reading for '{drf}' had no value despite ok status")))
    }

    fn get(&self, drf: &str, timeout: Option<Duration>) -> Result<Reading>;

    /// Order-preserving batch read; the result length always equals
    /// `drfs.len()`.
    fn get_many(&self, drfs: &[String], timeout: Option<Duration>) -> Result<Vec<Reading>>;

    fn write(&self, drf: &str, value: Value, timeout: Option<Duration>) -> Result<WriteResult>;

    fn write_many(&self, settings: &[Setting], timeout: Option<Duration>) -> Result<Vec<WriteResult>>;

    fn subscribe(&self, drfs: &[String]) -> Result<(SubscriptionId, SubscriptionHandle)>;

    fn remove(&self, id: SubscriptionId) -> Result<()>;

    fn stop_streaming(&self) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// The cooperative-concurrent twin of [`Backend`]. Every operation is
/// suspendable; canceling a suspended operation aborts the in-flight wire
/// transaction where the transport allows it, and otherwise detaches the
/// caller while the I/O completes in the background.
#[async_trait]
pub trait AsyncBackend: Send + Sync {
    fn capabilities(&self) -> BackendCapability;

    async fn read(&self, drf: &str, timeout: Option<Duration>) -> Result<Value> {
        let reading = self.get(drf, timeout).await?;
        if reading.is_error() {
            return Err(CoreError::Device {
                drf: reading.drf.clone(),
                facility: reading.facility,
                error_code: reading.error_code,
                message: reading.status_text().unwrap_or_default(),
            });
        }
        reading
            .value
            .ok_or_else(|| CoreError::Other(format!("reading for '{drf}' had no value despite ok status")))
    }

    async fn get(&self, drf: &str, timeout: Option<Duration>) -> Result<Reading>;

    async fn get_many(&self, drfs: &[String], timeout: Option<Duration>) -> Result<Vec<Reading>>;

    async fn write(&self, drf: &str, value: Value, timeout: Option<Duration>) -> Result<WriteResult>;

    async fn write_many(&self, settings: &[Setting], timeout: Option<Duration>) -> Result<Vec<WriteResult>>;

    async fn subscribe(&self, drfs: &[String]) -> Result<(SubscriptionId, AsyncSubscriptionHandle)>;

    async fn remove(&self, id: SubscriptionId) -> Result<()>;

    async fn stop_streaming(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
