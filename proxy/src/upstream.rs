//! Construction of the upstream backend the proxy forwards admitted
//! requests to. `dpm` wires straight into [`devnet_dpm::DpmBackend`];
//! `grpc` is a thin `tonic` client that re-plays the same
//! `DeviceControl` contract against another server speaking this
//! crate's own wire protocol — standing in for a native gRPC gateway,
//! synthesized here since the upstream's own service definition is out
//! of this core's scope.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
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
use tokio::task::JoinHandle;

use crate::config::ProxyConfig;
use crate::config::UpstreamBackendKind;
use crate::pb;
use crate::wire;

/// Build the configured upstream as a boxed [`AsyncBackend`] trait object,
/// so `ProxyService` stays agnostic to which concrete backend it is
/// talking to.
pub async fn build_upstream(config: &ProxyConfig) -> anyhow::Result<Arc<dyn AsyncBackend>> {
    match config.upstream_backend {
        UpstreamBackendKind::Dpm => {
            let backend = devnet_dpm::DpmBackend::connect(&config.upstream_url(), config.upstream_role.clone())
                .await
                .map_err(|e| anyhow::anyhow!("dpm upstream connect failed: {e}"))?;
            Ok(Arc::new(backend))
        }
        UpstreamBackendKind::Grpc => {
            let backend = GrpcUpstream::connect(&config.upstream_url(), config.upstream_role.is_some()).await?;
            Ok(Arc::new(backend))
        }
    }
}

/// A `DeviceControl` client standing in for a native gRPC gateway
/// upstream.
pub struct GrpcUpstream {
    client: pb::device_control_client::DeviceControlClient<tonic::transport::Channel>,
    can_write: bool,
    streams: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl GrpcUpstream {
    pub async fn connect(url: &str, can_write: bool) -> anyhow::Result<Self> {
        let client = pb::device_control_client::DeviceControlClient::connect(url.to_string()).await?;
        Ok(GrpcUpstream {
            client,
            can_write,
            streams: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }
}

fn grpc_error(drf: &str, status: tonic::Status) -> CoreError {
    if status.code() == tonic::Code::DeadlineExceeded {
        CoreError::Timeout { drf: drf.to_string() }
    } else {
        CoreError::Other(format!("upstream gRPC call failed: {status}"))
    }
}

#[async_trait]
impl AsyncBackend for GrpcUpstream {
    fn capabilities(&self) -> BackendCapability {
        let mut caps = BackendCapability::READ | BackendCapability::STREAM | BackendCapability::BATCH;
        if self.can_write {
            caps |= BackendCapability::WRITE | BackendCapability::AUTH;
        }
        caps
    }

    async fn get(&self, drf: &str, timeout: Option<Duration>) -> Result<Reading> {
        let readings = self.get_many(std::slice::from_ref(&drf.to_string()), timeout).await?;
        readings
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Other(format!("upstream returned no reading for '{drf}'")))
    }

    async fn get_many(&self, drfs: &[String], timeout: Option<Duration>) -> Result<Vec<Reading>> {
        let mut client = self.client.clone();
        let mut request = tonic::Request::new(pb::ReadRequest { drfs: drfs.to_vec() });
        if let Some(t) = timeout {
            request.set_timeout(t);
        }
        let reply = client
            .read(request)
            .await
            .map_err(|e| grpc_error(drfs.first().map(String::as_str).unwrap_or(""), e))?
            .into_inner();
        Ok(reply.readings.iter().map(wire::proto_reading_to_core).collect())
    }

    async fn write(&self, drf: &str, value: Value, timeout: Option<Duration>) -> Result<WriteResult> {
        if !self.can_write {
            return Err(CoreError::UnsupportedOperation("grpc upstream was not configured with a write role"));
        }
        let results = self
            .write_many(std::slice::from_ref(&Setting { drf: drf.to_string(), value }), timeout)
            .await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Other(format!("upstream returned no write result for '{drf}'")))
    }

    async fn write_many(&self, settings: &[Setting], timeout: Option<Duration>) -> Result<Vec<WriteResult>> {
        if !self.can_write {
            return Err(CoreError::UnsupportedOperation("grpc upstream was not configured with a write role"));
        }
        let mut client = self.client.clone();
        let proto_settings = settings
            .iter()
            .map(|s| pb::Setting { drf: s.drf.clone(), value: Some(wire::value_to_proto(&s.value)) })
            .collect();
        let mut request = tonic::Request::new(pb::SetRequest { settings: proto_settings });
        if let Some(t) = timeout {
            request.set_timeout(t);
        }
        let reply = client
            .set(request)
            .await
            .map_err(|e| grpc_error("batch", e))?
            .into_inner();
        Ok(reply
            .results
            .iter()
            .map(wire::proto_reading_to_core)
            .map(|r| WriteResult {
                drf: r.drf,
                facility: r.facility,
                error_code: r.error_code,
                message: r.message,
                verified: None,
                attempts: 1,
            })
            .collect())
    }

    async fn subscribe(&self, drfs: &[String]) -> Result<(SubscriptionId, AsyncSubscriptionHandle)> {
        let mut client = self.client.clone();
        let mut stream = client
            .subscribe(tonic::Request::new(pb::ReadRequest { drfs: drfs.to_vec() }))
            .await
            .map_err(|e| grpc_error("subscribe", e))?
            .into_inner();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (dispatcher, handle) = async_subscription_channel(256, vec![id.to_string()], SubscriptionMode::Iterator);

        let task = tokio::spawn(async move {
            loop {
                match tokio_stream::StreamExt::next(&mut stream).await {
                    Some(Ok(reply)) => {
                        for reading in &reply.readings {
                            dispatcher.dispatch(wire::proto_reading_to_core(reading));
                        }
                    }
                    Some(Err(status)) => {
                        dispatcher.signal_error(CoreError::Other(format!("upstream subscription failed: {status}")));
                        break;
                    }
                    None => {
                        dispatcher.signal_stop();
                        break;
                    }
                }
            }
        });
        self.streams.lock().await.insert(id, task);
        Ok((SubscriptionId(id), handle))
    }

    async fn remove(&self, id: SubscriptionId) -> Result<()> {
        if let Some(task) = self.streams.lock().await.remove(&id.0) {
            task.abort();
        }
        Ok(())
    }

    async fn stop_streaming(&self) -> Result<()> {
        let mut streams = self.streams.lock().await;
        for (_, task) in streams.drain() {
            task.abort();
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.stop_streaming().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn deadline_exceeded_status_becomes_a_timeout_error() {
        let err = grpc_error("M:OUTTMP", tonic::Status::deadline_exceeded("slow"));
        assert!(matches!(err, CoreError::Timeout { drf } if drf == "M:OUTTMP"));
    }

    #[test]
    fn other_status_codes_become_an_other_error_carrying_the_status() {
        let err = grpc_error("M:OUTTMP", tonic::Status::unavailable("down"));
        match err {
            CoreError::Other(msg) => assert!(msg.contains("down")),
            other => panic!("expected Other, got {other:?}"),
        }
    }
}
