#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devnet_audit::AuditLog;
use devnet_core::AsyncBackend;
use devnet_core::AsyncSubscriptionHandle;
use devnet_core::BackendCapability;
use devnet_core::CoreError;
use devnet_core::Reading;
use devnet_core::Result as CoreResult;
use devnet_core::Setting;
use devnet_core::SubscriptionId;
use devnet_core::Value;
use devnet_core::WriteResult;
use devnet_policy::DeviceAccessMode;
use devnet_policy::DeviceAccessPolicy;
use devnet_policy::Policy;
use devnet_policy::ReadOnlyPolicy;
use devnet_proxy::pb;
use devnet_proxy::pb::device_control_server::DeviceControl;
use devnet_proxy::ProxyService;
use tonic::Request;

/// A stub backend that always returns a canned, ok `Reading` for every
/// drf it is asked about, so these tests exercise the proxy's own policy
/// and audit wiring without a real upstream.
struct EchoBackend;

#[async_trait]
impl AsyncBackend for EchoBackend {
    fn capabilities(&self) -> BackendCapability {
        BackendCapability::READ | BackendCapability::WRITE | BackendCapability::BATCH
    }

    async fn get(&self, drf: &str, _timeout: Option<Duration>) -> CoreResult<Reading> {
        Ok(Reading::ok(drf, Value::Scalar(1.0), chrono::Local::now()))
    }

    async fn get_many(&self, drfs: &[String], _timeout: Option<Duration>) -> CoreResult<Vec<Reading>> {
        Ok(drfs.iter().map(|d| Reading::ok(d, Value::Scalar(1.0), chrono::Local::now())).collect())
    }

    async fn write(&self, drf: &str, _value: Value, _timeout: Option<Duration>) -> CoreResult<WriteResult> {
        Ok(WriteResult::success(drf, 1))
    }

    async fn write_many(&self, settings: &[Setting], _timeout: Option<Duration>) -> CoreResult<Vec<WriteResult>> {
        Ok(settings.iter().map(|s| WriteResult::success(s.drf.clone(), 1)).collect())
    }

    async fn subscribe(&self, _drfs: &[String]) -> CoreResult<(SubscriptionId, AsyncSubscriptionHandle)> {
        Err(CoreError::UnsupportedOperation("EchoBackend does not support subscribe in tests"))
    }

    async fn remove(&self, _id: SubscriptionId) -> CoreResult<()> {
        Ok(())
    }

    async fn stop_streaming(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn close(&self) -> CoreResult<()> {
        Ok(())
    }
}

fn audit(dir: &tempfile::TempDir) -> Arc<AuditLog> {
    Arc::new(AuditLog::open(&dir.path().join("audit.jsonl"), None, 1).expect("open audit log"))
}

#[tokio::test]
async fn read_is_allowed_without_bearer_token() {
    let dir = tempfile::tempdir().unwrap();
    let service = ProxyService::new(Arc::new(EchoBackend), vec![], audit(&dir), b"secret".to_vec(), false);
    let request = Request::new(pb::ReadRequest { drfs: vec!["M:OUTTMP".to_string()] });
    let reply = service.read(request).await.unwrap().into_inner();
    assert_eq!(reply.readings.len(), 1);
    assert_eq!(reply.readings[0].drf, "M:OUTTMP");
}

#[tokio::test]
async fn set_without_bearer_token_is_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let service = ProxyService::new(Arc::new(EchoBackend), vec![], audit(&dir), b"secret".to_vec(), false);
    let request = Request::new(pb::SetRequest { settings: vec![] });
    let err = service.set(request).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::Unauthenticated);
}

#[tokio::test]
async fn set_with_matching_bearer_token_runs_the_policy_chain() {
    let dir = tempfile::tempdir().unwrap();
    let policies: Vec<Box<dyn Policy>> = vec![Box::new(ReadOnlyPolicy)];
    let service = ProxyService::new(Arc::new(EchoBackend), policies, audit(&dir), b"secret".to_vec(), false);
    let mut request = Request::new(pb::SetRequest {
        settings: vec![pb::Setting { drf: "M:OUTTMP".to_string(), value: Some(pb::Value { value: Some(pb::value::Value::Scalar(1.0)) }) }],
    });
    request.metadata_mut().insert("authorization", "Bearer secret".parse().unwrap());
    let err = service.set(request).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::PermissionDenied);
    assert!(err.message().contains("Write operations disabled"));
}

#[tokio::test]
async fn device_access_policy_denies_out_of_allowlist_reads() {
    let dir = tempfile::tempdir().unwrap();
    let policies: Vec<Box<dyn Policy>> =
        vec![Box::new(DeviceAccessPolicy::new(&["M:*".to_string()], DeviceAccessMode::Allow))];
    let service = ProxyService::new(Arc::new(EchoBackend), policies, audit(&dir), b"secret".to_vec(), false);
    let request = Request::new(pb::ReadRequest { drfs: vec!["Z:FOO".to_string()] });
    let err = service.read(request).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::PermissionDenied);
    assert!(err.message().contains("Z:FOO"));
}

#[tokio::test]
async fn denied_request_writes_one_audit_line_without_final_drfs() {
    let dir = tempfile::tempdir().unwrap();
    let policies: Vec<Box<dyn Policy>> = vec![Box::new(ReadOnlyPolicy)];
    let audit_log = audit(&dir);
    let service = ProxyService::new(Arc::new(EchoBackend), policies, audit_log.clone(), b"secret".to_vec(), false);
    let mut request = Request::new(pb::SetRequest { settings: vec![] });
    request.metadata_mut().insert("authorization", "Bearer secret".parse().unwrap());
    let _ = service.set(request).await;
    audit_log.close().unwrap();

    let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
    assert_eq!(contents.lines().count(), 1);
    let parsed: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
    assert_eq!(parsed["allowed"], false);
    assert!(parsed.get("final_drfs").is_none());
}
