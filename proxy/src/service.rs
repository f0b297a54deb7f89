use std::pin::Pin;
use std::sync::Arc;

use devnet_audit::AuditLog;
use devnet_audit::TAG_READ_REPLY;
use devnet_audit::TAG_READ_REQUEST;
use devnet_audit::TAG_SETTING_REPLY;
use devnet_audit::TAG_SETTING_REQUEST;
use devnet_core::AsyncBackend;
use devnet_core::Setting;
use devnet_policy::evaluate_policies;
use devnet_policy::Policy;
use devnet_policy::RequestContext;
use devnet_policy::RpcMethod;
use prost::Message;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tonic::Streaming;

use crate::error::core_error_to_status;
use crate::pb;
use crate::wire;

/// Terminates the inbound `DeviceControl` service: checks the bearer
/// token on `Set`/`Subscribe`, runs the policy chain, writes the audit
/// trail, and translates the (possibly rewritten) request onto the
/// configured upstream backend.
pub struct ProxyService {
    backend: Arc<dyn AsyncBackend>,
    policies: Vec<Box<dyn Policy>>,
    audit: Arc<AuditLog>,
    token: Vec<u8>,
    log_responses: bool,
}

impl ProxyService {
    pub fn new(
        backend: Arc<dyn AsyncBackend>,
        policies: Vec<Box<dyn Policy>>,
        audit: Arc<AuditLog>,
        token: Vec<u8>,
        log_responses: bool,
    ) -> Self {
        ProxyService { backend, policies, audit, token, log_responses }
    }

    /// `Set` and `Subscribe` require an exact `authorization: Bearer
    /// <token>` metadata match; `Read`/`Alarms` do not.
    fn check_bearer_token<T>(&self, request: &Request<T>) -> std::result::Result<(), Status> {
        let header = request
            .metadata()
            .get("authorization")
            .ok_or_else(|| Status::unauthenticated("missing authorization metadata"))?;
        let expected = format!("Bearer {}", String::from_utf8_lossy(&self.token));
        if header.as_bytes() != expected.as_bytes() {
            return Err(Status::unauthenticated("bearer token mismatch"));
        }
        Ok(())
    }

    fn peer_string<T>(request: &Request<T>) -> String {
        request
            .remote_addr()
            .map(|addr| format!("ipv4:{addr}"))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Copy the inbound ASCII metadata entries into a plain map so policies
    /// can inspect caller-supplied context without depending on `tonic`.
    /// Binary (`-bin`-suffixed) entries are skipped; they're not
    /// meaningful as request context for the policy chain.
    fn request_metadata<T>(request: &Request<T>) -> std::collections::HashMap<String, String> {
        request
            .metadata()
            .iter()
            .filter_map(|kv| match kv {
                tonic::metadata::KeyAndValueRef::Ascii(key, value) => {
                    value.to_str().ok().map(|v| (key.as_str().to_string(), v.to_string()))
                }
                tonic::metadata::KeyAndValueRef::Binary(_, _) => None,
            })
            .collect()
    }

    /// Run the policy chain, writing the request-side audit entry
    /// regardless of the verdict, and return the (possibly rewritten)
    /// context on allow.
    fn admit(
        &self,
        seq: u64,
        peer: &str,
        method: &str,
        ctx: RequestContext,
        binary_tag: u8,
        binary_payload: Option<Vec<u8>>,
    ) -> std::result::Result<RequestContext, Status> {
        let decision = evaluate_policies(&self.policies, &ctx);
        let final_drfs = decision.ctx.as_ref().filter(|c| c.drfs != ctx.drfs).map(|c| c.drfs.clone());
        let _ = self.audit.log_request(
            seq,
            peer,
            method,
            &ctx.drfs,
            decision.allowed,
            decision.reason.as_deref(),
            final_drfs.as_deref(),
            decision.allowed.then_some(binary_tag),
            binary_payload.as_deref(),
        );
        if !decision.allowed {
            return Err(Status::permission_denied(decision.reason.unwrap_or_default()));
        }
        Ok(decision.ctx.unwrap_or(ctx))
    }

    fn log_response(&self, seq: u64, peer: &str, method: &str, reading: &devnet_core::Reading, binary_tag: u8) {
        let payload = json!({
            "drf": reading.drf,
            "ok": reading.is_ok(),
            "error_code": reading.error_code,
        });
        let proto = wire::reading_to_proto(reading).encode_to_vec();
        let _ = self.audit.log_response(seq, peer, method, payload, Some(binary_tag), Some(&proto));
    }
}

#[tonic::async_trait]
impl pb::device_control_server::DeviceControl for ProxyService {
    async fn read(&self, request: Request<pb::ReadRequest>) -> std::result::Result<Response<pb::ReadReply>, Status> {
        let peer = Self::peer_string(&request);
        let metadata = Self::request_metadata(&request);
        let seq = self.audit.next_seq();
        let req = request.into_inner();
        let mut ctx = RequestContext::new(req.drfs.clone(), RpcMethod::Read, peer.clone());
        ctx.metadata = metadata;
        let proto_req = pb::ReadRequest { drfs: req.drfs };
        let ctx = self.admit(seq, &peer, "Read", ctx, TAG_READ_REQUEST, Some(proto_req.encode_to_vec()))?;

        let readings = self.backend.get_many(&ctx.drfs, None).await.map_err(|e| core_error_to_status(&e))?;
        if self.log_responses {
            for reading in &readings {
                self.log_response(seq, &peer, "Read", reading, TAG_READ_REPLY);
            }
        }
        Ok(Response::new(pb::ReadReply { readings: readings.iter().map(wire::reading_to_proto).collect() }))
    }

    async fn set(&self, request: Request<pb::SetRequest>) -> std::result::Result<Response<pb::SetReply>, Status> {
        self.check_bearer_token(&request)?;
        let peer = Self::peer_string(&request);
        let metadata = Self::request_metadata(&request);
        let seq = self.audit.next_seq();
        let req = request.into_inner();
        let drfs: Vec<String> = req.settings.iter().map(|s| s.drf.clone()).collect();
        let values: Vec<serde_json::Value> =
            req.settings.iter().map(|s| serde_json::to_value(s.value.as_ref().and_then(wire::proto_to_value)).unwrap_or_default()).collect();
        let mut ctx = RequestContext::new(drfs, RpcMethod::Set, peer.clone());
        ctx.values = Some(values);
        ctx.metadata = metadata;
        let proto_req = pb::SetRequest { settings: req.settings.clone() };
        let ctx = self.admit(seq, &peer, "Set", ctx, TAG_SETTING_REQUEST, Some(proto_req.encode_to_vec()))?;

        let settings: Vec<Setting> = ctx
            .drfs
            .iter()
            .zip(req.settings.iter())
            .filter_map(|(drf, original)| {
                original.value.as_ref().and_then(wire::proto_to_value).map(|value| Setting { drf: drf.clone(), value })
            })
            .collect();
        let results = self.backend.write_many(&settings, None).await.map_err(|e| core_error_to_status(&e))?;
        let readings: Vec<pb::Reading> = results
            .iter()
            .map(|r| pb::Reading {
                drf: r.drf.clone(),
                facility: r.facility as u32,
                error_code: r.error_code as i32,
                message: r.message.clone().unwrap_or_default(),
                timestamp: chrono::Local::now().to_rfc3339(),
                value: None,
            })
            .collect();
        if self.log_responses {
            for reading in &readings {
                let _ = self.audit.log_response(
                    seq,
                    &peer,
                    "Set",
                    json!({"drf": reading.drf, "ok": reading.error_code == 0}),
                    Some(TAG_SETTING_REPLY),
                    Some(&reading.encode_to_vec()),
                );
            }
        }
        Ok(Response::new(pb::SetReply { results: readings }))
    }

    async fn alarms(
        &self,
        request: Request<pb::AlarmsRequest>,
    ) -> std::result::Result<Response<pb::AlarmsReply>, Status> {
        let peer = Self::peer_string(&request);
        let metadata = Self::request_metadata(&request);
        let seq = self.audit.next_seq();
        let req = request.into_inner();
        let mut ctx = RequestContext::new(req.drfs.clone(), RpcMethod::Alarms, peer.clone());
        ctx.metadata = metadata;
        let proto_req = pb::AlarmsRequest { drfs: req.drfs };
        let ctx = self.admit(seq, &peer, "Alarms", ctx, TAG_READ_REQUEST, Some(proto_req.encode_to_vec()))?;

        let readings = self.backend.get_many(&ctx.drfs, None).await.map_err(|e| core_error_to_status(&e))?;
        if self.log_responses {
            for reading in &readings {
                self.log_response(seq, &peer, "Alarms", reading, TAG_READ_REPLY);
            }
        }
        Ok(Response::new(pb::AlarmsReply { readings: readings.iter().map(wire::reading_to_proto).collect() }))
    }

    type SubscribeStream = Pin<Box<dyn tokio_stream::Stream<Item = std::result::Result<pb::ReadReply, Status>> + Send>>;

    async fn subscribe(
        &self,
        request: Request<pb::ReadRequest>,
    ) -> std::result::Result<Response<Self::SubscribeStream>, Status> {
        self.check_bearer_token(&request)?;
        let peer = Self::peer_string(&request);
        let metadata = Self::request_metadata(&request);
        let seq = self.audit.next_seq();
        let req = request.into_inner();
        // `RequestContext::rpc_method` only distinguishes {Read, Set, Alarms};
        // a subscription is policy-evaluated as a Read.
        let mut ctx = RequestContext::new(req.drfs.clone(), RpcMethod::Read, peer.clone());
        ctx.metadata = metadata;
        let proto_req = pb::ReadRequest { drfs: req.drfs };
        let ctx = self.admit(seq, &peer, "Subscribe", ctx, TAG_READ_REQUEST, Some(proto_req.encode_to_vec()))?;

        let all_oneshot = ctx.drfs.iter().all(|drf| {
            devnet_drf::parse_request(drf).map(|r| r.event.is_oneshot()).unwrap_or(false)
        });

        let backend = self.backend.clone();
        let audit = self.audit.clone();
        let log_responses = self.log_responses;
        let peer_owned = peer.clone();
        let drfs = ctx.drfs.clone();

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            if all_oneshot {
                match backend.get_many(&drfs, None).await {
                    Ok(readings) => {
                        if log_responses {
                            for reading in &readings {
                                let payload = json!({"drf": reading.drf, "ok": reading.is_ok()});
                                let proto = wire::reading_to_proto(reading).encode_to_vec();
                                let _ = audit.log_response(seq, &peer_owned, "Subscribe", payload, Some(TAG_READ_REPLY), Some(&proto));
                            }
                        }
                        let reply = pb::ReadReply { readings: readings.iter().map(wire::reading_to_proto).collect() };
                        let _ = tx.send(Ok(reply)).await;
                    }
                    Err(e) => {
                        let _ = tx.send(Err(core_error_to_status(&e))).await;
                    }
                }
                return;
            }

            let (_id, handle) = match backend.subscribe(&drfs).await {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = tx.send(Err(core_error_to_status(&e))).await;
                    return;
                }
            };
            loop {
                match handle.readings(Some(std::time::Duration::from_millis(500))).await {
                    Ok(readings) if !readings.is_empty() => {
                        if log_responses {
                            for reading in &readings {
                                let payload = json!({"drf": reading.drf, "ok": reading.is_ok()});
                                let proto = wire::reading_to_proto(reading).encode_to_vec();
                                let _ = audit.log_response(seq, &peer_owned, "Subscribe", payload, Some(TAG_READ_REPLY), Some(&proto));
                            }
                        }
                        let reply = pb::ReadReply { readings: readings.iter().map(wire::reading_to_proto).collect() };
                        if tx.send(Ok(reply)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {
                        if handle.stopped() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(core_error_to_status(&e))).await;
                        break;
                    }
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}
