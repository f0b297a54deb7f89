use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// The RPC method a request arrived under, mirroring the proxy's three
/// service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    Read,
    Set,
    Alarms,
}

/// Everything a policy needs to decide, and everything it may rewrite. A
/// policy that rewrites `drfs` hands later policies and the backend the
/// rewritten list — the audit log keeps both the original and final
/// request, so the rewrite is always reconstructable.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub drfs: Vec<String>,
    pub rpc_method: RpcMethod,
    pub peer: String,
    pub metadata: HashMap<String, String>,
    pub values: Option<Vec<JsonValue>>,
    pub raw_request: Option<JsonValue>,
}

impl RequestContext {
    pub fn new(drfs: Vec<String>, rpc_method: RpcMethod, peer: impl Into<String>) -> Self {
        RequestContext {
            drfs,
            rpc_method,
            peer: peer.into(),
            metadata: HashMap::new(),
            values: None,
            raw_request: None,
        }
    }
}

/// The verdict a policy (or `evaluate_policies`) reaches. A denial must
/// always carry a non-empty `reason`.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub ctx: Option<RequestContext>,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        PolicyDecision { allowed: true, reason: None, ctx: None }
    }

    pub fn allow_with_context(ctx: RequestContext) -> Self {
        PolicyDecision { allowed: true, reason: None, ctx: Some(ctx) }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        PolicyDecision { allowed: false, reason: Some(reason.into()), ctx: None }
    }
}
