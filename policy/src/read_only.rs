use crate::chain::Policy;
use crate::context::PolicyDecision;
use crate::context::RequestContext;
use crate::context::RpcMethod;

/// Denies every `Set` call; allows everything else.
pub struct ReadOnlyPolicy;

impl Policy for ReadOnlyPolicy {
    fn check(&self, ctx: &RequestContext) -> PolicyDecision {
        if ctx.rpc_method == RpcMethod::Set {
            PolicyDecision::deny("Write operations disabled")
        } else {
            PolicyDecision::allow()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn denies_set() {
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Set, "peer1");
        assert!(!ReadOnlyPolicy.check(&ctx).allowed);
    }

    #[test]
    fn allows_read() {
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Read, "peer1");
        assert!(ReadOnlyPolicy.check(&ctx).allowed);
    }
}
