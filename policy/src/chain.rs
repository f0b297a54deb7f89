use crate::context::PolicyDecision;
use crate::context::RequestContext;

/// One link in the policy chain. `check` may allow, deny, or allow with a
/// rewritten context that later policies and the backend observe instead
/// of the caller's original request.
pub trait Policy: Send + Sync {
    fn check(&self, ctx: &RequestContext) -> PolicyDecision;
}

/// Run `policies` in order against `ctx`, threading any rewrite forward.
/// Returns the first denial; an allow is only returned once every policy
/// has allowed. The returned context is the final (possibly rewritten)
/// one.
pub fn evaluate_policies(policies: &[Box<dyn Policy>], ctx: &RequestContext) -> PolicyDecision {
    let mut current = ctx.clone();
    for policy in policies {
        let decision = policy.check(&current);
        if !decision.allowed {
            return decision;
        }
        if let Some(rewritten) = decision.ctx {
            current = rewritten;
        }
    }
    PolicyDecision::allow_with_context(current)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::context::RpcMethod;

    struct AlwaysDeny;
    impl Policy for AlwaysDeny {
        fn check(&self, _ctx: &RequestContext) -> PolicyDecision {
            PolicyDecision::deny("nope")
        }
    }

    struct AlwaysAllow;
    impl Policy for AlwaysAllow {
        fn check(&self, _ctx: &RequestContext) -> PolicyDecision {
            PolicyDecision::allow()
        }
    }

    #[test]
    fn first_denial_short_circuits() {
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Read, "peer1");
        let policies: Vec<Box<dyn Policy>> = vec![Box::new(AlwaysAllow), Box::new(AlwaysDeny), Box::new(AlwaysAllow)];
        let decision = evaluate_policies(&policies, &ctx);
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("nope"));
    }

    #[test]
    fn all_allow_yields_allow() {
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Read, "peer1");
        let policies: Vec<Box<dyn Policy>> = vec![Box::new(AlwaysAllow), Box::new(AlwaysAllow)];
        let decision = evaluate_policies(&policies, &ctx);
        assert!(decision.allowed);
    }
}
