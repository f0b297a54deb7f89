use wildmatch::WildMatch;

use crate::chain::Policy;
use crate::context::PolicyDecision;
use crate::context::RequestContext;

/// Whether matching patterns are the only thing permitted, or the only
/// thing forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAccessMode {
    Allow,
    Deny,
}

/// Case-insensitive fnmatch-glob device name filter, matched against the
/// canonical device-name prefix of each DRF (not the full request text).
pub struct DeviceAccessPolicy {
    patterns: Vec<WildMatch>,
    mode: DeviceAccessMode,
}

impl DeviceAccessPolicy {
    pub fn new(patterns: &[String], mode: DeviceAccessMode) -> Self {
        DeviceAccessPolicy {
            patterns: patterns.iter().map(|p| WildMatch::new(&p.to_ascii_uppercase())).collect(),
            mode,
        }
    }

    fn matches_any(&self, device_name: &str) -> bool {
        let upper = device_name.to_ascii_uppercase();
        self.patterns.iter().any(|p| p.matches(&upper))
    }
}

impl Policy for DeviceAccessPolicy {
    fn check(&self, ctx: &RequestContext) -> PolicyDecision {
        for drf in &ctx.drfs {
            let device_name = match devnet_drf::get_device_name(drf) {
                Ok(name) => name,
                Err(e) => return PolicyDecision::deny(format!("unparseable DRF '{drf}': {e}")),
            };
            let matched = self.matches_any(&device_name);
            let offending = match self.mode {
                DeviceAccessMode::Allow => !matched,
                DeviceAccessMode::Deny => matched,
            };
            if offending {
                return PolicyDecision::deny(match self.mode {
                    DeviceAccessMode::Allow => format!("Device {device_name} not in allow list"),
                    DeviceAccessMode::Deny => format!("Device {device_name} in deny list"),
                });
            }
        }
        PolicyDecision::allow()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::context::RpcMethod;

    #[test]
    fn allow_mode_denies_non_matching_device() {
        let policy = DeviceAccessPolicy::new(&["M:*".to_string()], DeviceAccessMode::Allow);
        let ctx = RequestContext::new(vec!["N:I2B1RI".into()], RpcMethod::Read, "peer1");
        let decision = policy.check(&ctx);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("N:I2B1RI"));
    }

    #[test]
    fn allow_mode_allows_matching_device() {
        let policy = DeviceAccessPolicy::new(&["M:*".to_string()], DeviceAccessMode::Allow);
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Read, "peer1");
        assert!(policy.check(&ctx).allowed);
    }

    #[test]
    fn deny_mode_blocks_matching_device() {
        let policy = DeviceAccessPolicy::new(&["M:OUTTMP".to_string()], DeviceAccessMode::Deny);
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Read, "peer1");
        assert!(!policy.check(&ctx).allowed);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let policy = DeviceAccessPolicy::new(&["m:*".to_string()], DeviceAccessMode::Allow);
        let ctx = RequestContext::new(vec!["M:OUTTMP".into()], RpcMethod::Read, "peer1");
        assert!(policy.check(&ctx).allowed);
    }
}
