//! The supervised proxy's policy chain: an ordered list of allow/deny
//! evaluators, each able to rewrite the request context for later policies
//! and the backend.

mod chain;
mod context;
mod device_access;
mod rate_limit;
mod read_only;

pub use chain::evaluate_policies;
pub use chain::Policy;
pub use context::PolicyDecision;
pub use context::RequestContext;
pub use context::RpcMethod;
pub use device_access::DeviceAccessMode;
pub use device_access::DeviceAccessPolicy;
pub use rate_limit::RateLimitKey;
pub use rate_limit::RateLimitPolicy;
pub use read_only::ReadOnlyPolicy;
