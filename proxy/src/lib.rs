//! The supervised proxy front end: config loading, the policy-chain +
//! audit-log plumbing, the upstream backend selector, and the `tonic`
//! service that terminates the `DeviceControl` RPCs.

pub mod config;
pub mod error;
pub mod pb;
pub mod service;
pub mod upstream;
pub mod wire;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use service::ProxyService;
