use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProxyError;
use crate::error::Result;

/// Which upstream backend family `upstream_host:upstream_port` speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamBackendKind {
    Dpm,
    Grpc,
}

/// One entry of the ordered policy chain, as written in the config file.
/// Deserialized into a live [`devnet_policy::Policy`] by
/// [`build_policy_chain`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicySpec {
    ReadOnly,
    DeviceAccess {
        mode: DeviceAccessModeSpec,
        patterns: Vec<String>,
    },
    RateLimit {
        max_requests: usize,
        window_secs: u64,
        #[serde(default)]
        key_by: RateLimitKeySpec,
    },
}

/// Which part of the peer string the rate-limit window buckets on. The
/// right granularity is deployment-specific; default to the full peer
/// string so distinct ports are not folded together unless asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitKeySpec {
    #[default]
    FullPeer,
    HostOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceAccessModeSpec {
    Allow,
    Deny,
}

/// Every recognized proxy option, with its default and validation rule
/// enforced at load time, not scattered across keyword-argument call
/// sites.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub bind_address: String,
    pub port: u16,
    /// Bearer token `Set`/`Subscribe` callers must present exactly, as
    /// raw bytes compared against the `authorization: Bearer <token>`
    /// metadata entry.
    #[serde(with = "token_as_string")]
    pub token: Vec<u8>,
    pub upstream_backend: UpstreamBackendKind,
    pub upstream_host: String,
    pub upstream_port: u16,
    pub upstream_auth: Option<String>,
    pub upstream_role: Option<String>,
    pub policies: Vec<PolicySpec>,
    pub audit_path: PathBuf,
    pub proto_path: Option<PathBuf>,
    #[serde(default)]
    pub log_responses: bool,
    #[serde(default = "default_flush_interval")]
    pub flush_interval: u64,
}

fn default_flush_interval() -> u64 {
    1
}

mod token_as_string {
    use serde::Deserialize;
    use serde::Deserializer;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.into_bytes())
    }
}

impl ProxyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ProxyConfig = toml::from_str(&text).map_err(|e| ProxyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.flush_interval == 0 {
            return Err(ProxyError::Config("flush_interval must be >= 1".to_string()));
        }
        if self.token.is_empty() {
            return Err(ProxyError::Config("token must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .unwrap_or_else(|_| std::net::SocketAddr::from(([0, 0, 0, 0], self.port)))
    }

    pub fn upstream_url(&self) -> String {
        match self.upstream_backend {
            UpstreamBackendKind::Dpm => format!("ws://{}:{}", self.upstream_host, self.upstream_port),
            UpstreamBackendKind::Grpc => format!("http://{}:{}", self.upstream_host, self.upstream_port),
        }
    }
}

/// Build the live policy chain from its config specs, in order.
pub fn build_policy_chain(specs: &[PolicySpec]) -> Vec<Box<dyn devnet_policy::Policy>> {
    specs
        .iter()
        .map(|spec| -> Box<dyn devnet_policy::Policy> {
            match spec {
                PolicySpec::ReadOnly => Box::new(devnet_policy::ReadOnlyPolicy),
                PolicySpec::DeviceAccess { mode, patterns } => {
                    let mode = match mode {
                        DeviceAccessModeSpec::Allow => devnet_policy::DeviceAccessMode::Allow,
                        DeviceAccessModeSpec::Deny => devnet_policy::DeviceAccessMode::Deny,
                    };
                    Box::new(devnet_policy::DeviceAccessPolicy::new(patterns, mode))
                }
                PolicySpec::RateLimit { max_requests, window_secs, key_by } => {
                    let key = match key_by {
                        RateLimitKeySpec::FullPeer => devnet_policy::RateLimitKey::FullPeer,
                        RateLimitKeySpec::HostOnly => devnet_policy::RateLimitKey::HostOnly,
                    };
                    Box::new(devnet_policy::RateLimitPolicy::with_key(
                        *max_requests,
                        Duration::from_secs(*window_secs),
                        key,
                    ))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn parses_a_full_config() {
        let toml_text = r#"
            bind_address = "0.0.0.0"
            port = 50051
            token = "s3cr3t"
            upstream_backend = "dpm"
            upstream_host = "dpm01.example"
            upstream_port = 6802
            audit_path = "/var/log/devnet/audit.jsonl"
            proto_path = "/var/log/devnet/audit.bin"
            log_responses = true
            flush_interval = 10

            [[policies]]
            kind = "read_only"

            [[policies]]
            kind = "device_access"
            mode = "allow"
            patterns = ["M:*"]

            [[policies]]
            kind = "rate_limit"
            max_requests = 100
            window_secs = 60
        "#;
        let config: ProxyConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(config.token, b"s3cr3t");
        assert_eq!(config.policies.len(), 3);
        assert_eq!(config.flush_interval, 10);
        assert!(config.log_responses);
    }

    #[test]
    fn rate_limit_key_defaults_to_full_peer_but_can_be_overridden() {
        let toml_text = r#"
            kind = "rate_limit"
            max_requests = 10
            window_secs = 1
        "#;
        let spec: PolicySpec = toml::from_str(toml_text).unwrap();
        match spec {
            PolicySpec::RateLimit { key_by, .. } => assert_eq!(key_by, RateLimitKeySpec::FullPeer),
            other => panic!("expected RateLimit, got {other:?}"),
        }

        let toml_text = r#"
            kind = "rate_limit"
            max_requests = 10
            window_secs = 1
            key_by = "host_only"
        "#;
        let spec: PolicySpec = toml::from_str(toml_text).unwrap();
        match spec {
            PolicySpec::RateLimit { key_by, .. } => assert_eq!(key_by, RateLimitKeySpec::HostOnly),
            other => panic!("expected RateLimit, got {other:?}"),
        }
    }

    #[test]
    fn flush_interval_defaults_to_one() {
        let toml_text = r#"
            bind_address = "127.0.0.1"
            port = 1
            token = "x"
            upstream_backend = "grpc"
            upstream_host = "h"
            upstream_port = 1
            audit_path = "a.jsonl"
        "#;
        let config: ProxyConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(config.flush_interval, 1);
        assert!(!config.log_responses);
    }
}
