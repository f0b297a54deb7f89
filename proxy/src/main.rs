use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use devnet_audit::AuditLog;
use devnet_proxy::config::build_policy_chain;
use devnet_proxy::config::ProxyConfig;
use devnet_proxy::pb::device_control_server::DeviceControlServer;
use devnet_proxy::upstream::build_upstream;
use devnet_proxy::ProxyService;
use tracing_subscriber::EnvFilter;

/// Supervised proxy for the device control network: terminates a
/// `DeviceControl` gRPC service behind a policy chain and audit log,
/// forwarding admitted requests to a configured upstream backend.
#[derive(Parser, Debug)]
#[command(name = "devnet-proxyd")]
struct Cli {
    /// Path to the proxy's TOML configuration file.
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = ProxyConfig::load(&cli.config)?;

    let backend = build_upstream(&config).await?;
    let policies = build_policy_chain(&config.policies);
    let audit = Arc::new(AuditLog::open(&config.audit_path, config.proto_path.as_deref(), config.flush_interval)?);

    let service = ProxyService::new(backend, policies, audit, config.token.clone(), config.log_responses);
    let addr = config.bind_addr();
    tracing::info!(%addr, "starting devnet-proxyd");

    tonic::transport::Server::builder()
        .add_service(DeviceControlServer::new(service))
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
