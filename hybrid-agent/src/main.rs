//! Hybrid agent entry point.
//!
//! Loads configuration from the environment, connects to the hub, and serves
//! requests against the in-memory PLM backend until Ctrl-C.

use std::sync::Arc;

use hybrid_agent::config::ENV_SEED_FILE;
use hybrid_agent::telemetry::{init_tracing, TelemetryConfig};
use hybrid_agent::{
    AgentConfig, AgentError, AgentResult, GrpcHubClient, HybridAgentService, ReverseAgent,
};
use hybrid_core::InMemoryPlm;

#[tokio::main]
async fn main() -> AgentResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let config = AgentConfig::from_env()?;
    let hub = Arc::new(GrpcHubClient::new(&config)?);

    let plm = match &config.seed_file {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await.map_err(|e| {
                AgentError::config(ENV_SEED_FILE, format!("{}: {}", path.display(), e))
            })?;
            tracing::info!(seed_file = %path.display(), "Seeding in-memory PLM backend");
            InMemoryPlm::from_json(&json)?
        }
        None => InMemoryPlm::new(),
    };
    let plm = Arc::new(plm);

    let agent = ReverseAgent::new(hub, plm.clone(), plm, &config);
    let service = HybridAgentService::new(agent);
    service.start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    } else {
        tracing::info!("Shutdown signal received");
    }

    if let Some(run) = service.stop() {
        if let Err(e) = run.await {
            tracing::error!(error = %e, "Reverse agent task failed");
        }
    }
    Ok(())
}
