//! Subcommand implementations.

use parley_a2a::{Artifact, artifacts_text};
use parley_agent::{
    AgentError, AgentRegistry, ConfigError, OrchestrationPlan, Orchestrator, ResilienceConfig,
    ResilienceConfigBuilder, ResilientClient, Step, Task,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable holding the secret sent to peers that declare a
/// security scheme
const API_KEY_VAR: &str = "PARLEY_API_KEY";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Invalid --data JSON: {0}")]
    InvalidData(serde_json::Error),

    #[error("Failed to render output: {0}")]
    Output(serde_json::Error),
}

impl CliError {
    /// Stable code for logs
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CONFIG_ERROR",
            CliError::Agent(e) => e.root_cause().error_code(),
            CliError::InvalidData(_) => "INVALID_DATA",
            CliError::Output(_) => "OUTPUT_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub async fn run_card(url: &str, format: OutputFormat) -> Result<(), CliError> {
    let config = load_config()?;
    let client = connect(url, &config).await?;
    let card = client.get_card(false).await?;

    match format {
        OutputFormat::Json => print_json(&*card)?,
        OutputFormat::Text => {
            println!("{} ({})", card.name, card.id);
            if let Some(description) = &card.description {
                println!("  {description}");
            }
            println!("  endpoint: {}", card.endpoint);
            println!("  version:  {}", card.version);
            for skill in &card.skills {
                println!("  - {}: {}", skill.id, skill.name);
            }
        }
    }
    Ok(())
}

pub async fn run_send(
    url: &str,
    text: &str,
    data: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let data = data
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(CliError::InvalidData)?;

    let config = load_config()?;
    let client = connect(url, &config).await?;
    let artifacts = client.send_message(text, data).await?;

    print_artifacts(&artifacts, format)
}

pub async fn run_skill(
    skill: &str,
    text: &str,
    peers: &[String],
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = load_config()?;

    let mut registry = AgentRegistry::new();
    for url in peers {
        let client = connect(url, &config).await?;
        registry.register(client).await?;
    }
    info!(peers = registry.len(), skills = ?registry.skills(), "Peers registered");

    let orchestrator = Orchestrator::new(Arc::new(registry));
    let plan = OrchestrationPlan::Sequential(vec![Step::skill(skill)]);
    let outcome = orchestrator
        .execute_until(&plan, &Task::new(text), shutdown_signal())
        .await?;

    match format {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Text => {
            if let Some(step) = outcome.steps.first() {
                println!("[{}]", step.agent_id);
            }
            print_artifacts(&outcome.artifacts, format)
        }
    }
}

fn load_config() -> Result<ResilienceConfig, CliError> {
    Ok(ResilienceConfigBuilder::from_env()?.build()?)
}

/// Connect over HTTP, authenticating with `PARLEY_API_KEY` when it is set
async fn connect(url: &str, config: &ResilienceConfig) -> Result<ResilientClient, CliError> {
    let client = match std::env::var(API_KEY_VAR) {
        Ok(secret) if !secret.is_empty() => {
            debug!(endpoint = %url, "Using credentials from {API_KEY_VAR}");
            ResilientClient::connect_with_secret(url, &secret, config).await?
        }
        _ => ResilientClient::connect(url, config)?,
    };
    Ok(client)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn print_artifacts(artifacts: &[Artifact], format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => print_json(&artifacts),
        OutputFormat::Text => {
            println!("{}", artifacts_text(artifacts));
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(CliError::Output)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_rejects_malformed_data_before_connecting() {
        let err = run_send("https://a.example.com", "hi", Some("{not json"), OutputFormat::Text)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_DATA");
    }

    #[test]
    fn test_agent_error_code_uses_root_cause() {
        let err = CliError::from(AgentError::step_failed(
            "sequential",
            0,
            "skill:legal",
            AgentError::routing("none"),
        ));
        assert_eq!(err.code(), "ROUTING_ERROR");
    }
}
