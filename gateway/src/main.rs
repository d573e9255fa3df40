//! Paymock Gateway
//!
//! Mock disbursement API for exercising webhook-driven payout flows.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use paymock_gateway::config::load_dotenv;
use paymock_gateway::http::serve;
use paymock_gateway::logging::init_tracing;
use paymock_gateway::{DisbursementService, GatewayConfig, HttpCallbackClient};
use paymock_scenario::{load_optional, OutcomeEngine};

/// Paymock Gateway CLI
#[derive(Parser, Debug)]
#[command(name = "paymock-gateway")]
#[command(about = "Mock disbursement gateway with scripted outcomes")]
struct Args {
    /// Dotenv file loaded before reading the environment
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Scenario file (overrides SCENARIO_FILE)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Report random outcomes (overrides RANDOM_STATUS)
    #[arg(long)]
    random_status: bool,

    /// Random seed for reproducibility (overrides RANDOM_SEED)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = load_dotenv(&args.env_file);

    let mut config = GatewayConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.scenario.is_some() {
        config.scenario_file = args.scenario;
    }
    if args.random_status {
        config.random_status = true;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }

    init_tracing(&config);
    info!(env_file = %args.env_file, loaded, "Starting Paymock Gateway");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let scenario = load_optional(config.scenario_file.as_deref());
    let engine = Arc::new(OutcomeEngine::with_seed(
        scenario,
        config.random_status,
        config.random_seed,
    ));

    if config.callback.url.is_empty() {
        info!("CALLBACK_URL is not set, webhooks will not be delivered");
    }
    let callbacks = Arc::new(HttpCallbackClient::from_config(&config.callback));

    let service = Arc::new(DisbursementService::new(
        engine,
        callbacks,
        config.user_id.clone(),
    ));

    serve(&config, service).await?;

    Ok(())
}
