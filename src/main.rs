use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use uppernft::auth::AuthService;
use uppernft::cli::{Cli, Commands};
use uppernft::config::UppernftConfig;
use uppernft::relayer::{HttpRelayer, NoopRelayer, Relayer};
use uppernft::rpc::RpcServer;
use uppernft::store::Store;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = UppernftConfig::load_or_default(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.node.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rpc_port = match cli.command {
        Some(Commands::Serve { rpc_port }) => rpc_port.unwrap_or(config.node.rpc_port),
        None => config.node.rpc_port,
    };

    let store = match Store::open(&config.node.db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let auth = Arc::new(AuthService::new(store, config.auth));

    let relayer: Arc<dyn Relayer> = if config.relayer.url.is_empty() {
        tracing::warn!("no relayer configured; minting runs in no-op mode");
        Arc::new(NoopRelayer)
    } else {
        match HttpRelayer::new(
            config.relayer.url.clone(),
            config.relayer.api_key.clone(),
            config.relayer.tx_base_url.clone(),
        ) {
            Ok(relayer) => Arc::new(relayer),
            Err(e) => {
                tracing::error!("failed to build relayer client: {}", e);
                std::process::exit(1);
            }
        }
    };

    RpcServer::new(auth, relayer, rpc_port).start().await;
}
