use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "uppernft", about = "Bike registry auth and wallet-credential node")]
pub struct Cli {
    /// Path to the TOML config file (created with defaults if missing)
    #[arg(short, long, default_value = "uppernft.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the RPC server (default when no subcommand is given)
    Serve {
        /// Override the configured RPC port
        #[arg(long)]
        rpc_port: Option<u16>,
    },
}
