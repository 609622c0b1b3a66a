//! Cadence CLI - inspect audio devices, manage settings and run the audio system.

mod commands;
mod monitor;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(author, version, about = "Cadence real-time audio I/O", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List backends, list devices and probe device availability
    Devices(commands::devices::DevicesArgs),

    /// Show or initialize the audio settings file
    Config(commands::config::ConfigArgs),

    /// Run the audio system with a monitor graph until Ctrl+C
    Run(commands::run::RunArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Run(args) => commands::run::run(args),
    }
}
