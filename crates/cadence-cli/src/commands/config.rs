//! Audio settings command.

use super::common::{load_settings, resolve_settings_path};
use anyhow::Context;
use cadence_config::AudioSettings;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Settings file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as TOML
    Show,

    /// Write a settings file with every default spelled out
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the settings file path
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            let (settings, path) = load_settings(args.config.as_deref())?;
            let source = if path.exists() { "file" } else { "defaults, no file" };
            println!("# {} ({source})", path.display());
            print!("{}", settings.to_toml_string()?);
        }

        ConfigCommand::Init { force } => {
            let path = resolve_settings_path(args.config.as_deref());
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            AudioSettings::default()
                .save(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default settings to {}", path.display());
        }

        ConfigCommand::Path => {
            println!("{}", resolve_settings_path(args.config.as_deref()).display());
        }
    }

    Ok(())
}
