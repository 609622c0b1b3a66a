//! Audio device management command.

use cadence_config::BACKEND_DEFAULT;
use cadence_io::{available_backends, list_devices, probe_device};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List the devices of a backend
    List {
        /// Backend to query ("default", "dummy", or a host such as "alsa" or "jack")
        #[arg(short, long, default_value = BACKEND_DEFAULT)]
        backend: String,
    },

    /// Check whether a device is available without opening a stream
    Probe {
        /// Backend to query
        #[arg(short, long)]
        backend: String,

        /// Device index, exact name or partial name (default output if omitted)
        #[arg(short, long)]
        device: Option<String>,
    },

    /// List the backends usable on this machine
    Backends,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List {
        backend: BACKEND_DEFAULT.to_string(),
    }) {
        DevicesCommand::List { backend } => {
            let devices = list_devices(&backend)?;

            if devices.is_empty() {
                println!("No audio devices found for backend '{backend}'.");
                return Ok(());
            }

            println!("Audio Devices ({backend})");
            println!("=======================\n");

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            if !inputs.is_empty() {
                println!("Input Devices:");
                for (idx, device) in inputs.iter().enumerate() {
                    let also_output = if device.is_output { " (also output)" } else { "" };
                    println!(
                        "  [{}] {} ({} Hz){}",
                        idx, device.name, device.default_sample_rate, also_output
                    );
                }
                println!();
            }

            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            if !outputs.is_empty() {
                println!("Output Devices:");
                for (idx, device) in outputs.iter().enumerate() {
                    let also_input = if device.is_input { " (also input)" } else { "" };
                    println!(
                        "  [{}] {} ({} Hz){}",
                        idx, device.name, device.default_sample_rate, also_input
                    );
                }
                println!();
            }

            println!("Total: {} input(s), {} output(s)", inputs.len(), outputs.len());
            println!();
            println!("Tip: select a device by index or partial name:");
            println!("  cadence run --backend {backend} --device 0");
            println!("  cadence run --backend {backend} --device \"USB\"");
        }

        DevicesCommand::Probe { backend, device } => {
            let label = device.as_deref().unwrap_or("default output");
            if probe_device(&backend, device.as_deref())? {
                println!("{backend}: {label} is available");
            } else {
                anyhow::bail!("{backend}: {label} is not available");
            }
        }

        DevicesCommand::Backends => {
            println!("Available Backends");
            println!("==================\n");
            for backend in available_backends() {
                println!("  {backend}");
            }
            println!();
            println!("  ({BACKEND_DEFAULT} selects the platform's default host)");
        }
    }

    Ok(())
}
