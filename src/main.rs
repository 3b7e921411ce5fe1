//! Mirrorwave CLI
//!
//! Command-line interface for the mirrorwave editor.

use clap::Parser;
use env_logger::Env;
use log::info;

use mirrorwave::cli::commands::{self, ExportArgs};
use mirrorwave::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    info!("Mirrorwave v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Mirrorwave v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &mirrorwave::config::SessionConfig, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { input } => commands::info(config, &input),
        Commands::Reverse {
            input,
            output,
            bit_depth,
        } => commands::reverse_file(&input, &output, bit_depth.into()),
        Commands::Export {
            input,
            track,
            start,
            end,
            bitrate,
            format,
            full_track,
            only,
            out_dir,
            manifest,
        } => commands::export_windows(
            config,
            &ExportArgs {
                input,
                track: track.into(),
                start,
                end,
                bitrate_kbps: bitrate,
                format: format.into(),
                full_track,
                only: only.map(Into::into),
                out_dir,
                manifest,
            },
        ),
    }
}
