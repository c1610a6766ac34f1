//! stlink-tools - Upload firmware through ST-Link probes
//!
//! Finds the application's ELF image and OpenOCD configuration in a project
//! tree, picks the attached ST-Link probe and hands everything to OpenOCD or
//! PyOCD.
//!
//! # Architecture
//!
//! - `stlink-tools-core` holds the file resolution, probe selection and
//!   backend command building
//! - `stlink-tools-usb` enumerates USB devices with `nusb`
//! - this binary parses arguments, sets up logging and maps every error to
//!   exit code 1

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Commands};
use stlink_tools_usb::NusbBus;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set log level based on verbosity, RUST_LOG still takes precedence
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::ShowDevices { format, hex_ids } => {
            commands::show_devices(&NusbBus, format, hex_ids)
        }
        Commands::UploadApp(args) => commands::upload_app(args, cli.verbose > 0),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
