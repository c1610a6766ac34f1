//! CLI argument parsing

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stlink-tools")]
#[command(author, version, about = "Upload firmware through ST-Link probes", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format of `show-devices`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable
    Text,
    /// JSON array
    Json,
}

/// Flashing tool selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// OpenOCD if available, PyOCD otherwise
    Auto,
    /// Open On-Chip Debugger
    Openocd,
    /// pyOCD
    Pyocd,
}

/// Options of `upload-app`
#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Application elf file or folder with the elf file
    #[arg(long)]
    pub elf_file: Option<PathBuf>,

    /// Backend to upload the program with
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,

    /// ST-Link hla serial, to select one of several attached probes
    #[arg(long)]
    pub hla_serial: Option<String>,

    /// OpenOCD executable path
    #[arg(long)]
    pub openocd_path: Option<PathBuf>,

    /// OpenOCD configuration file or folder to search. Found automatically
    /// in the project directory if not set
    #[arg(long)]
    pub openocd_config: Option<PathBuf>,

    /// Directory names to skip while searching the OpenOCD configuration
    /// (comma-separated or repeated, e.g. TESTS,mbed-os)
    #[arg(long, value_delimiter = ',')]
    pub exclude_dir: Vec<String>,

    /// PyOCD executable path
    #[arg(long)]
    pub pyocd_path: Option<PathBuf>,

    /// PyOCD target. See `pyocd list --targets`
    #[arg(long)]
    pub pyocd_target: Option<String>,

    /// PyOCD configuration file
    #[arg(long)]
    pub pyocd_config: Option<PathBuf>,

    /// PyOCD script file
    #[arg(long)]
    pub pyocd_script: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show attached ST-Link probes
    ShowDevices {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Print USB ids as 0x-prefixed hex strings in JSON output
        #[arg(long)]
        hex_ids: bool,
    },

    /// Upload compiled application
    ///
    /// The elf file is taken from --elf-file if it is a file, searched in it
    /// if it is a folder, and otherwise searched in the project's build
    /// directories (or the project directory when it has none). The OpenOCD
    /// configuration is resolved the same way from --openocd-config and the
    /// project directory. Every search must find exactly one file.
    UploadApp(UploadArgs),
}
