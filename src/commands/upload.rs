//! upload-app command implementation

use std::path::PathBuf;

use stlink_tools_core::backend::BackendRequest;
use stlink_tools_core::exec::{SearchPath, SystemRunner};
use stlink_tools_core::upload::{self, Environment, OpenOcdOptions, PyOcdOptions, UploadOptions};
use stlink_tools_usb::NusbBus;

use crate::cli::{BackendArg, UploadArgs};

impl From<BackendArg> for BackendRequest {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendRequest::Auto,
            BackendArg::Openocd => BackendRequest::OpenOcd,
            BackendArg::Pyocd => BackendRequest::PyOcd,
        }
    }
}

fn build_options(args: UploadArgs, verbose: bool, cwd: PathBuf) -> UploadOptions {
    UploadOptions {
        project_dir: args.project_dir.unwrap_or(cwd),
        elf_file: args.elf_file,
        backend: args.backend.into(),
        hla_serial: args.hla_serial,
        verbose,
        openocd: OpenOcdOptions {
            path: args.openocd_path,
            config: args.openocd_config,
            exclude_dirs: args.exclude_dir,
        },
        pyocd: PyOcdOptions {
            path: args.pyocd_path,
            target: args.pyocd_target,
            config: args.pyocd_config,
            script: args.pyocd_script,
        },
    }
}

/// Upload the application with the real USB bus and tools
pub fn upload_app(args: UploadArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(args, verbose, std::env::current_dir()?);
    let env = Environment {
        usb: &NusbBus,
        runner: &SystemRunner,
        locator: &SearchPath,
    };
    upload::upload_app(&options, env)?;
    Ok(())
}
