//! Firmware upload workflow
//!
//! Resolves the image and the probe, picks a backend, builds its command line
//! and runs it. Everything external is reached through the collaborators in
//! [`Environment`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::backend::openocd::{self, encode_hla_serial, OpenOcdCommand, OpenOcdVersion};
use crate::backend::pyocd::PyOcdCommand;
use crate::backend::{
    locate_backend, select_backend, Backend, BackendAvailability, BackendRequest, Invocation,
};
use crate::device::{list_connected_probes, select_probe, ConnectedProbe, UsbBus};
use crate::error::{Error, Result};
use crate::exec::{format_command, ExecutableLocator, ProcessOutput, ProcessRunner};
use crate::search::{absolute, resolve_elf, resolve_openocd_config};

/// OpenOCD specific options
#[derive(Debug, Clone, Default)]
pub struct OpenOcdOptions {
    /// Explicit executable path
    pub path: Option<PathBuf>,
    /// Explicit configuration file, or directory to search
    pub config: Option<PathBuf>,
    /// Directory names skipped while searching for the configuration
    pub exclude_dirs: Vec<String>,
}

/// PyOCD specific options
#[derive(Debug, Clone, Default)]
pub struct PyOcdOptions {
    /// Explicit executable path
    pub path: Option<PathBuf>,
    /// Target type
    pub target: Option<String>,
    /// Configuration file
    pub config: Option<PathBuf>,
    /// User script
    pub script: Option<PathBuf>,
}

/// Everything `upload-app` needs to know
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Project root
    pub project_dir: PathBuf,
    /// Explicit image file, or directory to search
    pub elf_file: Option<PathBuf>,
    /// Requested backend
    pub backend: BackendRequest,
    /// Serial of the probe to use
    pub hla_serial: Option<String>,
    /// Pass verbose flags to the backend
    pub verbose: bool,
    /// OpenOCD options
    pub openocd: OpenOcdOptions,
    /// PyOCD options
    pub pyocd: PyOcdOptions,
}

/// External collaborators used during an upload
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    /// USB device enumeration
    pub usb: &'a dyn UsbBus,
    /// Process execution
    pub runner: &'a dyn ProcessRunner,
    /// Executable search
    pub locator: &'a dyn ExecutableLocator,
}

/// Upload the project's firmware to the selected probe
pub fn upload_app(options: &UploadOptions, env: Environment<'_>) -> Result<()> {
    let project_dir = absolute(&options.project_dir)?;
    if !project_dir.is_dir() {
        return Err(Error::NotFound {
            what: "project directory".into(),
            searched: vec![project_dir],
        });
    }

    log::info!("Determine *.elf file location");
    let elf_file = resolve_elf(&project_dir, options.elf_file.as_deref())?;
    log::info!("Target elf file to upload: {}", elf_file.display());

    let probes = list_connected_probes(env.usb)?;
    let probe = select_probe(
        probes,
        options.hla_serial.as_deref(),
        "upload the application",
    )?;
    log::info!("Target ST-Link device: {}", probe);

    let openocd_path =
        locate_backend(Backend::OpenOcd, options.openocd.path.as_deref(), env.locator)?;
    let pyocd_path = locate_backend(Backend::PyOcd, options.pyocd.path.as_deref(), env.locator)?;
    let backend = select_backend(
        options.backend,
        BackendAvailability {
            openocd: openocd_path.is_some(),
            pyocd: pyocd_path.is_some(),
            openocd_config_given: options.openocd.config.is_some(),
            pyocd_target_given: options.pyocd.target.is_some(),
        },
    )?;
    log::info!("Upload backend: \"{}\"", backend);

    // select_backend only returns a backend whose executable was found
    let program = match backend {
        Backend::OpenOcd => openocd_path,
        Backend::PyOcd => pyocd_path,
    }
    .ok_or_else(|| Error::BackendUnavailable(backend.executable_name().to_string()))?;

    match backend {
        Backend::OpenOcd => {
            upload_with_openocd(options, env, &project_dir, &elf_file, &probe, program)?
        }
        Backend::PyOcd => {
            upload_with_pyocd(options, env, &project_dir, &elf_file, &probe, program)?
        }
    }

    log::info!("Program has been uploaded successfully");
    Ok(())
}

fn probe_serial(probe: &ConnectedProbe) -> Result<&str> {
    probe.serial().ok_or_else(|| {
        Error::InvalidInput(format!("{} doesn't report a serial number", probe.name()))
    })
}

fn upload_with_openocd(
    options: &UploadOptions,
    env: Environment<'_>,
    project_dir: &Path,
    elf_file: &Path,
    probe: &ConnectedProbe,
    program: PathBuf,
) -> Result<()> {
    let config = resolve_openocd_config(
        project_dir,
        options.openocd.config.as_deref(),
        &options.openocd.exclude_dirs,
    )?;
    log::info!("OpenOCD configuration file: {}", config.display());

    let version = OpenOcdVersion::detect(env.runner, &program, project_dir)?;
    let mut command = OpenOcdCommand {
        program,
        config_files: vec![config.display().to_string()],
        hla_serial: encode_hla_serial(probe_serial(probe)?, version)?,
        elf_file: elf_file.to_path_buf(),
        verbose: options.verbose,
    };

    let output = run_backend(env.runner, &command.invocation(), project_dir)?;
    if output.success() {
        return Ok(());
    }
    if !openocd::is_init_failure(&output) {
        return Err(exit_failure(Backend::OpenOcd, &output));
    }

    let Some(interface) = probe.family().version.openocd_interface() else {
        log::warn!("No OpenOCD interface script is known for {}", probe.name());
        return Err(exit_failure(Backend::OpenOcd, &output));
    };
    log::warn!(
        "OpenOCD init failed. Retrying with interface {} for {}",
        interface,
        probe.name()
    );
    command.config_files.push(interface.to_string());

    let output = run_backend(env.runner, &command.invocation(), project_dir)?;
    if output.success() {
        Ok(())
    } else {
        Err(exit_failure(Backend::OpenOcd, &output))
    }
}

fn upload_with_pyocd(
    options: &UploadOptions,
    env: Environment<'_>,
    project_dir: &Path,
    elf_file: &Path,
    probe: &ConnectedProbe,
    program: PathBuf,
) -> Result<()> {
    let command = PyOcdCommand {
        program,
        target: options.pyocd.target.clone(),
        uid: probe_serial(probe)?.to_string(),
        config: options.pyocd.config.as_deref().map(absolute).transpose()?,
        script: options.pyocd.script.as_deref().map(absolute).transpose()?,
        elf_file: elf_file.to_path_buf(),
        verbose: options.verbose,
    };
    let invocation = command.invocation()?;

    let output = run_backend(env.runner, &invocation, project_dir)?;
    if output.success() {
        Ok(())
    } else {
        Err(exit_failure(Backend::PyOcd, &output))
    }
}

fn run_backend(
    runner: &dyn ProcessRunner,
    invocation: &Invocation,
    cwd: &Path,
) -> Result<ProcessOutput> {
    let backend = invocation.backend;
    log::info!(
        "Run command: {}",
        format_command(&invocation.program, &invocation.args)
    );

    let started = Instant::now();
    let output = runner
        .run(&invocation.program, &invocation.args, cwd)
        .map_err(|e| Error::BackendFailure {
            backend: backend.display_name(),
            code: None,
            message: format!("cannot run {}: {}", invocation.program.display(), e),
        })?;
    log::info!(
        "Command execution time: {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    log_output(backend, &output);
    match output.status {
        Some(code) => log::info!("{} return code: {}", backend.display_name(), code),
        None => log::warn!("{} was terminated by a signal", backend.display_name()),
    }
    Ok(output)
}

fn log_output(backend: Backend, output: &ProcessOutput) {
    log::info!("==================== start of {} logs ====================", backend);
    match backend {
        Backend::OpenOcd => {
            for (level, message) in openocd::parse_log(&output.stderr) {
                log::log!(level, "{}", message);
            }
        }
        Backend::PyOcd => {
            let stderr = output.stderr.trim();
            if !stderr.is_empty() {
                log::info!("{}", stderr);
            }
        }
    }
    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        log::info!("{}", stdout);
    }
    log::info!("===================== end of {} logs =====================", backend);
}

fn exit_failure(backend: Backend, output: &ProcessOutput) -> Error {
    Error::BackendFailure {
        backend: backend.display_name(),
        code: output.status,
        message: "see logs above".into(),
    }
}
