//! Flashing backends
//!
//! A backend is an external tool that performs the actual programming. This
//! module decides which one to use and builds its command line; running it is
//! left to [`crate::exec::ProcessRunner`].

pub mod openocd;
pub mod pyocd;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::exec::ExecutableLocator;
use crate::search::absolute;

/// External flashing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Open On-Chip Debugger
    OpenOcd,
    /// pyOCD
    PyOcd,
}

impl Backend {
    /// Executable name looked up on `PATH`
    pub fn executable_name(self) -> &'static str {
        match self {
            Backend::OpenOcd => "openocd",
            Backend::PyOcd => "pyocd",
        }
    }

    /// Name used in log and error messages
    pub fn display_name(self) -> &'static str {
        match self {
            Backend::OpenOcd => "OpenOCD",
            Backend::PyOcd => "PyOCD",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable_name())
    }
}

/// Backend requested by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendRequest {
    /// Pick whichever tool is available
    #[default]
    Auto,
    /// Always use OpenOCD
    OpenOcd,
    /// Always use PyOCD
    PyOcd,
}

impl FromStr for BackendRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendRequest::Auto),
            "openocd" => Ok(BackendRequest::OpenOcd),
            "pyocd" => Ok(BackendRequest::PyOcd),
            other => Err(Error::InvalidInput(format!(
                "unknown backend \"{}\" (expected auto, openocd or pyocd)",
                other
            ))),
        }
    }
}

/// A fully resolved external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Tool being run
    pub backend: Backend,
    /// Executable path
    pub program: PathBuf,
    /// Arguments, not including the program
    pub args: Vec<String>,
}

/// Resolve a backend executable
///
/// An explicit path must exist and is made absolute, since backends run from
/// the project directory. Otherwise the locator searches for the backend's
/// executable name; `Ok(None)` means it is not installed.
pub fn locate_backend(
    backend: Backend,
    explicit: Option<&Path>,
    locator: &dyn ExecutableLocator,
) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(absolute(path)?)),
        Some(path) => Err(Error::BackendUnavailable(format!(
            "given {} path \"{}\" does not exist",
            backend.executable_name(),
            path.display()
        ))),
        None => {
            let found = locator.locate(backend.executable_name());
            match &found {
                Some(path) => log::debug!("Found {} at {}", backend, path.display()),
                None => log::debug!("{} not found in PATH", backend),
            }
            Ok(found)
        }
    }
}

/// Inputs to [`select_backend`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendAvailability {
    /// OpenOCD executable was found
    pub openocd: bool,
    /// PyOCD executable was found
    pub pyocd: bool,
    /// User gave an OpenOCD configuration explicitly
    pub openocd_config_given: bool,
    /// User gave a PyOCD target explicitly
    pub pyocd_target_given: bool,
}

/// Choose the backend to run
pub fn select_backend(request: BackendRequest, available: BackendAvailability) -> Result<Backend> {
    let require = |backend: Backend, found: bool| {
        if found {
            Ok(backend)
        } else {
            Err(Error::BackendUnavailable(format!(
                "{} isn't found in the PATH or specified explicitly",
                backend.executable_name()
            )))
        }
    };

    match request {
        BackendRequest::OpenOcd => require(Backend::OpenOcd, available.openocd),
        BackendRequest::PyOcd => require(Backend::PyOcd, available.pyocd),
        BackendRequest::Auto => {
            let backend = match (available.openocd, available.pyocd) {
                (true, false) => Backend::OpenOcd,
                (false, true) => Backend::PyOcd,
                (false, false) => {
                    return Err(Error::BackendUnavailable(
                        "pyocd and openocd aren't found in the PATH or specified explicitly"
                            .into(),
                    ))
                }
                (true, true) => {
                    if available.pyocd_target_given && !available.openocd_config_given {
                        Backend::PyOcd
                    } else {
                        Backend::OpenOcd
                    }
                }
            };
            log::info!("Select \"{}\" for program uploading automatically", backend);
            Ok(backend)
        }
    }
}
