//! PyOCD command line construction

use std::path::PathBuf;

use super::{Backend, Invocation};
use crate::error::{Error, Result};

/// Arguments for one `pyocd flash` run
#[derive(Debug, Clone)]
pub struct PyOcdCommand {
    /// PyOCD executable
    pub program: PathBuf,
    /// Target type, e.g. `stm32f411re`
    pub target: Option<String>,
    /// Probe unique id (canonical serial)
    pub uid: String,
    /// Optional pyocd configuration file
    pub config: Option<PathBuf>,
    /// Optional user script
    pub script: Option<PathBuf>,
    /// Image to program
    pub elf_file: PathBuf,
    /// Enable PyOCD verbose output
    pub verbose: bool,
}

impl PyOcdCommand {
    /// Build the argument list
    ///
    /// PyOCD cannot guess the target for ST-Link probes, so a target is
    /// required.
    pub fn invocation(&self) -> Result<Invocation> {
        let target = self.target.as_deref().ok_or_else(|| {
            Error::InvalidInput(
                concat!(
                    "PyOCD target isn't specified. ",
                    "Please specify '--pyocd-target' option to use pyocd backend"
                )
                .into(),
            )
        })?;

        let mut args = vec!["flash".to_string()];
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args.push("--trust-crc".to_string());
        args.extend(["--target".to_string(), target.to_string()]);
        args.extend(["--uid".to_string(), self.uid.clone()]);
        if let Some(config) = &self.config {
            args.extend(["--config".to_string(), config.display().to_string()]);
        }
        if let Some(script) = &self.script {
            args.extend(["--script".to_string(), script.display().to_string()]);
        }
        args.extend(["--format".to_string(), "elf".to_string()]);
        args.push(self.elf_file.display().to_string());

        Ok(Invocation {
            backend: Backend::PyOcd,
            program: self.program.clone(),
            args,
        })
    }
}
