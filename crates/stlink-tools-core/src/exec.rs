//! External process collaborators
//!
//! Flashing is delegated to OpenOCD or PyOCD. Running them and finding them
//! on `PATH` goes through [`ProcessRunner`] and [`ExecutableLocator`] so the
//! upload logic can be exercised without the tools installed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub status: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs to completion
pub trait ProcessRunner {
    /// Run `program` with `args` in `cwd` and wait for it to exit
    fn run(&self, program: &Path, args: &[String], cwd: &Path) -> io::Result<ProcessOutput>;
}

/// Resolves bare executable names to paths
pub trait ExecutableLocator {
    /// Find `name` using the environment's search path
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// [`ProcessRunner`] backed by `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String], cwd: &Path) -> io::Result<ProcessOutput> {
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// [`ExecutableLocator`] searching `PATH`
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchPath;

impl ExecutableLocator for SearchPath {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c)
}

/// Render a command line for logging, quoting arguments the way a POSIX
/// shell would need them
pub fn format_command(program: &Path, args: &[String]) -> String {
    std::iter::once(program.to_string_lossy().into_owned())
        .chain(args.iter().cloned())
        .map(|arg| {
            if !arg.is_empty() && arg.chars().all(is_shell_safe) {
                arg
            } else {
                format!("'{}'", arg.replace('\'', r#"'"'"'"#))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
