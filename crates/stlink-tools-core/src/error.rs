//! Error types for stlink-tools-core
//!
//! Every failure is terminal for the current invocation. Messages carry the
//! candidate paths or probes involved so the user can fix the input without
//! re-running in verbose mode.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate matched a search, or an explicit path does not exist
    #[error("No {what} found in:\n{}", format_paths(.searched))]
    NotFound {
        /// Human readable description of the searched item
        what: String,
        /// Directories or paths that were inspected
        searched: Vec<PathBuf>,
    },

    /// More than one candidate matched where exactly one was required
    #[error("Multiple {what} found:\n{}", format_paths(.matches))]
    Ambiguous {
        /// Human readable description of the searched item
        what: String,
        /// Every match, in discovery order
        matches: Vec<PathBuf>,
    },

    /// No debug probe is attached
    #[error("Cannot find any ST-Link device to {operation}")]
    NoDevice {
        /// The operation that needed a probe
        operation: String,
    },

    /// Requested serial is absent or duplicated, or selection is ambiguous
    #[error("{message}\nAvailable devices:\n{}", .probes.join("\n"))]
    DeviceMismatch {
        /// What went wrong
        message: String,
        /// One line per attached probe (name and serial)
        probes: Vec<String>,
    },

    /// The requested flashing tool, or any flashing tool, cannot be located
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The flashing tool ran and failed, or could not be run at all
    #[error("{backend} has failed{}: {message}", code_suffix(.code))]
    BackendFailure {
        /// Backend display name
        backend: &'static str,
        /// Process exit code, if the process exited normally
        code: Option<i32>,
        /// Failure description
        message: String,
    },

    /// Malformed input or missing required option
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem error while inspecting a path
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// USB enumeration failed
    #[error("USB enumeration failed: {0}")]
    Usb(String),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

fn code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with code {}", c)).unwrap_or_default()
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_lists_every_path() {
        let err = Error::Ambiguous {
            what: "elf files".into(),
            matches: vec![PathBuf::from("/p/build/a.elf"), PathBuf::from("/p/build/b.elf")],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Multiple elf files found:"));
        assert!(msg.contains("/p/build/a.elf"));
        assert!(msg.contains("/p/build/b.elf"));
    }

    #[test]
    fn test_backend_failure_code() {
        let err = Error::BackendFailure {
            backend: "OpenOCD",
            code: Some(1),
            message: "see logs".into(),
        };
        assert_eq!(err.to_string(), "OpenOCD has failed with code 1: see logs");

        let err = Error::BackendFailure {
            backend: "PyOCD",
            code: None,
            message: "terminated by signal".into(),
        };
        assert_eq!(err.to_string(), "PyOCD has failed: terminated by signal");
    }
}
