//! OpenOCD command line construction
//!
//! OpenOCD before 0.11 mis-parses `hla_serial` values containing bytes above
//! 0x7F, so for those versions the serial is passed as `\xHH` escapes with
//! such bytes replaced by `?`.

use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Backend, Invocation};
use crate::device::SERIAL_HEX_LEN;
use crate::error::{Error, Result};
use crate::exec::{ProcessOutput, ProcessRunner};

static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bv?(\d+)\.(\d+)\.(\d+)\b").unwrap());
static INIT_FAILED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)init failed").unwrap());
static LOG_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\w{0,8})\s{0,6}:").unwrap());

/// Placeholder for serial bytes old OpenOCD versions cannot handle
const NON_ASCII_REPLACEMENT: u8 = b'?';

/// Installed OpenOCD version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OpenOcdVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl OpenOcdVersion {
    /// First version that accepts the plain hex serial
    pub const PLAIN_HLA_SERIAL: OpenOcdVersion = OpenOcdVersion::new(0, 11, 0);

    /// Create a version
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the first `x.y.z` version from `openocd --version` output
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION.captures(text)?;
        let part = |i: usize| caps[i].parse::<u32>().ok();
        Some(Self::new(part(1)?, part(2)?, part(3)?))
    }

    /// Run `openocd --version` and parse its output
    pub fn detect(runner: &dyn ProcessRunner, program: &Path, cwd: &Path) -> Result<Self> {
        let output = runner
            .run(program, &["--version".to_string()], cwd)
            .map_err(|e| Error::BackendFailure {
                backend: Backend::OpenOcd.display_name(),
                code: None,
                message: format!("cannot run {}: {}", program.display(), e),
            })?;
        // OpenOCD prints its banner on stderr
        let text = format!("{}\n{}", output.stdout, output.stderr);
        let version = Self::parse(&text).ok_or_else(|| Error::BackendFailure {
            backend: Backend::OpenOcd.display_name(),
            code: output.status,
            message: format!("cannot parse OpenOCD version from:\n{}", text.trim()),
        })?;
        log::debug!("OpenOCD version: {}", version);
        Ok(version)
    }
}

impl fmt::Display for OpenOcdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Encode a canonical serial for OpenOCD's `hla_serial` command
pub fn encode_hla_serial(serial: &str, version: OpenOcdVersion) -> Result<String> {
    if serial.len() != SERIAL_HEX_LEN || !serial.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidInput(format!(
            "invalid hla serial \"{}\": expected {} hex characters",
            serial, SERIAL_HEX_LEN
        )));
    }

    if version >= OpenOcdVersion::PLAIN_HLA_SERIAL {
        return Ok(serial.to_string());
    }

    let mut encoded = String::with_capacity(SERIAL_HEX_LEN * 2);
    for pair in serial.as_bytes().chunks(2) {
        // Checked above: every pair is two ASCII hex digits
        let pair = std::str::from_utf8(pair).unwrap_or_default();
        let mut byte = u8::from_str_radix(pair, 16).unwrap_or(NON_ASCII_REPLACEMENT);
        if byte > 0x7F {
            byte = NON_ASCII_REPLACEMENT;
        }
        encoded.push_str(&format!("\\x{:02X}", byte));
    }
    Ok(encoded)
}

/// Arguments for one OpenOCD programming run
#[derive(Debug, Clone)]
pub struct OpenOcdCommand {
    /// OpenOCD executable
    pub program: PathBuf,
    /// Configuration scripts, passed with `--file` in order
    pub config_files: Vec<String>,
    /// Value for `hla_serial`, already encoded
    pub hla_serial: String,
    /// Image to program
    pub elf_file: PathBuf,
    /// Enable OpenOCD debug output
    pub verbose: bool,
}

impl OpenOcdCommand {
    /// Build the argument list
    pub fn invocation(&self) -> Invocation {
        let mut args = Vec::new();
        if self.verbose {
            args.push("--debug".to_string());
        }
        for file in &self.config_files {
            args.push("--file".to_string());
            args.push(file.clone());
        }
        args.push("--command".to_string());
        args.push(format!("hla_serial \"{}\"", self.hla_serial));
        args.push("--command".to_string());
        args.push(format!(
            "program \"{}\" verify reset exit",
            self.elf_file.display()
        ));

        Invocation {
            backend: Backend::OpenOcd,
            program: self.program.clone(),
            args,
        }
    }
}

/// Whether a failed run reported an adapter initialisation failure
pub fn is_init_failure(output: &ProcessOutput) -> bool {
    !output.success() && INIT_FAILED.is_match(&output.stderr)
}

/// Split OpenOCD's stderr into messages with the log level of their
/// `Error:`/`Warn :`/`Info :`/`Debug:` prefix
pub fn parse_log(text: &str) -> Vec<(log::Level, String)> {
    let mut messages = Vec::new();
    let mut level = log::Level::Info;
    let mut start = 0;

    let mut push = |level: log::Level, chunk: &str| {
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            messages.push((level, chunk.to_string()));
        }
    };

    for caps in LOG_PREFIX.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push(level, &text[start..whole.start()]);
        start = whole.end();

        let name = name.as_str().to_ascii_lowercase();
        level = if name == "error" {
            log::Level::Error
        } else if name.starts_with("warn") {
            log::Level::Warn
        } else if name == "debug" {
            log::Level::Debug
        } else {
            log::Level::Info
        };
    }
    push(level, &text[start..]);

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIAL: &str = "34006A063141323910300243";

    #[test]
    fn test_parse_version() {
        let banner = "Open On-Chip Debugger 0.10.0+dev-01273-g2d3d8e8 (2020-06-11-16:54)\n\
                      Licensed under GNU GPL v2";
        assert_eq!(OpenOcdVersion::parse(banner), Some(OpenOcdVersion::new(0, 10, 0)));
        assert_eq!(
            OpenOcdVersion::parse("xPack OpenOCD x86_64 Open On-Chip Debugger 0.12.0+dev"),
            Some(OpenOcdVersion::new(0, 12, 0))
        );
        assert_eq!(OpenOcdVersion::parse("openocd v0.9.1"), Some(OpenOcdVersion::new(0, 9, 1)));
        assert_eq!(OpenOcdVersion::parse("no version here"), None);
    }

    #[test]
    fn test_version_order() {
        assert!(OpenOcdVersion::new(0, 9, 0) < OpenOcdVersion::PLAIN_HLA_SERIAL);
        assert!(OpenOcdVersion::new(0, 10, 99) < OpenOcdVersion::PLAIN_HLA_SERIAL);
        assert!(OpenOcdVersion::new(0, 11, 0) >= OpenOcdVersion::PLAIN_HLA_SERIAL);
        assert!(OpenOcdVersion::new(1, 0, 0) > OpenOcdVersion::PLAIN_HLA_SERIAL);
    }

    #[test]
    fn test_encode_old_openocd() {
        let encoded = encode_hla_serial(SERIAL, OpenOcdVersion::new(0, 9, 0)).unwrap();
        assert_eq!(
            encoded,
            r"\x34\x00\x6A\x06\x31\x41\x32\x39\x10\x30\x02\x43"
        );
    }

    #[test]
    fn test_encode_replaces_non_ascii() {
        let encoded =
            encode_hla_serial("066DFF545071494867133240", OpenOcdVersion::new(0, 10, 0)).unwrap();
        assert_eq!(
            encoded,
            r"\x06\x6D\x3F\x54\x50\x71\x49\x48\x67\x13\x32\x40"
        );
    }

    #[test]
    fn test_encode_new_openocd() {
        let encoded = encode_hla_serial(SERIAL, OpenOcdVersion::new(0, 12, 0)).unwrap();
        assert_eq!(encoded, SERIAL);
    }

    #[test]
    fn test_encode_rejects_bad_length() {
        assert!(matches!(
            encode_hla_serial("313233", OpenOcdVersion::new(0, 12, 0)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            encode_hla_serial("34006A06314132391030024G", OpenOcdVersion::new(0, 9, 0)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invocation() {
        let cmd = OpenOcdCommand {
            program: PathBuf::from("/usr/bin/openocd"),
            config_files: vec![
                "/p/openocd_stm.cfg".to_string(),
                "interface/stlink-v2-1.cfg".to_string(),
            ],
            hla_serial: SERIAL.to_string(),
            elf_file: PathBuf::from("/p/build/demo.elf"),
            verbose: true,
        };
        let inv = cmd.invocation();
        assert_eq!(inv.backend, Backend::OpenOcd);
        assert_eq!(
            inv.args,
            vec![
                "--debug",
                "--file",
                "/p/openocd_stm.cfg",
                "--file",
                "interface/stlink-v2-1.cfg",
                "--command",
                "hla_serial \"34006A063141323910300243\"",
                "--command",
                "program \"/p/build/demo.elf\" verify reset exit",
            ]
        );
    }

    #[test]
    fn test_init_failure_detection() {
        let failed = ProcessOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: "Error: open failed\nin procedure 'program'\nOpenOCD init failed".into(),
        };
        assert!(is_init_failure(&failed));

        let other = ProcessOutput {
            stderr: "Error: couldn't open demo.elf".into(),
            ..failed.clone()
        };
        assert!(!is_init_failure(&other));

        let ok = ProcessOutput {
            status: Some(0),
            ..failed
        };
        assert!(!is_init_failure(&ok));
    }

    #[test]
    fn test_parse_log() {
        let text = "Open On-Chip Debugger 0.12.0\n\
                    Info : clock speed 1800 kHz\n\
                    Warn : target not halted\n\
                    Error: open failed\n\
                    Debug: 12 command.c\n";
        let messages = parse_log(text);
        assert_eq!(
            messages,
            vec![
                (log::Level::Info, "Open On-Chip Debugger 0.12.0".to_string()),
                (log::Level::Info, "clock speed 1800 kHz".to_string()),
                (log::Level::Warn, "target not halted".to_string()),
                (log::Level::Error, "open failed".to_string()),
                (log::Level::Debug, "12 command.c".to_string()),
            ]
        );
        assert!(parse_log("   \n").is_empty());
    }
}
