//! stlink-tools-core - Firmware and probe resolution for ST-Link uploads
//!
//! This crate holds the decision logic of `stlink-tools`:
//!
//! - [`device`]: the catalog of ST-Link probes, serial number normalization
//!   and probe selection
//! - [`search`]: breadth-first file search and the ELF / OpenOCD config
//!   location policies built on it
//! - [`backend`]: OpenOCD / PyOCD selection and command line construction
//! - [`upload`]: the end-to-end upload workflow
//!
//! USB enumeration, process execution and `PATH` lookup are reached through
//! the [`device::UsbBus`], [`exec::ProcessRunner`] and
//! [`exec::ExecutableLocator`] traits.
//!
//! # Example
//!
//! ```ignore
//! use stlink_tools_core::exec::{SearchPath, SystemRunner};
//! use stlink_tools_core::upload::{upload_app, Environment, UploadOptions};
//!
//! let options = UploadOptions {
//!     project_dir: std::env::current_dir()?,
//!     ..Default::default()
//! };
//! let env = Environment {
//!     usb: &stlink_tools_usb::NusbBus,
//!     runner: &SystemRunner,
//!     locator: &SearchPath,
//! };
//! upload_app(&options, env)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod device;
pub mod error;
pub mod exec;
pub mod search;
pub mod upload;

pub use error::{Error, Result};
