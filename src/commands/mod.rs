//! CLI command implementations
//!
//! - `show-devices`: enumerate attached ST-Link probes
//! - `upload-app`: resolve the firmware image and probe, then flash with
//!   OpenOCD or PyOCD

mod list;
mod upload;

pub use list::show_devices;
pub use upload::upload_app;
