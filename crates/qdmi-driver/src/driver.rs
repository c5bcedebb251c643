// SPDX-License-Identifier: Apache-2.0
//! The driver: owns every loaded device plugin for the life of the process.

use qdmi_abi::error::Result;

use crate::config::{self, Config};
use crate::device::Device;
use crate::loader;
use crate::session::Session;

/// Holds every device plugin the config file named and successfully loaded.
///
/// A failed entry (disallowed path, bad path, missing required symbol,
/// `initialize` error) is logged and skipped; it does not abort loading the
/// remaining entries.
pub struct Driver {
    devices: Vec<Device>,
}

impl Driver {
    /// Loads every device named in `config`, skipping (with a logged
    /// warning) any entry that fails to load.
    pub fn init(config: &Config) -> Result<Self> {
        let mut devices = Vec::with_capacity(config.devices.len());
        for entry in &config.devices {
            if !config::is_path_allowed(&entry.library_path) {
                log::warn!(
                    "skipping device plugin {}: path is outside the allowed directories (cwd, $HOME)",
                    entry.library_path.display()
                );
                continue;
            }
            match loader::load(&entry.library_path, entry.mode) {
                Ok(device) => devices.push(device),
                Err(e) => {
                    log::warn!(
                        "skipping device plugin {}: {e}",
                        entry.library_path.display()
                    );
                }
            }
        }
        Ok(Self { devices })
    }

    /// Loads a config file directly from `QDMI_CONF` (or `qdmi.conf`) and
    /// initializes every device it names.
    pub fn init_from_env() -> Result<Self> {
        Self::init(&Config::load_from_env()?)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    /// Opens a new session over the driver's current device list.
    pub fn open_session(&self) -> Session<'_> {
        Session::new(self)
    }

    /// Drops every device, running each one's `finalize` in turn. After
    /// this call the driver has no devices; it is safe (a no-op) to drop
    /// the `Driver` itself afterwards.
    pub fn shutdown(&mut self) {
        self.devices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_no_devices() {
        let driver = Driver::init(&Config::default()).unwrap();
        assert_eq!(driver.num_devices(), 0);
    }

    #[test]
    fn bad_entry_is_skipped_not_fatal() {
        let config = Config::parse("/nonexistent/libfoo.so read_only\n");
        let driver = Driver::init(&config).unwrap();
        assert_eq!(driver.num_devices(), 0);
    }

    #[test]
    fn entry_outside_allow_list_is_skipped_not_fatal() {
        // /etc is neither cwd nor $HOME; the library is never even opened.
        let config = Config::parse("/etc/libfoo.so read_only\n");
        let driver = Driver::init(&config).unwrap();
        assert_eq!(driver.num_devices(), 0);
    }
}
