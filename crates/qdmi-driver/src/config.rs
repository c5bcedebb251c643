// SPDX-License-Identifier: Apache-2.0
//! Config-file parsing: which device plugins to load, and in what mode.
//!
//! The env var `QDMI_CONF` names the config file (default `qdmi.conf` in
//! the current directory); each non-blank, non-`#`-comment line is
//! `<path> <mode>` where `mode` is `read_only` or `read_write`. A line with
//! an unrecognized mode keyword is skipped with a warning rather than
//! aborting the whole file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::properties::DeviceMode;

const ENV_VAR: &str = "QDMI_CONF";
const DEFAULT_CONFIG_FILE: &str = "qdmi.conf";

/// One device plugin entry from the config file.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub library_path: PathBuf,
    pub mode: DeviceMode,
}

/// The fully parsed configuration: which device plugins to load and how.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub devices: Vec<DeviceEntry>,
}

impl Config {
    /// Loads the config named by `QDMI_CONF`, falling back to `qdmi.conf`.
    pub fn load_from_env() -> Result<Self> {
        let path = env::var(ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load(Path::new(&path))
    }

    /// Loads and parses a config file at an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        if !is_path_allowed(path) {
            return Err(QdmiError::PermissionDenied(format!(
                "config path {} is outside the allowed directories (cwd, $HOME)",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path).map_err(|e| {
            QdmiError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Ok(Self::parse(&contents))
    }

    /// Parses config-file text directly (used by tests and by [`Config::load`]).
    pub fn parse(contents: &str) -> Self {
        let mut devices = Vec::new();
        for (lineno, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(lib_name), Some(mode_str)) = (parts.next(), parts.next()) else {
                log::warn!("qdmi.conf:{}: malformed line, skipping", lineno + 1);
                continue;
            };
            let mode = match mode_str {
                "read_only" => DeviceMode::ReadOnly,
                "read_write" => DeviceMode::ReadWrite,
                other => {
                    log::warn!(
                        "qdmi.conf:{}: unrecognized mode `{other}`, skipping",
                        lineno + 1
                    );
                    continue;
                }
            };
            devices.push(DeviceEntry {
                library_path: PathBuf::from(lib_name),
                mode,
            });
        }
        Self { devices }
    }
}

/// Restricts a path to the current working directory or `$HOME`. Applied
/// both to the config file itself ([`Config::load`]) and, by the driver, to
/// every device library path a config line names before it is ever passed
/// to `dlopen` — this keeps a compromised or merely sloppy config file from
/// loading arbitrary system libraries.
pub fn is_path_allowed(path: &Path) -> bool {
    let Ok(resolved) = absolute(path) else {
        return false;
    };
    let mut allowed = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        allowed.push(cwd);
    }
    if let Some(home) = env::var_os("HOME") {
        allowed.push(PathBuf::from(home));
    }
    allowed.iter().any(|root| resolved.starts_with(root))
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        let cfg = Config::parse(
            "# comment\n\nlibfoo.so read_only\nlibbar.so read_write\n",
        );
        assert_eq!(cfg.devices.len(), 2);
        assert_eq!(cfg.devices[0].mode, DeviceMode::ReadOnly);
        assert_eq!(cfg.devices[1].mode, DeviceMode::ReadWrite);
    }

    #[test]
    fn skips_unrecognized_mode() {
        let cfg = Config::parse("libfoo.so sometimes\nlibbar.so read_write\n");
        assert_eq!(cfg.devices.len(), 1);
        assert_eq!(cfg.devices[0].library_path, PathBuf::from("libbar.so"));
    }

    #[test]
    fn skips_malformed_line() {
        let cfg = Config::parse("libfoo.so\nlibbar.so read_write\n");
        assert_eq!(cfg.devices.len(), 1);
    }

    #[test]
    fn cwd_is_allowed() {
        let cwd = env::current_dir().unwrap();
        assert!(is_path_allowed(&cwd.join("libfoo.so")));
    }

    #[test]
    fn root_is_not_allowed() {
        assert!(!is_path_allowed(Path::new("/etc/passwd")));
    }
}
