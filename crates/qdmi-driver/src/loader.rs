// SPDX-License-Identifier: Apache-2.0
//! Opens a device plugin's shared library and resolves its vtable.
//!
//! Symbols are resolved in two passes: functions every device must export,
//! and functions a device may omit if it has no use for them. Missing
//! optional symbols leave the corresponding vtable slot `None` rather than
//! failing the load. Symbol names follow the `QDMI_<name>_dev` suffix
//! convention — one plugin is one device, so there is no per-device prefix
//! to disambiguate.

use std::path::Path;

use libloading::{Library, Symbol};
use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::properties::DeviceMode;
use qdmi_abi::status::QdmiStatus;

use crate::device::{Device, Vtable};
use crate::ffi;

/// Opens `path`, resolves its vtable, calls `initialize`, and discovers its
/// site/operation handles. Returns an error if the library can't be opened
/// or any *required* symbol is missing — the caller (the driver's
/// `init_all`) decides whether that's fatal for the whole config or just
/// this entry.
pub fn load(path: &Path, mode: DeviceMode) -> Result<Device> {
    // SAFETY: we immediately use the library only through symbols we
    // resolve from it below; its lifetime is tied to the returned `Device`.
    let library = unsafe { Library::new(path) }.map_err(|e| QdmiError::LoadFailed {
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;

    let vtable = Vtable {
        initialize: resolve_required(&library, "initialize")?,
        finalize: resolve_required(&library, "finalize")?,
        query_get_sites: resolve_required(&library, "query_get_sites")?,
        query_get_operations: resolve_required(&library, "query_get_operations")?,
        query_device_property: resolve_required(&library, "query_device_property")?,
        query_site_property: resolve_required(&library, "query_site_property")?,
        query_operation_property: resolve_required(&library, "query_operation_property")?,
        control_create_job: resolve_optional(&library, "control_create_job"),
        control_set_parameter: resolve_optional(&library, "control_set_parameter"),
        control_submit_job: resolve_optional(&library, "control_submit_job"),
        control_cancel: resolve_optional(&library, "control_cancel"),
        control_check: resolve_optional(&library, "control_check"),
        control_wait: resolve_optional(&library, "control_wait"),
        control_get_data: resolve_optional(&library, "control_get_data"),
        control_free_job: resolve_optional(&library, "control_free_job"),
    };

    // SAFETY: `initialize` is required to be safely callable exactly once,
    // before any other device function.
    let code = unsafe { (vtable.initialize)() };
    let status = QdmiStatus::from_raw(code);
    if !status.is_success() {
        return Err(QdmiError::from_status(
            status,
            format!("initialize failed for {}", path.display()),
        ));
    }

    let mut device = Device::new(library, path.to_path_buf(), mode, vtable);
    device.discover_handles()?;
    Ok(device)
}

fn resolve_required<T: Copy>(library: &Library, base: &str) -> Result<T> {
    resolve_optional(library, base).ok_or_else(|| QdmiError::SymbolNotFound {
        symbol: ffi::symbol_name(base),
        cause: "symbol not found".to_string(),
    })
}

fn resolve_optional<T: Copy>(library: &Library, base: &str) -> Option<T> {
    let name = ffi::symbol_name(base);
    // SAFETY: `T` is always one of the `Fn*` typedefs in `crate::ffi`, each
    // of which matches the C signature the plugin is required to export
    // under this symbol name.
    unsafe {
        library
            .get::<T>(name.as_bytes())
            .ok()
            .map(|sym: Symbol<T>| *sym)
    }
}
