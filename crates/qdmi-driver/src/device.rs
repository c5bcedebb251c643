// SPDX-License-Identifier: Apache-2.0
//! A single loaded device plugin: the open `Library`, its resolved vtable,
//! and the bookkeeping (mode, cached site/operation handles) the driver
//! needs to dispatch calls safely.

use std::ffi::c_void;
use std::path::PathBuf;
use std::sync::Mutex;

use libloading::Library;
use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::properties::DeviceMode;
use qdmi_abi::status::QdmiStatus;
use qdmi_abi::{OperationId, SiteId};

use crate::ffi;

/// Resolved function pointers for one device plugin.
pub(crate) struct Vtable {
    pub initialize: ffi::FnInitialize,
    pub finalize: ffi::FnFinalize,
    pub query_get_sites: ffi::FnQueryGetSites,
    pub query_get_operations: ffi::FnQueryGetOperations,
    pub query_device_property: ffi::FnQueryDeviceProperty,
    pub query_site_property: ffi::FnQuerySiteProperty,
    pub query_operation_property: ffi::FnQueryOperationProperty,
    pub control_create_job: Option<ffi::FnControlCreateJob>,
    pub control_set_parameter: Option<ffi::FnControlSetParameter>,
    pub control_submit_job: Option<ffi::FnControlSubmitJob>,
    pub control_cancel: Option<ffi::FnControlCancel>,
    pub control_check: Option<ffi::FnControlCheck>,
    pub control_wait: Option<ffi::FnControlWait>,
    pub control_get_data: Option<ffi::FnControlGetData>,
    pub control_free_job: Option<ffi::FnControlFreeJob>,
}

/// A loaded, initialized device plugin.
///
/// Holds the raw opaque handles the plugin returned for each of its sites
/// and operations; [`SiteId`]/[`OperationId`] are plain indices into these
/// vectors, so a handle from a different device (or a stale one) is caught
/// by a bounds check instead of being passed across the FFI boundary.
pub struct Device {
    // Kept alive for the lifetime of `vtable`'s function pointers; never
    // read directly.
    _library: Library,
    path: PathBuf,
    mode: DeviceMode,
    vtable: Vtable,
    call_lock: Mutex<()>,
    sites: Vec<*mut c_void>,
    operations: Vec<*mut c_void>,
}

// SAFETY: the raw handles stored in `sites`/`operations` are opaque tokens
// owned by the device plugin; we never dereference them ourselves, only
// pass them back into the plugin's own vtable, and `call_lock` serializes
// every vtable call so the plugin never sees concurrent access.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

impl Device {
    pub(crate) fn new(library: Library, path: PathBuf, mode: DeviceMode, vtable: Vtable) -> Self {
        Self {
            _library: library,
            path,
            mode,
            vtable,
            call_lock: Mutex::new(()),
            sites: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn library_path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub(crate) fn vtable(&self) -> &Vtable {
        &self.vtable
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.call_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Populates `sites`/`operations` by calling `query_get_sites`/
    /// `query_get_operations` with the probe/fill protocol. Called once
    /// right after `initialize` succeeds.
    pub(crate) fn discover_handles(&mut self) -> Result<()> {
        self.sites = probe_fill_handles(|size, out, size_ret| unsafe {
            (self.vtable.query_get_sites)(size, out, size_ret)
        })?;
        self.operations = probe_fill_handles(|size, out, size_ret| unsafe {
            (self.vtable.query_get_operations)(size, out, size_ret)
        })?;
        Ok(())
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }

    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        (0..self.sites.len()).map(SiteId)
    }

    pub fn operation_ids(&self) -> impl Iterator<Item = OperationId> + '_ {
        (0..self.operations.len()).map(OperationId)
    }

    pub(crate) fn raw_site(&self, id: SiteId) -> Result<*mut c_void> {
        self.sites
            .get(id.0)
            .copied()
            .ok_or_else(|| QdmiError::OutOfRange(format!("site index {} out of range", id.0)))
    }

    pub(crate) fn raw_operation(&self, id: OperationId) -> Result<*mut c_void> {
        self.operations
            .get(id.0)
            .copied()
            .ok_or_else(|| {
                QdmiError::OutOfRange(format!("operation index {} out of range", id.0))
            })
    }

    pub(crate) fn require_read_write(&self) -> Result<()> {
        if self.mode == DeviceMode::ReadWrite {
            Ok(())
        } else {
            Err(QdmiError::PermissionDenied(format!(
                "device {} is open read_only",
                self.path.display()
            )))
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // SAFETY: `finalize` takes no arguments and is required to be
        // callable exactly once after `initialize` succeeded.
        let code = unsafe { (self.vtable.finalize)() };
        if !QdmiStatus::from_raw(code).is_success() {
            log::warn!(
                "finalize failed for device {} with code {code}",
                self.path.display()
            );
        }
    }
}

/// Runs the probe/fill protocol for a `query_get_sites`/`query_get_operations`
/// style call that fills an array of opaque handles.
fn probe_fill_handles(
    call: impl Fn(usize, *mut *mut c_void, *mut usize) -> i32,
) -> Result<Vec<*mut c_void>> {
    let mut needed: usize = 0;
    let code = call(0, std::ptr::null_mut(), &mut needed);
    let status = QdmiStatus::from_raw(code);
    if !status.is_success() {
        return Err(QdmiError::from_status(status, "probing handle count".into()));
    }
    if needed == 0 {
        return Ok(Vec::new());
    }
    let mut buf: Vec<*mut c_void> = vec![std::ptr::null_mut(); needed];
    let mut filled: usize = 0;
    let code = call(needed, buf.as_mut_ptr(), &mut filled);
    let status = QdmiStatus::from_raw(code);
    if !status.is_success() {
        return Err(QdmiError::from_status(status, "filling handle list".into()));
    }
    buf.truncate(filled);
    Ok(buf)
}
