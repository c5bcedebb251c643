// SPDX-License-Identifier: Apache-2.0
//! Raw C ABI a device plugin exports.
//!
//! Every function is resolved by its `QDMI_<name>_dev` symbol name (see
//! [`crate::loader`]) and called exactly as declared here: opaque handles
//! cross the boundary as `*mut c_void`, and every variable-length output
//! follows the probe/fill convention (`size == 0` or `value` null means
//! "just tell me the required size").
//!
//! This module intentionally mirrors the device.h function signatures
//! rather than a Rust-friendlier shape — the translation into safe,
//! ergonomic APIs happens in [`crate::device`] and [`crate::client`].

use std::ffi::c_void;
use std::os::raw::c_int;

pub type FnInitialize = unsafe extern "C" fn() -> c_int;
pub type FnFinalize = unsafe extern "C" fn() -> c_int;

pub type FnQueryGetSites =
    unsafe extern "C" fn(size: usize, sites: *mut *mut c_void, size_ret: *mut usize) -> c_int;

pub type FnQueryGetOperations =
    unsafe extern "C" fn(size: usize, operations: *mut *mut c_void, size_ret: *mut usize) -> c_int;

pub type FnQueryDeviceProperty = unsafe extern "C" fn(
    prop: c_int,
    size: usize,
    value: *mut c_void,
    size_ret: *mut usize,
) -> c_int;

pub type FnQuerySiteProperty = unsafe extern "C" fn(
    site: *mut c_void,
    prop: c_int,
    size: usize,
    value: *mut c_void,
    size_ret: *mut usize,
) -> c_int;

pub type FnQueryOperationProperty = unsafe extern "C" fn(
    operation: *mut c_void,
    num_sites: usize,
    sites: *const *mut c_void,
    prop: c_int,
    size: usize,
    value: *mut c_void,
    size_ret: *mut usize,
) -> c_int;

pub type FnControlCreateJob = unsafe extern "C" fn(
    format: c_int,
    prog_size: usize,
    program: *const c_void,
    job: *mut *mut c_void,
) -> c_int;

pub type FnControlSetParameter = unsafe extern "C" fn(
    job: *mut c_void,
    param: c_int,
    size: usize,
    value: *const c_void,
) -> c_int;

pub type FnControlSubmitJob = unsafe extern "C" fn(job: *mut c_void) -> c_int;

pub type FnControlCancel = unsafe extern "C" fn(job: *mut c_void) -> c_int;

pub type FnControlCheck = unsafe extern "C" fn(job: *mut c_void, status: *mut c_int) -> c_int;

pub type FnControlWait = unsafe extern "C" fn(job: *mut c_void) -> c_int;

pub type FnControlGetData = unsafe extern "C" fn(
    job: *mut c_void,
    result: c_int,
    size: usize,
    data: *mut c_void,
    size_ret: *mut usize,
) -> c_int;

pub type FnControlFreeJob = unsafe extern "C" fn(job: *mut c_void) -> c_int;

/// Required symbol names, suffix convention: `QDMI_<base>_dev`.
pub const REQUIRED_SYMBOLS: &[&str] = &[
    "initialize",
    "finalize",
    "query_get_sites",
    "query_get_operations",
    "query_device_property",
    "query_site_property",
    "query_operation_property",
];

/// Optional symbol names — a query-only device plugin may omit all of these.
pub const OPTIONAL_SYMBOLS: &[&str] = &[
    "control_create_job",
    "control_set_parameter",
    "control_submit_job",
    "control_cancel",
    "control_check",
    "control_wait",
    "control_get_data",
    "control_free_job",
];

pub fn symbol_name(base: &str) -> String {
    format!("QDMI_{base}_dev")
}
