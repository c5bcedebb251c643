// SPDX-License-Identifier: Apache-2.0
//! The C ABI this device exports, resolved by the driver via its
//! `QDMI_<name>_dev` symbol names (see `qdmi-driver::ffi`).
//!
//! There is exactly one device per loaded library, so all state lives
//! behind a single process-wide `Mutex`. Site and operation handles need no
//! heap allocation — they are plain indices smuggled across the boundary as
//! `(index + 1) as *mut c_void` — but a job handle is a real
//! `Box::into_raw(Box<SimJob>)`, freed by `control_free_job_dev`.
//!
//! Every exported function is wrapped in [`catch_unwind`] so a bug in the
//! simulator (for example a malformed program triggering an `unwrap`
//! somewhere upstream, or an arithmetic overflow) reports `QDMI_ERROR_FATAL`
//! to the caller instead of unwinding across the FFI boundary, which is
//! undefined behavior.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, OnceLock};

use qdmi_abi::properties::{DeviceProperty, DeviceStatus, OperationProperty, ResultKind, SiteProperty};
use qdmi_abi::status::QdmiStatus;

use crate::device::{self, SimDevice};
use crate::job::{self, SimJob};
use crate::topology::NUM_QUBITS;

static DEVICE: OnceLock<Mutex<SimDevice>> = OnceLock::new();

fn device_lock() -> std::sync::MutexGuard<'static, SimDevice> {
    DEVICE
        .get_or_init(|| Mutex::new(SimDevice::default()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

fn guard(f: impl FnOnce() -> c_int) -> c_int {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or(QdmiStatus::Fatal.as_raw())
}

unsafe fn write_out(value: &[u8], size: usize, out: *mut c_void, size_ret: *mut usize) -> c_int {
    if !size_ret.is_null() {
        *size_ret = value.len();
    }
    if size == 0 || out.is_null() {
        return QdmiStatus::Success.as_raw();
    }
    if size < value.len() {
        return QdmiStatus::InvalidArgument.as_raw();
    }
    std::ptr::copy_nonoverlapping(value.as_ptr(), out as *mut u8, value.len());
    QdmiStatus::Success.as_raw()
}

fn site_handle(index: usize) -> *mut c_void {
    (index + 1) as *mut c_void
}

fn site_index(handle: *mut c_void) -> Option<usize> {
    (handle as usize).checked_sub(1)
}

fn operation_handle(index: usize) -> *mut c_void {
    (index + 1) as *mut c_void
}

fn operation_index(handle: *mut c_void) -> Option<usize> {
    (handle as usize).checked_sub(1)
}

#[no_mangle]
pub extern "C" fn QDMI_initialize_dev() -> c_int {
    guard(|| {
        device_lock().initialize();
        QdmiStatus::Success.as_raw()
    })
}

#[no_mangle]
pub extern "C" fn QDMI_finalize_dev() -> c_int {
    guard(|| {
        device_lock().finalize();
        QdmiStatus::Success.as_raw()
    })
}

/// # Safety
/// `sites`, if non-null, must point to at least `size` writable slots;
/// `size_ret`, if non-null, must be writable.
#[no_mangle]
pub unsafe extern "C" fn QDMI_query_get_sites_dev(
    size: usize,
    sites: *mut *mut c_void,
    size_ret: *mut usize,
) -> c_int {
    guard(|| {
        let num_sites = device_lock().num_sites();
        if !size_ret.is_null() {
            *size_ret = num_sites;
        }
        if size == 0 || sites.is_null() {
            return QdmiStatus::Success.as_raw();
        }
        if size < num_sites {
            return QdmiStatus::InvalidArgument.as_raw();
        }
        for i in 0..num_sites {
            *sites.add(i) = site_handle(i);
        }
        QdmiStatus::Success.as_raw()
    })
}

/// # Safety
/// Same contract as [`QDMI_query_get_sites_dev`].
#[no_mangle]
pub unsafe extern "C" fn QDMI_query_get_operations_dev(
    size: usize,
    operations: *mut *mut c_void,
    size_ret: *mut usize,
) -> c_int {
    guard(|| {
        let num_operations = device_lock().num_operations();
        if !size_ret.is_null() {
            *size_ret = num_operations;
        }
        if size == 0 || operations.is_null() {
            return QdmiStatus::Success.as_raw();
        }
        if size < num_operations {
            return QdmiStatus::InvalidArgument.as_raw();
        }
        for i in 0..num_operations {
            *operations.add(i) = operation_handle(i);
        }
        QdmiStatus::Success.as_raw()
    })
}

/// # Safety
/// `value`, if non-null, must point to at least `size` writable bytes;
/// `size_ret`, if non-null, must be writable.
#[no_mangle]
pub unsafe extern "C" fn QDMI_query_device_property_dev(
    prop: c_int,
    size: usize,
    value: *mut c_void,
    size_ret: *mut usize,
) -> c_int {
    guard(|| {
        let device = device_lock();
        let bytes: Vec<u8> = match prop {
            p if p == DeviceProperty::Name as c_int => cstr_bytes(device::DEVICE_NAME),
            p if p == DeviceProperty::DeviceVersion as c_int => cstr_bytes(device::DEVICE_VERSION),
            p if p == DeviceProperty::LibraryVersion as c_int => cstr_bytes(device::LIBRARY_VERSION),
            p if p == DeviceProperty::QubitsNum as c_int => (NUM_QUBITS as i32).to_ne_bytes().to_vec(),
            p if p == DeviceProperty::DeviceStatus as c_int => {
                (status_code(device.status())).to_ne_bytes().to_vec()
            }
            p if p == DeviceProperty::CouplingMap as c_int => {
                device.coupling_map().iter().flat_map(|v| v.to_ne_bytes()).collect()
            }
            p if p == DeviceProperty::GateSet as c_int => cstr_list_bytes(&device::GATE_SET),
            _ => return QdmiStatus::InvalidArgument.as_raw(),
        };
        write_out(&bytes, size, value, size_ret)
    })
}

/// # Safety
/// Same contract as [`QDMI_query_device_property_dev`]; `site` must be a
/// handle previously returned by `QDMI_query_get_sites_dev`.
#[no_mangle]
pub unsafe extern "C" fn QDMI_query_site_property_dev(
    site: *mut c_void,
    prop: c_int,
    size: usize,
    value: *mut c_void,
    size_ret: *mut usize,
) -> c_int {
    guard(|| {
        let Some(index) = site_index(site) else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        if index >= NUM_QUBITS {
            return QdmiStatus::OutOfRange.as_raw();
        }
        let bytes: Vec<u8> = match prop {
            p if p == SiteProperty::T1 as c_int => device::SITE_T1_US.to_ne_bytes().to_vec(),
            p if p == SiteProperty::T2 as c_int => device::SITE_T2_US.to_ne_bytes().to_vec(),
            _ => return QdmiStatus::InvalidArgument.as_raw(),
        };
        write_out(&bytes, size, value, size_ret)
    })
}

/// # Safety
/// `operation` must be a handle previously returned by
/// `QDMI_query_get_operations_dev`; `sites`, if non-null, must point to
/// `num_sites` valid site handles.
#[no_mangle]
pub unsafe extern "C" fn QDMI_query_operation_property_dev(
    operation: *mut c_void,
    num_sites: usize,
    sites: *const *mut c_void,
    prop: c_int,
    size: usize,
    value: *mut c_void,
    size_ret: *mut usize,
) -> c_int {
    guard(|| {
        let Some(op_index) = operation_index(operation) else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        let device = device_lock();
        let Some(name) = device.operation_name(op_index) else {
            return QdmiStatus::OutOfRange.as_raw();
        };
        let bytes: Vec<u8> = match prop {
            p if p == OperationProperty::Name as c_int => cstr_bytes(name),
            p if p == OperationProperty::QubitsNum as c_int => {
                (device.operation_qubits_num(op_index).unwrap() as i32)
                    .to_ne_bytes()
                    .to_vec()
            }
            p if p == OperationProperty::Duration as c_int => {
                if name == "cx" {
                    0.1f64.to_ne_bytes().to_vec()
                } else {
                    device::SINGLE_QUBIT_DURATION_US.to_ne_bytes().to_vec()
                }
            }
            p if p == OperationProperty::Fidelity as c_int => {
                if name == "cx" {
                    if num_sites != 2 || sites.is_null() {
                        return QdmiStatus::InvalidArgument.as_raw();
                    }
                    let a = site_index(*sites);
                    let b = site_index(*sites.add(1));
                    let (Some(a), Some(b)) = (a, b) else {
                        return QdmiStatus::InvalidArgument.as_raw();
                    };
                    match crate::topology::cx_fidelity(a, b) {
                        Some(f) => f.to_ne_bytes().to_vec(),
                        None => return QdmiStatus::InvalidArgument.as_raw(),
                    }
                } else {
                    device::SINGLE_QUBIT_FIDELITY.to_ne_bytes().to_vec()
                }
            }
            _ => return QdmiStatus::InvalidArgument.as_raw(),
        };
        write_out(&bytes, size, value, size_ret)
    })
}

/// # Safety
/// `program` must point to `prog_size` readable bytes; `job` must be
/// writable.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_create_job_dev(
    format: c_int,
    prog_size: usize,
    program: *const c_void,
    job: *mut *mut c_void,
) -> c_int {
    guard(|| {
        let mut device = device_lock();
        if device.status() != DeviceStatus::Idle {
            return QdmiStatus::Fatal.as_raw();
        }
        let Some(program_format) = program_format_from_raw(format) else {
            return QdmiStatus::NotSupported.as_raw();
        };
        let bytes = std::slice::from_raw_parts(program as *const u8, prog_size).to_vec();
        match SimJob::new(program_format, bytes) {
            Ok(sim_job) => {
                device.set_status(DeviceStatus::Busy);
                let raw = Box::into_raw(Box::new(sim_job)) as *mut c_void;
                *job = raw;
                QdmiStatus::Success.as_raw()
            }
            Err(e) => e.to_status().as_raw(),
        }
    })
}

/// # Safety
/// `job` must be a live handle from `QDMI_control_create_job_dev`; `value`
/// must point to `size` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_set_parameter_dev(
    job: *mut c_void,
    param: c_int,
    size: usize,
    value: *const c_void,
) -> c_int {
    guard(|| {
        let Some(job) = (job as *mut SimJob).as_mut() else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        if param != qdmi_abi::properties::JobParameter::ShotsNum as c_int {
            return QdmiStatus::InvalidArgument.as_raw();
        }
        if size != std::mem::size_of::<u64>() || value.is_null() {
            return QdmiStatus::InvalidArgument.as_raw();
        }
        let mut buf = [0u8; 8];
        std::ptr::copy_nonoverlapping(value as *const u8, buf.as_mut_ptr(), 8);
        match job.set_shots_num(u64::from_ne_bytes(buf)) {
            Ok(()) => QdmiStatus::Success.as_raw(),
            Err(e) => e.to_status().as_raw(),
        }
    })
}

/// # Safety
/// `job` must be a live handle from `QDMI_control_create_job_dev`.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_submit_job_dev(job: *mut c_void) -> c_int {
    guard(|| {
        let Some(job) = (job as *mut SimJob).as_mut() else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        match job.submit() {
            Ok(()) => QdmiStatus::Success.as_raw(),
            Err(e) => e.to_status().as_raw(),
        }
    })
}

/// # Safety
/// `job` must be a live handle from `QDMI_control_create_job_dev`.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_cancel_dev(job: *mut c_void) -> c_int {
    guard(|| {
        let Some(job) = (job as *mut SimJob).as_mut() else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        let result = job.cancel();
        if result.is_ok() {
            device_lock().set_status(DeviceStatus::Idle);
        }
        match result {
            Ok(()) => QdmiStatus::Success.as_raw(),
            Err(e) => e.to_status().as_raw(),
        }
    })
}

/// # Safety
/// `job` must be a live handle; `status` must be writable.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_check_dev(job: *mut c_void, status: *mut c_int) -> c_int {
    guard(|| {
        let Some(job) = (job as *mut SimJob).as_mut() else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        let new_status = job.advance();
        if new_status == qdmi_abi::properties::JobStatus::Done {
            device_lock().set_status(DeviceStatus::Idle);
        }
        if !status.is_null() {
            *status = job_status_code(new_status);
        }
        QdmiStatus::Success.as_raw()
    })
}

/// # Safety
/// `job` must be a live handle from `QDMI_control_create_job_dev`.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_wait_dev(job: *mut c_void) -> c_int {
    guard(|| {
        let Some(job) = (job as *mut SimJob).as_mut() else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        job.finish();
        device_lock().set_status(DeviceStatus::Idle);
        QdmiStatus::Success.as_raw()
    })
}

/// # Safety
/// `job` must be a live `Done` handle; `data`, if non-null, must point to
/// `size` writable bytes; `size_ret`, if non-null, must be writable.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_get_data_dev(
    job: *mut c_void,
    result: c_int,
    size: usize,
    data: *mut c_void,
    size_ret: *mut usize,
) -> c_int {
    guard(|| {
        let Some(job) = (job as *mut SimJob).as_ref() else {
            return QdmiStatus::InvalidArgument.as_raw();
        };
        let bytes = match result_kind_from_raw(result) {
            Some(kind) => match encode_result(job, kind) {
                Ok(bytes) => bytes,
                Err(e) => return e.to_status().as_raw(),
            },
            None => return QdmiStatus::InvalidArgument.as_raw(),
        };
        write_out(&bytes, size, data, size_ret)
    })
}

/// # Safety
/// `job` must be a handle previously returned by
/// `QDMI_control_create_job_dev`, and must not be used again afterwards.
#[no_mangle]
pub unsafe extern "C" fn QDMI_control_free_job_dev(job: *mut c_void) -> c_int {
    guard(|| {
        if job.is_null() {
            return QdmiStatus::InvalidArgument.as_raw();
        }
        drop(Box::from_raw(job as *mut SimJob));
        QdmiStatus::Success.as_raw()
    })
}

fn cstr_bytes(s: &str) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

fn cstr_list_bytes(items: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for item in items {
        bytes.extend_from_slice(item.as_bytes());
        bytes.push(0);
    }
    bytes
}

fn status_code(status: DeviceStatus) -> i32 {
    status as i32
}

fn program_format_from_raw(raw: c_int) -> Option<qdmi_abi::properties::ProgramFormat> {
    use qdmi_abi::properties::ProgramFormat::*;
    Some(match raw {
        0 => Qasm2,
        1 => QirString,
        2 => QirModule,
        _ => return None,
    })
}

fn job_status_code(status: qdmi_abi::properties::JobStatus) -> i32 {
    use qdmi_abi::properties::JobStatus::*;
    match status {
        Submitted => 0,
        Done => 1,
        Running => 2,
        Cancelled => 3,
        Created => 0, // not observable device-side: submit() always runs first
    }
}

fn result_kind_from_raw(raw: c_int) -> Option<ResultKind> {
    use ResultKind::*;
    Some(match raw {
        0 => Shots,
        1 => HistKeys,
        2 => HistValues,
        3 => StateVectorDense,
        4 => StateVectorSparseKeys,
        5 => StateVectorSparseValues,
        6 => ProbabilitiesDense,
        7 => ProbabilitiesSparseKeys,
        8 => ProbabilitiesSparseValues,
        _ => return None,
    })
}

const SPARSE_THRESHOLD: f64 = 1e-9;

fn encode_result(job: &SimJob, kind: ResultKind) -> qdmi_abi::error::Result<Vec<u8>> {
    match kind {
        ResultKind::Shots => Ok(job.shots()?.join(",").into_bytes()),
        ResultKind::HistKeys => {
            let hist = job::histogram(job.shots()?);
            Ok(hist
                .into_iter()
                .flat_map(|(key, _)| key.into_bytes())
                .collect())
        }
        ResultKind::HistValues => {
            let hist = job::histogram(job.shots()?);
            Ok(hist
                .into_iter()
                .flat_map(|(_, count)| count.to_ne_bytes())
                .collect())
        }
        ResultKind::StateVectorDense => {
            let state = job.state()?;
            Ok(state
                .iter()
                .flat_map(|c| [c.re.to_ne_bytes(), c.im.to_ne_bytes()])
                .flatten()
                .collect())
        }
        ResultKind::StateVectorSparseKeys => {
            let state = job.state()?;
            Ok(state
                .iter()
                .enumerate()
                .filter(|(_, c)| c.norm_sqr() > SPARSE_THRESHOLD)
                .flat_map(|(i, _)| (i as u64).to_ne_bytes())
                .collect())
        }
        ResultKind::StateVectorSparseValues => {
            let state = job.state()?;
            Ok(state
                .iter()
                .filter(|c| c.norm_sqr() > SPARSE_THRESHOLD)
                .flat_map(|c| [c.re.to_ne_bytes(), c.im.to_ne_bytes()])
                .flatten()
                .collect())
        }
        ResultKind::ProbabilitiesDense => {
            let state = job.state()?;
            Ok(state
                .iter()
                .flat_map(|c| c.norm_sqr().to_ne_bytes())
                .collect())
        }
        ResultKind::ProbabilitiesSparseKeys => {
            let state = job.state()?;
            Ok(state
                .iter()
                .enumerate()
                .filter(|(_, c)| c.norm_sqr() > SPARSE_THRESHOLD)
                .flat_map(|(i, _)| (i as u64).to_ne_bytes())
                .collect())
        }
        ResultKind::ProbabilitiesSparseValues => {
            let state = job.state()?;
            Ok(state
                .iter()
                .filter(|c| c.norm_sqr() > SPARSE_THRESHOLD)
                .flat_map(|c| c.norm_sqr().to_ne_bytes())
                .collect())
        }
    }
}
