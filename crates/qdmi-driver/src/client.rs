// SPDX-License-Identifier: Apache-2.0
//! Thin client façade: safe, idiomatic wrappers over each device operation.
//!
//! Every function here takes a [`Session`] and a [`DeviceHandle`], checks
//! the handle and (for mutating calls) the device's mode, and only then
//! invokes the resolved vtable pointer under the device's call lock. This
//! is the only module outside `device.rs`/`loader.rs` that touches a raw
//! function pointer.

use std::ffi::c_void;
use std::os::raw::c_int;

use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::properties::{JobStatus, ProgramFormat, ResultKind};
use qdmi_abi::status::QdmiStatus;
use qdmi_abi::{JobId, OperationId, SiteId};

use crate::device::Device;
use crate::probe;
use crate::session::{DeviceHandle, Session};

/// Reads a device property into an owned byte vector.
pub fn query_device_property(
    session: &Session<'_>,
    device: DeviceHandle,
    prop: i32,
) -> Result<Vec<u8>> {
    let dev = session.device(device)?;
    let _guard = dev.lock();
    probe::read_to_vec(|size, value, size_ret| unsafe {
        (dev.vtable().query_device_property)(prop, size, value, size_ret)
    })
}

/// Reads a site property into an owned byte vector.
pub fn query_site_property(
    session: &Session<'_>,
    device: DeviceHandle,
    site: SiteId,
    prop: i32,
) -> Result<Vec<u8>> {
    let dev = session.device(device)?;
    let raw_site = dev.raw_site(site)?;
    let _guard = dev.lock();
    probe::read_to_vec(|size, value, size_ret| unsafe {
        (dev.vtable().query_site_property)(raw_site, prop, size, value, size_ret)
    })
}

/// Reads an operation property, restricted to the given set of sites, into
/// an owned byte vector.
pub fn query_operation_property(
    session: &Session<'_>,
    device: DeviceHandle,
    operation: OperationId,
    sites: &[SiteId],
    prop: i32,
) -> Result<Vec<u8>> {
    let dev = session.device(device)?;
    let raw_operation = dev.raw_operation(operation)?;
    let raw_sites: Result<Vec<*mut c_void>> = sites.iter().map(|s| dev.raw_site(*s)).collect();
    let raw_sites = raw_sites?;
    let _guard = dev.lock();
    probe::read_to_vec(|size, value, size_ret| unsafe {
        (dev.vtable().query_operation_property)(
            raw_operation,
            raw_sites.len(),
            raw_sites.as_ptr(),
            prop,
            size,
            value,
            size_ret,
        )
    })
}

/// Creates a job on `device` from `program`, in state `Created`.
pub fn control_create_job(
    session: &Session<'_>,
    device: DeviceHandle,
    format: ProgramFormat,
    program: &[u8],
) -> Result<JobId> {
    let dev = session.device(device)?;
    dev.require_read_write()?;
    let create = required(dev, |v| v.control_create_job, "control_create_job")?;
    let _guard = dev.lock();
    let mut raw_job: *mut c_void = std::ptr::null_mut();
    let code = unsafe {
        create(
            format as c_int,
            program.len(),
            program.as_ptr() as *const c_void,
            &mut raw_job,
        )
    };
    let status = QdmiStatus::from_raw(code);
    if !status.is_success() {
        return Err(QdmiError::from_status(status, "control_create_job".into()));
    }
    Ok(session.jobs.insert(device.index(), raw_job))
}

/// Sets a job parameter. Only valid while the job is in state `Created`.
pub fn control_set_parameter(
    session: &Session<'_>,
    device: DeviceHandle,
    job: JobId,
    param: i32,
    value: &[u8],
) -> Result<()> {
    let dev = session.device(device)?;
    dev.require_read_write()?;
    let set_parameter =
        required(dev, |v| v.control_set_parameter, "control_set_parameter")?;
    session.jobs.with_slot(job, |slot| {
        if slot.status != JobStatus::Created {
            return Err(QdmiError::InvalidArgument(
                "cannot set a parameter on a job that has already been submitted".into(),
            ));
        }
        let _guard = dev.lock();
        let code = unsafe {
            set_parameter(
                slot.raw,
                param,
                value.len(),
                value.as_ptr() as *const c_void,
            )
        };
        check_status(code, "control_set_parameter")
    })
}

/// Submits a job: `Created -> Submitted`.
pub fn control_submit_job(session: &Session<'_>, device: DeviceHandle, job: JobId) -> Result<()> {
    let dev = session.device(device)?;
    dev.require_read_write()?;
    let submit = required(dev, |v| v.control_submit_job, "control_submit_job")?;
    session.jobs.with_slot(job, |slot| {
        if slot.status != JobStatus::Created {
            return Err(QdmiError::InvalidArgument(
                "job has already been submitted".into(),
            ));
        }
        let _guard = dev.lock();
        let code = unsafe { submit(slot.raw) };
        check_status(code, "control_submit_job")?;
        slot.status = JobStatus::Submitted;
        Ok(())
    })
}

/// Cancels a non-terminal job.
pub fn control_cancel(session: &Session<'_>, device: DeviceHandle, job: JobId) -> Result<()> {
    let dev = session.device(device)?;
    dev.require_read_write()?;
    let cancel = required(dev, |v| v.control_cancel, "control_cancel")?;
    session.jobs.with_slot(job, |slot| {
        if slot.status.is_terminal() {
            return Err(QdmiError::InvalidArgument(
                "cannot cancel a job that has already reached a terminal state".into(),
            ));
        }
        let _guard = dev.lock();
        let code = unsafe { cancel(slot.raw) };
        check_status(code, "control_cancel")?;
        slot.status = JobStatus::Cancelled;
        Ok(())
    })
}

/// Polls a job's status without blocking.
pub fn control_check(
    session: &Session<'_>,
    device: DeviceHandle,
    job: JobId,
) -> Result<JobStatus> {
    let dev = session.device(device)?;
    let check = required(dev, |v| v.control_check, "control_check")?;
    session.jobs.with_slot(job, |slot| {
        if slot.status == JobStatus::Created {
            return Ok(JobStatus::Created);
        }
        let _guard = dev.lock();
        let mut raw_status: c_int = 0;
        let code = unsafe { check(slot.raw, &mut raw_status) };
        check_status(code, "control_check")?;
        let status = device_job_status(raw_status)?;
        slot.status = status;
        Ok(status)
    })
}

/// Blocks until the job reaches a terminal state. Callers who want a
/// timeout poll `control_check` and call `control_cancel` themselves —
/// there is no timeout in the device contract itself.
pub fn control_wait(
    session: &Session<'_>,
    device: DeviceHandle,
    job: JobId,
) -> Result<JobStatus> {
    let dev = session.device(device)?;
    let wait = required(dev, |v| v.control_wait, "control_wait")?;
    session.jobs.with_slot(job, |slot| {
        let _guard = dev.lock();
        let code = unsafe { wait(slot.raw) };
        check_status(code, "control_wait")?;
        let mut raw_status: c_int = 0;
        let check = required(dev, |v| v.control_check, "control_check")?;
        let code = unsafe { check(slot.raw, &mut raw_status) };
        check_status(code, "control_check")?;
        let status = device_job_status(raw_status)?;
        slot.status = status;
        Ok(status)
    })
}

/// Retrieves one kind of result data from a `Done` job.
pub fn control_get_data(
    session: &Session<'_>,
    device: DeviceHandle,
    job: JobId,
    result: ResultKind,
) -> Result<Vec<u8>> {
    let dev = session.device(device)?;
    let get_data = required(dev, |v| v.control_get_data, "control_get_data")?;
    session.jobs.with_slot(job, |slot| {
        if slot.status != JobStatus::Done {
            return Err(QdmiError::InvalidArgument(
                "job result is only available once the job is Done".into(),
            ));
        }
        let _guard = dev.lock();
        probe::read_to_vec(|size, value, size_ret| unsafe {
            get_data(slot.raw, result as c_int, size, value, size_ret)
        })
    })
}

/// Frees a job, releasing both the driver's and the device's bookkeeping
/// for it. Idempotent: freeing an already-freed handle is an error, not a
/// crash.
pub fn control_free_job(session: &Session<'_>, device: DeviceHandle, job: JobId) -> Result<()> {
    let dev = session.device(device)?;
    let free = required(dev, |v| v.control_free_job, "control_free_job")?;
    let raw = session.jobs.remove(job)?;
    let _guard = dev.lock();
    let code = unsafe { free(raw) };
    check_status(code, "control_free_job")
}

fn required<T: Copy>(
    dev: &Device,
    select: impl FnOnce(&crate::device::Vtable) -> Option<T>,
    name: &str,
) -> Result<T> {
    select(dev.vtable()).ok_or_else(|| {
        log::debug!(
            "device {} has no {name} symbol",
            dev.library_path().display()
        );
        QdmiError::NotImplemented
    })
}

fn check_status(code: i32, context: &str) -> Result<()> {
    let status = QdmiStatus::from_raw(code);
    if status.is_success() {
        Ok(())
    } else {
        Err(QdmiError::from_status(status, context.into()))
    }
}

fn device_job_status(raw: i32) -> Result<JobStatus> {
    match raw {
        0 => Ok(JobStatus::Submitted),
        1 => Ok(JobStatus::Done),
        2 => Ok(JobStatus::Running),
        3 => Ok(JobStatus::Cancelled),
        other => Err(QdmiError::Fatal(format!(
            "device returned unknown job status {other}"
        ))),
    }
}

impl DeviceHandle {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}
