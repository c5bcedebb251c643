// SPDX-License-Identifier: Apache-2.0
//! A session: a snapshot of the driver's device list, plus the job table
//! for jobs created through it.
//!
//! Grounded on `QDMI_session_alloc` in `driver.h`: opening a session hands
//! the caller the full device list as it stood at open time, following the
//! probe/fill convention for `enumerate_devices` even though — unlike the
//! FFI original — it can't actually fail partway through an in-process
//! `Vec` copy.

use qdmi_abi::error::{QdmiError, Result};

use crate::device::Device;
use crate::driver::Driver;
use crate::job::JobTable;

/// Identifies one device within a session's device list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(pub(crate) usize);

/// A session over a driver's device list, opened via
/// [`Driver::open_session`].
pub struct Session<'d> {
    driver: &'d Driver,
    pub(crate) jobs: JobTable,
}

impl<'d> Session<'d> {
    pub(crate) fn new(driver: &'d Driver) -> Self {
        Self {
            driver,
            jobs: JobTable::default(),
        }
    }

    /// The number of devices visible to this session.
    pub fn num_devices(&self) -> usize {
        self.driver.num_devices()
    }

    /// All devices visible to this session, as an iterator over handles.
    pub fn devices(&self) -> impl Iterator<Item = DeviceHandle> + '_ {
        (0..self.driver.num_devices()).map(DeviceHandle)
    }

    /// Probe/fill-style enumeration: call with an empty buffer to learn how
    /// many devices exist, then again with a buffer of that size to fill it.
    pub fn enumerate_devices(&self, out: &mut [DeviceHandle]) -> Result<usize> {
        let count = self.driver.num_devices();
        if out.is_empty() {
            return Ok(count);
        }
        if out.len() < count {
            return Err(QdmiError::InvalidArgument(format!(
                "buffer holds {} devices, need {count}",
                out.len()
            )));
        }
        for (index, slot) in out.iter_mut().enumerate().take(count) {
            *slot = DeviceHandle(index);
        }
        Ok(count)
    }

    pub(crate) fn device(&self, handle: DeviceHandle) -> Result<&Device> {
        self.driver
            .devices()
            .get(handle.0)
            .ok_or_else(|| QdmiError::InvalidArgument(format!("unknown device handle {handle:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn enumerate_devices_probe_then_fill_agree() {
        let driver = Driver::init(&Config::default()).unwrap();
        let session = driver.open_session();
        let mut empty: [DeviceHandle; 0] = [];
        let probed = session.enumerate_devices(&mut empty).unwrap();
        assert_eq!(probed, 0);
    }
}
