// SPDX-License-Identifier: Apache-2.0
//! Job handle bookkeeping.
//!
//! A job handle crossing the FFI boundary is an opaque `*mut c_void` owned
//! by the device plugin. The driver never hands that pointer to a client
//! directly; instead each accepted job occupies a generation-tagged slot in
//! the owning [`crate::session::Session`], and the client only ever sees a
//! [`qdmi_abi::JobId`] into that table. A handle from a freed or foreign
//! slot is rejected with `InvalidArgument`/`NotFound` instead of being
//! dereferenced.

use std::ffi::c_void;
use std::sync::Mutex;

use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::properties::JobStatus;
use qdmi_abi::JobId;

/// One live job: which device created it, the device's raw handle for it,
/// and the last status this crate observed (`Created` until submitted).
pub(crate) struct JobSlot {
    pub device_index: usize,
    pub raw: *mut c_void,
    pub status: JobStatus,
    generation: u64,
}

// SAFETY: `raw` is only ever passed back into the owning device's own
// vtable, under that device's `call_lock`; we never dereference it.
unsafe impl Send for JobSlot {}

/// A table of live job slots for one session, indexed by [`JobId`].
#[derive(Default)]
pub(crate) struct JobTable {
    slots: Mutex<Vec<Option<JobSlot>>>,
    next_generation: Mutex<u64>,
}

impl JobTable {
    pub fn insert(&self, device_index: usize, raw: *mut c_void) -> JobId {
        let mut generation_guard = self.next_generation.lock().unwrap_or_else(|e| e.into_inner());
        let generation = *generation_guard;
        *generation_guard += 1;
        drop(generation_guard);

        let slot = JobSlot {
            device_index,
            raw,
            status: JobStatus::Created,
            generation,
        };
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        for (index, existing) in slots.iter_mut().enumerate() {
            if existing.is_none() {
                *existing = Some(slot);
                return JobId::new(index, generation);
            }
        }
        slots.push(Some(slot));
        JobId::new(slots.len() - 1, generation)
    }

    pub fn with_slot<R>(&self, id: JobId, f: impl FnOnce(&mut JobSlot) -> Result<R>) -> Result<R> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots
            .get_mut(id.index)
            .and_then(|s| s.as_mut())
            .filter(|s| s.generation == id.generation)
            .ok_or_else(|| QdmiError::NotFound(format!("job handle {id:?} is stale or unknown")))?;
        f(slot)
    }

    /// Removes the slot, returning its raw device handle so the caller can
    /// run `control_free_job` on it.
    pub fn remove(&self, id: JobId) -> Result<*mut c_void> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let slot = slots
            .get_mut(id.index)
            .ok_or_else(|| QdmiError::NotFound(format!("job handle {id:?} is unknown")))?;
        match slot {
            Some(s) if s.generation == id.generation => {
                let raw = s.raw;
                *slot = None;
                Ok(raw)
            }
            _ => Err(QdmiError::NotFound(format!(
                "job handle {id:?} is stale or unknown"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handle_after_removal_is_rejected() {
        let table = JobTable::default();
        let id = table.insert(0, std::ptr::null_mut());
        table.remove(id).unwrap();
        assert!(table.with_slot(id, |_| Ok(())).is_err());
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let table = JobTable::default();
        let first = table.insert(0, std::ptr::null_mut());
        table.remove(first).unwrap();
        let second = table.insert(0, std::ptr::null_mut());
        assert_eq!(first.index, second.index);
        assert_ne!(first.generation, second.generation);
        assert!(table.with_slot(first, |_| Ok(())).is_err());
        assert!(table.with_slot(second, |_| Ok(())).is_ok());
    }
}
