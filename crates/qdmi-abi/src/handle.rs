// SPDX-License-Identifier: Apache-2.0
//! Opaque handle newtypes.
//!
//! Across the C ABI a site, operation, or job is an opaque `void*`. On the
//! driver side we never dereference those pointers directly; each one is
//! immediately wrapped into a plain index into a driver-owned table. A
//! client that hangs onto a stale handle gets `NotFound`/`InvalidArgument`
//! on next use instead of a dangling-pointer dereference.

/// Identifies one site (qubit slot) within a device's site list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub usize);

/// Identifies one operation (gate) within a device's operation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub usize);

/// Identifies a job within a session. Carries a generation counter so a
/// freed-and-reused slot cannot be mistaken for the job that previously
/// occupied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId {
    pub index: usize,
    pub generation: u64,
}

impl JobId {
    pub fn new(index: usize, generation: u64) -> Self {
        Self { index, generation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_with_different_generations_are_not_equal() {
        assert_ne!(JobId::new(0, 0), JobId::new(0, 1));
    }

    #[test]
    fn site_ids_order_by_index() {
        assert!(SiteId(0) < SiteId(1));
    }
}
