// SPDX-License-Identifier: Apache-2.0
//! Property, format, and job enums shared across the device ABI.
//!
//! Numeric values for `DeviceProperty`, `DeviceStatus`, `SiteProperty`,
//! `OperationProperty`, and `DeviceMode` mirror the historical QDMI C enums
//! 1:1. `JobStatus` adds a `Created` variant (value 4, after the historical
//! range) for the pre-submission state this rewrite's job lifecycle
//! requires; devices report `Submitted`/`Running`/`Done`/`Cancelled` exactly
//! as before.

/// A property queryable via `query_device_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DeviceProperty {
    Name = 0,
    DeviceVersion = 1,
    DeviceStatus = 2,
    LibraryVersion = 3,
    QubitsNum = 4,
    CouplingMap = 5,
    GateSet = 6,
}

/// The device's own operating status, returned as the value of
/// [`DeviceProperty::DeviceStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DeviceStatus {
    Offline = 0,
    Idle = 1,
    Busy = 2,
    Error = 3,
    Maintenance = 4,
    Calibration = 5,
}

impl DeviceStatus {
    pub fn from_raw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Offline,
            1 => Self::Idle,
            2 => Self::Busy,
            3 => Self::Error,
            4 => Self::Maintenance,
            5 => Self::Calibration,
            _ => return None,
        })
    }
}

/// A property queryable via `query_site_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SiteProperty {
    T1 = 0,
    T2 = 1,
}

/// A property queryable via `query_operation_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OperationProperty {
    Name = 0,
    QubitsNum = 1,
    Duration = 2,
    Fidelity = 3,
}

/// Read/write mode a device is opened in, set per config-file entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DeviceMode {
    ReadOnly = 0,
    ReadWrite = 1,
}

/// A submitted program's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ProgramFormat {
    Qasm2 = 0,
    QirString = 1,
    QirModule = 2,
}

/// The job lifecycle state machine.
///
/// `Created` is pre-submission; the rest mirror the device-reported status
/// 1:1. A job moves `Created -> Submitted -> Running -> {Done, Cancelled}`,
/// and `Cancelled` is also reachable from `Submitted`/`Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum JobStatus {
    Submitted = 0,
    Done = 1,
    Running = 2,
    Cancelled = 3,
    Created = 4,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

/// A settable job parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum JobParameter {
    ShotsNum = 0,
}

/// The kind of result retrievable from a finished job via
/// `control_get_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultKind {
    Shots = 0,
    HistKeys = 1,
    HistValues = 2,
    StateVectorDense = 3,
    StateVectorSparseKeys = 4,
    StateVectorSparseValues = 5,
    ProbabilitiesDense = 6,
    ProbabilitiesSparseKeys = 7,
    ProbabilitiesSparseValues = 8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_status_from_raw_rejects_unknown() {
        assert_eq!(DeviceStatus::from_raw(99), None);
        assert_eq!(DeviceStatus::from_raw(1), Some(DeviceStatus::Idle));
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Created.is_terminal());
    }
}
