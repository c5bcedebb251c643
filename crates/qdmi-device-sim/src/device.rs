// SPDX-License-Identifier: Apache-2.0
//! The reference device's identity, status, and property data — the safe,
//! in-process counterpart to what [`crate::ffi`] exposes across the C ABI.

use qdmi_abi::properties::DeviceStatus;

use crate::topology::{self, NUM_QUBITS};

pub const DEVICE_NAME: &str = "Device with 5 qubits";
pub const DEVICE_VERSION: &str = "0.1.0";
pub const LIBRARY_VERSION: &str = "1.0.0b1";
pub const GATE_SET: [&str; 4] = ["rx", "ry", "rz", "cx"];

// T1 >= T2, matching the usual relaxation/dephasing relationship.
pub const SITE_T1_US: f64 = 100.0;
pub const SITE_T2_US: f64 = 50.0;

pub const SINGLE_QUBIT_DURATION_US: f64 = 0.01;
pub const SINGLE_QUBIT_FIDELITY: f64 = 0.999;

/// The reference device's mutable state: only its own operating status.
/// Everything else (name, topology, gate set) is fixed data.
pub struct SimDevice {
    status: DeviceStatus,
}

impl Default for SimDevice {
    fn default() -> Self {
        Self {
            status: DeviceStatus::Offline,
        }
    }
}

impl SimDevice {
    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn set_status(&mut self, status: DeviceStatus) {
        self.status = status;
    }

    pub fn initialize(&mut self) {
        self.status = DeviceStatus::Idle;
    }

    pub fn finalize(&mut self) {
        self.status = DeviceStatus::Offline;
    }

    pub fn num_sites(&self) -> usize {
        NUM_QUBITS
    }

    pub fn num_operations(&self) -> usize {
        GATE_SET.len()
    }

    pub fn operation_name(&self, index: usize) -> Option<&'static str> {
        GATE_SET.get(index).copied()
    }

    pub fn operation_qubits_num(&self, index: usize) -> Option<usize> {
        self.operation_name(index).map(|name| if name == "cx" { 2 } else { 1 })
    }

    pub fn coupling_map(&self) -> Vec<i32> {
        topology::flattened_coupling_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_offline_and_initializes_to_idle() {
        let mut device = SimDevice::default();
        assert_eq!(device.status(), DeviceStatus::Offline);
        device.initialize();
        assert_eq!(device.status(), DeviceStatus::Idle);
    }

    #[test]
    fn cx_is_the_only_two_qubit_operation() {
        let device = SimDevice::default();
        for i in 0..device.num_operations() {
            let expected = if device.operation_name(i) == Some("cx") { 2 } else { 1 };
            assert_eq!(device.operation_qubits_num(i), Some(expected));
        }
    }
}
