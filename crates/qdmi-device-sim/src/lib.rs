// SPDX-License-Identifier: Apache-2.0
//! Reference QDMI device: a 5-qubit ring-topology statevector simulator.
//!
//! This crate is usable two ways:
//!
//! - In-process, as a safe `SimDevice` (see [`device`]) — handy for unit
//!   tests that want the reference device's behavior without going through
//!   `dlopen`.
//! - As a `cdylib` exporting the `QDMI_*_dev` C ABI (see [`ffi`]), so
//!   `qdmi-driver` can load it exactly like any third-party plugin.
//!
//! Topology: five qubits in a ring, `0-1-2-3-4-0`. Native gates: `rx`, `ry`,
//! `rz` (single-qubit) and `cx` (two-qubit, directional, one physical
//! coupling per ring edge).

pub mod circuit;
pub mod device;
pub mod ffi;
pub mod job;
pub mod topology;

pub use device::SimDevice;
