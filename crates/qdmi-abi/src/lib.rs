// SPDX-License-Identifier: Apache-2.0
//! Wire-level types shared by every QDMI component.
//!
//! ```text
//!  ┌─────────────┐      ┌──────────────┐      ┌────────────────┐
//!  │ qdmi-driver │◄────►│   qdmi-abi   │◄────►│ qdmi-device-sim │
//!  │ (loader,    │      │ (status,     │      │ (plugin, cdylib)│
//!  │  dispatch)  │      │  properties, │      │                 │
//!  └─────────────┘      │  handles)    │      └─────────────────┘
//!                       └──────────────┘
//! ```
//!
//! This crate has no I/O and does not link against `libloading`: it only
//! defines the vocabulary both sides of the FFI boundary agree on — status
//! codes, property/format/result enums, and the opaque handle newtypes. The
//! numeric values of every `#[repr(i32)]` enum here are part of the ABI and
//! must not change.

pub mod error;
pub mod handle;
pub mod properties;
pub mod status;

pub use error::{QdmiError, Result};
pub use handle::{JobId, OperationId, SiteId};
pub use status::QdmiStatus;
