// SPDX-License-Identifier: Apache-2.0
//! QDMI driver: discovers device plugins from a config file, loads them as
//! dynamic libraries, and dispatches calls through a per-device vtable.
//!
//! ```text
//!   qdmi.conf ──► Config::load ──► Loader::load_all ──► Driver { devices }
//!                                                             │
//!                                               Session::open(&driver)
//!                                                             │
//!                                    client::{query_*, control_*}(session, ..)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use qdmi_driver::{config::Config, Driver};
//!
//! let config = Config::load_from_env()?;
//! let driver = Driver::init(&config)?;
//! let session = driver.open_session();
//! for device in session.devices() {
//!     println!("{}", device.library_path());
//! }
//! # Ok::<(), qdmi_abi::QdmiError>(())
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod driver;
pub mod ffi;
pub mod job;
pub mod loader;
pub mod probe;
pub mod session;

pub use driver::Driver;
pub use session::{DeviceHandle, Session};
