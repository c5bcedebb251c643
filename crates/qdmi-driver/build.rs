// SPDX-License-Identifier: Apache-2.0
//! Compiles the reference C test device used by `tests/driver_integration.rs`
//! into a shared library by shelling out to the system `cc`, rather than
//! taking a build-dependency on the `cc` crate.

use std::env;
use std::path::PathBuf;
use std::process::Command;

fn main() {
    let source = "tests/support/reference_device.c";
    println!("cargo:rerun-if-changed={source}");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let ext = if cfg!(target_os = "macos") { "dylib" } else { "so" };
    let output = out_dir.join(format!("libreference_device.{ext}"));

    let status = Command::new("cc")
        .args(["-shared", "-fPIC", "-o"])
        .arg(&output)
        .arg(source)
        .args(["-Wall", "-Wextra", "-O2"])
        .status()
        .expect("failed to invoke `cc` to build the reference test device");
    assert!(status.success(), "building the reference test device failed");

    println!(
        "cargo:rustc-env=REFERENCE_DEVICE_PATH={}",
        output.display()
    );
}
