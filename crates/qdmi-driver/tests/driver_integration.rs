// SPDX-License-Identifier: Apache-2.0
//! End-to-end tests driving the real `dlopen`/dispatch path against the
//! reference C test device built by `build.rs`, covering discovery,
//! property queries, mode enforcement, and the full job lifecycle.

use std::io::Write;
use std::sync::Mutex;

// `Config::load` reads the process-wide `$HOME` env var; serialize tests
// that override it so they can't race each other.
static HOME_ENV_LOCK: Mutex<()> = Mutex::new(());

use qdmi_abi::properties::{DeviceProperty, JobParameter, JobStatus, ProgramFormat, ResultKind, SiteProperty};
use qdmi_abi::{OperationId, SiteId};
use qdmi_driver::client;
use qdmi_driver::config::Config;
use qdmi_driver::Driver;

fn reference_device_path() -> &'static str {
    env!("REFERENCE_DEVICE_PATH")
}

fn write_conf(dir: &tempfile::TempDir, mode: &str) -> std::path::PathBuf {
    // Config-referenced paths must live under cwd or $HOME (see
    // `config::is_path_allowed`); copy the build-script-compiled device
    // into the session's temp `$HOME` rather than pointing at OUT_DIR.
    let local_copy = dir.path().join("libreference_device.so");
    std::fs::copy(reference_device_path(), &local_copy).unwrap();

    let conf_path = dir.path().join("qdmi.conf");
    let mut f = std::fs::File::create(&conf_path).unwrap();
    writeln!(f, "{} {}", local_copy.display(), mode).unwrap();
    conf_path
}

fn init_driver(mode: &str) -> (tempfile::TempDir, Driver) {
    let _guard = HOME_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let conf_path = write_conf(&dir, mode);
    std::env::set_var("HOME", dir.path());
    let config = Config::load(&conf_path).unwrap();
    let driver = Driver::init(&config).unwrap();
    (dir, driver)
}

#[test]
fn load_reference_device_read_write() {
    let (_dir, driver) = init_driver("read_write");
    assert_eq!(driver.num_devices(), 1);
}

#[test]
fn load_nonexistent_device_is_skipped_not_fatal() {
    let config = Config::parse("/definitely/not/a/real/path.so read_only\n");
    let driver = Driver::init(&config).unwrap();
    assert_eq!(driver.num_devices(), 0);
}

#[test]
fn query_device_name_version_and_qubit_count() {
    let (_dir, driver) = init_driver("read_only");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let name = client::query_device_property(&session, device, DeviceProperty::Name as i32).unwrap();
    assert_eq!(std::str::from_utf8(&name[..name.len() - 1]).unwrap(), "Device with 5 qubits");

    let version =
        client::query_device_property(&session, device, DeviceProperty::DeviceVersion as i32)
            .unwrap();
    assert_eq!(std::str::from_utf8(&version[..version.len() - 1]).unwrap(), "0.1.0");

    let qubits =
        client::query_device_property(&session, device, DeviceProperty::QubitsNum as i32).unwrap();
    assert_eq!(i32::from_ne_bytes(qubits.try_into().unwrap()), 5);
}

#[test]
fn probe_then_fill_agree_for_coupling_map() {
    let (_dir, driver) = init_driver("read_only");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let map = client::query_device_property(&session, device, DeviceProperty::CouplingMap as i32)
        .unwrap();
    // 10 directed edges * 2 ints * 4 bytes.
    assert_eq!(map.len(), 10 * 2 * 4);
}

#[test]
fn site_properties_t1_is_not_less_than_t2() {
    let (_dir, driver) = init_driver("read_only");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    for site in 0..5 {
        let t1 = client::query_site_property(&session, device, SiteId(site), SiteProperty::T1 as i32)
            .unwrap();
        let t2 = client::query_site_property(&session, device, SiteId(site), SiteProperty::T2 as i32)
            .unwrap();
        let t1 = f64::from_ne_bytes(t1.try_into().unwrap());
        let t2 = f64::from_ne_bytes(t2.try_into().unwrap());
        assert!(t1 >= t2);
    }
}

#[test]
fn operation_fidelity_is_in_unit_interval_for_adjacent_sites() {
    let (_dir, driver) = init_driver("read_only");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    // Operation index 3 is `cx` (rx, ry, rz, cx).
    let fidelity = client::query_operation_property(
        &session,
        device,
        OperationId(3),
        &[SiteId(0), SiteId(1)],
        qdmi_abi::properties::OperationProperty::Fidelity as i32,
    )
    .unwrap();
    let fidelity = f64::from_ne_bytes(fidelity.try_into().unwrap());
    assert!((0.0..=1.0).contains(&fidelity));
}

#[test]
fn disconnected_sites_reject_cx_fidelity_query() {
    let (_dir, driver) = init_driver("read_only");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let err = client::query_operation_property(
        &session,
        device,
        OperationId(3),
        &[SiteId(0), SiteId(2)],
        qdmi_abi::properties::OperationProperty::Fidelity as i32,
    )
    .unwrap_err();
    assert!(matches!(err, qdmi_abi::QdmiError::InvalidArgument(_)));
}

#[test]
fn read_only_device_rejects_job_creation() {
    let (_dir, driver) = init_driver("read_only");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let err = client::control_create_job(&session, device, ProgramFormat::Qasm2, b"h q[0];")
        .unwrap_err();
    assert!(matches!(err, qdmi_abi::QdmiError::PermissionDenied(_)));
}

#[test]
fn end_to_end_job_lifecycle_reaches_done_and_returns_shots() {
    let (_dir, driver) = init_driver("read_write");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let job =
        client::control_create_job(&session, device, ProgramFormat::Qasm2, b"h q[0];\ncx q[0],q[1];")
            .unwrap();

    let shots: u64 = 10;
    client::control_set_parameter(
        &session,
        device,
        job,
        JobParameter::ShotsNum as i32,
        &shots.to_ne_bytes(),
    )
    .unwrap();

    client::control_submit_job(&session, device, job).unwrap();
    let status = client::control_wait(&session, device, job).unwrap();
    assert_eq!(status, JobStatus::Done);

    let raw = client::control_get_data(&session, device, job, ResultKind::Shots).unwrap();
    let text = std::str::from_utf8(&raw[..raw.len() - 1]).unwrap();
    let bitstrings: Vec<&str> = text.split(',').collect();
    assert_eq!(bitstrings.len(), shots as usize);
    for bs in bitstrings {
        assert_eq!(bs.len(), 5);
        assert!(bs.chars().all(|c| c == '0' || c == '1'));
    }

    client::control_free_job(&session, device, job).unwrap();
}

#[test]
fn cancelling_a_done_job_is_an_error() {
    let (_dir, driver) = init_driver("read_write");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let job = client::control_create_job(&session, device, ProgramFormat::Qasm2, b"h q[0];").unwrap();
    client::control_submit_job(&session, device, job).unwrap();
    client::control_wait(&session, device, job).unwrap();
    let err = client::control_cancel(&session, device, job).unwrap_err();
    assert!(matches!(err, qdmi_abi::QdmiError::InvalidArgument(_)));
}

#[test]
fn device_busy_refuses_concurrent_job_creation() {
    let (_dir, driver) = init_driver("read_write");
    let session = driver.open_session();
    let device = session.devices().next().unwrap();

    let _job = client::control_create_job(&session, device, ProgramFormat::Qasm2, b"h q[0];").unwrap();
    let err = client::control_create_job(&session, device, ProgramFormat::Qasm2, b"h q[0];")
        .unwrap_err();
    assert!(matches!(err, qdmi_abi::QdmiError::Fatal(_)));
}
