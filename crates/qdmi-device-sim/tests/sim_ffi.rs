// SPDX-License-Identifier: Apache-2.0
//! Drives the reference device's own exported C ABI in-process (no
//! `dlopen` involved — this crate is also usable as an ordinary `rlib`).
//! Covers the result kinds the driver's C test device intentionally
//! leaves unimplemented: histograms, state vectors, probabilities.

use std::ffi::c_void;
use std::sync::Mutex;

use qdmi_device_sim::ffi::*;

// The device is process-wide global state; serialize tests against it.
static LOCK: Mutex<()> = Mutex::new(());

fn probe_and_fill<F: Fn(usize, *mut c_void, *mut usize) -> i32>(call: F) -> Vec<u8> {
    let mut needed: usize = 0;
    assert_eq!(call(0, std::ptr::null_mut(), &mut needed), 0);
    if needed == 0 {
        return Vec::new();
    }
    let mut buf = vec![0u8; needed];
    let mut filled: usize = 0;
    assert_eq!(call(buf.len(), buf.as_mut_ptr() as *mut c_void, &mut filled), 0);
    buf.truncate(filled);
    buf
}

fn bell_pair_job() -> *mut c_void {
    let program = b"h q[0];\ncx q[0],q[1];";
    let mut job: *mut c_void = std::ptr::null_mut();
    let code = unsafe {
        QDMI_control_create_job_dev(0, program.len(), program.as_ptr() as *const c_void, &mut job)
    };
    assert_eq!(code, 0);
    job
}

#[test]
fn bell_pair_statevector_has_two_equal_weight_amplitudes() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(unsafe { QDMI_initialize_dev() }, 0);

    let job = bell_pair_job();
    let shots: u64 = 4;
    unsafe {
        QDMI_control_set_parameter_dev(job, 0, 8, shots.to_ne_bytes().as_ptr() as *const c_void);
    }
    assert_eq!(unsafe { QDMI_control_submit_job_dev(job) }, 0);
    assert_eq!(unsafe { QDMI_control_wait_dev(job) }, 0);

    let probs_bytes =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 6, size, value, size_ret) });
    let probs: Vec<f64> = probs_bytes
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(probs.len(), 32); // 2^5 device qubits
    let total: f64 = probs.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
    let nonzero = probs.iter().filter(|p| **p > 1e-9).count();
    assert_eq!(nonzero, 2);

    let shots_bytes =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 0, size, value, size_ret) });
    let text = std::str::from_utf8(&shots_bytes).unwrap();
    assert_eq!(text.split(',').count(), shots as usize);

    assert_eq!(unsafe { QDMI_control_free_job_dev(job) }, 0);
    assert_eq!(unsafe { QDMI_finalize_dev() }, 0);
}

#[test]
fn sparse_and_dense_probabilities_agree() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(unsafe { QDMI_initialize_dev() }, 0);

    let job = bell_pair_job();
    assert_eq!(unsafe { QDMI_control_submit_job_dev(job) }, 0);
    assert_eq!(unsafe { QDMI_control_wait_dev(job) }, 0);

    let dense =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 6, size, value, size_ret) });
    let dense: Vec<f64> = dense
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect();

    let sparse_keys =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 7, size, value, size_ret) });
    let sparse_values =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 8, size, value, size_ret) });
    let keys: Vec<u64> = sparse_keys
        .chunks_exact(8)
        .map(|c| u64::from_ne_bytes(c.try_into().unwrap()))
        .collect();
    let values: Vec<f64> = sparse_values
        .chunks_exact(8)
        .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
        .collect();

    for (key, value) in keys.iter().zip(values.iter()) {
        assert!((dense[*key as usize] - value).abs() < 1e-9);
    }

    assert_eq!(unsafe { QDMI_control_free_job_dev(job) }, 0);
    assert_eq!(unsafe { QDMI_finalize_dev() }, 0);
}

#[test]
fn histogram_keys_and_values_cover_all_shots() {
    let _guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(unsafe { QDMI_initialize_dev() }, 0);

    let job = bell_pair_job();
    let shots: u64 = 50;
    unsafe {
        QDMI_control_set_parameter_dev(job, 0, 8, shots.to_ne_bytes().as_ptr() as *const c_void);
    }
    assert_eq!(unsafe { QDMI_control_submit_job_dev(job) }, 0);
    assert_eq!(unsafe { QDMI_control_wait_dev(job) }, 0);

    let keys =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 1, size, value, size_ret) });
    let values =
        probe_and_fill(|size, value, size_ret| unsafe { QDMI_control_get_data_dev(job, 2, size, value, size_ret) });
    assert_eq!(keys.len() % 5, 0);
    let num_keys = keys.len() / 5;
    assert_eq!(values.len(), num_keys * 8);
    let total: u64 = values
        .chunks_exact(8)
        .map(|c| u64::from_ne_bytes(c.try_into().unwrap()))
        .sum();
    assert_eq!(total, shots);

    assert_eq!(unsafe { QDMI_control_free_job_dev(job) }, 0);
    assert_eq!(unsafe { QDMI_finalize_dev() }, 0);
}
