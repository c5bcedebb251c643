// SPDX-License-Identifier: Apache-2.0
//! The size-probe/fill protocol, generalized over raw byte buffers.
//!
//! Every variable-length device output (a property value, a job result)
//! follows the same two-call shape: call once with `size == 0` and a null
//! buffer to learn the required size, then call again with a buffer of that
//! size. [`probe_len`] and [`fill`] expose this 1:1; [`read_to_vec`] is a
//! convenience built strictly on top of both, for callers that don't need
//! bounded-memory behavior.

use qdmi_abi::error::{QdmiError, Result};
use qdmi_abi::status::QdmiStatus;
use std::ffi::c_void;

/// Calls `probe` with a null buffer and returns the required size in bytes.
pub fn probe_len(probe: impl FnOnce(usize, *mut c_void, *mut usize) -> i32) -> Result<usize> {
    let mut size_ret: usize = 0;
    let code = probe(0, std::ptr::null_mut(), &mut size_ret);
    let status = QdmiStatus::from_raw(code);
    if status.is_success() {
        Ok(size_ret)
    } else {
        Err(QdmiError::from_status(status, "probing size".into()))
    }
}

/// Calls `fill` with the given buffer, requiring it be at least as large
/// as the device reports needing, and returns the number of bytes written.
pub fn fill(
    buf: &mut [u8],
    call: impl FnOnce(usize, *mut c_void, *mut usize) -> i32,
) -> Result<usize> {
    let mut size_ret: usize = 0;
    let code = call(buf.len(), buf.as_mut_ptr() as *mut c_void, &mut size_ret);
    let status = QdmiStatus::from_raw(code);
    if !status.is_success() {
        return Err(QdmiError::from_status(status, "filling buffer".into()));
    }
    if size_ret > buf.len() {
        return Err(QdmiError::InvalidArgument(format!(
            "buffer too small: need {size_ret}, have {}",
            buf.len()
        )));
    }
    Ok(size_ret)
}

/// Probes for the required size, allocates exactly that many bytes, then
/// fills — the convenience path for callers that just want the bytes.
pub fn read_to_vec(
    mut call: impl FnMut(usize, *mut c_void, *mut usize) -> i32,
) -> Result<Vec<u8>> {
    let needed = probe_len(&mut call)?;
    if needed == 0 {
        return Ok(Vec::new());
    }
    let mut buf = vec![0u8; needed];
    let written = fill(&mut buf, &mut call)?;
    buf.truncate(written);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn read_to_vec_matches_probed_size() {
        let payload = b"hello".to_vec();
        let calls = Cell::new(0);
        let bytes = read_to_vec(|size, value, size_ret| {
            calls.set(calls.get() + 1);
            unsafe { *size_ret = payload.len() };
            if size == 0 || value.is_null() {
                return 0;
            }
            assert!(size >= payload.len());
            unsafe {
                std::ptr::copy_nonoverlapping(payload.as_ptr(), value as *mut u8, payload.len());
            }
            0
        })
        .unwrap();
        assert_eq!(bytes, payload);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn read_to_vec_empty_skips_fill_call() {
        let calls = Cell::new(0);
        let bytes = read_to_vec(|_size, _value, size_ret| {
            calls.set(calls.get() + 1);
            unsafe { *size_ret = 0 };
            0
        })
        .unwrap();
        assert!(bytes.is_empty());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fill_rejects_undersized_buffer() {
        let mut buf = [0u8; 2];
        let err = fill(&mut buf, |_size, _value, size_ret| {
            unsafe { *size_ret = 10 };
            0
        })
        .unwrap_err();
        assert!(matches!(err, QdmiError::InvalidArgument(_)));
    }
}
