use std::ffi::c_void;
use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::args::{bytes_arg, bytes_out_arg, store};
use crate::error;
use crate::sink::CallbackSink;

/// Output callback for [`nljson_decode_nla_cb`]: receives one attribute
/// record per call and returns 0 or a negative errno.
pub type NljsonDecodeCb =
    Option<unsafe extern "C" fn(buf: *const c_void, size: usize, data: *mut c_void) -> c_int>;

/// Decode the first JSON document in `input` into the attribute stream
/// `nla_stream`. Bytes after the document are left unconsumed.
///
/// Returns `-EAGAIN` when `input` ends before the document does.
///
/// # Safety
/// `input` must be readable for `input_len` bytes and `nla_stream` writable
/// for `nla_stream_len` bytes. `bytes_consumed` and `bytes_produced` must be
/// null or writable.
#[no_mangle]
pub unsafe extern "C" fn nljson_decode_nla(
    input: *const c_char,
    input_len: usize,
    nla_stream: *mut u8,
    nla_stream_len: usize,
    bytes_consumed: *mut usize,
    bytes_produced: *mut usize,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe {
            store(bytes_consumed, 0);
            store(bytes_produced, 0);
        }

        let json = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_arg(input.cast(), input_len, "input") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };
        let out = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_out_arg(nla_stream, nla_stream_len, "nla_stream") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };

        match nljson_codec::decode(json, out) {
            Ok(progress) => {
                // SAFETY: Out-pointers are null or writable per the caller contract.
                unsafe {
                    store(bytes_consumed, progress.consumed);
                    store(bytes_produced, progress.produced);
                }
                0
            }
            Err(err) => error::map_codec_error(&err),
        }
    })
}

/// Like [`nljson_decode_nla`] but returns a newly allocated buffer of
/// `*bytes_produced` bytes. Release it with `nljson_free_nla`.
///
/// Returns null on error, and also for a document with no attributes; in
/// that case `nljson_last_error()` is empty.
///
/// # Safety
/// Same contract as [`nljson_decode_nla`] minus the output buffer.
#[no_mangle]
pub unsafe extern "C" fn nljson_decode_nla_alloc(
    input: *const c_char,
    input_len: usize,
    bytes_consumed: *mut usize,
    bytes_produced: *mut usize,
) -> *mut u8 {
    crate::ffi_boundary(ptr::null_mut(), || {
        error::clear_error_state();
        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe {
            store(bytes_consumed, 0);
            store(bytes_produced, 0);
        }

        let json = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_arg(input.cast(), input_len, "input") } {
                Some(v) => v,
                None => return ptr::null_mut(),
            }
        };

        let decoded = match nljson_codec::decode_alloc(json) {
            Ok(decoded) => decoded,
            Err(err) => {
                let _ = error::map_codec_error(&err);
                return ptr::null_mut();
            }
        };

        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe {
            store(bytes_consumed, decoded.consumed);
            store(bytes_produced, decoded.produced());
        }

        if decoded.output.is_empty() {
            return ptr::null_mut();
        }
        let boxed: Box<[u8]> = decoded.output.to_vec().into_boxed_slice();
        Box::into_raw(boxed) as *mut u8
    })
}

/// Like [`nljson_decode_nla`] but hands each encoded attribute record to
/// `decode_cb`. Nothing is emitted unless the whole document decodes.
///
/// # Safety
/// Same contract as [`nljson_decode_nla`] minus the output buffer;
/// `decode_cb` must be safe to call with `cb_data`.
#[no_mangle]
pub unsafe extern "C" fn nljson_decode_nla_cb(
    input: *const c_char,
    input_len: usize,
    bytes_consumed: *mut usize,
    decode_cb: NljsonDecodeCb,
    cb_data: *mut c_void,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe { store(bytes_consumed, 0) };

        let Some(emit) = decode_cb else {
            return error::set_invalid_argument("decode_cb cannot be null");
        };
        let json = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_arg(input.cast(), input_len, "input") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };

        let sink = CallbackSink::new(|record: &[u8]| {
            // SAFETY: `record` is valid for the duration of the call.
            unsafe { emit(record.as_ptr().cast(), record.len(), cb_data) }
        });
        match nljson_codec::decode_to(json, sink) {
            Ok(progress) => {
                // SAFETY: Out-pointers are null or writable per the caller contract.
                unsafe { store(bytes_consumed, progress.consumed) };
                0
            }
            Err(err) => error::map_codec_error(&err),
        }
    })
}

/// Release a buffer returned by [`nljson_decode_nla_alloc`].
///
/// # Safety
/// `nla_stream` must be null or a pointer returned by
/// `nljson_decode_nla_alloc` together with the `*bytes_produced` it
/// reported, and must not have been freed.
#[no_mangle]
pub unsafe extern "C" fn nljson_free_nla(nla_stream: *mut u8, len: usize) {
    crate::ffi_boundary((), || {
        if nla_stream.is_null() {
            return;
        }
        let slice_ptr = ptr::slice_from_raw_parts_mut(nla_stream, len);
        // SAFETY: The buffer was allocated as `Box<[u8]>` in `nljson_decode_nla_alloc`.
        unsafe { drop(Box::from_raw(slice_ptr)) };
    });
}
