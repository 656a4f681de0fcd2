use std::ffi::{c_void, CString};
use std::os::raw::{c_char, c_int};

use crate::args::{bytes_arg, bytes_out_arg, store};
use crate::error;
use crate::handle::{with_handle, NljsonHandle};
use crate::sink::CallbackSink;

/// Output callback for [`nljson_encode_nla_cb`]: receives a chunk of JSON
/// text (not NUL terminated) and returns 0 or a negative errno.
pub type NljsonEncodeCb =
    Option<unsafe extern "C" fn(buf: *const c_char, size: usize, data: *mut c_void) -> c_int>;

/// Encode the complete attributes at the front of `nla_stream` as JSON into
/// `output`. The text is not NUL terminated; its length is stored in
/// `*bytes_produced`. A null `hdl` encodes without a policy.
///
/// # Safety
/// `hdl` must be null or a live handle. `nla_stream` must be readable for
/// `nla_stream_len` bytes and `output` writable for `output_len` bytes.
/// `bytes_consumed` and `bytes_produced` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn nljson_encode_nla(
    hdl: NljsonHandle,
    nla_stream: *const u8,
    nla_stream_len: usize,
    output: *mut c_char,
    output_len: usize,
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

        let nla = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_arg(nla_stream, nla_stream_len, "nla_stream") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };
        let out = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_out_arg(output.cast(), output_len, "output") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };

        with_handle(hdl, |handle| match handle.encode(nla, out) {
            Ok(progress) => {
                // SAFETY: Out-pointers are null or writable per the caller contract.
                unsafe {
                    store(bytes_consumed, progress.consumed);
                    store(bytes_produced, progress.produced);
                }
                0
            }
            Err(err) => error::map_codec_error(&err),
        })
    })
}

/// Like [`nljson_encode_nla`] but returns a newly allocated, NUL-terminated
/// string, or null on error. Release it with `nljson_free_json`.
///
/// # Safety
/// Same contract as [`nljson_encode_nla`] minus the output buffer.
#[no_mangle]
pub unsafe extern "C" fn nljson_encode_nla_alloc(
    hdl: NljsonHandle,
    nla_stream: *const u8,
    nla_stream_len: usize,
    bytes_consumed: *mut usize,
    bytes_produced: *mut usize,
) -> *mut c_char {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();
        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe {
            store(bytes_consumed, 0);
            store(bytes_produced, 0);
        }

        let nla = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_arg(nla_stream, nla_stream_len, "nla_stream") } {
                Some(v) => v,
                None => return std::ptr::null_mut(),
            }
        };

        let encoded = match with_handle(hdl, |handle| handle.encode_alloc(nla)) {
            Ok(encoded) => encoded,
            Err(err) => {
                let _ = error::map_codec_error(&err);
                return std::ptr::null_mut();
            }
        };
        let progress = encoded.progress();
        let Ok(text) = CString::new(encoded.output) else {
            error::set_error_message("encoded JSON contains a NUL byte");
            return std::ptr::null_mut();
        };

        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe {
            store(bytes_consumed, progress.consumed);
            store(bytes_produced, progress.produced);
        }
        text.into_raw()
    })
}

/// Like [`nljson_encode_nla`] but hands the JSON text to `encode_cb` in
/// chunks. Nothing is emitted unless the whole input encodes.
///
/// # Safety
/// Same contract as [`nljson_encode_nla`] minus the output buffer;
/// `encode_cb` must be safe to call with `cb_data`.
#[no_mangle]
pub unsafe extern "C" fn nljson_encode_nla_cb(
    hdl: NljsonHandle,
    nla_stream: *const u8,
    nla_stream_len: usize,
    bytes_consumed: *mut usize,
    encode_cb: NljsonEncodeCb,
    cb_data: *mut c_void,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        // SAFETY: Out-pointers are null or writable per the caller contract.
        unsafe { store(bytes_consumed, 0) };

        let Some(emit) = encode_cb else {
            return error::set_invalid_argument("encode_cb cannot be null");
        };
        let nla = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { bytes_arg(nla_stream, nla_stream_len, "nla_stream") } {
                Some(v) => v,
                None => return -libc::EINVAL,
            }
        };

        let sink = CallbackSink::new(|chunk: &[u8]| {
            // SAFETY: `chunk` is valid for the duration of the call.
            unsafe { emit(chunk.as_ptr().cast(), chunk.len(), cb_data) }
        });
        match with_handle(hdl, |handle| handle.encode_to(nla, sink)) {
            Ok(progress) => {
                // SAFETY: Out-pointers are null or writable per the caller contract.
                unsafe { store(bytes_consumed, progress.consumed) };
                0
            }
            Err(err) => error::map_codec_error(&err),
        }
    })
}

/// Release a string returned by [`nljson_encode_nla_alloc`].
///
/// # Safety
/// `json` must be null or a pointer returned by `nljson_encode_nla_alloc`
/// that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn nljson_free_json(json: *mut c_char) {
    crate::ffi_boundary((), || {
        if json.is_null() {
            return;
        }
        // SAFETY: `json` was produced by `CString::into_raw` in this library.
        unsafe { drop(CString::from_raw(json)) };
    });
}
