//! nljson-ffi: C-ABI exports for the nljson codec.
//!
//! Functions return 0 on success or a negative errno (`-EINVAL`, `-ENOMEM`,
//! `-ENOBUFS`, `-EAGAIN` for incomplete input, `-EIO`). The message for the
//! most recent failure on the calling thread is available from
//! [`nljson_last_error`].

mod args;
mod decode;
mod encode;
mod error;
mod handle;
mod sink;

use std::panic::AssertUnwindSafe;

pub use decode::{
    nljson_decode_nla, nljson_decode_nla_alloc, nljson_decode_nla_cb, nljson_free_nla,
    NljsonDecodeCb,
};
pub use encode::{
    nljson_encode_nla, nljson_encode_nla_alloc, nljson_encode_nla_cb, nljson_free_json,
    NljsonEncodeCb,
};
pub use handle::{
    nljson_deinit, nljson_init, nljson_init_cb, nljson_init_file, NljsonHandle, NljsonReadCb,
    NLJSON_FLAG_ADD_TIMESTAMP, NLJSON_FLAG_PRETTY, NLJSON_FLAG_SKIP_UNKNOWN_ATTRS,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Message describing the last failure on this thread, empty after a
/// successful call. Valid until the next nljson call on the same thread.
#[no_mangle]
pub extern "C" fn nljson_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
