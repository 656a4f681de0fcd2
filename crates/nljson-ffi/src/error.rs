use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::{c_char, c_int};

use nljson_codec::CodecError;

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

pub(crate) fn clear_error_state() {
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::default();
    });
}

pub(crate) fn set_error_message(message: impl Into<String>) {
    let sanitized = message.into().replace('\0', "?");
    LAST_ERROR.with(|state| {
        *state.borrow_mut() = CString::new(sanitized).unwrap_or_default();
    });
}

/// Record `message` and return `-EINVAL`.
pub(crate) fn set_invalid_argument(message: impl Into<String>) -> c_int {
    set_error_message(message);
    -libc::EINVAL
}

pub(crate) fn set_panic_error() {
    set_error_message("panic across FFI boundary");
}

/// Record `err` and return its negative errno.
pub(crate) fn map_codec_error(err: &CodecError) -> c_int {
    set_error_message(err.to_string());
    -err.errno()
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|state| state.borrow().as_ptr())
}
