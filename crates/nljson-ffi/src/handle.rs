use std::ffi::c_void;
use std::io::{self, Read};
use std::os::raw::{c_char, c_int};

use nljson_codec::{CodecConfig, Handle};

use crate::args;
use crate::error;

pub type NljsonHandle = *mut c_void;

/// Callback filling `buf` with at most `size` bytes of policy JSON and
/// returning the count written; 0 ends the document.
pub type NljsonReadCb =
    Option<unsafe extern "C" fn(buf: *mut c_void, size: usize, data: *mut c_void) -> usize>;

pub const NLJSON_FLAG_SKIP_UNKNOWN_ATTRS: u32 = 1;
pub const NLJSON_FLAG_ADD_TIMESTAMP: u32 = 1 << 1;
pub const NLJSON_FLAG_PRETTY: u32 = 1 << 2;

const KNOWN_FLAGS: u32 =
    NLJSON_FLAG_SKIP_UNKNOWN_ATTRS | NLJSON_FLAG_ADD_TIMESTAMP | NLJSON_FLAG_PRETTY;

fn config_from_flags(flags: u32) -> Option<CodecConfig> {
    let unknown = flags & !KNOWN_FLAGS;
    if unknown != 0 {
        let _ = error::set_invalid_argument(format!("unknown flag bits {unknown:#x}"));
        return None;
    }
    Some(CodecConfig {
        skip_unknown_attrs: flags & NLJSON_FLAG_SKIP_UNKNOWN_ATTRS != 0,
        add_timestamp: flags & NLJSON_FLAG_ADD_TIMESTAMP != 0,
        pretty: flags & NLJSON_FLAG_PRETTY != 0,
    })
}

/// Shared body of the init family: validate arguments, build, publish.
fn init_with(
    hdl: *mut NljsonHandle,
    flags: u32,
    build: impl FnOnce(CodecConfig) -> Option<nljson_codec::Result<Handle>>,
) -> c_int {
    if hdl.is_null() {
        return error::set_invalid_argument("hdl cannot be null");
    }
    let Some(config) = config_from_flags(flags) else {
        return -libc::EINVAL;
    };

    let handle = match build(config) {
        None => return -libc::EINVAL,
        Some(Ok(handle)) => handle,
        Some(Err(err)) => return error::map_codec_error(&err),
    };

    // SAFETY: `hdl` is non-null and points to caller-owned storage.
    unsafe { hdl.write(Box::into_raw(Box::new(handle)) as NljsonHandle) };
    0
}

/// Create a handle from policy JSON text. A null `policy_json` creates a
/// handle without a policy.
///
/// # Safety
/// `hdl` must be valid for writes. `policy_json` must be null or a valid
/// NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn nljson_init(
    hdl: *mut NljsonHandle,
    flags: u32,
    policy_json: *const c_char,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        init_with(hdl, flags, |config| {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { args::optional_str_arg(policy_json, "policy_json") } {
                Err(()) => None,
                Ok(None) => Some(Ok(Handle::new(None, config))),
                Ok(Some(text)) => Some(Handle::from_policy_str(text, config)),
            }
        })
    })
}

/// Create a handle from a policy file. A null `path` creates a handle
/// without a policy.
///
/// # Safety
/// `hdl` must be valid for writes. `path` must be null or a valid
/// NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn nljson_init_file(
    hdl: *mut NljsonHandle,
    flags: u32,
    path: *const c_char,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        init_with(hdl, flags, |config| {
            // SAFETY: We validate null and UTF-8 in helper.
            match unsafe { args::optional_str_arg(path, "path") } {
                Err(()) => None,
                Ok(None) => Some(Ok(Handle::new(None, config))),
                Ok(Some(path)) => Some(Handle::from_policy_file(path, config)),
            }
        })
    })
}

/// Create a handle from policy JSON pulled through `read_cb`. A null
/// callback creates a handle without a policy.
///
/// # Safety
/// `hdl` must be valid for writes. `read_cb` must be null or safe to call
/// with `cb_data` and a writable buffer of the given size.
#[no_mangle]
pub unsafe extern "C" fn nljson_init_cb(
    hdl: *mut NljsonHandle,
    flags: u32,
    read_cb: NljsonReadCb,
    cb_data: *mut c_void,
) -> c_int {
    crate::ffi_boundary(-libc::EIO, || {
        error::clear_error_state();
        init_with(hdl, flags, |config| match read_cb {
            None => Some(Ok(Handle::new(None, config))),
            Some(read) => Some(Handle::from_policy_reader(
                CallbackReader { read, data: cb_data },
                config,
            )),
        })
    })
}

/// Free a handle and set `*hdl` to null.
///
/// # Safety
/// `hdl` must be null or point to null or to a handle returned by the init
/// family that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn nljson_deinit(hdl: *mut NljsonHandle) {
    crate::ffi_boundary((), || {
        if hdl.is_null() {
            return;
        }
        // SAFETY: `hdl` is non-null and readable per the caller contract.
        let raw = unsafe { hdl.read() };
        if raw.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by the init family.
        unsafe {
            drop(Box::from_raw(raw as *mut Handle));
            hdl.write(std::ptr::null_mut());
        }
    });
}

/// Run `f` with the handle behind `hdl`, or with a policy-less default
/// handle when `hdl` is null.
pub(crate) fn with_handle<T>(hdl: NljsonHandle, f: impl FnOnce(&Handle) -> T) -> T {
    if hdl.is_null() {
        return f(&Handle::default());
    }

    let handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &*(hdl as *const Handle) }
    };
    f(handle)
}

struct CallbackReader {
    read: unsafe extern "C" fn(*mut c_void, usize, *mut c_void) -> usize,
    data: *mut c_void,
}

impl Read for CallbackReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is writable for `buf.len()` bytes; the callback
        // contract is the caller's responsibility.
        let n = unsafe { (self.read)(buf.as_mut_ptr().cast(), buf.len(), self.data) };
        if n > buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("read callback reported {n} bytes for a {}-byte buffer", buf.len()),
            ));
        }
        Ok(n)
    }
}
