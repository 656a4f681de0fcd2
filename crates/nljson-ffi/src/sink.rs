use std::io::{self, Write};
use std::os::raw::c_int;

/// Adapts a C output callback to [`Write`].
///
/// The callback gets each chunk whole. It returns 0 on success or a negative
/// errno; any other value is reported as a generic I/O failure.
pub(crate) struct CallbackSink<F> {
    emit: F,
}

impl<F: FnMut(&[u8]) -> c_int> CallbackSink<F> {
    pub(crate) fn new(emit: F) -> Self {
        Self { emit }
    }
}

impl<F: FnMut(&[u8]) -> c_int> Write for CallbackSink<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match (self.emit)(buf) {
            0 => Ok(buf.len()),
            rc if rc < 0 => Err(io::Error::from_raw_os_error(-rc)),
            rc => Err(io::Error::other(format!("output callback returned {rc}"))),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
