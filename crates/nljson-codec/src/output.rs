use std::io::{ErrorKind, Write};

use crate::error::{CodecError, Result};

/// Largest single write issued to a sink.
pub const OUTPUT_CHUNK_SIZE: usize = 4096;

/// Bytes taken from the input and bytes handed to the caller by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub consumed: usize,
    pub produced: usize,
}

/// Output of an allocating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded<T> {
    /// Input bytes the output was built from.
    pub consumed: usize,
    pub output: T,
}

impl<T: AsRef<[u8]>> Transcoded<T> {
    pub fn produced(&self) -> usize {
        self.output.as_ref().len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            consumed: self.consumed,
            produced: self.produced(),
        }
    }
}

/// Copy `src` to the front of `dst`, or fail without touching `dst`.
pub(crate) fn copy_into(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if src.len() > dst.len() {
        return Err(CodecError::Capacity {
            needed: src.len(),
            available: dst.len(),
        });
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(src.len())
}

/// Copy `chunks` into a new buffer allocated at exactly their total size.
pub(crate) fn alloc_exact<'a>(
    chunks: impl IntoIterator<Item = &'a [u8]>,
    total: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| CodecError::Allocation(total))?;
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

/// Push `chunk` to `sink` in full.
pub(crate) fn write_chunk<W: Write>(sink: &mut W, chunk: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < chunk.len() {
        match sink.write(&chunk[offset..]) {
            Ok(0) => return Err(CodecError::Io(ErrorKind::WriteZero.into())),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(CodecError::Io(err)),
        }
    }
    Ok(())
}

pub(crate) fn flush<W: Write>(sink: &mut W) -> Result<()> {
    loop {
        match sink.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(CodecError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_into_fits() {
        let mut dst = [0xEEu8; 6];
        assert_eq!(copy_into(b"abcd", &mut dst).unwrap(), 4);
        assert_eq!(&dst, b"abcd\xEE\xEE");
    }

    #[test]
    fn copy_into_too_small_leaves_dst_untouched() {
        let mut dst = [0xEEu8; 3];
        let err = copy_into(b"abcd", &mut dst).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Capacity {
                needed: 4,
                available: 3
            }
        ));
        assert_eq!(dst, [0xEE; 3]);
    }

    #[test]
    fn alloc_exact_concatenates() {
        let out = alloc_exact([&b"ab"[..], &b"cde"[..]], 5).unwrap();
        assert_eq!(out, b"abcde".to_vec());
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn write_chunk_retries_short_and_interrupted_writes() {
        let mut sink = Stuttering::default();
        write_chunk(&mut sink, b"hello world").unwrap();
        flush(&mut sink).unwrap();
        assert_eq!(sink.data, b"hello world");
        assert!(sink.calls > 11);
    }

    #[test]
    fn write_chunk_reports_closed_sink() {
        let mut sink: &mut [u8] = &mut [];
        let err = write_chunk(&mut sink, b"x").unwrap_err();
        assert!(matches!(err, CodecError::Io(ref e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn progress_of_transcoded() {
        let done = Transcoded {
            consumed: 12,
            output: vec![0u8; 8],
        };
        assert_eq!(
            done.progress(),
            Progress {
                consumed: 12,
                produced: 8
            }
        );
    }

    /// Accepts one byte per call and fails two calls out of three.
    #[derive(Default)]
    struct Stuttering {
        data: Vec<u8>,
        calls: usize,
    }

    impl Write for Stuttering {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            match self.calls % 3 {
                0 => Err(ErrorKind::Interrupted.into()),
                1 => Err(ErrorKind::WouldBlock.into()),
                _ => {
                    self.data.push(buf[0]);
                    Ok(1)
                }
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
