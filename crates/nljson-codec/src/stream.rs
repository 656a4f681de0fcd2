use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use nljson_attr::align_up;
use tracing::{debug, warn};

use crate::decoder::decode_members;
use crate::document::{parse_document, render};
use crate::encoder::encode_members;
use crate::error::{CodecError, Result};
use crate::handle::Handle;
use crate::output::alloc_exact;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Default ceiling on buffered, not yet transcoded input (16 MiB).
pub const DEFAULT_MAX_WINDOW: usize = 16 * 1024 * 1024;

/// Largest span one attribute record can occupy.
const MAX_RECORD_SPAN: usize = align_up(u16::MAX as usize);

/// Buffered input shared by both stream directions.
#[derive(Debug)]
struct Window<R> {
    inner: R,
    buf: BytesMut,
    eof: bool,
    max_window: usize,
}

impl<R: Read> Window<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            eof: false,
            max_window: DEFAULT_MAX_WINDOW,
        }
    }

    /// Read one chunk. Sets `eof` when the source is drained.
    ///
    /// Overflowing the window drops the buffered input and ends the stream:
    /// later calls report a drained source.
    fn fill(&mut self) -> Result<()> {
        if self.buf.len() >= self.max_window {
            let needed = self.buf.len() + 1;
            warn!(
                dropped = self.buf.len(),
                max_window = self.max_window,
                "window limit reached, ending stream"
            );
            self.buf.clear();
            self.eof = true;
            return Err(CodecError::Capacity {
                needed,
                available: self.max_window,
            });
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            };

            if read == 0 {
                self.eof = true;
            } else {
                self.buf.reserve(read);
                self.buf.extend_from_slice(&chunk[..read]);
            }
            return Ok(());
        }
    }
}

/// Pulls JSON documents out of a byte source and decodes each into an
/// attribute stream.
///
/// Anything before the next `{` is skipped, so documents may be separated by
/// whitespace, newlines or other noise.
#[derive(Debug)]
pub struct DecodeStream<R> {
    window: Window<R>,
}

impl<R: Read> DecodeStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            window: Window::new(inner),
        }
    }

    /// Cap the bytes buffered while waiting for a document to complete.
    pub fn set_max_window(&mut self, max: usize) {
        self.window.max_window = max;
    }

    /// Decode the next document. Returns `Ok(None)` once the source is
    /// drained.
    ///
    /// A document that fails validation is dropped and the error returned;
    /// the next call continues with the input after it. Malformed JSON is
    /// skipped up to the next `{`.
    pub fn next_stream(&mut self) -> Result<Option<Bytes>> {
        loop {
            self.skip_to_document();

            if !self.window.buf.is_empty() {
                match parse_document(&self.window.buf) {
                    Ok((members, consumed)) => {
                        self.window.buf.advance(consumed);
                        let writer = decode_members(&members)?;
                        debug!(consumed, produced = writer.len(), "decoded streamed document");
                        return alloc_exact(writer.chunks(), writer.len())
                            .map(|out| Some(Bytes::from(out)));
                    }
                    Err(CodecError::Incomplete) if !self.window.eof => {}
                    Err(CodecError::Incomplete) => {
                        warn!(
                            dropped = self.window.buf.len(),
                            "input ended inside a JSON document"
                        );
                        self.window.buf.clear();
                        return Err(CodecError::Incomplete);
                    }
                    Err(err) => {
                        // Step past this `{` and resync on the next one.
                        warn!(error = %err, "skipping unparsable document");
                        self.window.buf.advance(1);
                        return Err(err);
                    }
                }
            } else if self.window.eof {
                return Ok(None);
            }

            self.window.fill()?;
        }
    }

    fn skip_to_document(&mut self) {
        match self.window.buf.iter().position(|&b| b == b'{') {
            Some(0) => {}
            Some(start) => self.window.buf.advance(start),
            None => self.window.buf.clear(),
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.window.inner
    }

    pub fn into_inner(self) -> R {
        self.window.inner
    }
}

impl<R: Read> Iterator for DecodeStream<R> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_stream().transpose()
    }
}

/// Pulls binary attribute records out of a byte source and encodes them as
/// JSON documents.
///
/// Each call encodes every complete record buffered so far into one
/// document.
#[derive(Debug)]
pub struct EncodeStream<'h, R> {
    handle: &'h Handle,
    window: Window<R>,
}

impl<'h, R: Read> EncodeStream<'h, R> {
    pub fn new(handle: &'h Handle, inner: R) -> Self {
        Self {
            handle,
            window: Window::new(inner),
        }
    }

    /// Cap the bytes buffered while waiting for a record to complete.
    pub fn set_max_window(&mut self, max: usize) {
        self.window.max_window = max;
    }

    /// Encode the next batch of records. Returns `Ok(None)` once the source
    /// is drained.
    pub fn next_document(&mut self) -> Result<Option<String>> {
        loop {
            if !self.window.buf.is_empty() {
                let config = self.handle.config();
                let encoded = encode_members(&self.window.buf, self.handle.policy(), &config);
                let (members, consumed) = match encoded {
                    Ok(done) => done,
                    Err(err) => {
                        self.window.buf.clear();
                        return Err(err);
                    }
                };

                if consumed > 0 {
                    self.window.buf.advance(consumed);
                    return render(members, config.pretty).map(Some);
                }

                if self.window.buf.len() >= MAX_RECORD_SPAN {
                    let dropped = self.window.buf.len();
                    self.window.buf.clear();
                    return Err(CodecError::invalid(
                        "",
                        format!("no well-formed attribute record in {dropped} buffered bytes"),
                    ));
                }

                if self.window.eof {
                    warn!(
                        dropped = self.window.buf.len(),
                        "input ended inside an attribute record"
                    );
                    self.window.buf.clear();
                    return Err(CodecError::Incomplete);
                }
            } else if self.window.eof {
                return Ok(None);
            }

            self.window.fill()?;
        }
    }

    pub fn into_inner(self) -> R {
        self.window.inner
    }
}

impl<R: Read> Iterator for EncodeStream<'_, R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}
