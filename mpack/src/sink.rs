//! Destinations for a [`Writer`](crate::Writer). The writer owns no memory itself; it asks its sink to
//! `reserve` the full size of a value before appending any of it, so a sink that cannot take the value fails
//! before anything was written.

use std::io::{self, Write};

use crate::error::EncodeError;

pub trait Sink {

    /// Makes room for `additional` bytes or fails without side effects on the written data.
    fn reserve(&mut self, additional: usize) -> Result<(), EncodeError>;

    /// Appends bytes for which room has been reserved.
    fn append(&mut self, bytes: &[u8]);

    /// Commits everything appended so far to the underlying destination.
    fn flush(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }

}

/// Growable: never runs out of capacity.
impl Sink for Vec<u8> {

    #[inline]
    fn reserve(&mut self, additional: usize) -> Result<(), EncodeError> {
        Vec::reserve(self, additional);
        Ok(())
    }

    #[inline]
    fn append(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

}

impl<S: Sink + ?Sized> Sink for &mut S {

    #[inline]
    fn reserve(&mut self, additional: usize) -> Result<(), EncodeError> {
        (**self).reserve(additional)
    }

    #[inline]
    fn append(&mut self, bytes: &[u8]) {
        (**self).append(bytes)
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        (**self).flush()
    }

}

/// A fixed-capacity span provided by the caller. Fails with [`EncodeError::Capacity`] instead of growing.
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {

    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

}

impl<'a> Sink for SliceSink<'a> {

    #[inline]
    fn reserve(&mut self, additional: usize) -> Result<(), EncodeError> {
        if additional > self.available() {
            Err(EncodeError::Capacity { needed: additional, available: self.available() })
        } else {
            Ok(())
        }
    }

    #[inline]
    fn append(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

}

/// Buffers output for an `io::Write` and hands it over in chunks of roughly `threshold` bytes. Whatever is
/// still buffered is written by `flush`, which callers must invoke once they are done.
pub struct IoSink<W: Write> {
    inner: W,
    buf: Vec<u8>,
    threshold: usize,
}

impl<W: Write> IoSink<W> {

    pub const DEFAULT_THRESHOLD: usize = 8 * 1024;

    pub fn new(inner: W) -> Self {
        Self::with_threshold(inner, Self::DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(inner: W, threshold: usize) -> Self {
        Self { inner, buf: Vec::with_capacity(threshold), threshold }
    }

    /// Bytes appended but not yet handed to the writer
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns the writer. Bytes which have not been flushed are lost.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Hands the buffer to the writer. Bytes the writer accepted are removed even if a later write fails, so
    /// a retried flush never sends them twice.
    fn drain(&mut self) -> Result<(), EncodeError> {
        let mut written = 0;
        let result = loop {
            if written == self.buf.len() {
                break Ok(());
            }
            match self.inner.write(&self.buf[written..]) {
                Ok(0) => break Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write the buffered data")),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        self.buf.drain(..written);
        Ok(result?)
    }

}

impl<W: Write> Sink for IoSink<W> {

    fn reserve(&mut self, additional: usize) -> Result<(), EncodeError> {
        if self.buf.len() + additional > self.threshold {
            self.drain()?;
        }
        self.buf.reserve(additional);
        Ok(())
    }

    #[inline]
    fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        self.drain()?;
        self.inner.flush()?;
        Ok(())
    }

}
