//! The byte-resource contract consumed by the buffers.
//!
//! A resource reads into or writes from a caller-supplied region and reports
//! `Ok(None)` once it has no more data (or room). `Ok(Some(0))` is a valid,
//! distinct answer: a call that transferred nothing but did not hit the end.

use crate::error::Result;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Capacity used by [`IoResource`] when no chunk size is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Properties shared by every readable or writable endpoint.
pub trait Resource {
    /// Preferred transfer size, used as the default buffer capacity.
    fn chunk_size(&self) -> usize;

    /// Repositions the resource and returns the new absolute position.
    fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "resource is not seekable").into())
    }
}

/// A readable endpoint.
pub trait Source: Resource {
    /// Reads into `dst`. Returns `Ok(None)` at end-of-data.
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>>;
}

/// A writable endpoint.
pub trait Sink: Resource {
    /// Writes a prefix of `src`, which may be shorter than `src`.
    /// Returns `Ok(None)` when no further content can be accepted.
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>>;

    /// Pushes any content held by this endpoint further downstream.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Resource + ?Sized> Resource for &mut T {
    fn chunk_size(&self) -> usize {
        (**self).chunk_size()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }
}

impl<T: Source + ?Sized> Source for &mut T {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        (**self).read(dst)
    }
}

impl<T: Sink + ?Sized> Sink for &mut T {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        (**self).write(src)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: Resource + ?Sized> Resource for Box<T> {
    fn chunk_size(&self) -> usize {
        (**self).chunk_size()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }
}

impl<T: Source + ?Sized> Source for Box<T> {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        (**self).read(dst)
    }
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        (**self).write(src)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Adapts a `std::io` value (file, socket, cursor) into a terminal resource.
///
/// A zero-length `std::io` read or write on a non-empty region is reported as
/// end-of-data. `Interrupted` errors are retried, everything else propagates.
#[derive(Debug)]
pub struct IoResource<T> {
    inner: T,
    chunk_size: usize,
}

impl<T> IoResource<T> {
    /// Wraps `inner` with [`DEFAULT_CHUNK_SIZE`].
    pub fn new(inner: T) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Wraps `inner`, advertising `chunk_size` (at least one byte).
    pub fn with_chunk_size(inner: T, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consumes the adapter, returning the wrapped value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Seek> Resource for IoResource<T> {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.inner.seek(pos)?)
    }
}

impl<T: Read + Seek> Source for IoResource<T> {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        read_io(&mut self.inner, dst)
    }
}

impl<T: Write + Seek> Sink for IoResource<T> {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        write_io(&mut self.inner, src)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Adapts a non-seekable `std::io` stream (pipe, socket, stdin) into a
/// terminal resource. Same transfer rules as [`IoResource`]; `seek` is
/// unsupported.
#[derive(Debug)]
pub struct StreamResource<T> {
    inner: T,
    chunk_size: usize,
}

impl<T> StreamResource<T> {
    pub fn new(inner: T) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: T, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Resource for StreamResource<T> {
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<T: Read> Source for StreamResource<T> {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        read_io(&mut self.inner, dst)
    }
}

impl<T: Write> Sink for StreamResource<T> {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        write_io(&mut self.inner, src)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

fn read_io<R: Read + ?Sized>(reader: &mut R, dst: &mut [u8]) -> Result<Option<usize>> {
    if dst.is_empty() {
        return Ok(Some(0));
    }
    loop {
        match reader.read(dst) {
            Ok(0) => return Ok(None),
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn write_io<W: Write + ?Sized>(writer: &mut W, src: &[u8]) -> Result<Option<usize>> {
    if src.is_empty() {
        return Ok(Some(0));
    }
    loop {
        match writer.write(src) {
            Ok(0) => return Ok(None),
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
