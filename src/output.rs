//! The write-side buffer.

use crate::chain::{BufferedOutput, Downstream};
use crate::error::{Error, Result};
use crate::region::Region;
use crate::resource::{Resource, Sink, Source};
use std::io::{self, SeekFrom};
use tracing::{debug, trace};

/// A fixed-capacity buffer that accumulates writes for a downstream neighbor.
///
/// Content is handed downstream when an append does not fit, on `flush`, or
/// explicitly through `drain`. Appends larger than the whole region skip it
/// and go straight to the neighbor. Nothing is written on drop: call `flush`.
///
/// ```rust
/// use bufchain::{BufferedOutput, MemoryResource, OutputBuffer, Sink};
///
/// let mut out = OutputBuffer::with_capacity(MemoryResource::new(), 4);
/// out.append(b"hi ")?;
/// out.append(b"there")?;
/// out.flush()?;
/// assert_eq!(out.get_ref().contents(), b"hi there");
/// # Ok::<(), bufchain::Error>(())
/// ```
#[derive(Debug)]
pub struct OutputBuffer<S> {
    neighbor: S,
    region: Region,
}

impl<S: Sink> OutputBuffer<S> {
    /// Creates a buffer sized to the neighbor's preferred chunk size.
    pub fn new(neighbor: S) -> Self {
        let capacity = neighbor.chunk_size();
        Self::with_capacity(neighbor, capacity)
    }

    /// Creates a buffer with an explicit capacity (at least one byte).
    pub fn with_capacity(neighbor: S, capacity: usize) -> Self {
        Self {
            neighbor,
            region: Region::new(capacity),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.neighbor
    }

    /// Mutable access to the neighbor. Writing to it directly overtakes
    /// whatever is still buffered.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.neighbor
    }

    /// Consumes the buffer, returning the neighbor. Unflushed bytes are lost.
    pub fn into_inner(self) -> S {
        self.neighbor
    }

    /// Writes pending content to the neighbor until the region is empty.
    fn emit(&mut self) -> Result<()> {
        let requested = self.region.readable();
        let mut sent = 0;
        while self.region.readable() > 0 {
            match self.neighbor.write(self.region.content())? {
                Some(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Some(n) => {
                    let n = n.min(self.region.readable());
                    self.region.consume(n);
                    sent += n;
                }
                None => return Err(Error::eof_writing(requested, sent)),
            }
        }
        self.region.clear();
        Ok(())
    }

    /// One write attempt of pending content to the neighbor, then compress.
    fn make_room(&mut self) -> Result<()> {
        let pending = self.region.readable();
        match self.neighbor.write(self.region.content())? {
            Some(0) => Err(io::Error::from(io::ErrorKind::WriteZero).into()),
            Some(n) => {
                self.region.consume(n.min(pending));
                self.region.compress();
                Ok(())
            }
            None => Err(Error::eof_writing(pending, 0)),
        }
    }

    /// Writes `bytes` to the neighbor without staging them.
    fn write_through(&mut self, bytes: &[u8]) -> Result<()> {
        debug!(len = bytes.len(), capacity = self.region.dimension(), "output bypass write");
        let mut written = 0;
        while written < bytes.len() {
            match self.neighbor.write(&bytes[written..])? {
                Some(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Some(n) => written += n,
                None => return Err(Error::eof_writing(bytes.len(), written)),
            }
        }
        Ok(())
    }
}

impl<S: Sink> Resource for OutputBuffer<S> {
    fn chunk_size(&self) -> usize {
        self.region.dimension()
    }

    /// Discards unflushed content, then seeks the neighbor.
    ///
    /// Flush first if the pending bytes must reach the neighbor.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let discarded = self.region.readable();
        if discarded > 0 {
            debug!(discarded, "seek dropped unflushed output");
        }
        self.region.clear();
        self.neighbor.seek(pos)
    }
}

impl<S: Sink> Sink for OutputBuffer<S> {
    /// Appends all of `src`; never reports a partial write.
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        self.append(src)?;
        Ok(Some(src.len()))
    }

    /// Empties the region downstream, then flushes the neighbor.
    fn flush(&mut self) -> Result<()> {
        self.emit()?;
        self.neighbor.flush()
    }
}

impl<S: Sink> BufferedOutput for OutputBuffer<S> {
    fn capacity(&self) -> usize {
        self.region.dimension()
    }

    fn position(&self) -> usize {
        self.region.position()
    }

    fn limit(&self) -> usize {
        self.region.limit()
    }

    fn buffered(&self) -> &[u8] {
        self.region.content()
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.region.writable() {
            self.emit()?;
            if bytes.len() > self.region.dimension() {
                return self.write_through(bytes);
            }
        }
        self.region.extend(bytes);
        Ok(())
    }

    fn copy(&mut self, source: &mut dyn Source) -> Result<u64> {
        let mut copied = 0u64;
        loop {
            if self.region.writable() == 0 {
                trace!(pending = self.region.readable(), "copy draining full buffer");
                self.make_room()?;
                continue;
            }
            let spare = self.region.spare_mut();
            let room = spare.len();
            match source.read(spare)? {
                Some(n) => {
                    let n = n.min(room);
                    self.region.commit(n);
                    copied += n as u64;
                }
                None => return Ok(copied),
            }
        }
    }

    fn drain(&mut self, sink: &mut dyn Sink) -> Result<Option<usize>> {
        let result = sink.write(self.region.content())?;
        if let Some(n) = result {
            self.region.consume(n.min(self.region.readable()));
        }
        self.region.compress();
        Ok(result)
    }

    fn truncate(&mut self, length: usize) {
        self.region.truncate(length);
    }

    fn clear(&mut self) {
        self.region.clear();
    }
}

impl<S: Downstream> Downstream for OutputBuffer<S> {
    fn downstream(&self) -> Option<&dyn Downstream> {
        Some(&self.neighbor)
    }

    fn downstream_mut(&mut self) -> Option<&mut dyn Downstream> {
        Some(&mut self.neighbor)
    }

    fn output_buffer(&self) -> Option<&dyn BufferedOutput> {
        Some(self)
    }

    fn output_buffer_mut(&mut self) -> Option<&mut dyn BufferedOutput> {
        Some(self)
    }
}

impl<S: Sink> io::Write for OutputBuffer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Sink::flush(self)?;
        Ok(())
    }
}
