//! Stream chains: filters, capabilities, and buffer discovery.
//!
//! A chain is an acyclic sequence of filters ending at a terminal resource.
//! Each filter names its one neighbor in the direction of data flow and
//! answers two capability queries: "are you a buffer?" and "do you change
//! the bytes passing through you?". Discovery walks the chain so that several
//! consumers of one stream share a single buffer instead of stacking them.
//!
//! ```rust
//! use bufchain::chain::create_input;
//! use bufchain::{BufferedInput, InputBuffer, MemoryResource};
//!
//! let mut buffered = InputBuffer::with_capacity(MemoryResource::from_bytes("a,b"), 16);
//! let handle = create_input(&mut buffered).unwrap();
//! assert!(handle.is_shared());
//! ```

use crate::error::{Error, Result};
use crate::input::InputBuffer;
use crate::memory::MemoryResource;
use crate::output::OutputBuffer;
use crate::resource::{IoResource, Resource, Sink, Source, StreamResource};
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};
use tracing::debug;

//--- Capabilities ---

/// Marker for filters that change the bytes passing through them.
///
/// Discovery never shares a buffer across a mutator: bytes buffered below it
/// are raw, bytes read above it are transformed.
pub trait Mutator {
    /// Short label of the transformation, for diagnostics.
    fn mutation(&self) -> &'static str;
}

/// Operations of a read-side buffer, usable through a trait object.
pub trait BufferedInput: Source {
    /// Total size of the backing region.
    fn capacity(&self) -> usize;

    /// Read cursor.
    fn position(&self) -> usize;

    /// End of valid content.
    fn limit(&self) -> usize;

    /// Unread bytes held in the region.
    fn readable(&self) -> usize {
        self.limit() - self.position()
    }

    /// Free bytes after `limit`.
    fn writable(&self) -> usize {
        self.capacity() - self.limit()
    }

    /// The unread window `[position, limit)`, without consuming it.
    fn buffered(&self) -> &[u8];

    /// Guarantees `size` contiguous unread bytes, refilling as needed.
    ///
    /// Fails with `Underflow` when `size` exceeds the capacity and with
    /// `Eof` when the neighbor ends first. Consumes the bytes when `eat`.
    fn slice(&mut self, size: usize, eat: bool) -> Result<&[u8]>;

    /// Reads until `dst` is full or the neighbor ends.
    ///
    /// Returns the bytes read when there was any progress, `None` otherwise.
    fn fill(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        let mut total = 0;
        while total < dst.len() {
            match self.read(&mut dst[total..])? {
                Some(n) => total += n,
                None => break,
            }
        }
        if total == 0 && !dst.is_empty() {
            Ok(None)
        } else {
            Ok(Some(total))
        }
    }

    /// Like `fill`, but running out before `dst` is full is an error.
    fn fill_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        match self.fill(dst)? {
            Some(n) if n == dst.len() => Ok(()),
            Some(n) => Err(Error::eof_reading(dst.len(), n)),
            None => Err(Error::eof_reading(dst.len(), 0)),
        }
    }

    /// Moves the cursor by `delta` bytes.
    ///
    /// Forward skips refill as needed. Backward skips stay inside the region
    /// and return `false`, changing nothing, when they would pass offset zero.
    fn skip(&mut self, delta: i64) -> Result<bool>;

    /// Extracts the next token recognised by `scan`.
    ///
    /// `scan` sees the unread window and returns the token's end offset, or
    /// `None` to ask for more input. Returns `Ok(None)` when the neighbor is
    /// exhausted first; the unmatched bytes stay buffered. Refilling may
    /// compress the region, moving previously returned slices.
    fn next(&mut self, scan: &mut dyn FnMut(&[u8]) -> Option<usize>) -> Result<Option<&[u8]>>;

    /// Makes room for `space` bytes at the tail, compressing if needed.
    ///
    /// Returns the read cursor afterwards. `space` must be below capacity.
    fn reserve(&mut self, space: usize) -> Result<usize>;

    /// Moves unread content to the front of the region.
    fn compress(&mut self);

    /// Offers the unread window to `sink` once, then compresses.
    fn drain(&mut self, sink: &mut dyn Sink) -> Result<Option<usize>>;

    /// Discards all content. The neighbor is left untouched.
    fn clear(&mut self);
}

/// Operations of a write-side buffer, usable through a trait object.
pub trait BufferedOutput: Sink {
    /// Total size of the backing region.
    fn capacity(&self) -> usize;

    /// Start of content not yet handed downstream.
    fn position(&self) -> usize;

    /// End of appended content.
    fn limit(&self) -> usize;

    /// Pending bytes.
    fn readable(&self) -> usize {
        self.limit() - self.position()
    }

    /// Room left for appends.
    fn writable(&self) -> usize {
        self.capacity() - self.limit()
    }

    /// Pending content `[position, limit)`.
    fn buffered(&self) -> &[u8];

    /// Buffers `bytes`, emptying the region first when they do not fit.
    ///
    /// Input larger than the capacity is written straight to the neighbor.
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Pulls from `source` until its end-of-data, draining downstream each
    /// time the region fills. The tail stays buffered until `flush`.
    fn copy(&mut self, source: &mut dyn Source) -> Result<u64>;

    /// Offers pending content to `sink` once, then compresses.
    fn drain(&mut self, sink: &mut dyn Sink) -> Result<Option<usize>>;

    /// Keeps only the first `length` pending bytes.
    fn truncate(&mut self, length: usize);

    /// Discards pending content without writing it.
    fn clear(&mut self);
}

//--- Filters ---

/// A read-side link of a stream chain.
pub trait Upstream: Source {
    /// The neighbor this filter reads from, `None` for a terminal resource.
    fn upstream(&self) -> Option<&dyn Upstream> {
        None
    }

    fn upstream_mut(&mut self) -> Option<&mut dyn Upstream> {
        None
    }

    /// This filter's buffer capability, if it is a buffer.
    fn input_buffer(&self) -> Option<&dyn BufferedInput> {
        None
    }

    fn input_buffer_mut(&mut self) -> Option<&mut dyn BufferedInput> {
        None
    }

    /// This filter's mutator marker, if it transforms content.
    fn as_mutator(&self) -> Option<&dyn Mutator> {
        None
    }
}

/// A write-side link of a stream chain.
pub trait Downstream: Sink {
    /// The neighbor this filter writes to, `None` for a terminal resource.
    fn downstream(&self) -> Option<&dyn Downstream> {
        None
    }

    fn downstream_mut(&mut self) -> Option<&mut dyn Downstream> {
        None
    }

    /// This filter's buffer capability, if it is a buffer.
    fn output_buffer(&self) -> Option<&dyn BufferedOutput> {
        None
    }

    fn output_buffer_mut(&mut self) -> Option<&mut dyn BufferedOutput> {
        None
    }

    /// This filter's mutator marker, if it transforms content.
    fn as_mutator(&self) -> Option<&dyn Mutator> {
        None
    }
}

impl<T: Upstream + ?Sized> Upstream for &mut T {
    fn upstream(&self) -> Option<&dyn Upstream> {
        (**self).upstream()
    }

    fn upstream_mut(&mut self) -> Option<&mut dyn Upstream> {
        (**self).upstream_mut()
    }

    fn input_buffer(&self) -> Option<&dyn BufferedInput> {
        (**self).input_buffer()
    }

    fn input_buffer_mut(&mut self) -> Option<&mut dyn BufferedInput> {
        (**self).input_buffer_mut()
    }

    fn as_mutator(&self) -> Option<&dyn Mutator> {
        (**self).as_mutator()
    }
}

impl<T: Upstream + ?Sized> Upstream for Box<T> {
    fn upstream(&self) -> Option<&dyn Upstream> {
        (**self).upstream()
    }

    fn upstream_mut(&mut self) -> Option<&mut dyn Upstream> {
        (**self).upstream_mut()
    }

    fn input_buffer(&self) -> Option<&dyn BufferedInput> {
        (**self).input_buffer()
    }

    fn input_buffer_mut(&mut self) -> Option<&mut dyn BufferedInput> {
        (**self).input_buffer_mut()
    }

    fn as_mutator(&self) -> Option<&dyn Mutator> {
        (**self).as_mutator()
    }
}

impl<T: Downstream + ?Sized> Downstream for &mut T {
    fn downstream(&self) -> Option<&dyn Downstream> {
        (**self).downstream()
    }

    fn downstream_mut(&mut self) -> Option<&mut dyn Downstream> {
        (**self).downstream_mut()
    }

    fn output_buffer(&self) -> Option<&dyn BufferedOutput> {
        (**self).output_buffer()
    }

    fn output_buffer_mut(&mut self) -> Option<&mut dyn BufferedOutput> {
        (**self).output_buffer_mut()
    }

    fn as_mutator(&self) -> Option<&dyn Mutator> {
        (**self).as_mutator()
    }
}

impl<T: Downstream + ?Sized> Downstream for Box<T> {
    fn downstream(&self) -> Option<&dyn Downstream> {
        (**self).downstream()
    }

    fn downstream_mut(&mut self) -> Option<&mut dyn Downstream> {
        (**self).downstream_mut()
    }

    fn output_buffer(&self) -> Option<&dyn BufferedOutput> {
        (**self).output_buffer()
    }

    fn output_buffer_mut(&mut self) -> Option<&mut dyn BufferedOutput> {
        (**self).output_buffer_mut()
    }

    fn as_mutator(&self) -> Option<&dyn Mutator> {
        (**self).as_mutator()
    }
}

// Terminal resources: no neighbor, no capabilities.
impl<T: Read + Seek> Upstream for IoResource<T> {}
impl<T: Write + Seek> Downstream for IoResource<T> {}
impl<T: Read> Upstream for StreamResource<T> {}
impl<T: Write> Downstream for StreamResource<T> {}
impl Upstream for MemoryResource {}
impl Downstream for MemoryResource {}

/// A pass-through filter that reports every transferred chunk to a callback.
///
/// Callback timing: invoked once per successful neighbor call, with exactly
/// the bytes that crossed it. Content is never altered, so discovery walks
/// through this filter.
pub struct Observed<S, C> {
    inner: S,
    callback: C,
}

impl<S, C: FnMut(&[u8])> Observed<S, C> {
    pub fn new(inner: S, callback: C) -> Self {
        Self { inner, callback }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Resource, C> Resource for Observed<S, C> {
    fn chunk_size(&self) -> usize {
        self.inner.chunk_size()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.inner.seek(pos)
    }
}

impl<S: Source, C: FnMut(&[u8])> Source for Observed<S, C> {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        let result = self.inner.read(dst)?;
        if let Some(n) = result {
            (self.callback)(&dst[..n.min(dst.len())]);
        }
        Ok(result)
    }
}

impl<S: Sink, C: FnMut(&[u8])> Sink for Observed<S, C> {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        let result = self.inner.write(src)?;
        if let Some(n) = result {
            (self.callback)(&src[..n.min(src.len())]);
        }
        Ok(result)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

impl<S: Upstream, C: FnMut(&[u8])> Upstream for Observed<S, C> {
    fn upstream(&self) -> Option<&dyn Upstream> {
        Some(&self.inner)
    }

    fn upstream_mut(&mut self) -> Option<&mut dyn Upstream> {
        Some(&mut self.inner)
    }
}

impl<S: Downstream, C: FnMut(&[u8])> Downstream for Observed<S, C> {
    fn downstream(&self) -> Option<&dyn Downstream> {
        Some(&self.inner)
    }

    fn downstream_mut(&mut self) -> Option<&mut dyn Downstream> {
        Some(&mut self.inner)
    }
}

//--- Discovery ---

/// An input buffer obtained from [`create_input`].
pub enum InputHandle<'a> {
    /// A buffer already present in the chain.
    Shared(&'a mut dyn BufferedInput),
    /// A new buffer reading from the stream given to discovery.
    Fresh(InputBuffer<&'a mut dyn Upstream>),
}

impl InputHandle<'_> {
    pub fn is_shared(&self) -> bool {
        matches!(self, InputHandle::Shared(_))
    }
}

impl<'a> Deref for InputHandle<'a> {
    type Target = dyn BufferedInput + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            InputHandle::Shared(buffer) => &**buffer,
            InputHandle::Fresh(buffer) => buffer,
        }
    }
}

impl DerefMut for InputHandle<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            InputHandle::Shared(buffer) => &mut **buffer,
            InputHandle::Fresh(buffer) => buffer,
        }
    }
}

/// An output buffer obtained from [`create_output`].
pub enum OutputHandle<'a> {
    /// A buffer already present in the chain.
    Shared(&'a mut dyn BufferedOutput),
    /// A new buffer writing to the stream given to discovery.
    Fresh(OutputBuffer<&'a mut dyn Downstream>),
}

impl OutputHandle<'_> {
    pub fn is_shared(&self) -> bool {
        matches!(self, OutputHandle::Shared(_))
    }
}

impl<'a> Deref for OutputHandle<'a> {
    type Target = dyn BufferedOutput + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            OutputHandle::Shared(buffer) => &**buffer,
            OutputHandle::Fresh(buffer) => buffer,
        }
    }
}

impl DerefMut for OutputHandle<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            OutputHandle::Shared(buffer) => &mut **buffer,
            OutputHandle::Fresh(buffer) => buffer,
        }
    }
}

/// Outcome of the read-only part of a discovery walk.
enum Walk {
    /// A buffer sits this many hops from the starting filter.
    Buffer(usize),
    /// No shareable buffer; a new one should use this capacity.
    Fresh { capacity: usize },
}

/// Returns a buffer for reading `stream`.
///
/// Walks toward the terminal resource. The first buffer-capable filter found
/// is shared. A mutator ends the walk, as does the terminal resource; either
/// way a new buffer over `stream` is built, sized by the chunk size of the
/// filter where the walk stopped.
pub fn create_input(stream: &mut dyn Upstream) -> Result<InputHandle<'_>> {
    let walk = {
        let mut depth = 0;
        let mut current: &dyn Upstream = stream;
        loop {
            if current.input_buffer().is_some() {
                break Walk::Buffer(depth);
            }
            if let Some(mutator) = current.as_mutator() {
                debug!(depth, mutation = mutator.mutation(), "input discovery halted at mutator");
                break Walk::Fresh {
                    capacity: current.chunk_size(),
                };
            }
            match current.upstream() {
                Some(next) => {
                    current = next;
                    depth += 1;
                }
                None => {
                    break Walk::Fresh {
                        capacity: current.chunk_size(),
                    }
                }
            }
        }
    };

    match walk {
        Walk::Buffer(depth) => {
            let mut current = stream;
            for hop in 0..depth {
                current = current
                    .upstream_mut()
                    .ok_or(Error::InconsistentChain { depth: hop })?;
            }
            let buffer = current
                .input_buffer_mut()
                .ok_or(Error::InconsistentChain { depth })?;
            debug!(depth, capacity = buffer.capacity(), "sharing input buffer");
            Ok(InputHandle::Shared(buffer))
        }
        Walk::Fresh { capacity } => {
            debug!(capacity, "creating input buffer");
            Ok(InputHandle::Fresh(InputBuffer::with_capacity(stream, capacity)))
        }
    }
}

/// Returns a buffer for writing to `stream`. Mirrors [`create_input`].
pub fn create_output(stream: &mut dyn Downstream) -> Result<OutputHandle<'_>> {
    let walk = {
        let mut depth = 0;
        let mut current: &dyn Downstream = stream;
        loop {
            if current.output_buffer().is_some() {
                break Walk::Buffer(depth);
            }
            if let Some(mutator) = current.as_mutator() {
                debug!(depth, mutation = mutator.mutation(), "output discovery halted at mutator");
                break Walk::Fresh {
                    capacity: current.chunk_size(),
                };
            }
            match current.downstream() {
                Some(next) => {
                    current = next;
                    depth += 1;
                }
                None => {
                    break Walk::Fresh {
                        capacity: current.chunk_size(),
                    }
                }
            }
        }
    };

    match walk {
        Walk::Buffer(depth) => {
            let mut current = stream;
            for hop in 0..depth {
                current = current
                    .downstream_mut()
                    .ok_or(Error::InconsistentChain { depth: hop })?;
            }
            let buffer = current
                .output_buffer_mut()
                .ok_or(Error::InconsistentChain { depth })?;
            debug!(depth, capacity = buffer.capacity(), "sharing output buffer");
            Ok(OutputHandle::Shared(buffer))
        }
        Walk::Fresh { capacity } => {
            debug!(capacity, "creating output buffer");
            Ok(OutputHandle::Fresh(OutputBuffer::with_capacity(stream, capacity)))
        }
    }
}
