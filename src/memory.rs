//! An in-memory resource for tests, benches and demos.

use crate::error::Result;
use crate::resource::{Resource, Sink, Source};
use std::io::{self, SeekFrom};
use std::num::NonZeroUsize;

/// A growable byte vector that behaves like a seekable device.
///
/// Reads and writes share one cursor, like a file opened read-write.
/// `max_transfer` caps how many bytes a single `read`/`write` call moves,
/// which forces callers through their partial-transfer paths. `capacity`
/// makes writes past a fixed size report end-of-data.
#[derive(Debug, Clone, Default)]
pub struct MemoryResource {
    data: Vec<u8>,
    cursor: usize,
    max_transfer: Option<NonZeroUsize>,
    capacity: Option<usize>,
    chunk_size: Option<usize>,
    reads: usize,
    writes: usize,
}

impl MemoryResource {
    /// An empty resource with no transfer cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource positioned at the start of `contents`.
    pub fn from_bytes(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            data: contents.into(),
            ..Self::default()
        }
    }

    /// Caps every single transfer at `max` bytes (`0` means uncapped).
    pub fn with_max_transfer(mut self, max: usize) -> Self {
        self.max_transfer = NonZeroUsize::new(max);
        self
    }

    /// Refuses writes beyond `capacity` total bytes.
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Overrides the advertised chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Everything written so far, regardless of the cursor.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.data
    }

    /// Number of `read` calls that reached this resource.
    pub fn read_calls(&self) -> usize {
        self.reads
    }

    /// Number of `write` calls that reached this resource.
    pub fn write_calls(&self) -> usize {
        self.writes
    }

    fn cap(&self, len: usize) -> usize {
        self.max_transfer.map_or(len, |max| len.min(max.get()))
    }
}

impl Resource for MemoryResource {
    fn chunk_size(&self) -> usize {
        self.chunk_size
            .or(self.max_transfer.map(NonZeroUsize::get))
            .unwrap_or(crate::resource::DEFAULT_CHUNK_SIZE)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(d) => (self.cursor as u64).checked_add_signed(d),
            SeekFrom::End(d) => (self.data.len() as u64).checked_add_signed(d),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of resource")
        })?;
        self.cursor = usize::try_from(target)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek offset overflow"))?;
        Ok(target)
    }
}

impl Source for MemoryResource {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        self.reads += 1;
        let remaining = self.data.len().saturating_sub(self.cursor);
        if remaining == 0 && !dst.is_empty() {
            return Ok(None);
        }
        let n = self.cap(dst.len().min(remaining));
        dst[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(Some(n))
    }
}

impl Sink for MemoryResource {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        self.writes += 1;
        let room = self
            .capacity
            .map_or(usize::MAX, |cap| cap.saturating_sub(self.cursor));
        if room == 0 && !src.is_empty() {
            return Ok(None);
        }
        let n = self.cap(src.len().min(room));
        let end = self.cursor + n;
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[self.cursor..end].copy_from_slice(&src[..n]);
        self.cursor = end;
        Ok(Some(n))
    }
}
