//! The read-side buffer.

use crate::chain::{BufferedInput, Upstream};
use crate::error::{Error, Result};
use crate::region::Region;
use crate::resource::{Resource, Sink, Source};
use std::io::{self, BufRead, SeekFrom};
use tracing::trace;

/// A fixed-capacity buffer that refills from an upstream neighbor on demand.
///
/// The buffer never grows: a request that cannot fit in the region fails
/// with a configuration error instead of allocating. Zero-copy views
/// (`buffered`, `slice`, `next`) borrow the region directly.
///
/// The neighbor may be owned or borrowed (`InputBuffer<&mut S>`); either
/// way the buffer only ever calls `read` and `seek` on it.
///
/// Positions reported by `seek` count from where the neighbor stood when
/// the buffer was created, or from the target of the last delegated seek.
///
/// ```rust
/// use bufchain::{BufferedInput, InputBuffer, MemoryResource};
///
/// let source = MemoryResource::from_bytes("key=value\nnext=1\n");
/// let mut input = InputBuffer::with_capacity(source, 8);
/// let token = input.next(&mut bufchain::scan::line()).unwrap();
/// assert_eq!(token, Some(&b"key=value\n"[..]));
/// # Ok::<(), bufchain::Error>(())
/// ```
#[derive(Debug)]
pub struct InputBuffer<S> {
    neighbor: S,
    region: Region,
    // Stream offset of region byte 0; the neighbor sits at `base + limit`.
    base: u64,
}

impl<S: Source> InputBuffer<S> {
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
            base: 0,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.neighbor
    }

    /// Mutable access to the neighbor. Reading from it directly skips
    /// whatever is still buffered.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.neighbor
    }

    /// Consumes the buffer, returning the neighbor. Buffered bytes are lost.
    pub fn into_inner(self) -> S {
        self.neighbor
    }

    /// Empties the region, keeping `base` in step with the neighbor.
    fn reset(&mut self) {
        self.base += self.region.limit() as u64;
        self.region.clear();
    }

    fn shift_front(&mut self) -> usize {
        let shift = self.region.compress();
        self.base += shift as u64;
        shift
    }

    /// One neighbor read into the writable tail.
    fn refill(&mut self) -> Result<Option<usize>> {
        let spare = self.region.spare_mut();
        let room = spare.len();
        let result = self.neighbor.read(spare)?;
        if let Some(n) = result {
            self.region.commit(n.min(room));
        }
        Ok(result)
    }
}

impl<S: Source> Resource for InputBuffer<S> {
    fn chunk_size(&self) -> usize {
        self.region.dimension()
    }

    /// Seeks the logical read position.
    ///
    /// A `Current` target inside the region only moves the cursor and never
    /// touches the neighbor. Anything else empties the buffer first and
    /// delegates.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Current(delta) => {
                let position = self.region.position() as i64;
                let limit = self.region.limit() as i64;
                if let Some(target) = position.checked_add(delta).filter(|t| (0..=limit).contains(t)) {
                    self.region.set_position(target as usize);
                    return Ok(self.base + target as u64);
                }
                // The neighbor is ahead of the cursor by the unread bytes.
                let unread = self.region.readable() as i64;
                SeekFrom::Current(delta.saturating_sub(unread))
            }
            absolute => absolute,
        };
        self.reset();
        self.base = self.neighbor.seek(target)?;
        Ok(self.base)
    }
}

impl<S: Source> Source for InputBuffer<S> {
    /// Copies buffered bytes into `dst`, refilling once when empty.
    ///
    /// When nothing is buffered and `dst` is larger than the whole region,
    /// the neighbor reads straight into `dst`.
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        if dst.is_empty() {
            return Ok(Some(0));
        }
        if self.region.readable() == 0 {
            if dst.len() > self.region.dimension() {
                trace!(len = dst.len(), capacity = self.region.dimension(), "input bypass read");
                // Bytes before the bypassed ones must not stay rewindable.
                self.reset();
                let result = self.neighbor.read(dst)?;
                if let Some(n) = result {
                    self.base += n.min(dst.len()) as u64;
                }
                return Ok(result);
            }
            if self.region.writable() == 0 {
                self.reset();
            }
            if self.refill()?.is_none() {
                return Ok(None);
            }
        }
        Ok(Some(self.region.take_into(dst)))
    }
}

impl<S: Source> BufferedInput for InputBuffer<S> {
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

    fn slice(&mut self, size: usize, eat: bool) -> Result<&[u8]> {
        let capacity = self.region.dimension();
        if size > capacity {
            return Err(Error::Underflow {
                requested: size,
                capacity,
            });
        }
        while self.region.readable() < size {
            if self.region.writable() == 0 {
                // Full yet short of `size`, so position > 0.
                self.shift_front();
            }
            if self.refill()?.is_none() {
                return Err(Error::eof_reading(size, self.region.readable()));
            }
        }
        let start = self.region.position();
        if eat {
            self.region.consume(size);
        }
        Ok(self.region.range(start, size))
    }

    fn skip(&mut self, delta: i64) -> Result<bool> {
        if delta < 0 {
            let back = delta.unsigned_abs();
            if back > self.region.position() as u64 {
                return Ok(false);
            }
            self.region.rewind(back as usize);
            return Ok(true);
        }
        let mut remaining = delta as u64;
        while remaining > 0 {
            let step = remaining.min(self.region.dimension() as u64) as usize;
            self.slice(step, true)?;
            remaining -= step as u64;
        }
        Ok(true)
    }

    fn next(&mut self, scan: &mut dyn FnMut(&[u8]) -> Option<usize>) -> Result<Option<&[u8]>> {
        loop {
            if let Some(end) = scan(self.region.content()) {
                let available = self.region.readable();
                if end > available {
                    return Err(Error::ScannerOverrun {
                        offset: end,
                        available,
                    });
                }
                let start = self.region.position();
                self.region.consume(end);
                return Ok(Some(self.region.range(start, end)));
            }
            if self.region.position() > 0 {
                let shift = self.shift_front();
                trace!(shift, readable = self.region.readable(), "compressed for token");
            } else if self.region.writable() == 0 {
                return Err(Error::TokenTooLarge {
                    capacity: self.region.dimension(),
                });
            }
            if self.refill()?.is_none() {
                return Ok(None);
            }
        }
    }

    fn reserve(&mut self, space: usize) -> Result<usize> {
        let capacity = self.region.dimension();
        if space >= capacity {
            return Err(Error::ReserveExceedsCapacity {
                requested: space,
                capacity,
            });
        }
        if self.region.writable() < space {
            self.shift_front();
        }
        Ok(self.region.position())
    }

    fn compress(&mut self) {
        self.shift_front();
    }

    fn drain(&mut self, sink: &mut dyn Sink) -> Result<Option<usize>> {
        let result = sink.write(self.region.content())?;
        if let Some(n) = result {
            self.region.consume(n.min(self.region.readable()));
        }
        self.shift_front();
        Ok(result)
    }

    fn clear(&mut self) {
        self.reset();
    }
}

impl<S: Upstream> Upstream for InputBuffer<S> {
    fn upstream(&self) -> Option<&dyn Upstream> {
        Some(&self.neighbor)
    }

    fn upstream_mut(&mut self) -> Option<&mut dyn Upstream> {
        Some(&mut self.neighbor)
    }

    fn input_buffer(&self) -> Option<&dyn BufferedInput> {
        Some(self)
    }

    fn input_buffer_mut(&mut self) -> Option<&mut dyn BufferedInput> {
        Some(self)
    }
}

impl<S: Source> io::Read for InputBuffer<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Source::read(self, buf)?.unwrap_or(0))
    }
}

impl<S: Source> BufRead for InputBuffer<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.region.readable() == 0 {
            self.reset();
            self.refill()?;
        }
        Ok(self.region.content())
    }

    fn consume(&mut self, amt: usize) {
        self.region.consume(amt.min(self.region.readable()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryResource;
    use crate::scan;
    use tracing_test::traced_test;

    fn trickle(contents: &str, capacity: usize) -> InputBuffer<MemoryResource> {
        InputBuffer::with_capacity(
            MemoryResource::from_bytes(contents).with_max_transfer(1),
            capacity,
        )
    }

    fn assert_invariant<S: Source>(input: &InputBuffer<S>) {
        assert!(input.position() <= input.limit());
        assert!(input.limit() <= input.capacity());
    }

    #[test]
    fn fill_from_one_byte_chunks() {
        let mut input = trickle("abcdefghij", 4);
        let mut dst = [0u8; 10];
        assert_eq!(input.fill(&mut dst).unwrap(), Some(10));
        assert_eq!(&dst, b"abcdefghij");
        assert_eq!(input.fill(&mut dst).unwrap(), None);
        assert_invariant(&input);
    }

    #[test]
    fn fill_returns_partial_count_on_short_source() {
        let mut input = trickle("abc", 4);
        let mut dst = [0u8; 8];
        assert_eq!(input.fill(&mut dst).unwrap(), Some(3));
        assert_eq!(&dst[..3], b"abc");
    }

    #[test]
    fn fill_exact_reports_transferred_bytes() {
        let mut input = trickle("abc", 4);
        let mut dst = [0u8; 5];
        match input.fill_exact(&mut dst) {
            Err(Error::Eof {
                requested,
                transferred,
                ..
            }) => assert_eq!((requested, transferred), (5, 3)),
            other => panic!("expected Eof, got {other:?}"),
        }
    }

    #[test]
    fn large_read_on_empty_buffer_bypasses_region() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("0123456789"), 4);
        let mut dst = [0u8; 8];
        assert_eq!(input.read(&mut dst).unwrap(), Some(8));
        assert_eq!(&dst, b"01234567");
        // Nothing was staged in the region.
        assert_eq!(input.limit(), 0);
        assert_eq!(input.get_ref().read_calls(), 1);
    }

    #[test]
    fn small_read_refills_once() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("0123456789"), 4);
        let mut dst = [0u8; 3];
        assert_eq!(input.read(&mut dst).unwrap(), Some(3));
        assert_eq!(&dst, b"012");
        assert_eq!(input.buffered(), b"3");
        assert_eq!(input.read(&mut dst).unwrap(), Some(1));
        assert_eq!(input.read(&mut dst).unwrap(), Some(3));
        assert_eq!(&dst, b"456");
    }

    #[test]
    fn slice_larger_than_capacity_underflows() {
        let mut input = trickle("abcdef", 4);
        match input.slice(5, false) {
            Err(Error::Underflow {
                requested: 5,
                capacity: 4,
            }) => {}
            other => panic!("expected Underflow, got {other:?}"),
        }
        assert_eq!(input.limit(), 0);
    }

    #[test]
    fn slice_compresses_to_gather_contiguous_bytes() {
        let mut input = trickle("abcdef", 4);
        assert_eq!(input.slice(3, true).unwrap(), b"abc");
        // Region now holds "abcd" with the cursor at 3; "d" moves to the front.
        assert_eq!(input.slice(3, false).unwrap(), b"def");
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn slice_without_eat_leaves_cursor() {
        let mut input = trickle("abcdef", 4);
        assert_eq!(input.slice(2, false).unwrap(), b"ab");
        assert_eq!(input.position(), 0);
        assert_eq!(input.slice(4, true).unwrap(), b"abcd");
        assert_eq!(input.position(), 4);
        match input.slice(3, true) {
            Err(Error::Eof { transferred: 2, .. }) => {}
            other => panic!("expected Eof, got {other:?}"),
        }
        assert_invariant(&input);
    }

    #[test]
    fn negative_skip_past_start_changes_nothing() {
        let mut input = trickle("abcdef", 4);
        input.slice(2, true).unwrap();
        let before = (input.position(), input.limit());
        assert!(!input.skip(-3).unwrap());
        assert_eq!((input.position(), input.limit()), before);
        assert!(input.skip(-2).unwrap());
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn positive_skip_crosses_refills() {
        let mut input = trickle("abcdefghij", 3);
        assert!(input.skip(7).unwrap());
        assert_eq!(input.slice(3, true).unwrap(), b"hij");
        assert!(input.skip(1).is_err());
    }

    #[traced_test]
    #[test]
    fn next_merges_token_across_compressions() {
        let mut input = trickle("ab cdefghi;rest", 8);
        let mut first = scan::delimiter(b' ');
        assert_eq!(input.next(&mut first).unwrap(), Some(&b"ab "[..]));
        let mut semi = scan::delimiter(b';');
        assert_eq!(input.next(&mut semi).unwrap(), Some(&b"cdefghi;"[..]));
        assert!(logs_contain("compressed for token"));
        assert_eq!(input.next(&mut semi).unwrap(), None);
        assert_eq!(input.buffered(), b"rest");
    }

    #[test]
    fn next_fails_when_token_exceeds_capacity() {
        let mut input = trickle("abcdefgh;", 4);
        match input.next(&mut scan::delimiter(b';')) {
            Err(Error::TokenTooLarge { capacity: 4 }) => {}
            other => panic!("expected TokenTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn next_rejects_scanner_overrun() {
        let mut input = trickle("ab", 4);
        input.slice(2, false).unwrap();
        let mut bad = |_: &[u8]| Some(3);
        assert!(matches!(
            input.next(&mut bad),
            Err(Error::ScannerOverrun {
                offset: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn reserve_compresses_and_checks_capacity() {
        let mut input = trickle("abcdef", 4);
        input.slice(4, true).unwrap();
        input.skip(-1).unwrap();
        assert_eq!(input.reserve(2).unwrap(), 0);
        assert_eq!(input.buffered(), b"d");
        assert_eq!(input.writable(), 3);
        assert!(matches!(
            input.reserve(4),
            Err(Error::ReserveExceedsCapacity { .. })
        ));
    }

    #[test]
    fn drain_pushes_buffered_bytes_once() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("abcdef"), 8);
        input.slice(6, false).unwrap();
        let mut sink = MemoryResource::new().with_max_transfer(4);
        assert_eq!(input.drain(&mut sink).unwrap(), Some(4));
        assert_eq!(sink.contents(), b"abcd");
        assert_eq!((input.position(), input.limit()), (0, 2));
        assert_eq!(input.buffered(), b"ef");
    }

    #[test]
    fn seek_within_window_reports_absolute_position() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("0123456789"), 4);
        input.slice(4, true).unwrap();
        assert_eq!(input.seek(SeekFrom::Current(-2)).unwrap(), 2);
        assert_eq!(input.get_ref().read_calls(), 1);
        assert_eq!(input.slice(2, true).unwrap(), b"23");
    }

    #[test]
    fn seek_outside_window_delegates() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("0123456789"), 4);
        input.slice(1, true).unwrap();
        // Cursor at 1, neighbor at 4: Current(+5) lands on 6.
        assert_eq!(input.seek(SeekFrom::Current(5)).unwrap(), 6);
        assert_eq!(input.limit(), 0);
        assert_eq!(input.slice(2, true).unwrap(), b"67");
        assert_eq!(input.seek(SeekFrom::Start(1)).unwrap(), 1);
        assert_eq!(input.slice(1, true).unwrap(), b"1");
    }

    #[test]
    fn bypass_read_drops_stale_window() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("0123456789abcdef"), 4);
        input.slice(4, true).unwrap();
        let mut dst = [0u8; 8];
        assert_eq!(input.read(&mut dst).unwrap(), Some(8));
        assert_eq!(&dst, b"456789ab");
        // Nothing buffered precedes the stream position any more.
        assert!(!input.skip(-1).unwrap());
        assert_eq!(input.seek(SeekFrom::Current(-1)).unwrap(), 11);
        assert_eq!(input.slice(2, true).unwrap(), b"bc");
    }

    #[test]
    fn in_window_seek_never_touches_unseekable_neighbor() {
        use crate::resource::StreamResource;
        let mut input = InputBuffer::with_capacity(StreamResource::new(&b"0123456789"[..]), 8);
        input.slice(4, true).unwrap();
        assert_eq!(input.seek(SeekFrom::Current(-2)).unwrap(), 2);
        assert_eq!(input.slice(2, true).unwrap(), b"23");
        // Compressing shifts the window without losing track of offsets.
        assert_eq!(input.slice(6, true).unwrap(), b"456789");
        assert_eq!(input.seek(SeekFrom::Current(0)).unwrap(), 10);
        assert_eq!(input.seek(SeekFrom::Current(-3)).unwrap(), 7);
        assert_eq!(input.slice(1, false).unwrap(), b"7");
        // Leaving the window has to ask the neighbor, which cannot seek.
        match input.seek(SeekFrom::Current(-8)) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::Unsupported),
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn std_read_maps_end_of_data_to_zero() {
        let mut input = InputBuffer::with_capacity(MemoryResource::from_bytes("line one\nline two\n"), 5);
        let mut lines = Vec::new();
        for line in BufRead::lines(&mut input) {
            lines.push(line.unwrap());
        }
        assert_eq!(lines, ["line one", "line two"]);
        assert_eq!(io::Read::read(&mut input, &mut [0u8; 4]).unwrap(), 0);
    }
}
