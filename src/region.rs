//! The fixed backing region shared by both buffer directions.

/// A fixed-length byte array with a read cursor and a content boundary.
///
/// Invariant: `position <= limit <= dimension` after every method returns.
/// Unread (input) or unflushed (output) content lives in `[position, limit)`.
#[derive(Debug)]
pub(crate) struct Region {
    bytes: Box<[u8]>,
    position: usize,
    limit: usize,
}

impl Region {
    /// Allocates a zeroed region of `dimension` bytes (at least one).
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            bytes: vec![0u8; dimension.max(1)].into_boxed_slice(),
            position: 0,
            limit: 0,
        }
    }

    #[inline]
    pub(crate) fn dimension(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub(crate) fn readable(&self) -> usize {
        self.limit - self.position
    }

    #[inline]
    pub(crate) fn writable(&self) -> usize {
        self.bytes.len() - self.limit
    }

    /// The content window `[position, limit)`.
    #[inline]
    pub(crate) fn content(&self) -> &[u8] {
        &self.bytes[self.position..self.limit]
    }

    /// `len` bytes starting at absolute offset `start`, which must lie below `limit`.
    #[inline]
    pub(crate) fn range(&self, start: usize, len: usize) -> &[u8] {
        debug_assert!(start + len <= self.limit);
        &self.bytes[start..start + len]
    }

    /// The writable tail `[limit, dimension)`.
    #[inline]
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[self.limit..]
    }

    /// Moves the cursor forward over `n` content bytes.
    #[inline]
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.readable());
        self.position += n;
    }

    /// Moves the cursor back over `n` already-consumed bytes.
    #[inline]
    pub(crate) fn rewind(&mut self, n: usize) {
        debug_assert!(n <= self.position);
        self.position -= n;
    }

    /// Places the cursor anywhere inside `[0, limit]`.
    #[inline]
    pub(crate) fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.limit);
        self.position = position;
    }

    /// Extends the content boundary over `n` freshly written tail bytes.
    #[inline]
    pub(crate) fn commit(&mut self, n: usize) {
        debug_assert!(n <= self.writable());
        self.limit += n;
    }

    /// Copies `src` into the tail and commits it. `src` must fit.
    pub(crate) fn extend(&mut self, src: &[u8]) {
        let end = self.limit + src.len();
        self.bytes[self.limit..end].copy_from_slice(src);
        self.limit = end;
    }

    /// Copies as much content as fits into `dst` and consumes it.
    pub(crate) fn take_into(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.readable());
        dst[..n].copy_from_slice(&self.bytes[self.position..self.position + n]);
        self.position += n;
        n
    }

    /// Drops content past `position + len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len < self.readable() {
            self.limit = self.position + len;
        }
    }

    /// Relocates `[position, limit)` to the front of the region.
    ///
    /// Returns the number of bytes the content moved by.
    pub(crate) fn compress(&mut self) -> usize {
        let shift = self.position;
        if shift > 0 {
            // copy_within is memmove: source and destination may overlap.
            self.bytes.copy_within(self.position..self.limit, 0);
            self.limit -= shift;
            self.position = 0;
        }
        shift
    }

    pub(crate) fn clear(&mut self) {
        self.position = 0;
        self.limit = 0;
    }
}
