//! Length-prefixed framing over the buffers: `[4-byte length | payload]`.
//!
//! Frames are written with [`append_frame`] and read back, zero-copy, with
//! [`next_frame`]. The length is a little-endian `u32`. A frame must fit in
//! the input buffer to be read; larger frames fail with `TokenTooLarge`.

use crate::chain::{BufferedInput, BufferedOutput};
use crate::error::{Error, Result};

/// Size of the length header.
pub const HEADER_LEN: usize = 4;

/// Scanner matching one complete frame, header included.
pub fn frame() -> impl FnMut(&[u8]) -> Option<usize> {
    |window| {
        let header: [u8; HEADER_LEN] = window.get(..HEADER_LEN)?.try_into().ok()?;
        let total = HEADER_LEN.checked_add(u32::from_le_bytes(header) as usize)?;
        (window.len() >= total).then_some(total)
    }
}

/// Appends `payload` as one frame.
pub fn append_frame<B: BufferedOutput + ?Sized>(out: &mut B, payload: &[u8]) -> Result<()> {
    // Enforce 32-bit length header contract to avoid truncation on cast
    let len = u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
        len: payload.len(),
        limit: u32::MAX as usize,
    })?;
    out.append(&len.to_le_bytes())?;
    out.append(payload)
}

/// Reads the next frame's payload.
///
/// Returns `Ok(None)` on a clean end of stream. Bytes left over when the
/// neighbor ends mid-frame are reported as `Eof` whilst reading.
pub fn next_frame<B: BufferedInput + ?Sized>(input: &mut B) -> Result<Option<&[u8]>> {
    let matched = input.next(&mut frame())?.map(<[u8]>::len);
    match matched {
        Some(len) => {
            // Step back over the consumed frame and borrow it in place.
            input.skip(-(len as i64))?;
            let frame = input.slice(len, true)?;
            Ok(Some(&frame[HEADER_LEN..]))
        }
        None => {
            let left = input.buffered();
            if left.is_empty() {
                return Ok(None);
            }
            let expected = match left.get(..HEADER_LEN) {
                Some(header) => {
                    let header: [u8; HEADER_LEN] = header.try_into().unwrap_or_default();
                    HEADER_LEN.saturating_add(u32::from_le_bytes(header) as usize)
                }
                None => HEADER_LEN,
            };
            Err(Error::eof_reading(expected, left.len()))
        }
    }
}
