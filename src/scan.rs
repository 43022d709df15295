//! Ready-made scanners for [`BufferedInput::next`](crate::BufferedInput::next).
//!
//! A scanner looks at the unread window and returns the offset just past the
//! end of the token it recognises, or `None` when the window does not yet
//! hold a complete token.

/// Tokens terminated by `byte`, delimiter included.
pub fn delimiter(byte: u8) -> impl FnMut(&[u8]) -> Option<usize> {
    move |window| window.iter().position(|&b| b == byte).map(|i| i + 1)
}

/// `\n`-terminated lines, newline included.
pub fn line() -> impl FnMut(&[u8]) -> Option<usize> {
    delimiter(b'\n')
}

/// Tokens terminated by a multi-byte `pattern`, pattern included.
///
/// The scanner remembers how far it has already searched, so a long token
/// arriving in small pieces is not rescanned from the start on every refill.
/// It must only be used with one buffer, from the first call.
pub fn sequence(pattern: &[u8]) -> impl FnMut(&[u8]) -> Option<usize> + '_ {
    let mut searched = 0;
    move |window: &[u8]| {
        if pattern.is_empty() {
            return Some(0);
        }
        if window.len() < pattern.len() {
            searched = 0;
            return None;
        }
        let start = searched.min(window.len() + 1 - pattern.len());
        match window[start..]
            .windows(pattern.len())
            .position(|w| w == pattern)
        {
            Some(i) => {
                searched = 0;
                Some(start + i + pattern.len())
            }
            None => {
                searched = window.len() + 1 - pattern.len();
                None
            }
        }
    }
}

/// Fixed-size records of `len` bytes.
pub fn fixed(len: usize) -> impl FnMut(&[u8]) -> Option<usize> {
    move |window| (window.len() >= len).then_some(len)
}
