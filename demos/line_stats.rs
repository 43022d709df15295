//! Reads lines from stdin through an input buffer and writes a numbered copy
//! to stdout through an output buffer.
//!
//! `cargo run --example line_stats < some_file.txt`

use bufchain::{scan, BufferedInput, BufferedOutput, InputBuffer, OutputBuffer, Result, Sink, StreamResource};
use std::io;

fn main() -> Result<()> {
    let mut input = InputBuffer::new(StreamResource::new(io::stdin().lock()));
    let mut output = OutputBuffer::with_capacity(StreamResource::new(io::stdout().lock()), 4096);

    let mut lines = 0usize;
    let mut bytes = 0usize;
    let mut longest = 0usize;
    while let Some(line) = input.next(&mut scan::line())? {
        lines += 1;
        bytes += line.len();
        longest = longest.max(line.len());
        output.append(format!("{lines:>6}  ").as_bytes())?;
        output.append(line)?;
    }
    // A last line without a newline stays buffered after the scan ends.
    let tail = input.buffered().len();
    if tail > 0 {
        lines += 1;
        bytes += tail;
        longest = longest.max(tail);
        output.append(format!("{lines:>6}  ").as_bytes())?;
        output.append(input.buffered())?;
        output.append(b"\n")?;
    }
    output.flush()?;

    eprintln!("[line_stats] {lines} line(s), {bytes} byte(s), longest {longest}");
    Ok(())
}
