//! Demonstrates buffer discovery across a chain of pass-through filters.
//!
//! A byte counter wraps an input buffer; discovery on the counter finds the
//! buffer underneath and shares it instead of stacking a second one.

use bufchain::{
    create_input, create_output, framing, InputBuffer, MemoryResource, Observed, OutputBuffer,
    Result, Sink,
};
use std::cell::Cell;

fn main() -> Result<()> {
    // Write two frames through an observed output buffer.
    let written = Cell::new(0usize);
    let buffer = OutputBuffer::with_capacity(MemoryResource::new(), 64);
    let mut sink = Observed::new(buffer, |chunk: &[u8]| written.set(written.get() + chunk.len()));
    {
        let mut out = create_output(&mut sink)?;
        println!("[writer] discovery shared an existing buffer: {}", out.is_shared());
        framing::append_frame(&mut *out, b"alpha")?;
        framing::append_frame(&mut *out, b"beta")?;
        out.flush()?;
    }
    let bytes = sink.into_inner().into_inner().into_contents();
    println!("[writer] {} byte(s) written, observer saw {}", bytes.len(), written.get());

    // Read them back through an observed input buffer.
    let read = Cell::new(0usize);
    let buffer = InputBuffer::with_capacity(MemoryResource::from_bytes(bytes), 32);
    let mut source = Observed::new(buffer, |chunk: &[u8]| read.set(read.get() + chunk.len()));
    let mut input = create_input(&mut source)?;
    println!("[reader] discovery shared an existing buffer: {}", input.is_shared());
    while let Some(payload) = framing::next_frame(&mut *input)? {
        println!("[reader] frame: {}", String::from_utf8_lossy(payload));
    }
    drop(input);
    // Reads went straight to the shared buffer, so the observer saw none.
    println!("[reader] observer saw {} byte(s)", read.get());
    Ok(())
}
