#![no_main]
use bufchain::{framing, InputBuffer, MemoryResource};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the transfer cap so short reads are exercised too.
    let (cap, rest) = match data.split_first() {
        Some((&cap, rest)) => (cap as usize, rest),
        None => return,
    };
    let source = MemoryResource::from_bytes(rest).with_max_transfer(cap % 17);
    let mut input = InputBuffer::with_capacity(source, 256);
    while let Ok(Some(_payload)) = framing::next_frame(&mut input) {}
});
