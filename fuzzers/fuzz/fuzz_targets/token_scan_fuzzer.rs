#![no_main]
use bufchain::{scan, BufferedInput, InputBuffer, MemoryResource};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (capacity, rest) = match data.split_first() {
        Some((&capacity, rest)) => (capacity as usize, rest),
        None => return,
    };
    let source = MemoryResource::from_bytes(rest).with_max_transfer(3);
    let mut input = InputBuffer::with_capacity(source, capacity);
    let mut scanner = scan::sequence(b"\r\n");
    let mut total = 0;
    while let Ok(Some(token)) = input.next(&mut scanner) {
        assert!(token.ends_with(b"\r\n"));
        total += token.len();
        assert!(input.position() <= input.limit());
    }
    assert!(total <= rest.len());
});
