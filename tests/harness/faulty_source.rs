use bufchain::{Error, Resource, Result, Source, Upstream};
use std::io;

/// Wraps a source and misbehaves in a controlled way.
pub struct FaultySource<S: Source> {
    inner: S,
    mode: FaultMode,
    counter: usize,
}

#[allow(dead_code)]
pub enum FaultMode {
    OneByteChunks,
    /// Every n-th call transfers nothing without reaching end-of-data.
    EmptyEvery(usize),
    /// Reports end-of-data from the n-th call on.
    PrematureEofAt(usize),
    /// Fails with a broken pipe on the n-th call.
    FailAt(usize),
}

impl<S: Source> FaultySource<S> {
    pub fn new(inner: S, mode: FaultMode) -> Self {
        Self {
            inner,
            mode,
            counter: 0,
        }
    }
}

impl<S: Source> Resource for FaultySource<S> {
    fn chunk_size(&self) -> usize {
        self.inner.chunk_size()
    }
}

impl<S: Source> Source for FaultySource<S> {
    fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>> {
        self.counter += 1;
        match self.mode {
            FaultMode::OneByteChunks => {
                let len = dst.len().min(1);
                self.inner.read(&mut dst[..len])
            }
            FaultMode::EmptyEvery(n) if n != 0 && self.counter % n == 0 => Ok(Some(0)),
            FaultMode::PrematureEofAt(n) if self.counter >= n => Ok(None),
            FaultMode::FailAt(n) if self.counter == n => Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "simulated device failure",
            ))),
            _ => self.inner.read(dst),
        }
    }
}

impl<S: Source> Upstream for FaultySource<S> {}
