use bufchain::{Downstream, Resource, Result, Sink};

/// A sink that records every write call and accepts at most `max_per_call`
/// bytes per call, and at most `capacity` bytes in total.
pub struct RecordingSink {
    pub calls: Vec<Vec<u8>>,
    max_per_call: usize,
    capacity: usize,
    flushes: usize,
}

impl RecordingSink {
    pub fn new(max_per_call: usize) -> Self {
        Self {
            calls: Vec::new(),
            max_per_call,
            capacity: usize::MAX,
            flushes: 0,
        }
    }

    #[allow(dead_code)]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn received(&self) -> Vec<u8> {
        self.calls.concat()
    }

    #[allow(dead_code)]
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Resource for RecordingSink {
    fn chunk_size(&self) -> usize {
        self.max_per_call
    }
}

impl Sink for RecordingSink {
    fn write(&mut self, src: &[u8]) -> Result<Option<usize>> {
        let taken: usize = self.calls.iter().map(Vec::len).sum();
        let room = self.capacity.saturating_sub(taken);
        if room == 0 {
            return Ok(None);
        }
        let n = src.len().min(self.max_per_call).min(room);
        self.calls.push(src[..n].to_vec());
        Ok(Some(n))
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

impl Downstream for RecordingSink {}
