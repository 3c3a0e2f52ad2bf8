use crate::prelude::SimError;
use num_complex::Complex64;

/// Simple scoped buffer pool that keeps per-channel scratch allocations
/// bounded across the frequency loop.
pub struct BufferPool {
    buffers: Vec<Vec<Complex64>>,
    outstanding: usize,
    max_capacity: usize,
}

impl BufferPool {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_capacity),
            outstanding: 0,
            max_capacity,
        }
    }

    /// Allocates a buffer from the pool or creates one if there is room.
    pub fn checkout(&mut self, length: usize) -> Result<Vec<Complex64>, SimError> {
        if let Some(mut buffer) = self.buffers.pop() {
            buffer.clear();
            buffer.resize(length, Complex64::default());
            self.outstanding += 1;
            Ok(buffer)
        } else if self.outstanding < self.max_capacity {
            self.outstanding += 1;
            Ok(vec![Complex64::default(); length])
        } else {
            Err(SimError::Internal("buffer pool depleted".to_string()))
        }
    }

    /// Returns a buffer back to the pool for reuse.
    pub fn release(&mut self, mut buffer: Vec<Complex64>) {
        buffer.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.buffers.len() < self.max_capacity {
            self.buffers.push(buffer);
        }
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
        self.outstanding = 0;
    }
}
