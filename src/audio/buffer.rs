use ringbuf::{traits::*, HeapRb};
use std::sync::Arc;
use parking_lot::Mutex;

/// Thread-safe ring buffer holding the most recent microphone samples
///
/// The capture callback writes into it; the amplitude sampler reads the
/// latest window once per frame without consuming it.
pub struct AudioRingBuffer {
    buffer: Arc<Mutex<HeapRb<f32>>>,
}

impl AudioRingBuffer {
    /// Create a new ring buffer with the specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(HeapRb::new(capacity.max(1)))),
        }
    }

    /// Write samples to the buffer, overwriting the oldest when full
    /// Returns the number of samples written
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut buffer = self.buffer.lock();
        let mut written = 0;

        for &sample in samples {
            if buffer.try_push(sample).is_err() {
                // Buffer is full, drop old samples
                let _ = buffer.try_pop();
                let _ = buffer.try_push(sample);
            }
            written += 1;
        }

        written
    }

    /// Copy the latest `count` samples into `out`, oldest first
    ///
    /// When fewer than `count` samples are buffered the front of `out` is
    /// zero-filled so the newest sample always lands at the end.
    pub fn latest(&self, out: &mut [f32]) {
        let buffer = self.buffer.lock();
        let available = buffer.occupied_len();
        let count = out.len();
        let take = available.min(count);
        let pad = count - take;

        out[..pad].fill(0.0);
        for (slot, &sample) in out[pad..]
            .iter_mut()
            .zip(buffer.iter().skip(available - take))
        {
            *slot = sample;
        }
    }

    /// Get the number of samples available
    pub fn len(&self) -> usize {
        self.buffer.lock().occupied_len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Clear the buffer
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// Get the capacity of the buffer
    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity().get()
    }
}

impl Clone for AudioRingBuffer {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
        }
    }
}
