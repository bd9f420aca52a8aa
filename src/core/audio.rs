//! Microphone audio framing.

use bytes::{Bytes, BytesMut};

/// Accumulates PCM16LE audio and emits fixed-size chunks.
#[derive(Debug)]
pub struct AudioChunker {
    chunk_bytes: usize,
    buffer: BytesMut,
}

impl AudioChunker {
    /// `chunk_bytes` is rounded up to a whole 16-bit sample.
    pub fn new(chunk_bytes: usize) -> Self {
        let chunk_bytes = chunk_bytes.max(2).next_multiple_of(2);
        Self {
            chunk_bytes,
            buffer: BytesMut::with_capacity(chunk_bytes * 2),
        }
    }

    /// Chunker for mono PCM16 at `sample_rate` emitting `duration_ms` per chunk.
    pub fn for_duration(sample_rate: u32, duration_ms: u32) -> Self {
        let samples = (sample_rate as u64 * duration_ms as u64 / 1000) as usize;
        Self::new(samples * 2)
    }

    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// Bytes waiting for a full chunk.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append audio and return every complete chunk.
    pub fn push(&mut self, pcm: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(pcm);

        let mut chunks = Vec::with_capacity(self.buffer.len() / self.chunk_bytes);
        while self.buffer.len() >= self.chunk_bytes {
            chunks.push(self.buffer.split_to(self.chunk_bytes).freeze());
        }
        chunks
    }

    /// Emit the remaining partial chunk, if any.
    pub fn flush(&mut self) -> Option<Bytes> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.split().freeze())
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Convert float samples in -1..1 to PCM16LE bytes, clamping out-of-range input.
pub fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let clamped = if sample.is_nan() {
            0.0
        } else {
            sample.clamp(-1.0, 1.0)
        };
        let value = (clamped * i16::MAX as f32).round() as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}
