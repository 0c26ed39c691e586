//! Buffer pool configuration.

use strata_common::{DEFAULT_BUFFER_POOL_FRAMES, DEFAULT_REPLACER_K};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the pool.
    pub num_frames: usize,
    /// K parameter of the LRU-K replacement policy.
    pub replacer_k: usize,
}

impl BufferPoolConfig {
    /// Creates a configuration with the given frame count and the default
    /// replacement parameter.
    pub fn new(num_frames: usize) -> Self {
        Self {
            num_frames,
            replacer_k: DEFAULT_REPLACER_K,
        }
    }

    /// Sets the LRU-K parameter.
    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_frames == 0 {
            return Err("num_frames must be > 0");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_POOL_FRAMES)
    }
}
