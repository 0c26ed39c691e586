//! System-wide constants for the Strata storage engine.

// =============================================================================
// Page Constants
// =============================================================================

/// Page size in bytes (4 KB).
///
/// Matches the typical OS page size and SSD block size. Every frame in the
/// buffer pool holds exactly one page image of this size.
pub const PAGE_SIZE: usize = 4 * 1024;

// =============================================================================
// Buffer Pool Constants
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_BUFFER_POOL_FRAMES: usize = 64;

/// Default K for the LRU-K replacement policy.
pub const DEFAULT_REPLACER_K: usize = 2;

/// Capacity of an extendible-hash bucket in the buffer pool's page table.
pub const PAGE_TABLE_BUCKET_SIZE: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_constants() {
        assert!(PAGE_SIZE.is_power_of_two());
    }

    #[test]
    fn test_buffer_pool_constants() {
        assert!(DEFAULT_BUFFER_POOL_FRAMES > 0);
        assert!(DEFAULT_REPLACER_K > 0);
        assert!(PAGE_TABLE_BUCKET_SIZE > 0);
    }
}
