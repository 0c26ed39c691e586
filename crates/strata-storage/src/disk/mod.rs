//! Synchronous page I/O over the database file.
//!
//! The disk layer transfers whole pages at `page_id * PAGE_SIZE` offsets.
//! Operations block until the transfer completes; the buffer pool above
//! accepts that cost in exchange for its single-latch invariants.

mod error;
mod manager;

pub use error::{DiskError, DiskResult};
pub use manager::DiskManager;
