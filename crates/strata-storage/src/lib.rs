//! # strata-storage
//!
//! Disk-oriented storage core for the Strata engine.
//!
//! This crate provides the two layers between callers and the database
//! file:
//!
//! - [`disk`]: synchronous page I/O over a single file
//! - [`buffer`]: a fixed-size buffer pool with an extendible-hash page
//!   table and LRU-K replacement

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod disk;

pub use buffer::{BufferError, BufferPoolConfig, BufferPoolManager, BufferResult, PageHandle};
pub use disk::{DiskError, DiskManager, DiskResult};
