//! In-memory container structures for the Strata storage engine.
//!
//! This crate provides concurrent data structures tuned for database
//! workloads:
//!
//! - **Extendible hash table**: a directory-doubling hash map with
//!   fixed-capacity buckets, used by the buffer pool as its page table
//!
//! # Example
//!
//! ```rust
//! use strata_cache::ExtendibleHashTable;
//!
//! let table: ExtendibleHashTable<u64, String> = ExtendibleHashTable::new(4);
//! table.insert(1, "one".to_string());
//! assert_eq!(table.find(&1), Some("one".to_string()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extendible;

pub use extendible::ExtendibleHashTable;
