//! # strata-common
//!
//! Common types and constants for the Strata storage engine.
//!
//! This crate provides the foundational pieces shared by every Strata
//! component:
//!
//! - **Types**: the [`PageId`] identifier newtype
//! - **Constants**: page sizing and buffer-pool defaults
//!
//! ## Example
//!
//! ```rust
//! use strata_common::types::PageId;
//! use strata_common::constants::PAGE_SIZE;
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert_eq!(PAGE_SIZE, 4096);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::PageId;
