//! Core types for the Strata storage engine.

mod ids;

pub use ids::PageId;
