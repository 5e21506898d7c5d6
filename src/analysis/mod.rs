//! Analysis modules.
//!
//! Aggregation of criterion scores into an investment decision.

pub mod aggregator;

pub use aggregator::*;
