//! Statistical process control module
//!
//! Converts throughput observations into SPC indicators: capability
//! index, control chart limits, and sigma level.

mod spc;

pub use spc::*;
