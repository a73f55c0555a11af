//! Transfer session module
//!
//! Drives file transfers over a secure channel with retry, backoff,
//! and digest verification, recording metrics for quality analysis.

mod session;

pub use session::*;
