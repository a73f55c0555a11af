//! Hash computation and integrity verification module
//!
//! Streaming digests over local files plus parsing of remote
//! checksum-command output for end-to-end verification.

mod integrity;

pub use integrity::*;
