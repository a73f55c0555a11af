//! # SigmaCopy - Secure Transfer with Six Sigma Quality Monitoring
//!
//! SigmaCopy transfers files to a remote host over an authenticated
//! SSH/SFTP channel, verifies every transfer end-to-end with a content
//! digest, retries failed attempts with exponential backoff, and derives
//! statistical-process-control indicators from observed throughput.
//!
//! ## Features
//!
//! - **Verified Transfers**: streaming SHA-256/BLAKE3 digests compared
//!   against the remote checksum command's output
//! - **Bounded Retry**: explicit attempt state machine with base-2
//!   exponential backoff
//! - **SPC Metrics**: capability index (Cpk), 3-sigma control limits,
//!   and sigma level over throughput samples
//! - **Quality Reports**: JSON reports and control chart data for
//!   external renderers
//! - **Bandwidth Control**: optional token-bucket byte-rate ceiling on
//!   the channel
//!
//! ## Quick Start
//!
//! ```no_run
//! use sigmacopy::config::{ChannelConfig, QualitySpec, TransferPolicy};
//! use sigmacopy::core::TransferSession;
//! use sigmacopy::network::SshChannel;
//! use sigmacopy::report::QualityReportBuilder;
//! use std::path::Path;
//!
//! let config = ChannelConfig {
//!     host: "server.example.com".to_string(),
//!     user: "deploy".to_string(),
//!     ..Default::default()
//! };
//!
//! let channel = SshChannel::connect(&config).unwrap();
//! let mut session = TransferSession::new(channel, TransferPolicy::default());
//!
//! session.transfer(Path::new("/local/data.bin"), "/remote/data.bin");
//!
//! let records = session.finish();
//! if let Some(report) = QualityReportBuilder::new(&records, QualitySpec::default()).build() {
//!     report.save(Path::new("quality_report.json")).unwrap();
//! }
//! ```
//!
//! ## Statistics Only
//!
//! ```
//! use sigmacopy::stats::SpcAnalyzer;
//!
//! let analyzer = SpcAnalyzer::new(vec![5.0, 8.0, 12.0, 9.0, 11.0]);
//! let cpk = analyzer.capability_index(100.0, 10.0);
//! let sigma = analyzer.sigma_level(10.0);
//! let limits = analyzer.control_limits();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod hash;
pub mod network;
pub mod report;
pub mod stats;

// Re-export commonly used types
pub use config::{ChannelConfig, HashAlgorithm, QualitySpec, TransferPolicy};
pub use core::{TransferRecord, TransferSession};
pub use error::{Result, SigmaCopyError};
pub use stats::SpcAnalyzer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use sigmacopy::prelude::*;
    //! ```

    pub use crate::config::{
        ChannelConfig, HashAlgorithm, QualitySpec, RemoteTarget, TransferPolicy,
    };
    pub use crate::core::{TransferRecord, TransferSession};
    pub use crate::error::{Result, SigmaCopyError};
    pub use crate::hash::{hash_bytes, hash_file, HashResult};
    pub use crate::network::{RemoteChannel, SshChannel};
    pub use crate::report::{ControlChartData, QualityReport, QualityReportBuilder};
    pub use crate::stats::{ControlLimits, SpcAnalyzer};
}
