//! Configuration settings for SigmaCopy
//!
//! Defines all configuration options, CLI arguments, and defaults
//! for the transfer session and quality analysis.

use crate::error::{Result, SigmaCopyError};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// SigmaCopy - Secure file transfer with Six Sigma quality monitoring
#[derive(Parser, Debug, Clone)]
#[command(name = "sigmacopy")]
#[command(author = "SigmaCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Secure file transfer with Six Sigma quality monitoring")]
#[command(long_about = r#"
SigmaCopy transfers files to a remote host over SSH/SFTP, verifies each
transfer end-to-end with a content digest, retries failed attempts with
exponential backoff, and derives statistical-process-control metrics
(Cpk, control limits, sigma level) from observed throughput.

Examples:
  sigmacopy file.dat user@server:/data/               # Single file
  sigmacopy a.bin b.bin user@server:/backup/          # Multiple files
  sigmacopy big.iso user@server:/iso/ --retries 5     # More attempts
  sigmacopy f.dat user@server:/d/ --report out.json   # Quality report
"#)]
pub struct CliArgs {
    /// Local source files followed by the remote destination (user@host:/path)
    #[arg(value_name = "SOURCE... DESTINATION", required = true, num_args = 2..)]
    pub paths: Vec<String>,

    /// SSH port
    #[arg(long, default_value = "22", value_name = "PORT")]
    pub port: u16,

    /// SSH private key path (falls back to the SSH agent)
    #[arg(short = 'i', long, value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Hash algorithm for verification
    #[arg(long, value_enum, default_value = "sha256", value_name = "ALGO")]
    pub algorithm: HashAlgorithm,

    /// Disable remote checksum verification
    #[arg(long)]
    pub no_verify: bool,

    /// Maximum transfer attempts per file
    #[arg(long, default_value = "3", value_name = "NUM")]
    pub retries: u32,

    /// Backoff unit; attempt n sleeps 2^n of these before retrying
    #[arg(long, default_value = "1s", value_name = "DURATION")]
    pub retry_delay: String,

    /// Channel I/O timeout
    #[arg(long, default_value = "15s", value_name = "DURATION")]
    pub timeout: String,

    /// Bandwidth limit (e.g., 100M for 100 MB/s)
    #[arg(long, value_name = "RATE")]
    pub bandwidth_limit: Option<String>,

    /// Throughput below this (Mbps) counts as a defect
    #[arg(long, default_value = "10.0", value_name = "MBPS")]
    pub defect_threshold: f64,

    /// Upper specification limit for Cpk (Mbps)
    #[arg(long, default_value = "100.0", value_name = "MBPS")]
    pub usl: f64,

    /// Lower specification limit for Cpk (Mbps)
    #[arg(long, default_value = "10.0", value_name = "MBPS")]
    pub lsl: f64,

    /// Write the quality report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write control chart data as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub chart_data: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Split the positional paths into local sources and the parsed
    /// remote destination (the last path)
    pub fn split_paths(&self) -> Result<(Vec<PathBuf>, RemoteTarget)> {
        let (dest, sources) = self
            .paths
            .split_last()
            .ok_or_else(|| SigmaCopyError::config("missing SOURCE and DESTINATION"))?;

        if sources.is_empty() {
            return Err(SigmaCopyError::config(
                "need at least one SOURCE and a DESTINATION",
            ));
        }

        let target = RemoteTarget::parse(dest)?;
        Ok((sources.iter().map(PathBuf::from).collect(), target))
    }
}

/// Hash algorithms with a remote checksum command counterpart
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (remote: sha256sum)
    Sha256,
    /// BLAKE3 (remote: b3sum)
    Blake3,
}

impl HashAlgorithm {
    /// Expected digest length in hex characters
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Blake3 => 64,
        }
    }

    /// Remote command that prints "<digest> <path>" for the given path
    pub fn remote_command(&self, remote_path: &str) -> String {
        match self {
            Self::Sha256 => format!("sha256sum {}", remote_path),
            Self::Blake3 => format!("b3sum {}", remote_path),
        }
    }
}

/// Parsed remote destination of the form user@host:/path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// SSH username
    pub user: String,
    /// Remote hostname or IP
    pub host: String,
    /// Remote destination path
    pub path: String,
}

impl RemoteTarget {
    /// Parse a destination string of the form `user@host:/path`
    pub fn parse(raw: &str) -> Result<Self> {
        let (user, rest) = raw
            .split_once('@')
            .ok_or_else(|| SigmaCopyError::config(format!("missing user in '{}'", raw)))?;
        let (host, path) = rest
            .split_once(':')
            .ok_or_else(|| SigmaCopyError::config(format!("missing remote path in '{}'", raw)))?;

        if user.is_empty() || host.is_empty() || path.is_empty() {
            return Err(SigmaCopyError::config(format!(
                "invalid destination '{}', expected user@host:/path",
                raw
            )));
        }

        Ok(Self {
            user: user.to_string(),
            host: host.to_string(),
            path: path.to_string(),
        })
    }

    /// Resolve the remote path for a given local source file.
    ///
    /// A destination ending in '/' is treated as a directory and the
    /// source file name is appended; otherwise the path is used as-is.
    pub fn remote_path_for(&self, source: &std::path::Path) -> String {
        if self.path.ends_with('/') {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            format!("{}{}", self.path, name)
        } else {
            self.path.clone()
        }
    }
}

/// Secure channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Remote hostname or IP
    pub host: String,
    /// SSH port
    pub port: u16,
    /// SSH username
    pub user: String,
    /// SSH private key path (None = use SSH agent)
    pub key_path: Option<PathBuf>,
    /// I/O timeout for channel operations
    pub timeout: Duration,
    /// Byte-rate ceiling (bytes/sec, None = unlimited)
    pub bandwidth_limit: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            user: String::new(),
            key_path: None,
            timeout: Duration::from_secs(15),
            bandwidth_limit: None,
        }
    }
}

impl ChannelConfig {
    /// Build channel configuration from CLI arguments and a parsed target
    pub fn from_cli(args: &CliArgs, target: &RemoteTarget) -> Result<Self> {
        let timeout = humantime::parse_duration(&args.timeout)
            .map_err(|e| SigmaCopyError::config(format!("invalid timeout: {}", e)))?;

        let bandwidth_limit = match &args.bandwidth_limit {
            Some(rate) => Some(parse_rate(rate).ok_or_else(|| {
                SigmaCopyError::config(format!("invalid bandwidth limit '{}'", rate))
            })?),
            None => None,
        };

        Ok(Self {
            host: target.host.clone(),
            port: args.port,
            user: target.user.clone(),
            key_path: args.key.clone(),
            timeout,
            bandwidth_limit,
        })
    }
}

/// Retry and verification policy for a transfer session
#[derive(Debug, Clone)]
pub struct TransferPolicy {
    /// Verify each transfer against a remote digest
    pub verify: bool,
    /// Maximum attempts per file (>= 1)
    pub max_attempts: u32,
    /// Backoff unit; attempt n sleeps this * 2^n before retrying
    pub retry_delay: Duration,
    /// Digest algorithm for local and remote hashing
    pub algorithm: HashAlgorithm,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            verify: true,
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            algorithm: HashAlgorithm::Sha256,
        }
    }
}

impl TransferPolicy {
    /// Build transfer policy from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        if args.retries == 0 {
            return Err(SigmaCopyError::config("--retries must be at least 1"));
        }

        let retry_delay = humantime::parse_duration(&args.retry_delay)
            .map_err(|e| SigmaCopyError::config(format!("invalid retry delay: {}", e)))?;

        Ok(Self {
            verify: !args.no_verify,
            max_attempts: args.retries,
            retry_delay,
            algorithm: args.algorithm,
        })
    }
}

/// Specification limits and defect threshold for quality analysis
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualitySpec {
    /// Upper specification limit (Mbps)
    pub upper_spec_limit: f64,
    /// Lower specification limit (Mbps)
    pub lower_spec_limit: f64,
    /// Throughput strictly below this counts as a defect (Mbps)
    pub defect_threshold: f64,
}

impl Default for QualitySpec {
    fn default() -> Self {
        Self {
            upper_spec_limit: 100.0,
            lower_spec_limit: 10.0,
            defect_threshold: 10.0,
        }
    }
}

impl QualitySpec {
    /// Build quality spec from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            upper_spec_limit: args.usl,
            lower_spec_limit: args.lsl,
            defect_threshold: args.defect_threshold,
        }
    }
}

/// Parse a human-readable rate string (e.g., "100M", "1G", "500K") into bytes/sec
pub fn parse_rate(rate: &str) -> Option<u64> {
    let rate = rate.trim().to_uppercase();

    let (num_str, multiplier) = if rate.ends_with("G") || rate.ends_with("GB") {
        (rate.trim_end_matches("GB").trim_end_matches('G'), 1024 * 1024 * 1024)
    } else if rate.ends_with("M") || rate.ends_with("MB") {
        (rate.trim_end_matches("MB").trim_end_matches('M'), 1024 * 1024)
    } else if rate.ends_with("K") || rate.ends_with("KB") {
        (rate.trim_end_matches("KB").trim_end_matches('K'), 1024)
    } else {
        (rate.as_str(), 1)
    };

    let num: f64 = num_str.parse().ok()?;
    let bytes_per_second = (num * multiplier as f64) as u64;

    if bytes_per_second > 0 {
        Some(bytes_per_second)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_remote_target_parse() {
        let target = RemoteTarget::parse("deploy@server.example.com:/data/incoming/").unwrap();
        assert_eq!(target.user, "deploy");
        assert_eq!(target.host, "server.example.com");
        assert_eq!(target.path, "/data/incoming/");

        assert!(RemoteTarget::parse("server:/path").is_err());
        assert!(RemoteTarget::parse("user@server").is_err());
        assert!(RemoteTarget::parse("@server:/path").is_err());
    }

    #[test]
    fn test_remote_path_resolution() {
        let dir = RemoteTarget::parse("u@h:/data/").unwrap();
        assert_eq!(dir.remote_path_for(Path::new("/local/file.bin")), "/data/file.bin");

        let file = RemoteTarget::parse("u@h:/data/renamed.bin").unwrap();
        assert_eq!(file.remote_path_for(Path::new("/local/file.bin")), "/data/renamed.bin");
    }

    #[test]
    fn test_remote_command() {
        assert_eq!(
            HashAlgorithm::Sha256.remote_command("/remote/f.dat"),
            "sha256sum /remote/f.dat"
        );
        assert_eq!(
            HashAlgorithm::Blake3.remote_command("/remote/f.dat"),
            "b3sum /remote/f.dat"
        );
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("100M"), Some(100 * 1024 * 1024));
        assert_eq!(parse_rate("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_rate("500K"), Some(500 * 1024));
        assert_eq!(parse_rate("2048"), Some(2048));
        assert_eq!(parse_rate("1.5M"), Some((1.5 * 1024.0 * 1024.0) as u64));
        assert_eq!(parse_rate("junk"), None);
        assert_eq!(parse_rate("0"), None);
    }

    #[test]
    fn test_split_paths() {
        let args = CliArgs::parse_from([
            "sigmacopy",
            "a.bin",
            "b.bin",
            "deploy@server:/data/",
        ]);
        let (sources, target) = args.split_paths().unwrap();
        assert_eq!(sources, vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")]);
        assert_eq!(target.host, "server");

        let args = CliArgs::parse_from(["sigmacopy", "a.bin", "not-a-target"]);
        assert!(args.split_paths().is_err());
    }

    #[test]
    fn test_default_policy() {
        let policy = TransferPolicy::default();
        assert!(policy.verify);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(1));
    }
}
