//! Transfer session with verification and retry
//!
//! One session owns one secure channel for its whole lifetime and runs
//! file transfers strictly sequentially. Each transfer is an explicit
//! bounded state machine: `Attempting(n)` moves to `Succeeded` on a clean,
//! verified attempt, to `Attempting(n + 1)` on a recoverable failure, and
//! to `Failed` when the attempt budget is exhausted.

use crate::config::TransferPolicy;
use crate::error::{Result, SigmaCopyError};
use crate::hash::{hash_file, parse_digest_output};
use crate::network::RemoteChannel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One completed, verified transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Source file identifier
    pub filename: String,
    /// Size of the transferred content
    pub size_bytes: u64,
    /// Wall-clock time of the successful attempt only; retries excluded
    pub duration_seconds: f64,
    /// Derived throughput; set by the constructor, never mutated
    pub throughput_mbps: f64,
    /// Lowercase hex content digest
    pub digest_hex: String,
    /// Record creation time
    pub timestamp: DateTime<Utc>,
}

impl TransferRecord {
    /// Create a record for a successful transfer.
    ///
    /// `throughput_mbps` is always recomputed from size and duration:
    /// `size_bytes * 8 / (duration_seconds * 1_000_000)`.
    pub fn new(
        filename: impl Into<String>,
        size_bytes: u64,
        duration_seconds: f64,
        digest_hex: impl Into<String>,
    ) -> Self {
        let throughput_mbps = (size_bytes as f64 * 8.0) / (duration_seconds * 1_000_000.0);

        Self {
            filename: filename.into(),
            size_bytes,
            duration_seconds,
            throughput_mbps,
            digest_hex: digest_hex.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Retry state for a single file transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptState {
    /// Running attempt n (1-based)
    Attempting(u32),
    /// Terminal: transfer completed and verified
    Succeeded,
    /// Terminal: attempt budget exhausted
    Failed,
}

/// Transfer session owning a secure channel and the records it produces
pub struct TransferSession<C: RemoteChannel> {
    channel: C,
    policy: TransferPolicy,
    records: Vec<TransferRecord>,
}

impl<C: RemoteChannel> TransferSession<C> {
    /// Create a session over an already-connected channel
    pub fn new(channel: C, policy: TransferPolicy) -> Self {
        Self {
            channel,
            policy,
            records: Vec::new(),
        }
    }

    /// Transfer one file with verification and retry.
    ///
    /// Returns `true` iff a new [`TransferRecord`] was appended, with a
    /// duration measured strictly for the successful attempt. Returns
    /// `false` after all attempts are exhausted; no record is appended
    /// and no error escapes. Calling again for the same file appends an
    /// additional independent record.
    pub fn transfer(&mut self, local: &Path, remote: &str) -> bool {
        let mut state = AttemptState::Attempting(1);

        while let AttemptState::Attempting(attempt) = state {
            state = match self.attempt_once(local, remote) {
                Ok(record) => {
                    tracing::info!(
                        "Transfer successful: {} -> {} ({:.2} Mbps)",
                        local.display(),
                        remote,
                        record.throughput_mbps
                    );
                    self.records.push(record);
                    AttemptState::Succeeded
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.policy.max_attempts,
                        local.display(),
                        e
                    );

                    if attempt >= self.policy.max_attempts {
                        tracing::error!("Max attempts exceeded for {}", local.display());
                        AttemptState::Failed
                    } else {
                        // Exponential backoff: 2^attempt delay units
                        std::thread::sleep(self.policy.retry_delay * (1u32 << attempt));
                        AttemptState::Attempting(attempt + 1)
                    }
                }
            };
        }

        state == AttemptState::Succeeded
    }

    /// Run one attempt: hash, timed put, optional remote digest check
    fn attempt_once(&mut self, local: &Path, remote: &str) -> Result<TransferRecord> {
        let local_hash = hash_file(local, self.policy.algorithm)?;

        let start = Instant::now();
        self.channel.put(local, remote)?;
        let duration = start.elapsed();

        if self.policy.verify {
            let command = self.policy.algorithm.remote_command(remote);
            let output = self.channel.run_command(&command)?;
            let remote_digest = parse_digest_output(&output, self.policy.algorithm)?;

            if remote_digest != local_hash.hash {
                return Err(SigmaCopyError::integrity_mismatch(
                    remote,
                    &local_hash.hash,
                    remote_digest,
                ));
            }
        }

        Ok(TransferRecord::new(
            local.to_string_lossy(),
            local_hash.size,
            duration.as_secs_f64(),
            local_hash.hash,
        ))
    }

    /// Transfer a list of (local, remote) pairs sequentially.
    /// Returns the number of successful transfers.
    pub fn transfer_all(&mut self, pairs: &[(PathBuf, String)]) -> usize {
        pairs
            .iter()
            .filter(|(local, remote)| self.transfer(local, remote))
            .count()
    }

    /// Records appended so far, in creation order
    pub fn records(&self) -> &[TransferRecord] {
        &self.records
    }

    /// End the session, releasing the channel, and take the records
    pub fn finish(self) -> Vec<TransferRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashAlgorithm;
    use crate::hash::hash_bytes;
    use std::collections::VecDeque;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Scripted channel: pops one result per put / run_command call
    struct MockChannel {
        put_results: VecDeque<Result<u64>>,
        digest_outputs: VecDeque<Result<String>>,
        puts: usize,
        commands: Vec<String>,
    }

    impl MockChannel {
        fn new() -> Self {
            Self {
                put_results: VecDeque::new(),
                digest_outputs: VecDeque::new(),
                puts: 0,
                commands: Vec::new(),
            }
        }

        fn with_puts(mut self, results: Vec<Result<u64>>) -> Self {
            self.put_results = results.into();
            self
        }

        fn with_digests(mut self, outputs: Vec<Result<String>>) -> Self {
            self.digest_outputs = outputs.into();
            self
        }
    }

    impl RemoteChannel for MockChannel {
        fn put(&mut self, _local: &Path, _remote: &str) -> Result<u64> {
            self.puts += 1;
            self.put_results.pop_front().unwrap_or(Ok(0))
        }

        fn run_command(&mut self, command: &str) -> Result<String> {
            self.commands.push(command.to_string());
            self.digest_outputs
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn test_policy(max_attempts: u32) -> TransferPolicy {
        TransferPolicy {
            verify: true,
            max_attempts,
            retry_delay: Duration::from_millis(1),
            algorithm: HashAlgorithm::Sha256,
        }
    }

    fn write_source(dir: &TempDir, content: &[u8]) -> PathBuf {
        let path = dir.path().join("source.bin");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_success_appends_one_record() {
        let dir = TempDir::new().unwrap();
        let content = b"some payload bytes";
        let source = write_source(&dir, content);
        let digest = hash_bytes(content, HashAlgorithm::Sha256).hash;

        let channel = MockChannel::new()
            .with_puts(vec![Ok(content.len() as u64)])
            .with_digests(vec![Ok(format!("{}  /remote/source.bin\n", digest))]);

        let mut session = TransferSession::new(channel, test_policy(3));
        assert!(session.transfer(&source, "/remote/source.bin"));

        assert_eq!(session.records().len(), 1);
        let record = &session.records()[0];
        assert_eq!(record.digest_hex, digest);
        assert_eq!(record.size_bytes, content.len() as u64);
        assert!(record.duration_seconds >= 0.0);
        assert_eq!(session.channel.puts, 1);
        assert_eq!(
            session.channel.commands,
            vec!["sha256sum /remote/source.bin".to_string()]
        );
    }

    #[test]
    fn test_permanent_failure_exhausts_attempts() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, b"data");

        let channel = MockChannel::new().with_puts(vec![
            Err(SigmaCopyError::TransportError("broken pipe".into())),
            Err(SigmaCopyError::TransportError("broken pipe".into())),
            Err(SigmaCopyError::TransportError("broken pipe".into())),
        ]);

        let policy = TransferPolicy {
            retry_delay: Duration::from_millis(10),
            ..test_policy(3)
        };

        let start = Instant::now();
        let mut session = TransferSession::new(channel, policy);
        assert!(!session.transfer(&source, "/remote/data"));

        assert_eq!(session.records().len(), 0);
        assert_eq!(session.channel.puts, 3);
        // Two backoff sleeps: 2 and 4 delay units
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_single_attempt_fails_without_sleep() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, b"data");

        let channel = MockChannel::new()
            .with_puts(vec![Err(SigmaCopyError::TransportError("refused".into()))]);

        let policy = TransferPolicy {
            retry_delay: Duration::from_secs(10),
            ..test_policy(1)
        };

        let start = Instant::now();
        let mut session = TransferSession::new(channel, policy);
        assert!(!session.transfer(&source, "/remote/data"));

        assert_eq!(session.channel.puts, 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_integrity_mismatch_is_retried() {
        let dir = TempDir::new().unwrap();
        let content = b"verified payload";
        let source = write_source(&dir, content);
        let digest = hash_bytes(content, HashAlgorithm::Sha256).hash;
        let wrong = "0".repeat(64);

        let channel = MockChannel::new()
            .with_puts(vec![Ok(content.len() as u64), Ok(content.len() as u64)])
            .with_digests(vec![
                Ok(format!("{}  /remote/f\n", wrong)),
                Ok(format!("{}  /remote/f\n", digest)),
            ]);

        let mut session = TransferSession::new(channel, test_policy(3));
        assert!(session.transfer(&source, "/remote/f"));

        assert_eq!(session.channel.puts, 2);
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn test_verification_disabled_skips_remote_digest() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, b"unverified");

        let channel = MockChannel::new().with_puts(vec![Ok(10)]);
        let policy = TransferPolicy {
            verify: false,
            ..test_policy(3)
        };

        let mut session = TransferSession::new(channel, policy);
        assert!(session.transfer(&source, "/remote/f"));

        assert!(session.channel.commands.is_empty());
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn test_unreadable_source_counts_as_attempt_failure() {
        let channel = MockChannel::new();
        let mut session = TransferSession::new(channel, test_policy(2));

        assert!(!session.transfer(Path::new("/no/such/file"), "/remote/f"));
        // Hashing fails before the channel is touched
        assert_eq!(session.channel.puts, 0);
        assert_eq!(session.records().len(), 0);
    }

    #[test]
    fn test_repeat_transfer_appends_independent_records() {
        let dir = TempDir::new().unwrap();
        let content = b"same file twice";
        let source = write_source(&dir, content);
        let digest = hash_bytes(content, HashAlgorithm::Sha256).hash;
        let line = format!("{}  /remote/f\n", digest);

        let channel = MockChannel::new()
            .with_puts(vec![Ok(15), Ok(15)])
            .with_digests(vec![Ok(line.clone()), Ok(line)]);

        let mut session = TransferSession::new(channel, test_policy(3));
        assert!(session.transfer(&source, "/remote/f"));
        assert!(session.transfer(&source, "/remote/f"));

        let records = session.finish();
        assert_eq!(records.len(), 2);
        assert!(records[0].timestamp <= records[1].timestamp);
    }

    #[test]
    fn test_record_throughput_derivation() {
        let record = TransferRecord::new("f.bin", 1_000_000, 1.0, "ab");
        assert!((record.throughput_mbps - 8.0).abs() < f64::EPSILON);

        let record = TransferRecord::new("f.bin", 500_000, 2.0, "ab");
        assert!((record.throughput_mbps - 2.0).abs() < f64::EPSILON);
    }
}
