//! Bandwidth throttling for controlled transfer rates
//!
//! Implements rate limiting using the Governor crate for smooth,
//! token-bucket based bandwidth control.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Bandwidth limiter for controlling transfer rates
pub struct BandwidthLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    bytes_per_token: usize,
}

impl BandwidthLimiter {
    /// Create a new bandwidth limiter
    ///
    /// # Arguments
    /// * `bytes_per_second` - Maximum transfer rate in bytes per second
    pub fn new(bytes_per_second: u64) -> Self {
        // 1KB chunks as tokens for smoother throttling
        const BYTES_PER_TOKEN: usize = 1024;

        let tokens_per_second = (bytes_per_second as usize / BYTES_PER_TOKEN).max(1);

        // Cap at u32::MAX to prevent overflow when casting
        let capped_tokens = tokens_per_second.min(u32::MAX as usize) as u32;
        let quota = Quota::per_second(NonZeroU32::new(capped_tokens).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            bytes_per_token: BYTES_PER_TOKEN,
        }
    }

    /// Wait (blocking) until we're allowed to transfer the given number of bytes
    pub fn wait_for_capacity(&self, bytes: usize) {
        let tokens_needed = (bytes / self.bytes_per_token).max(1);

        for _ in 0..tokens_needed {
            while self.limiter.check().is_err() {
                std::thread::sleep(Duration::from_micros(100));
            }
        }
    }

    /// Try to acquire capacity without blocking.
    /// Returns true if capacity was available
    pub fn try_acquire(&self, bytes: usize) -> bool {
        let tokens_needed = (bytes / self.bytes_per_token).max(1);

        for _ in 0..tokens_needed {
            if self.limiter.check().is_err() {
                return false;
            }
        }
        true
    }
}

impl Clone for BandwidthLimiter {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            bytes_per_token: self.bytes_per_token,
        }
    }
}

/// Throttled reader that limits read bandwidth
pub struct ThrottledReader<R> {
    inner: R,
    limiter: BandwidthLimiter,
}

impl<R: std::io::Read> ThrottledReader<R> {
    /// Wrap a reader so that reads wait for rate-limit capacity
    pub fn new(reader: R, limiter: BandwidthLimiter) -> Self {
        Self {
            inner: reader,
            limiter,
        }
    }
}

impl<R: std::io::Read> std::io::Read for ThrottledReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.limiter.wait_for_capacity(buf.len());
        self.inner.read(buf)
    }
}
