//! Secure channel module
//!
//! The `RemoteChannel` trait is the seam between the transfer session and
//! the secure transport; `SshChannel` implements it over SSH/SFTP.

mod ssh;
mod throttle;

pub use ssh::{RemoteChannel, SshChannel};
pub use throttle::{BandwidthLimiter, ThrottledReader};
