//! SSH/SFTP secure channel
//!
//! Provides the authenticated channel used for file transfer and remote
//! digest commands. One channel is opened per session and released
//! deterministically when the session ends.

use crate::config::ChannelConfig;
use crate::error::{Result, SigmaCopyError};
use crate::network::throttle::{BandwidthLimiter, ThrottledReader};
use ssh2::{Session, Sftp};
use std::io::{BufReader, Read, Write};
use std::net::TcpStream;
use std::path::Path;

/// Operations the transfer session needs from a secure channel.
///
/// The SSH implementation is the production channel; tests drive the
/// session with a scripted implementation of this trait.
pub trait RemoteChannel {
    /// Copy a local file to the remote destination path, returning bytes copied
    fn put(&mut self, local: &Path, remote: &str) -> Result<u64>;

    /// Execute a remote command and return its standard output
    fn run_command(&mut self, command: &str) -> Result<String>;
}

/// SSH connection implementing [`RemoteChannel`] over SFTP
pub struct SshChannel {
    /// SSH session
    session: Session,
    /// SFTP channel
    sftp: Sftp,
    /// Optional byte-rate ceiling
    limiter: Option<BandwidthLimiter>,
    /// Whether the underlying connection has been released
    closed: bool,
}

impl SshChannel {
    /// Connect and authenticate to the remote host
    pub fn connect(config: &ChannelConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| SigmaCopyError::connection(&config.host, e.to_string()))?;

        let mut session = Session::new()
            .map_err(|e| SigmaCopyError::connection(&config.host, e.to_string()))?;

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| SigmaCopyError::connection(&config.host, e.to_string()))?;

        Self::authenticate(&mut session, config)?;

        // The channel timeout is the only bounding mechanism for I/O
        session.set_timeout(config.timeout.as_millis() as u32);

        let sftp = session
            .sftp()
            .map_err(|e| SigmaCopyError::connection(&config.host, e.to_string()))?;

        Ok(Self {
            session,
            sftp,
            limiter: config.bandwidth_limit.map(BandwidthLimiter::new),
            closed: false,
        })
    }

    /// Authenticate with the remote host
    fn authenticate(session: &mut Session, config: &ChannelConfig) -> Result<()> {
        if let Some(key_path) = &config.key_path {
            session
                .userauth_pubkey_file(&config.user, None, key_path, None)
                .map_err(|e| SigmaCopyError::auth(&config.user, &config.host, e.to_string()))?;
        } else {
            let mut agent = session
                .agent()
                .map_err(|e| SigmaCopyError::auth(&config.user, &config.host, e.to_string()))?;

            agent
                .connect()
                .map_err(|e| SigmaCopyError::auth(&config.user, &config.host, e.to_string()))?;

            agent
                .list_identities()
                .map_err(|e| SigmaCopyError::auth(&config.user, &config.host, e.to_string()))?;

            let authenticated = agent
                .identities()
                .unwrap_or_default()
                .iter()
                .any(|identity| agent.userauth(&config.user, identity).is_ok());

            if !authenticated {
                return Err(SigmaCopyError::auth(
                    &config.user,
                    &config.host,
                    "No valid SSH key found in agent",
                ));
            }
        }

        if !session.authenticated() {
            return Err(SigmaCopyError::auth(
                &config.user,
                &config.host,
                "Authentication failed",
            ));
        }

        Ok(())
    }

    /// Release the underlying connection. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            if let Err(e) = self.session.disconnect(None, "session closed", None) {
                tracing::debug!("disconnect failed: {}", e);
            }
            self.closed = true;
        }
    }
}

impl RemoteChannel for SshChannel {
    fn put(&mut self, local: &Path, remote: &str) -> Result<u64> {
        let local_file = std::fs::File::open(local).map_err(|e| SigmaCopyError::io(local, e))?;

        let reader: Box<dyn Read> = match &self.limiter {
            Some(limiter) => Box::new(ThrottledReader::new(local_file, limiter.clone())),
            None => Box::new(local_file),
        };

        let mut remote_file = self
            .sftp
            .create(Path::new(remote))
            .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

        let mut reader = BufReader::with_capacity(1024 * 1024, reader);
        let mut buffer = vec![0u8; 1024 * 1024];
        let mut bytes_copied = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer).map_err(|e| SigmaCopyError::io(local, e))?;

            if bytes_read == 0 {
                break;
            }

            remote_file
                .write_all(&buffer[..bytes_read])
                .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

            bytes_copied += bytes_read as u64;
        }

        Ok(bytes_copied)
    }

    fn run_command(&mut self, command: &str) -> Result<String> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

        channel
            .exec(command)
            .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr).ok();

        channel
            .wait_close()
            .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

        let status = channel
            .exit_status()
            .map_err(|e| SigmaCopyError::TransportError(e.to_string()))?;

        if status != 0 {
            return Err(SigmaCopyError::TransportError(format!(
                "'{}' exited with status {}: {}",
                command,
                status,
                stderr.trim()
            )));
        }

        Ok(stdout)
    }
}

impl Drop for SshChannel {
    fn drop(&mut self) {
        self.close();
    }
}
