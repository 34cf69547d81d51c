//! Caller-side ownership of one child process and its message channel.
//!
//! The listening endpoint is bound (and the ephemeral port known) before
//! the child command line is assembled, so the child can never race the
//! listener. No retries anywhere: a closed channel or malformed frame is
//! surfaced to the caller as-is.

use std::path::Path;
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use objbox_core::error::{Error, Result};

use crate::channel::{self, MessageChannel};
use crate::message::Message;

/// Grace period between shutting the channel and force-killing the child.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

pub struct ProcessWrapper {
    child: Option<Child>,
    channel: Option<MessageChannel>,
}

impl ProcessWrapper {
    /// Bind the listener, spawn `run_script <port> <secret> [extra…]`, and
    /// authenticate the connection. Blocks until the child connects, with no
    /// timeout; cancellation means calling `close`/`kill` from another owner
    /// or killing the child externally.
    pub fn start(run_script: &Path, extra_args: &[String]) -> Result<Self> {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
        let port = listener.local_addr()?.port();
        let secret = channel::generate_secret();

        tracing::debug!(script = %run_script.display(), port, "spawning isolated child");
        let child = Command::new(run_script)
            .arg(port.to_string())
            .arg(&secret)
            .args(extra_args)
            .spawn()
            .map_err(|e| {
                Error::Configuration(format!(
                    "failed to spawn run script {}: {e}",
                    run_script.display()
                ))
            })?;

        let channel = MessageChannel::accept(&listener, &secret)?;
        Ok(Self {
            child: Some(child),
            channel: Some(channel),
        })
    }

    /// Blocking send. [`Error::ChannelClosed`] if the peer is gone or the
    /// wrapper is already closed.
    pub fn send(&mut self, msg: &Message) -> Result<()> {
        self.channel
            .as_mut()
            .ok_or(Error::ChannelClosed)?
            .send(msg)
    }

    /// Blocks until a full message arrives or the channel closes.
    pub fn recv(&mut self) -> Result<Message> {
        self.channel.as_mut().ok_or(Error::ChannelClosed)?.recv()
    }

    /// Idempotent release: shut the channel, give the child a short grace
    /// period to exit on its own (it sees the closed channel), then kill it.
    pub fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            channel.shutdown();
        }
        if let Some(mut child) = self.child.take() {
            let deadline = Instant::now() + CLOSE_GRACE;
            loop {
                match child.try_wait()? {
                    Some(status) => {
                        tracing::debug!(%status, "isolated child exited");
                        break;
                    }
                    None if Instant::now() >= deadline => {
                        tracing::warn!("isolated child did not exit, killing");
                        child.kill()?;
                        child.wait()?;
                        break;
                    }
                    None => std::thread::sleep(Duration::from_millis(20)),
                }
            }
        }
        Ok(())
    }

    /// Hard cancellation: kill the child without the grace period.
    pub fn kill(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            channel.shutdown();
        }
        if let Some(mut child) = self.child.take() {
            child.kill()?;
            child.wait()?;
        }
        Ok(())
    }
}

impl Drop for ProcessWrapper {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "process wrapper close failed on drop");
        }
    }
}
