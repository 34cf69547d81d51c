//! Authenticated, ordered message channel over loopback TCP.
//!
//! Framing: 4-byte big-endian length prefix, then one JSON-encoded
//! [`Message`]. Each frame is delivered atomically; a peer never observes a
//! partial message.
//!
//! Authentication happens before any message flows. The accepting side
//! sends a random nonce; the connecting side must answer
//! `sha256(nonce || secret)` in hex. A wrong answer closes the connection:
//! the channel fails closed. The secret travels out-of-band as a launch
//! argument, never over the socket.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};

use rand::RngCore;
use sha2::{Digest, Sha256};

use objbox_core::error::{Error, Result};

use crate::message::Message;

/// Upper bound on a single frame; refuse absurd lengths before allocating.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const AUTH_OK: &[u8] = b"ok";
const NONCE_LEN: usize = 32;

pub struct MessageChannel {
    stream: TcpStream,
}

impl MessageChannel {
    /// Connect to a listening endpoint and answer its auth challenge.
    pub fn connect(port: u16, secret: &str) -> Result<Self> {
        let stream = TcpStream::connect(("127.0.0.1", port))?;
        let mut channel = Self { stream };
        let nonce = channel.recv_frame()?;
        channel.send_frame(auth_digest(&nonce, secret).as_bytes())?;
        let verdict = channel.recv_frame()?;
        if verdict != AUTH_OK {
            return Err(Error::Protocol("authentication rejected by peer".to_string()));
        }
        Ok(channel)
    }

    /// Accept one connection and verify the peer knows the shared secret.
    /// Blocks until a peer connects; the caller must have spawned one.
    pub fn accept(listener: &TcpListener, secret: &str) -> Result<Self> {
        let (stream, peer) = listener.accept()?;
        tracing::debug!(%peer, "channel connection accepted, authenticating");
        let mut channel = Self { stream };
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        channel.send_frame(&nonce)?;
        let answer = channel.recv_frame()?;
        if answer != auth_digest(&nonce, secret).as_bytes() {
            channel.shutdown();
            return Err(Error::Protocol("peer failed authentication".to_string()));
        }
        channel.send_frame(AUTH_OK)?;
        Ok(channel)
    }

    /// Send one message. Blocking; [`Error::ChannelClosed`] if the peer is
    /// gone.
    pub fn send(&mut self, msg: &Message) -> Result<()> {
        let payload = serde_json::to_vec(msg)?;
        self.send_frame(&payload)
    }

    /// Receive one full message, blocking until it arrives or the channel
    /// closes. A frame that does not decode is a fatal [`Error::Protocol`].
    pub fn recv(&mut self) -> Result<Message> {
        let frame = self.recv_frame()?;
        serde_json::from_slice(&frame)
            .map_err(|e| Error::Protocol(format!("malformed frame: {e}")))
    }

    /// Half of the documented cancellation path: dropping the transport
    /// unblocks a peer stuck in `recv`.
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_FRAME_SIZE {
            return Err(Error::Protocol(format!(
                "frame of {} bytes exceeds the {} byte limit",
                payload.len(),
                MAX_FRAME_SIZE
            )));
        }
        let len = (payload.len() as u32).to_be_bytes();
        self.stream.write_all(&len).map_err(map_io)?;
        self.stream.write_all(payload).map_err(map_io)?;
        self.stream.flush().map_err(map_io)?;
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).map_err(map_io)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(Error::Protocol(format!(
                "peer announced a frame of {len} bytes, limit is {MAX_FRAME_SIZE}"
            )));
        }
        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).map_err(map_io)?;
        Ok(payload)
    }
}

fn map_io(e: std::io::Error) -> Error {
    use std::io::ErrorKind::*;
    match e.kind() {
        UnexpectedEof | BrokenPipe | ConnectionReset | ConnectionAborted | NotConnected => {
            Error::ChannelClosed
        }
        _ => Error::Io(e),
    }
}

fn auth_digest(nonce: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fresh shared secret for one channel, passed to the child as a launch
/// argument.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn bound_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn authenticated_pair_exchanges_messages() {
        let (listener, port) = bound_listener();
        let secret = generate_secret();
        let client_secret = secret.clone();

        let client = thread::spawn(move || {
            let mut channel = MessageChannel::connect(port, &client_secret).unwrap();
            channel.send(&Message::Setup { seed: 7 }).unwrap();
            channel.recv().unwrap()
        });

        let mut server = MessageChannel::accept(&listener, &secret).unwrap();
        assert_eq!(server.recv().unwrap(), Message::Setup { seed: 7 });
        server.send(&Message::Quit).unwrap();

        assert_eq!(client.join().unwrap(), Message::Quit);
    }

    #[test]
    fn wrong_secret_fails_closed() {
        let (listener, port) = bound_listener();

        let client = thread::spawn(move || MessageChannel::connect(port, "wrong"));
        let server = MessageChannel::accept(&listener, "right");

        assert!(matches!(server, Err(Error::Protocol(_))));
        assert!(client.join().unwrap().is_err());
    }

    #[test]
    fn peer_disappearing_is_channel_closed() {
        let (listener, port) = bound_listener();
        let secret = generate_secret();
        let client_secret = secret.clone();

        let client = thread::spawn(move || {
            let channel = MessageChannel::connect(port, &client_secret).unwrap();
            drop(channel);
        });

        let mut server = MessageChannel::accept(&listener, &secret).unwrap();
        client.join().unwrap();
        assert!(matches!(server.recv(), Err(Error::ChannelClosed)));
    }

    #[test]
    fn announced_oversize_frame_is_rejected() {
        let (listener, port) = bound_listener();
        let secret = generate_secret();
        let client_secret = secret.clone();

        let client = thread::spawn(move || {
            let mut channel = MessageChannel::connect(port, &client_secret).unwrap();
            // Hand-rolled frame header announcing far more than the limit.
            let len = ((MAX_FRAME_SIZE + 1) as u32).to_be_bytes();
            channel.stream.write_all(&len).unwrap();
            channel.stream.flush().unwrap();
            // Keep the socket open until the server has judged the header.
            let _ = channel.recv_frame();
        });

        let mut server = MessageChannel::accept(&listener, &secret).unwrap();
        assert!(matches!(server.recv(), Err(Error::Protocol(_))));
        server.shutdown();
        client.join().unwrap();
    }
}
