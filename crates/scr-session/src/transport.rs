//! Request/reply datagram channel to the race server.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TransportError;

/// Blocking channel the session talks through.
///
/// `receive` waits at most the transport's configured timeout and reports
/// [`TransportError::Timeout`] when nothing arrived.
pub trait Transport {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        (**self).send(payload)
    }

    fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        (**self).receive(max_bytes)
    }
}

pub const DEFAULT_SERVER_PORT: u16 = 3001;
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Receive timeout; 0 blocks indefinitely.
    pub receive_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_SERVER_PORT,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
        }
    }
}

impl TransportConfig {
    pub fn receive_timeout(&self) -> Option<Duration> {
        (self.receive_timeout_ms > 0).then(|| Duration::from_millis(self.receive_timeout_ms))
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// UDP transport bound to an ephemeral local port.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    server: SocketAddr,
}

impl UdpTransport {
    /// Resolve the server and bind a local socket of the same address family.
    ///
    /// # Errors
    ///
    /// Fails if the host does not resolve or the socket cannot be set up.
    pub fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let candidates: Vec<SocketAddr> = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve(format!("{} ({e})", config.server_address())))?
            .collect();
        // the simulator listens on IPv4; prefer it when a name resolves to both
        let server = candidates
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| TransportError::Resolve(config.server_address()))?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_read_timeout(config.receive_timeout())?;

        info!(
            server = %server,
            local = ?socket.local_addr().ok(),
            "UDP transport ready"
        );
        Ok(Self { socket, server })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.socket.send_to(payload, self.server)?;
        Ok(())
    }

    fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; max_bytes];
        match self.socket.recv_from(&mut buf) {
            Ok((len, from)) => {
                if from != self.server {
                    debug!(%from, "datagram from unexpected peer");
                }
                buf.truncate(len);
                Ok(buf)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Err(TransportError::Timeout)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}
