//! UDP transport for outbound queries.
//!
//! One socket, bound once at startup, shared by every query the walk
//! sends. Exchanges are strictly sequential: send one datagram, block
//! until the reply arrives or the per-query deadline elapses.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Maximum size of a DNS packet (with some headroom).
pub const MAX_DNS_PACKET_SIZE: usize = 4096;

/// Standard DNS port.
pub const DNS_PORT: u16 = 53;

/// Blocking-style UDP client with a fixed receive deadline.
pub struct UdpClient {
    socket: UdpSocket,
    port: u16,
    timeout: Duration,
}

impl UdpClient {
    /// Bind an ephemeral local socket. `port` is the destination port
    /// for every exchange (53 outside of tests).
    pub async fn bind(port: u16, timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        Ok(Self {
            socket,
            port,
            timeout,
        })
    }

    /// Send `payload` to `server` and wait for one datagram back.
    ///
    /// A deadline elapse surfaces as [`Error::Timeout`]; the walk treats
    /// that as fatal for the whole resolve.
    pub async fn exchange(&self, payload: &[u8], server: Ipv4Addr) -> Result<Vec<u8>> {
        let dest = SocketAddr::from((server, self.port));
        self.socket.send_to(payload, dest).await?;

        let mut buf = [0u8; MAX_DNS_PACKET_SIZE];
        match tokio::time::timeout(self.timeout, self.socket.recv_from(&mut buf)).await {
            Ok(received) => {
                let (len, _) = received?;
                Ok(buf[..len].to_vec())
            }
            Err(_) => Err(Error::Timeout),
        }
    }
}
