use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};

use crate::codec::{encode, PixelPoint};
use crate::error::TransportError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Fire-and-forget datagram publisher for coordinate packets.
///
/// Sends happen only once a target is set; failures are returned to the
/// caller and never retried.
#[derive(Debug)]
pub struct UdpCoordinateSender {
    socket: UdpSocket,
    target: Option<SocketAddrV4>,
}

impl UdpCoordinateSender {
    /// Bind the local socket, e.g. `"0.0.0.0:0"` for an ephemeral port.
    pub fn bind(local: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(local)?;
        Ok(Self {
            socket,
            target: None,
        })
    }

    /// Point the sender at `ip:port`. `ip` must be a dotted IPv4 address.
    pub fn set_target(&mut self, ip: &str, port: u16) -> Result<(), TransportError> {
        let addr = parse_target(ip, port)?;
        if self.target != Some(addr) {
            log::info!("UDP target: {addr}");
        }
        self.target = Some(addr);
        Ok(())
    }

    pub fn target(&self) -> Option<SocketAddrV4> {
        self.target
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one packet with `points`. Returns the number of payload bytes
    /// sent; an empty list or a missing target sends nothing and returns 0.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip_all, fields(points = points.len()))
    )]
    pub fn send(&self, points: &[PixelPoint]) -> Result<usize, TransportError> {
        let Some(target) = self.target else {
            return Ok(0);
        };
        if points.is_empty() {
            return Ok(0);
        }
        let payload = encode(points);
        let sent = self.socket.send_to(payload.as_bytes(), target)?;
        log::trace!("sent {sent} byte(s) to {target}: {payload}");
        Ok(sent)
    }
}

/// Validate an operator-entered IPv4 address and port.
pub fn parse_target(ip: &str, port: u16) -> Result<SocketAddrV4, TransportError> {
    let ip: Ipv4Addr = ip
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidAddress(ip.to_string()))?;
    if port == 0 {
        return Err(TransportError::InvalidPort(port));
    }
    Ok(SocketAddrV4::new(ip, port))
}
