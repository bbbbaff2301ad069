use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Instant;

use crate::codec::{decode, CoordinatePacket, PixelPoint};
use crate::connection::ConnectionMonitor;
use crate::error::TransportError;

/// Default number of recent point lists kept for trail display.
pub const TRAIL_FRAMES: usize = 40;

/// One byte more than the largest IPv4 UDP payload, so a full buffer
/// always means the datagram was cut.
const RECV_BUFFER_LEN: usize = 65_508;

/// `WSAEMSGSIZE`: the datagram did not fit the receive buffer.
const WSAEMSGSIZE: i32 = 10040;

/// One datagram as read from the socket.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedPacket {
    pub from: SocketAddr,
    /// Payload decoded as UTF-8, invalid sequences replaced.
    pub raw: String,
    pub packet: CoordinatePacket,
}

/// Non-blocking consumer side of the coordinate stream.
///
/// Each [`poll`](Self::poll) reads at most one datagram, so a render loop
/// can call it once per tick without stalling.
#[derive(Debug)]
pub struct UdpCoordinateReceiver {
    socket: UdpSocket,
    buf: Vec<u8>,
    monitor: ConnectionMonitor,
    total_packets: u64,
    last_raw: Option<String>,
    trail: VecDeque<Vec<PixelPoint>>,
    trail_len: usize,
}

impl UdpCoordinateReceiver {
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        log::info!("listening on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            buf: vec![0; RECV_BUFFER_LEN],
            monitor: ConnectionMonitor::default(),
            total_packets: 0,
            last_raw: None,
            trail: VecDeque::with_capacity(TRAIL_FRAMES),
            trail_len: TRAIL_FRAMES,
        })
    }

    /// Keep at most `len` point lists in the trail (at least one).
    pub fn with_trail_len(mut self, len: usize) -> Self {
        self.trail_len = len.max(1);
        self.trail.truncate(self.trail_len);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Read one pending datagram, if any.
    ///
    /// Returns `Ok(None)` when nothing is queued. Empty and truncated
    /// datagrams are discarded without touching the statistics, as are
    /// per-datagram socket errors (connection reset by an ICMP
    /// port-unreachable, interrupted reads, oversized messages).
    pub fn poll(&mut self, now: Instant) -> Result<Option<ReceivedPacket>, TransportError> {
        let (n, from) = match self.socket.recv_from(&mut self.buf) {
            Ok(r) => r,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) if is_transient(&e) => {
                log::warn!("dropped datagram: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(None);
        }
        if n == self.buf.len() {
            log::warn!("dropped datagram from {from}: longer than {} bytes", n - 1);
            return Ok(None);
        }

        let raw = String::from_utf8_lossy(&self.buf[..n]).into_owned();
        let packet = decode(&raw);
        self.total_packets += 1;
        self.monitor.record(now);
        self.last_raw = Some(raw.clone());
        if !packet.is_empty() {
            self.trail.push_front(packet.points.clone());
            self.trail.truncate(self.trail_len);
        }
        log::trace!("packet #{} from {from}: {} point(s)", self.total_packets, packet.len());

        Ok(Some(ReceivedPacket { from, raw, packet }))
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn last_raw(&self) -> Option<&str> {
        self.last_raw.as_deref()
    }

    /// Most recent non-empty point list.
    pub fn current(&self) -> Option<&[PixelPoint]> {
        self.trail.front().map(Vec::as_slice)
    }

    /// Recent non-empty point lists, newest first.
    pub fn trail(&self) -> impl Iterator<Item = &[PixelPoint]> {
        self.trail.iter().map(Vec::as_slice)
    }

    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.monitor
    }

    pub fn is_connected_at(&self, now: Instant) -> bool {
        self.monitor.is_connected_at(now)
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused | io::ErrorKind::Interrupted
    ) || e.raw_os_error() == Some(WSAEMSGSIZE)
}
