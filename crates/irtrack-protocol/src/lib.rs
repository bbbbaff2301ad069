//! Coordinate streaming over UDP.
//!
//! Each datagram carries the rectified points of one frame as ASCII text,
//! `x1,y1;x2,y2;...`. The [`codec`] module defines the format; the sender and
//! receiver move packets over `std::net::UdpSocket`.

pub mod codec;
mod connection;
mod error;
mod receiver;
mod sender;

pub use codec::{decode, encode, encode_points, CoordinatePacket, PixelPoint};
pub use connection::{ConnectionMonitor, CONNECTION_TIMEOUT};
pub use error::TransportError;
pub use receiver::{ReceivedPacket, UdpCoordinateReceiver, TRAIL_FRAMES};
pub use sender::{parse_target, UdpCoordinateSender};
