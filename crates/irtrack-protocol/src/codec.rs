//! `x1,y1;x2,y2;...` coordinate payloads.
//!
//! Points are separated by `;` and each point is `x,y` in decimal integers,
//! with no trailing delimiter. Decoding is lenient: malformed tokens are
//! skipped and never fail the whole packet.

use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer target pixel coordinate as carried on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncate toward zero.
    pub fn from_point(p: Point2<f32>) -> Self {
        Self::new(p.x as i32, p.y as i32)
    }
}

impl From<Point2<f32>> for PixelPoint {
    fn from(p: Point2<f32>) -> Self {
        Self::from_point(p)
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Ordered point list of one datagram.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatePacket {
    pub points: Vec<PixelPoint>,
}

impl CoordinatePacket {
    pub fn new(points: Vec<PixelPoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn encode(&self) -> String {
        encode(&self.points)
    }
}

impl fmt::Display for CoordinatePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&str> for CoordinatePacket {
    fn from(payload: &str) -> Self {
        decode(payload)
    }
}

/// Serialize points in order; an empty slice gives an empty string.
pub fn encode(points: &[PixelPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(&p.to_string());
    }
    out
}

/// [`encode`] after truncating float coordinates toward zero.
pub fn encode_points(points: &[Point2<f32>]) -> String {
    let pixels: Vec<PixelPoint> = points.iter().copied().map(PixelPoint::from_point).collect();
    encode(&pixels)
}

fn parse_token(token: &str) -> Option<PixelPoint> {
    let (x, y) = token.split_once(',')?;
    let x = x.trim().parse::<i32>().ok()?;
    let y = y.trim().parse::<i32>().ok()?;
    Some(PixelPoint::new(x, y))
}

/// Parse a payload, skipping tokens without a comma or with a non-integer
/// component.
pub fn decode(payload: &str) -> CoordinatePacket {
    let mut points = Vec::new();
    let mut skipped = 0usize;
    for token in payload.split(';') {
        match parse_token(token) {
            Some(p) => points.push(p),
            None if token.trim().is_empty() => {}
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("skipped {skipped} malformed token(s) in {payload:?}");
    }
    CoordinatePacket { points }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_in_order_without_trailing_delimiter() {
        let pts = [PixelPoint::new(512, 300), PixelPoint::new(10, 770)];
        assert_eq!(encode(&pts), "512,300;10,770");
        assert_eq!(encode(&[]), "");
        assert_eq!(encode(&[PixelPoint::new(-3, 0)]), "-3,0");
    }

    #[test]
    fn float_points_truncate_toward_zero() {
        let pts = [Point2::new(512.9_f32, 300.2), Point2::new(-0.7, 767.99)];
        assert_eq!(encode_points(&pts), "512,300;0,767");
    }

    #[test]
    fn decode_inverts_encode() {
        let pts = vec![PixelPoint::new(512, 300), PixelPoint::new(10, 770)];
        assert_eq!(decode(&encode(&pts)).points, pts);
    }

    #[test]
    fn empty_payload_has_no_points() {
        assert!(decode("").is_empty());
        assert!(decode(";;").is_empty());
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let packet = decode("5,6;bad;7,8");
        assert_eq!(
            packet.points,
            vec![PixelPoint::new(5, 6), PixelPoint::new(7, 8)]
        );
        assert_eq!(decode("1,x;2;,3;4,5").points, vec![PixelPoint::new(4, 5)]);
        assert_eq!(decode("99999999999,1").len(), 0);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(
            decode(" 1, 2;3 ,4\n").points,
            vec![PixelPoint::new(1, 2), PixelPoint::new(3, 4)]
        );
    }

    #[test]
    fn display_matches_wire_format() {
        let packet = CoordinatePacket::new(vec![PixelPoint::new(1, 2), PixelPoint::new(3, 4)]);
        assert_eq!(packet.to_string(), packet.encode());
        assert_eq!(CoordinatePacket::from("1,2;3,4"), packet);
    }

    #[test]
    fn packet_serializes_as_json() {
        let packet = CoordinatePacket::new(vec![PixelPoint::new(1, 2)]);
        let json = serde_json::to_string(&packet).unwrap();
        assert_eq!(json, r#"{"points":[{"x":1,"y":2}]}"#);
    }
}
