use std::thread;
use std::time::{Duration, Instant};

use irtrack_protocol::{PixelPoint, ReceivedPacket, UdpCoordinateReceiver, UdpCoordinateSender};

fn pair(trail_len: usize) -> (UdpCoordinateSender, UdpCoordinateReceiver) {
    let receiver = UdpCoordinateReceiver::bind("127.0.0.1:0")
        .expect("bind receiver")
        .with_trail_len(trail_len);
    let port = receiver.local_addr().expect("local addr").port();
    let mut sender = UdpCoordinateSender::bind("127.0.0.1:0").expect("bind sender");
    sender.set_target("127.0.0.1", port).expect("target");
    (sender, receiver)
}

fn wait_for_packet(receiver: &mut UdpCoordinateReceiver) -> ReceivedPacket {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(p) = receiver.poll(Instant::now()).expect("poll") {
            return p;
        }
        assert!(Instant::now() < deadline, "no datagram within 2 s");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn sender_to_receiver_delivers_points() {
    let (sender, mut receiver) = pair(40);
    assert!(receiver.poll(Instant::now()).expect("poll").is_none());
    assert!(!receiver.is_connected_at(Instant::now()));

    let pts = [PixelPoint::new(512, 300), PixelPoint::new(10, 770)];
    let n = sender.send(&pts).expect("send");
    assert_eq!(n, "512,300;10,770".len());

    let got = wait_for_packet(&mut receiver);
    assert_eq!(got.raw, "512,300;10,770");
    assert_eq!(got.packet.points, pts);
    assert_eq!(receiver.total_packets(), 1);
    assert_eq!(receiver.last_raw(), Some("512,300;10,770"));
    assert_eq!(receiver.current(), Some(&pts[..]));
    assert!(receiver.is_connected_at(Instant::now()));
}

#[test]
fn empty_point_list_sends_nothing() {
    let (sender, mut receiver) = pair(40);
    assert_eq!(sender.send(&[]).expect("send"), 0);
    thread::sleep(Duration::from_millis(50));
    assert!(receiver.poll(Instant::now()).expect("poll").is_none());
    assert_eq!(receiver.total_packets(), 0);
}

#[test]
fn trail_history_is_bounded() {
    let (sender, mut receiver) = pair(3);
    for i in 0..5 {
        sender.send(&[PixelPoint::new(i, i)]).expect("send");
        wait_for_packet(&mut receiver);
    }
    let trail: Vec<_> = receiver.trail().map(|pts| pts[0].x).collect();
    assert_eq!(trail, vec![4, 3, 2]);
    assert_eq!(receiver.total_packets(), 5);
}

#[test]
fn long_packets_arrive_whole() {
    let (sender, mut receiver) = pair(40);
    let pts: Vec<PixelPoint> = (0..300).map(|i| PixelPoint::new(1000 + i, 1234)).collect();
    let n = sender.send(&pts).expect("send");
    assert!(n > 2048);

    let got = wait_for_packet(&mut receiver);
    assert_eq!(got.raw.len(), n);
    assert_eq!(got.packet.points, pts);
}
