use std::time::{Duration, Instant};

/// Silence after which a peer counts as disconnected.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Connectivity heuristic based on the time of the last received packet.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionMonitor {
    last_packet: Option<Instant>,
    timeout: Duration,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new(CONNECTION_TIMEOUT)
    }
}

impl ConnectionMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_packet: None,
            timeout,
        }
    }

    pub fn record(&mut self, at: Instant) {
        self.last_packet = Some(at);
    }

    pub fn last_packet(&self) -> Option<Instant> {
        self.last_packet
    }

    /// Connected iff a packet arrived less than the timeout before `now`.
    pub fn is_connected_at(&self, now: Instant) -> bool {
        self.last_packet
            .is_some_and(|t| now.saturating_duration_since(t) < self.timeout)
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_connected_before_first_packet() {
        let m = ConnectionMonitor::default();
        assert!(!m.is_connected_at(Instant::now()));
    }

    #[test]
    fn timeout_is_exclusive() {
        let t = Instant::now();
        let mut m = ConnectionMonitor::default();
        m.record(t);
        assert!(m.is_connected_at(t));
        assert!(m.is_connected_at(t + Duration::from_millis(2900)));
        assert!(!m.is_connected_at(t + Duration::from_secs(3)));
        assert!(!m.is_connected_at(t + Duration::from_secs(10)));
    }

    #[test]
    fn new_packet_refreshes_the_window() {
        let t = Instant::now();
        let mut m = ConnectionMonitor::default();
        m.record(t);
        m.record(t + Duration::from_secs(2));
        assert!(m.is_connected_at(t + Duration::from_secs(4)));
    }
}
