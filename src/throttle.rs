use std::time::{Duration, Instant};

/// Leading-edge throttle: the first call in a window fires, the rest of the
/// window is swallowed.
#[derive(Debug, Clone)]
pub struct Throttle {
    limit: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            last_fired: None,
        }
    }

    /// Treats `now` as the last firing, so the first call waits a full window.
    pub fn started(limit: Duration, now: Instant) -> Self {
        Self {
            limit,
            last_fired: Some(now),
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.limit => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_inside_window_is_dropped() {
        let mut throttle = Throttle::new(Duration::from_millis(1000));
        let start = Instant::now();
        assert!(throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_millis(10)));
        assert!(throttle.ready(start + Duration::from_millis(1500)));
    }

    #[test]
    fn started_throttle_waits_one_window() {
        let start = Instant::now();
        let mut throttle = Throttle::started(Duration::from_secs(5), start);
        assert!(!throttle.ready(start + Duration::from_secs(1)));
        assert!(throttle.ready(start + Duration::from_secs(5)));
    }

    #[test]
    fn window_restarts_from_last_fire() {
        let mut throttle = Throttle::new(Duration::from_millis(200));
        let start = Instant::now();
        assert!(throttle.ready(start));
        assert!(throttle.ready(start + Duration::from_millis(200)));
        assert!(!throttle.ready(start + Duration::from_millis(300)));
    }
}
