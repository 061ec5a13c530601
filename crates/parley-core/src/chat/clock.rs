//! Time-derived, strictly increasing message ids.

use chrono::{DateTime, Utc};

/// Issues message ids from the wall clock in milliseconds.
///
/// Two messages created within the same millisecond (a user message and its
/// instant reply, say) still get distinct ids: each id is at least one more
/// than the last one issued or observed.
#[derive(Debug, Clone, Default)]
pub struct MessageClock {
    last: i64,
}

impl MessageClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids are greater than `id` (e.g. after loading a session).
    pub fn observe(&mut self, id: i64) {
        self.last = self.last.max(id);
    }

    /// Next id and the timestamp it encodes.
    pub fn next(&mut self) -> (i64, DateTime<Utc>) {
        let now = Utc::now().timestamp_millis();
        let id = now.max(self.last + 1);
        self.last = id;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(id).unwrap_or_else(Utc::now);
        (id, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_strictly_increase() {
        let mut clock = MessageClock::new();
        let mut previous = 0;
        for _ in 0..1000 {
            let (id, _) = clock.next();
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn test_observe_moves_clock_forward() {
        let mut clock = MessageClock::new();
        let far_future = Utc::now().timestamp_millis() + 60_000;
        clock.observe(far_future);
        let (id, timestamp) = clock.next();
        assert_eq!(id, far_future + 1);
        assert_eq!(timestamp.timestamp_millis(), id);
    }

    #[test]
    fn test_observe_never_moves_backwards() {
        let mut clock = MessageClock::new();
        let (first, _) = clock.next();
        clock.observe(1);
        let (second, _) = clock.next();
        assert!(second > first);
    }
}
