//! The single self-rescheduling tick timer.

use std::time::Instant;

/// At most one pending tick deadline.
///
/// Re-arming while a tick is pending is a logic error: callers cancel
/// first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingTick {
    deadline: Option<Instant>,
}

impl PendingTick {
    /// Schedule the next tick.
    pub fn arm(&mut self, deadline: Instant) {
        debug_assert!(self.deadline.is_none(), "tick armed while one is pending");
        self.deadline = Some(deadline);
    }

    /// Drop the pending tick. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Whether a tick is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and return `true` if the deadline has passed.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if d <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_once_after_deadline() {
        let now = Instant::now();
        let mut t = PendingTick::default();
        t.arm(now + Duration::from_millis(10));
        assert!(!t.take_if_due(now));
        assert!(t.is_armed());
        assert!(t.take_if_due(now + Duration::from_millis(10)));
        assert!(!t.is_armed());
        assert!(!t.take_if_due(now + Duration::from_secs(1)));
    }

    #[test]
    fn cancel_reports_pending() {
        let mut t = PendingTick::default();
        assert!(!t.cancel());
        t.arm(Instant::now());
        assert!(t.cancel());
        assert_eq!(t.deadline(), None);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "tick armed while one is pending")]
    fn double_arm_is_caught() {
        let mut t = PendingTick::default();
        t.arm(Instant::now());
        t.arm(Instant::now());
    }
}
