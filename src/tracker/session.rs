use chrono::{DateTime, Duration, Utc};
use super::Snapshot;

pub const DEFAULT_INACTIVITY_LIMIT_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Visible,
    Hidden,
    Stopped,
}

/// Active/inactive accounting for one page load.
///
/// Every interval of wall time is attributed exactly once: the tracker keeps
/// a mark up to which time has been accounted and only ever moves it forward.
/// While the page is visible, time counts as active until `inactivity_limit`
/// passes without user activity; hidden time is always inactive.
#[derive(Debug, Clone)]
pub struct TimeTracker {
    inactivity_limit: Duration,
    state: State,
    accounted_until: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    active: Duration,
    inactive: Duration,
}

impl TimeTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_inactivity_limit(now, Duration::seconds(DEFAULT_INACTIVITY_LIMIT_SECS))
    }

    pub fn with_inactivity_limit(now: DateTime<Utc>, inactivity_limit: Duration) -> Self {
        Self {
            inactivity_limit,
            state: State::Visible,
            accounted_until: now,
            last_activity: now,
            active: Duration::zero(),
            inactive: Duration::zero(),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.state != State::Stopped
    }

    pub fn is_visible(&self) -> bool {
        self.state == State::Visible
    }

    pub fn on_visibility(&mut self, visible: bool, now: DateTime<Utc>) {
        self.advance(now);
        match (self.state, visible) {
            (State::Hidden, true) => {
                self.state = State::Visible;
                // Returning to the tab counts as activity
                self.last_activity = self.accounted_until;
            }
            (State::Visible, false) => self.state = State::Hidden,
            _ => {}
        }
    }

    pub fn on_activity(&mut self, now: DateTime<Utc>) {
        self.advance(now);
        if self.state == State::Visible {
            self.last_activity = self.accounted_until;
        }
    }

    pub fn snapshot(&mut self, now: DateTime<Utc>) -> Snapshot {
        self.advance(now);
        Snapshot::new(whole_secs(self.active), whole_secs(self.inactive))
    }

    /// Final snapshot. The tracker stops accruing afterwards.
    pub fn unload(&mut self, now: DateTime<Utc>) -> Snapshot {
        let snapshot = self.snapshot(now);
        self.state = State::Stopped;
        snapshot
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        // A clock that went backwards accounts nothing
        if now <= self.accounted_until {
            return;
        }
        let from = self.accounted_until;
        self.accounted_until = now;

        match self.state {
            State::Stopped => {}
            State::Hidden => self.inactive = self.inactive + (now - from),
            State::Visible => {
                let idle_at = self.last_activity + self.inactivity_limit;
                let active_until = idle_at.clamp(from, now);
                self.active = self.active + (active_until - from);
                self.inactive = self.inactive + (now - active_until);
            }
        }
    }
}

fn whole_secs(d: Duration) -> u64 {
    d.num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_continuous_activity_is_active() {
        let mut tracker = TimeTracker::new(t(0));
        for s in 1..=20 {
            tracker.on_activity(t(s));
        }
        assert_eq!(tracker.snapshot(t(20)), Snapshot::new(20, 0));
    }

    #[test]
    fn test_idle_visible_time_turns_inactive() {
        let mut tracker = TimeTracker::new(t(0));
        tracker.on_activity(t(2));
        // idle from t=7 onwards
        assert_eq!(tracker.snapshot(t(12)), Snapshot::new(7, 5));

        tracker.on_activity(t(15));
        assert_eq!(tracker.snapshot(t(17)), Snapshot::new(9, 8));
    }

    #[test]
    fn test_hidden_time_is_inactive() {
        let mut tracker = TimeTracker::new(t(0));
        tracker.on_activity(t(3));
        tracker.on_visibility(false, t(4));
        tracker.on_activity(t(10));  // ignored while hidden
        tracker.on_visibility(true, t(30));
        assert_eq!(tracker.snapshot(t(32)), Snapshot::new(6, 26));
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_repeated_snapshots_do_not_double_count() {
        let mut tracker = TimeTracker::new(t(0));
        tracker.on_activity(t(4));
        let first = tracker.snapshot(t(4));
        let again = tracker.snapshot(t(4));
        assert_eq!(first, again);

        // overlapping flush callbacks at the same instant
        tracker.on_visibility(false, t(6));
        let a = tracker.snapshot(t(9));
        let b = tracker.snapshot(t(9));
        assert_eq!(a, b);
        assert_eq!(a.total_secs(), 9);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut tracker = TimeTracker::new(t(0));
        tracker.on_activity(t(3));
        assert_eq!(tracker.snapshot(t(1)), Snapshot::new(3, 0));
        assert_eq!(tracker.snapshot(t(4)), Snapshot::new(4, 0));
    }

    #[test]
    fn test_unload_stops_tracking() {
        let mut tracker = TimeTracker::new(t(0));
        tracker.on_activity(t(3));
        let last = tracker.unload(t(3));
        assert!(!tracker.is_tracking());

        tracker.on_visibility(true, t(50));
        tracker.on_activity(t(60));
        assert_eq!(tracker.snapshot(t(100)), last);
    }

    #[test]
    fn test_hide_and_show_twice_is_idempotent() {
        let mut tracker = TimeTracker::with_inactivity_limit(t(0), Duration::seconds(60));
        tracker.on_visibility(false, t(10));
        tracker.on_visibility(false, t(20));
        tracker.on_visibility(true, t(30));
        tracker.on_visibility(true, t(35));
        assert_eq!(tracker.snapshot(t(40)), Snapshot::new(20, 20));
    }
}
