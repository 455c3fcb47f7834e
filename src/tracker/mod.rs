//! Time-on-page bookkeeping.
//!
//! [`TimeTracker`] models what the viewer page measures during one page
//! load; [`SessionLedger`] is how the server folds the cumulative reports of
//! many page loads into one running total.
mod session;
mod ledger;

pub use session::{TimeTracker, DEFAULT_INACTIVITY_LIMIT_SECS};
pub use ledger::{SessionEntry, SessionLedger};

use serde::{Deserialize, Serialize};

/// Cumulative whole seconds of one session. Sums saturate at `u64::MAX`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    #[serde(rename = "segundosActivos")]
    pub active_secs: u64,
    #[serde(rename = "segundosInactivos")]
    pub inactive_secs: u64,
}

impl Snapshot {
    pub fn new(active_secs: u64, inactive_secs: u64) -> Self {
        Self { active_secs, inactive_secs }
    }

    pub fn total_secs(&self) -> u64 {
        self.active_secs.saturating_add(self.inactive_secs)
    }

    /// Field-wise maximum.
    pub fn max(self, other: Snapshot) -> Snapshot {
        Snapshot {
            active_secs: self.active_secs.max(other.active_secs),
            inactive_secs: self.inactive_secs.max(other.inactive_secs),
        }
    }
}

impl std::ops::Add for Snapshot {
    type Output = Snapshot;

    fn add(self, other: Snapshot) -> Snapshot {
        Snapshot {
            active_secs: self.active_secs.saturating_add(other.active_secs),
            inactive_secs: self.inactive_secs.saturating_add(other.inactive_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_saturate() {
        let huge = Snapshot::new(u64::MAX, u64::MAX);
        assert_eq!(huge + Snapshot::new(1, 1), huge);
        assert_eq!(huge.total_secs(), u64::MAX);
        assert_eq!(Snapshot::new(2, 3) + Snapshot::new(4, 5), Snapshot::new(6, 8));
    }
}
