use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use super::Snapshot;

/// Latest report of one session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct SessionEntry {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    #[serde(default, rename = "cerrada")]
    pub closed: bool,
}

/// Latest cumulative totals of every session that reported into one record.
///
/// Merging keeps the field-wise maximum per session, so a replayed or
/// out-of-order report never lowers a total and never adds twice.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct SessionLedger(BTreeMap<String, SessionEntry>);

impl SessionLedger {
    /// Returns whether the ledger changed.
    ///
    /// A final report closes the session. A later report reopens it only if
    /// it advances the totals, so a delayed periodic flush cannot undo an unload.
    pub fn merge(&mut self, session_id: &str, snapshot: Snapshot, is_final: bool) -> bool {
        match self.0.get_mut(session_id) {
            Some(current) => {
                let merged = current.snapshot.max(snapshot);
                let advanced = merged != current.snapshot;
                let closed = if is_final { true } else if advanced { false } else { current.closed };
                let changed = advanced || closed != current.closed;
                current.snapshot = merged;
                current.closed = closed;
                changed
            }
            None => {
                self.0.insert(session_id.to_string(), SessionEntry { snapshot, closed: is_final });
                true
            }
        }
    }

    pub fn totals(&self) -> Snapshot {
        self.0.values().fold(Snapshot::default(), |acc, e| acc + e.snapshot)
    }

    /// Whether any session is still reporting.
    pub fn any_open(&self) -> bool {
        self.0.values().any(|e| !e.closed)
    }

    pub fn close_all(&mut self) {
        self.0.values_mut().for_each(|e| e.closed = true);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionEntry> {
        self.0.get(session_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_add_up() {
        let mut ledger = SessionLedger::default();
        assert!(ledger.is_empty());
        assert!(ledger.merge("a", Snapshot::new(30, 5), false));
        assert!(ledger.merge("b", Snapshot::new(10, 0), false));
        assert_eq!(ledger.totals(), Snapshot::new(40, 5));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_replayed_report_is_not_double_counted() {
        let mut ledger = SessionLedger::default();
        ledger.merge("a", Snapshot::new(30, 5), false);
        assert!(!ledger.merge("a", Snapshot::new(30, 5), false));
        assert_eq!(ledger.totals(), Snapshot::new(30, 5));
    }

    #[test]
    fn test_stale_report_never_lowers_totals() {
        let mut ledger = SessionLedger::default();
        ledger.merge("a", Snapshot::new(60, 10), false);
        // periodic flush that raced the unload flush
        assert!(!ledger.merge("a", Snapshot::new(45, 10), false));
        assert_eq!(ledger.get("a").unwrap().snapshot, Snapshot::new(60, 10));

        assert!(ledger.merge("a", Snapshot::new(45, 20), false));
        assert_eq!(ledger.get("a").unwrap().snapshot, Snapshot::new(60, 20));
    }

    #[test]
    fn test_open_while_any_session_reports() {
        let mut ledger = SessionLedger::default();
        ledger.merge("a", Snapshot::new(10, 0), false);
        ledger.merge("b", Snapshot::new(10, 0), false);

        assert!(ledger.merge("a", Snapshot::new(20, 0), true));
        assert!(ledger.any_open());

        // late periodic flush of "a" that does not advance keeps it closed
        assert!(!ledger.merge("a", Snapshot::new(15, 0), false));
        assert!(ledger.get("a").unwrap().closed);

        assert!(ledger.merge("b", Snapshot::new(10, 0), true));
        assert!(!ledger.any_open());

        // a restored page keeps reporting under its old id
        assert!(ledger.merge("b", Snapshot::new(12, 0), false));
        assert!(ledger.any_open());

        ledger.close_all();
        assert!(!ledger.any_open());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut ledger = SessionLedger::default();
        ledger.merge("s1", Snapshot::new(3, 4), true);
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json["s1"]["segundosActivos"], 3);
        assert_eq!(json["s1"]["segundosInactivos"], 4);
        assert_eq!(json["s1"]["cerrada"], true);

        // records written before sessions tracked their state
        let old: SessionLedger =
            serde_json::from_str(r#"{"s1":{"segundosActivos":3,"segundosInactivos":4}}"#).unwrap();
        assert!(old.any_open());
    }
}
