//! Per-sender dedup state.
//!
//! The ledger is an explicit keyed store handed into the pipeline rather than
//! module-level state, so independent runs stay isolated and a long-running
//! session can keep one ledger across batches. Merges are serialized behind a
//! mutex; concurrent messages from distinct senders never contend on record
//! content, only on the map itself.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::record::CandidateRecord;

/// How a merge changed the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First record for this sender.
    Inserted,
    /// Existing record gained at least one previously-unset field.
    Updated,
    /// Nothing new; the incoming record added no information.
    Unchanged,
}

#[derive(Default)]
pub struct RecordLedger {
    records: Mutex<HashMap<String, CandidateRecord>>,
}

impl RecordLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `incoming` under its sender id and returns the outcome together
    /// with a snapshot of the post-merge record. Previously-set fields are
    /// never overwritten; only unset fields are filled.
    pub fn merge(&self, incoming: CandidateRecord) -> (MergeOutcome, CandidateRecord) {
        let mut records = self.records.lock().expect("ledger mutex poisoned");

        match records.get_mut(&incoming.sender_id) {
            Some(existing) => {
                let before = existing.clone();
                existing.fill_missing_from(&incoming);
                let outcome = if *existing == before {
                    MergeOutcome::Unchanged
                } else {
                    MergeOutcome::Updated
                };
                debug!("Merged record for sender '{}': {:?}", incoming.sender_id, outcome);
                (outcome, existing.clone())
            }
            None => {
                debug!("First record for sender '{}'", incoming.sender_id);
                let snapshot = incoming.clone();
                records.insert(incoming.sender_id.clone(), incoming);
                (MergeOutcome::Inserted, snapshot)
            }
        }
    }

    pub fn get(&self, sender_id: &str) -> Option<CandidateRecord> {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .get(sender_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("ledger mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all accumulated records, in unspecified order.
    pub fn records(&self) -> Vec<CandidateRecord> {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_merge_inserts() {
        let ledger = RecordLedger::new();
        let mut record = CandidateRecord::new("s1");
        record.email = Some("a@example.com".to_string());

        let (outcome, snapshot) = ledger.merge(record);
        assert_eq!(outcome, MergeOutcome::Inserted);
        assert_eq!(snapshot.email.as_deref(), Some("a@example.com"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_second_merge_fills_unset_fields_only() {
        let ledger = RecordLedger::new();

        let mut first = CandidateRecord::new("s1");
        first.email = Some("a@example.com".to_string());
        ledger.merge(first);

        let mut second = CandidateRecord::new("s1");
        second.email = Some("other@example.com".to_string());
        second.phone = Some("+123".to_string());
        let (outcome, snapshot) = ledger.merge(second);

        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(snapshot.email.as_deref(), Some("a@example.com"));
        assert_eq!(snapshot.phone.as_deref(), Some("+123"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_noop_merge_is_unchanged() {
        let ledger = RecordLedger::new();
        let mut record = CandidateRecord::new("s1");
        record.name = Some("Ada".to_string());
        ledger.merge(record.clone());

        let (outcome, _) = ledger.merge(record);
        assert_eq!(outcome, MergeOutcome::Unchanged);
    }

    #[test]
    fn test_distinct_senders_kept_apart() {
        let ledger = RecordLedger::new();
        ledger.merge(CandidateRecord::new("s1"));
        ledger.merge(CandidateRecord::new("s2"));
        assert_eq!(ledger.len(), 2);
        assert!(ledger.get("s1").is_some());
        assert!(ledger.get("s2").is_some());
    }

    #[test]
    fn test_concurrent_merges_to_distinct_senders() {
        let ledger = Arc::new(RecordLedger::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(std::thread::spawn(move || {
                let mut record = CandidateRecord::new(format!("sender-{}", i));
                record.name = Some(format!("Name {}", i));
                ledger.merge(record);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 8);
    }
}
