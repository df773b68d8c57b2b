//! Last-known-good record snapshot guarded by a request-generation counter.
//!
//! Fetches are not cancelled when superseded. Each fetch takes a ticket, and
//! only the result of the newest ticket may replace the snapshot, so a slow
//! stale response can never overwrite a newer one.

use crate::domain::model::NormalizedRecord;
use crate::utils::error::Result;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The snapshot was replaced.
    Applied,
    /// A newer fetch was started after this one; the result was dropped.
    Stale,
    /// The fetch failed; the previous snapshot is still in place.
    Failed,
}

#[derive(Debug)]
struct Snapshot {
    records: Arc<[NormalizedRecord]>,
    generation: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            generation: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordCache {
    latest_ticket: AtomicU64,
    snapshot: RwLock<Snapshot>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Installs `result` if `ticket` is still the newest fetch.
    pub fn complete(&self, ticket: FetchTicket, result: Result<Vec<NormalizedRecord>>) -> FetchOutcome {
        if ticket.0 != self.latest_ticket.load(Ordering::SeqCst) {
            tracing::warn!(
                "Dropping stale fetch result (generation {}, latest {})",
                ticket.0,
                self.latest_ticket.load(Ordering::SeqCst)
            );
            return FetchOutcome::Stale;
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Fetch failed, keeping last known records: {}", e);
                return FetchOutcome::Failed;
            }
        };

        let mut snapshot = self.snapshot.write();
        // 同一把鎖內再檢查一次，避免兩個完成的 fetch 交錯寫入
        if ticket.0 < snapshot.generation {
            return FetchOutcome::Stale;
        }
        snapshot.records = records.into();
        snapshot.generation = ticket.0;
        FetchOutcome::Applied
    }

    /// Immutable view of the current records. Cheap to clone and hold across renders.
    pub fn records(&self) -> Arc<[NormalizedRecord]> {
        Arc::clone(&self.snapshot.read().records)
    }

    /// Generation of the installed snapshot; 0 before the first successful fetch.
    pub fn generation(&self) -> u64 {
        self.snapshot.read().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_all;
    use crate::domain::model::FundingRecord;
    use crate::utils::error::FundingError;
    use serde_json::json;

    fn records(ids: &[&str]) -> Vec<NormalizedRecord> {
        let raws: Vec<FundingRecord> = ids
            .iter()
            .map(|id| FundingRecord::from(json!({"_id": id})))
            .collect();
        normalize_all(&raws).unwrap()
    }

    #[test]
    fn test_newest_fetch_wins() {
        let cache = RecordCache::new();
        let first = cache.begin_fetch();
        let second = cache.begin_fetch();

        assert_eq!(cache.complete(second, Ok(records(&["new"]))), FetchOutcome::Applied);
        assert_eq!(cache.complete(first, Ok(records(&["old"]))), FetchOutcome::Stale);

        assert_eq!(cache.records()[0].id.as_str(), "new");
        assert_eq!(cache.generation(), second.generation());
    }

    #[test]
    fn test_stale_result_dropped_even_when_it_arrives_first() {
        let cache = RecordCache::new();
        let first = cache.begin_fetch();
        let _second = cache.begin_fetch();

        assert_eq!(cache.complete(first, Ok(records(&["old"]))), FetchOutcome::Stale);
        assert!(cache.records().is_empty());
    }

    #[test]
    fn test_failure_keeps_last_known_good_records() {
        let cache = RecordCache::new();
        let ticket = cache.begin_fetch();
        cache.complete(ticket, Ok(records(&["a", "b"])));

        let ticket = cache.begin_fetch();
        let outcome = cache.complete(
            ticket,
            Err(FundingError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }),
        );

        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(cache.records().len(), 2);
    }

    #[test]
    fn test_concurrent_completions_install_newest_ticket() {
        let cache = Arc::new(RecordCache::new());
        let tickets: Vec<FetchTicket> = (0..8).map(|_| cache.begin_fetch()).collect();
        let newest = tickets[tickets.len() - 1];

        let handles: Vec<_> = tickets
            .into_iter()
            .map(|ticket| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let id = ticket.generation().to_string();
                    cache.complete(ticket, Ok(records(&[id.as_str()])))
                })
            })
            .collect();
        let applied = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| *outcome == FetchOutcome::Applied)
            .count();

        assert_eq!(applied, 1);
        assert_eq!(cache.generation(), newest.generation());
        assert_eq!(cache.records()[0].id.as_str(), newest.generation().to_string());
    }
}
