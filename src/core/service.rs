use crate::core::cache::{FetchOutcome, RecordCache};
use crate::core::normalize::{normalize, normalize_all};
use crate::domain::model::{FundingRecord, NormalizedRecord, RecordId};
use crate::domain::ports::RecordStore;
use crate::utils::error::Result;
use std::sync::Arc;

/// Record store plus the last-known-good normalized collection. Every
/// mutation is followed by a full refetch; nothing is patched locally.
/// A failed refetch after a successful mutation does not fail the mutation.
pub struct FundingService<R: RecordStore> {
    store: R,
    cache: RecordCache,
}

impl<R: RecordStore> FundingService<R> {
    pub fn new(store: R) -> Self {
        Self {
            store,
            cache: RecordCache::new(),
        }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Current snapshot without touching the network.
    pub fn records(&self) -> Arc<[NormalizedRecord]> {
        self.cache.records()
    }

    /// Fetches and normalizes the whole collection.
    ///
    /// On failure the error is returned and the previous snapshot stays in
    /// place. A response superseded by a newer refresh is dropped.
    pub async fn refresh(&self) -> Result<Arc<[NormalizedRecord]>> {
        let ticket = self.cache.begin_fetch();
        tracing::debug!("Refreshing funding entries (generation {})", ticket.generation());

        let fetched = match self.store.list().await {
            Ok(raw) => normalize_all(&raw),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(records) => {
                let count = records.len();
                if self.cache.complete(ticket, Ok(records)) == FetchOutcome::Applied {
                    tracing::info!("📥 Loaded {} funding entries", count);
                }
                Ok(self.cache.records())
            }
            Err(e) => {
                let kept = self.cache.records().len();
                tracing::warn!("Refresh failed, still showing {} entries: {}", kept, e);
                Err(e)
            }
        }
    }

    // 寫入已成功，重新抓取失敗只留舊快照
    async fn refetch_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!("Mutation applied but refetch failed: {}", e);
        }
    }

    pub async fn get(&self, id: &RecordId) -> Result<NormalizedRecord> {
        let raw = self.store.get(id).await?;
        normalize(&raw)
    }

    pub async fn create(&self, record: &FundingRecord) -> Result<NormalizedRecord> {
        let created = self.store.create(record).await?;
        let normalized = normalize(&created)?;
        self.refetch_after_mutation().await;
        Ok(normalized)
    }

    pub async fn update(&self, id: &RecordId, patch: &FundingRecord) -> Result<NormalizedRecord> {
        let updated = self.store.update(id, patch).await?;
        let normalized = normalize(&updated)?;
        self.refetch_after_mutation().await;
        Ok(normalized)
    }

    pub async fn delete(&self, id: &RecordId) -> Result<String> {
        let message = self.store.delete(id).await?;
        self.refetch_after_mutation().await;
        Ok(message)
    }
}
