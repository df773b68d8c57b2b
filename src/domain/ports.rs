use crate::domain::model::{FundingRecord, RecordId};
use crate::domain::report::Report;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn compress_output(&self) -> bool;
    fn request_timeout(&self) -> Duration;
}

/// The record store's REST contract. Implementations perform I/O only;
/// normalization happens on the caller's side.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self) -> Result<Vec<FundingRecord>>;
    async fn get(&self, id: &RecordId) -> Result<FundingRecord>;
    /// Creates a record (no id) and returns it as stored, id included.
    async fn create(&self, record: &FundingRecord) -> Result<FundingRecord>;
    /// Replaces the fields present in `patch`.
    async fn update(&self, id: &RecordId, patch: &FundingRecord) -> Result<FundingRecord>;
    /// Returns the store's confirmation message.
    async fn delete(&self, id: &RecordId) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FundingRecord>>;
    async fn transform(&self, data: Vec<FundingRecord>) -> Result<Report>;
    async fn load(&self, report: Report) -> Result<String>;
}
