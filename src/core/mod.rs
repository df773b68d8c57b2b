pub mod aggregate;
pub mod cache;
pub mod dates;
pub mod engine;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod service;
pub mod stage;

pub use crate::domain::model::{FundingRecord, NormalizedRecord, RecordId};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RecordStore, Storage};
pub use crate::utils::error::Result;
