pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{LocalStorage, RestRecordStore, Session};
pub use config::AppConfig;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::core::aggregate::{build_dashboard, count_by_category, sum_by_year, top_n};
pub use crate::core::normalize::normalize;
pub use crate::core::query::{filter_options, query, QuerySpec};
pub use crate::core::{engine::ReportEngine, pipeline::ReportPipeline, service::FundingService};
pub use domain::model::{FundingRecord, NormalizedRecord, RecordId};
pub use utils::error::{FundingError, Result};
