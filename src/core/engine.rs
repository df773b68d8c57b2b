use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

/// Runs a [`Pipeline`] phase by phase, logging counts and timings.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting funding report");

        // Extract
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 Fetched {} funding entries", raw_data.len());

        // Transform
        let report = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "🔧 Selected {} entries, total funding {}",
            report.rows.len(),
            crate::utils::format::currency_or_na(report.dashboard.summary.total_funding)
        );

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("📁 Report saved to: {} ({:?})", output_path, started.elapsed());

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FundingRecord;
    use crate::domain::report::{Dashboard, DashboardSummary, Report};
    use crate::utils::error::FundingError;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        loads: AtomicUsize,
        fail_extract: bool,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Vec<FundingRecord>> {
            if self.fail_extract {
                return Err(FundingError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(vec![FundingRecord::new()])
        }

        async fn transform(&self, data: Vec<FundingRecord>) -> Result<Report> {
            Ok(Report {
                rows: Vec::new(),
                dashboard: Dashboard {
                    summary: DashboardSummary {
                        total_companies: data.len(),
                        total_funding: None,
                        average_company_age: None,
                        average_funding_rounds: None,
                        unicorn_count: 0,
                    },
                    prop_types: Vec::new(),
                    locations: Vec::new(),
                    funding_stages: Vec::new(),
                    founded_years: Vec::new(),
                    top_funded: Vec::new(),
                    funding_by_year: BTreeMap::new(),
                },
                csv_output: String::new(),
                json_output: String::new(),
            })
        }

        async fn load(&self, _report: Report) -> Result<String> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok("out/funding_report.zip".to_string())
        }
    }

    #[test]
    fn test_run_executes_all_phases() {
        let engine = ReportEngine::new(CountingPipeline {
            loads: AtomicUsize::new(0),
            fail_extract: false,
        });

        let output = tokio_test::block_on(engine.run()).unwrap();

        assert_eq!(output, "out/funding_report.zip");
        assert_eq!(engine.pipeline.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extract_failure_stops_before_load() {
        let engine = ReportEngine::new(CountingPipeline {
            loads: AtomicUsize::new(0),
            fail_extract: true,
        });

        let result = tokio_test::block_on(engine.run());

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(engine.pipeline.loads.load(Ordering::SeqCst), 0);
    }
}
