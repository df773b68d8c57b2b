use crate::core::aggregate::build_dashboard;
use crate::core::normalize::normalize_all;
use crate::core::query::{query_records, QuerySpec};
use crate::core::stage::FundingStage;
use crate::domain::model::{FundingRecord, NormalizedRecord};
use crate::domain::ports::{ConfigProvider, Pipeline, RecordStore, Storage};
use crate::domain::report::{Dashboard, Report};
use crate::utils::error::Result;
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const CSV_FILENAME: &str = "companies.csv";
pub const JSON_FILENAME: &str = "dashboard.json";
pub const ZIP_FILENAME: &str = "funding_report.zip";

const CSV_COLUMNS: [&str; 9] = [
    "Name",
    "Technology",
    "Prop Type",
    "Location",
    "Founded",
    "Total Funding",
    "Latest Valuation",
    "# of Funding Rounds",
    "Total Funding Rank",
];

#[derive(Serialize)]
struct ReportDocument<'a> {
    generated_at: String,
    query: &'a QuerySpec,
    dashboard: &'a Dashboard,
    companies: &'a [NormalizedRecord],
}

/// Fetch → normalize/query/aggregate → export.
pub struct ReportPipeline<R: RecordStore, S: Storage, C: ConfigProvider> {
    store: R,
    storage: S,
    config: C,
    query: QuerySpec,
    current_year: i32,
}

impl<R: RecordStore, S: Storage, C: ConfigProvider> ReportPipeline<R, S, C> {
    pub fn new(store: R, storage: S, config: C, query: QuerySpec) -> Self {
        Self {
            store,
            storage,
            config,
            query,
            current_year: Utc::now().year(),
        }
    }

    /// Pins the year used for company age, for reproducible reports.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }
}

fn stages_of(record: &NormalizedRecord) -> String {
    FundingStage::ALL
        .iter()
        .filter(|stage| stage.matches(record))
        .map(FundingStage::label)
        .collect::<Vec<_>>()
        .join("; ")
}

fn render_csv(rows: &[NormalizedRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Id"];
    header.extend(CSV_COLUMNS);
    header.push("Funding Stages");
    writer.write_record(&header)?;

    for row in rows {
        let mut line = vec![row.id.to_string()];
        line.extend(CSV_COLUMNS.iter().map(|column| row.display(column).to_string()));
        line.push(stages_of(row));
        writer.write_record(&line)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait::async_trait]
impl<R: RecordStore, S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<R, S, C> {
    async fn extract(&self) -> Result<Vec<FundingRecord>> {
        tracing::debug!("Fetching funding entries from: {}", self.config.api_base_url());
        self.store.list().await
    }

    async fn transform(&self, data: Vec<FundingRecord>) -> Result<Report> {
        let normalized = normalize_all(&data)?;
        let rows: Vec<NormalizedRecord> = query_records(&normalized, &self.query)
            .into_iter()
            .cloned()
            .collect();

        tracing::debug!("Query kept {} of {} entries", rows.len(), normalized.len());

        let dashboard = build_dashboard(&rows, self.current_year);
        let csv_output = render_csv(&rows)?;
        let json_output = serde_json::to_string_pretty(&ReportDocument {
            generated_at: Utc::now().to_rfc3339(),
            query: &self.query,
            dashboard: &dashboard,
            companies: &rows,
        })?;

        Ok(Report {
            rows,
            dashboard,
            csv_output,
            json_output,
        })
    }

    async fn load(&self, report: Report) -> Result<String> {
        let mut files: Vec<(&str, &[u8])> = Vec::new();
        if self.wants("csv") {
            files.push((CSV_FILENAME, report.csv_output.as_bytes()));
        }
        if self.wants("json") {
            files.push((JSON_FILENAME, report.json_output.as_bytes()));
        }

        if !self.config.compress_output() {
            for (name, data) in &files {
                tracing::debug!("Writing {} ({} bytes) to storage", name, data.len());
                self.storage.write_file(name, data).await?;
            }
            return Ok(self.config.output_path().to_string());
        }

        tracing::debug!("Creating ZIP file with {} files", files.len());

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, data) in &files {
                zip.start_file::<_, ()>(*name, FileOptions::default())?;
                zip.write_all(data)?;
            }
            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(ZIP_FILENAME, &zip_data).await?;

        Ok(format!("{}/{}", self.config.output_path(), ZIP_FILENAME))
    }
}
