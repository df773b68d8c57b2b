pub mod toml_config;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, QueryArgs, RecordArgs};

#[cfg(feature = "cli")]
mod cli {
    use super::AppConfig;
    use crate::core::normalize::parse_amount;
    use crate::core::query::QuerySpec;
    use crate::core::stage::FundingStage;
    use crate::domain::model::FundingRecord;
    use crate::domain::report::SortDirection;
    use crate::utils::error::{FundingError, Result};
    use clap::{Args, Parser, Subcommand};
    use serde_json::Value;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "proptech-funding")]
    #[command(about = "Query, summarize and maintain PropTech funding records")]
    pub struct CliConfig {
        #[arg(long, global = true, help = "Path to a TOML config file")]
        pub config: Option<PathBuf>,

        #[arg(long, global = true, env = "FUNDING_API_URL")]
        pub api_url: Option<String>,

        #[arg(long, global = true, env = "FUNDING_API_TOKEN", hide_env_values = true)]
        pub token: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// List funding entries matching a query
        List {
            #[command(flatten)]
            query: QueryArgs,
            #[arg(long)]
            limit: Option<usize>,
        },
        /// Show one funding entry with its round timeline
        Show { id: String },
        /// Summary statistics and distributions for a query
        Dashboard {
            #[command(flatten)]
            query: QueryArgs,
        },
        /// Distinct values of a field, for building filters
        Options { field: String },
        /// Create a funding entry
        Add {
            #[command(flatten)]
            record: RecordArgs,
        },
        /// Update fields of a funding entry
        Update {
            id: String,
            #[command(flatten)]
            record: RecordArgs,
        },
        /// Delete a funding entry
        Delete { id: String },
        /// Obtain a bearer token
        Login {
            #[arg(long)]
            email: String,
            #[arg(long, env = "FUNDING_API_PASSWORD", hide_env_values = true)]
            password: String,
        },
        /// Write companies.csv / dashboard.json for a query
        Export {
            #[command(flatten)]
            query: QueryArgs,
            #[arg(long)]
            output_path: Option<String>,
            #[arg(long, value_delimiter = ',')]
            formats: Vec<String>,
            #[arg(long, help = "Write plain files instead of a ZIP archive")]
            no_compress: bool,
        },
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct QueryArgs {
        #[arg(short, long, help = "Case-insensitive text to look for")]
        pub search: Option<String>,

        #[arg(long = "search-field", help = "Field to search (repeatable)")]
        pub search_fields: Vec<String>,

        #[arg(long = "filter", value_parser = parse_key_value, help = "FIELD=VALUE, repeat to allow several values")]
        pub filters: Vec<(String, String)>,

        #[arg(long = "range", value_parser = parse_range, help = "FIELD=MIN..MAX, either bound may be left open")]
        pub ranges: Vec<(String, f64, f64)>,

        #[arg(long = "stage", help = "Funding stage, e.g. seed, a, b, c+, unicorn")]
        pub stages: Vec<FundingStage>,

        #[arg(long)]
        pub sort: Option<String>,

        #[arg(long)]
        pub direction: Option<SortDirection>,
    }

    impl QueryArgs {
        /// Layers the flags over the config file's query defaults.
        pub fn to_query(&self, config: &AppConfig) -> QuerySpec {
            let mut spec = config.base_query();

            if let Some(text) = &self.search {
                spec = spec.search(text.clone());
            }
            if !self.search_fields.is_empty() {
                spec = spec.search_in(self.search_fields.iter().cloned());
            }
            for (field, value) in &self.filters {
                spec = spec.with_category(field, [value.clone()]);
            }
            for (field, min, max) in &self.ranges {
                spec = spec.with_range(field, *min, *max);
            }
            for stage in &self.stages {
                spec = spec.with_stage(*stage);
            }
            if let Some(key) = &self.sort {
                let direction = self.direction.unwrap_or(config.query.sort_direction);
                spec = spec.sorted_by(key, direction);
            } else if let Some(direction) = self.direction {
                spec.sort_direction = direction;
            }

            spec
        }
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct RecordArgs {
        #[arg(long = "field", value_parser = parse_key_value, help = "FIELD=VALUE (repeatable)")]
        pub fields: Vec<(String, String)>,

        #[arg(long, help = "Fields as a JSON object; --field values win")]
        pub json: Option<String>,
    }

    impl RecordArgs {
        pub fn to_record(&self) -> Result<FundingRecord> {
            let mut record = match &self.json {
                Some(raw) => match serde_json::from_str::<Value>(raw)? {
                    value @ Value::Object(_) => FundingRecord::from(value),
                    _ => {
                        return Err(FundingError::Validation {
                            message: "--json must be a JSON object".to_string(),
                        })
                    }
                },
                None => FundingRecord::new(),
            };

            for (field, value) in &self.fields {
                record = record.with_field(field, value.clone());
            }
            Ok(record)
        }
    }

    fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got `{}`", raw))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing field name in `{}`", raw));
        }
        Ok((key.to_string(), value.trim().to_string()))
    }

    fn parse_range(raw: &str) -> std::result::Result<(String, f64, f64), String> {
        let (field, bounds) = parse_key_value(raw)?;
        let (min, max) = bounds
            .split_once("..")
            .ok_or_else(|| format!("expected FIELD=MIN..MAX, got `{}`", raw))?;

        let bound = |text: &str, open: f64| -> std::result::Result<f64, String> {
            if text.trim().is_empty() {
                return Ok(open);
            }
            parse_amount(text).ok_or_else(|| format!("`{}` is not a number", text))
        };

        Ok((field, bound(min, f64::MIN)?, bound(max, f64::MAX)?))
    }

}
