use crate::domain::model::{NormalizedRecord, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort direction shared by the query engine and `top_n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub id: RecordId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRound {
    pub round: String,
    pub date: String,
    pub amount: f64,
    pub formatted_amount: String,
}

/// Headline numbers for the dashboard. `None` means "unknown" and is shown as `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_companies: usize,
    pub total_funding: Option<f64>,
    pub average_company_age: Option<f64>,
    pub average_funding_rounds: Option<f64>,
    pub unicorn_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub prop_types: Vec<CategoryCount>,
    pub locations: Vec<CategoryCount>,
    pub funding_stages: Vec<CategoryCount>,
    pub founded_years: Vec<CategoryCount>,
    pub top_funded: Vec<RankedRecord>,
    pub funding_by_year: BTreeMap<i32, f64>,
}

/// Output of the report pipeline's transform phase.
#[derive(Debug, Clone)]
pub struct Report {
    /// Query result in sort order.
    pub rows: Vec<NormalizedRecord>,
    pub dashboard: Dashboard,
    pub csv_output: String,
    pub json_output: String,
}
