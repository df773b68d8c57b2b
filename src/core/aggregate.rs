//! Summary statistics and distributions for the dashboard.
//!
//! Every function recomputes from scratch over the given slice. Values that
//! do not parse are skipped, never counted as zero.

use crate::core::dates::extract_year;
use crate::core::normalize::numeric_of;
use crate::core::query::{compare_records, UNKNOWN_BUCKET};
use crate::core::stage::{FundingStage, ROUNDS};
use crate::domain::model::NormalizedRecord;
use crate::domain::report::{CategoryCount, Dashboard, DashboardSummary, RankedRecord, SortDirection};
use std::collections::{BTreeMap, HashMap};

const CHART_BUCKETS: usize = 8;
const FOUNDED_YEARS_SHOWN: usize = 10;
const TOP_FUNDED_SHOWN: usize = 5;

/// Record count per distinct value, most frequent first. Records lacking the
/// field are counted under `Unknown`. Ties keep first-seen order.
pub fn count_by_category(records: &[NormalizedRecord], field: &str) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let value = record.value(field).unwrap_or(UNKNOWN_BUCKET);
        match index.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.to_string(), counts.len());
                counts.push(CategoryCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by 是穩定排序，同數量保持首次出現順序
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `n` records with the largest (descending) or smallest (ascending)
/// value of `field`. Returns fewer than `n` when fewer records qualify.
pub fn top_n(
    records: &[NormalizedRecord],
    field: &str,
    n: usize,
    direction: SortDirection,
) -> Vec<RankedRecord> {
    let mut ranked: Vec<(&NormalizedRecord, f64)> = records
        .iter()
        .filter_map(|record| numeric_of(record, field).map(|value| (record, value)))
        .collect();

    if ranked.len() < n {
        tracing::debug!(
            "top_n({}, {}): only {} qualifying records",
            field,
            n,
            ranked.len()
        );
    }

    ranked.sort_by(|(a, _), (b, _)| compare_records(a, b, field, direction));
    ranked
        .into_iter()
        .take(n)
        .map(|(record, value)| RankedRecord {
            id: record.id.clone(),
            value,
        })
        .collect()
}

/// Amount totals per year of `date_field`, in ascending year order. Records
/// missing either a parseable year or a parseable amount are skipped.
pub fn sum_by_year(
    records: &[NormalizedRecord],
    date_field: &str,
    amount_field: &str,
) -> BTreeMap<i32, f64> {
    let mut totals = BTreeMap::new();
    accumulate_by_year(&mut totals, records, date_field, amount_field);
    totals
}

fn accumulate_by_year(
    totals: &mut BTreeMap<i32, f64>,
    records: &[NormalizedRecord],
    date_field: &str,
    amount_field: &str,
) {
    for record in records {
        let Some(year) = record.value(date_field).and_then(extract_year) else {
            continue;
        };
        let Some(amount) = numeric_of(record, amount_field) else {
            continue;
        };
        *totals.entry(year).or_insert(0.0) += amount;
    }
}

/// Mean of the parseable values of `field`; `None` when there are none.
pub fn average(records: &[NormalizedRecord], field: &str) -> Option<f64> {
    mean(records.iter().filter_map(|record| numeric_of(record, field)))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Sum of the parseable values of `field`; `None` when there are none.
pub fn total(records: &[NormalizedRecord], field: &str) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| numeric_of(record, field))
        .collect();
    (!values.is_empty()).then(|| values.iter().sum())
}

/// Record count per funding stage in dashboard order, empty stages omitted.
pub fn stage_distribution(records: &[NormalizedRecord]) -> Vec<CategoryCount> {
    FundingStage::ALL
        .iter()
        .map(|stage| CategoryCount {
            value: stage.label().to_string(),
            count: records.iter().filter(|r| stage.matches(r)).count(),
        })
        .filter(|bucket| bucket.count > 0)
        .collect()
}

/// Companies founded per year, ascending, limited to the most recent `last` years.
pub fn founded_year_distribution(records: &[NormalizedRecord], last: usize) -> Vec<CategoryCount> {
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for record in records {
        if let Some(year) = record.value("Founded").and_then(extract_year) {
            *years.entry(year).or_insert(0) += 1;
        }
    }

    let skip = years.len().saturating_sub(last);
    years
        .into_iter()
        .skip(skip)
        .map(|(year, count)| CategoryCount {
            value: year.to_string(),
            count,
        })
        .collect()
}

/// All round amounts per round year, across every round type.
pub fn funding_by_year(records: &[NormalizedRecord]) -> BTreeMap<i32, f64> {
    let mut totals = BTreeMap::new();
    for round in ROUNDS.iter() {
        accumulate_by_year(&mut totals, records, round.date_field, round.amount_field);
    }
    totals
}

pub fn summarize(records: &[NormalizedRecord], current_year: i32) -> DashboardSummary {
    let ages = records.iter().filter_map(|record| {
        let founded = record.value("Founded").and_then(extract_year)?;
        (founded <= current_year).then(|| f64::from(current_year - founded))
    });

    DashboardSummary {
        total_companies: records.len(),
        total_funding: total(records, "Total Funding"),
        average_company_age: mean(ages),
        average_funding_rounds: average(records, "# of Funding Rounds"),
        unicorn_count: records
            .iter()
            .filter(|r| FundingStage::Unicorn.matches(r))
            .count(),
    }
}

fn top_buckets(mut counts: Vec<CategoryCount>, limit: usize) -> Vec<CategoryCount> {
    counts.truncate(limit);
    counts
}

pub fn build_dashboard(records: &[NormalizedRecord], current_year: i32) -> Dashboard {
    Dashboard {
        summary: summarize(records, current_year),
        prop_types: top_buckets(count_by_category(records, "Prop Type"), CHART_BUCKETS),
        locations: top_buckets(count_by_category(records, "State"), CHART_BUCKETS),
        funding_stages: stage_distribution(records),
        founded_years: founded_year_distribution(records, FOUNDED_YEARS_SHOWN),
        top_funded: top_n(records, "Total Funding", TOP_FUNDED_SHOWN, SortDirection::Descending),
        funding_by_year: funding_by_year(records),
    }
}
