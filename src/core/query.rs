//! Filter/sort/search engine over normalized records.
//!
//! Active filter categories combine with AND; the values selected inside one
//! category combine with OR. Results are identifiers in sort order.

use crate::core::normalize::{numeric_of, parse_amount};
use crate::core::stage::FundingStage;
use crate::domain::model::{NormalizedRecord, RecordId, LOCATION_FIELD};
use crate::domain::report::SortDirection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Bucket name for records lacking a categorical field.
pub const UNKNOWN_BUCKET: &str = "Unknown";

pub const DEFAULT_SEARCH_FIELDS: [&str; 3] = ["Name", "Prop Type", LOCATION_FIELD];

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min > max` (or a NaN bound) can never match anything.
    pub fn is_satisfiable(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Everything one query applies. The default value selects every record
/// in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuerySpec {
    pub search_text: Option<String>,
    /// Fields searched by `search_text`; `None` means Name, Prop Type and Location.
    pub search_fields: Option<Vec<String>>,
    pub categorical_filters: BTreeMap<String, BTreeSet<String>>,
    pub range_filters: BTreeMap<String, RangeFilter>,
    pub funding_stages: BTreeSet<FundingStage>,
    pub sort_key: Option<String>,
    pub sort_direction: SortDirection,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn search_in<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_category<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_filters
            .entry(field.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_range(mut self, field: &str, min: f64, max: f64) -> Self {
        self.range_filters
            .insert(field.to_string(), RangeFilter::new(min, max));
        self
    }

    pub fn with_stage(mut self, stage: FundingStage) -> Self {
        self.funding_stages.insert(stage);
        self
    }

    pub fn sorted_by(mut self, key: &str, direction: SortDirection) -> Self {
        self.sort_key = Some(key.to_string());
        self.sort_direction = direction;
        self
    }

    fn search_needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn matches(&self, record: &NormalizedRecord, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let found = match &self.search_fields {
                Some(fields) => fields.iter().any(|f| contains_text(record, f, needle)),
                None => DEFAULT_SEARCH_FIELDS
                    .iter()
                    .any(|f| contains_text(record, f, needle)),
            };
            if !found {
                return false;
            }
        }

        let categories_pass = self
            .categorical_filters
            .iter()
            .filter(|(_, allowed)| !allowed.is_empty())
            .all(|(field, allowed)| category_matches(record, field, allowed));
        if !categories_pass {
            return false;
        }

        // 缺值一律不在範圍內，不能當成 0
        let ranges_pass = self.range_filters.iter().all(|(field, range)| {
            numeric_of(record, field).is_some_and(|value| range.contains(value))
        });
        if !ranges_pass {
            return false;
        }

        self.funding_stages.is_empty() || self.funding_stages.iter().any(|s| s.matches(record))
    }
}

fn contains_text(record: &NormalizedRecord, field: &str, needle: &str) -> bool {
    record
        .value(field)
        .is_some_and(|value| value.to_lowercase().contains(needle))
}

fn category_matches(record: &NormalizedRecord, field: &str, allowed: &BTreeSet<String>) -> bool {
    if field.eq_ignore_ascii_case(LOCATION_FIELD) {
        let candidates = [record.city(), record.state(), record.value(LOCATION_FIELD)];
        if candidates.iter().flatten().any(|v| allowed.contains(*v)) {
            return true;
        }
        return candidates.iter().all(Option::is_none) && allowed.contains(UNKNOWN_BUCKET);
    }

    match record.value(field) {
        Some(value) => allowed.contains(value),
        None => allowed.contains(UNKNOWN_BUCKET),
    }
}

/// Case-insensitive ordering with byte order as the tie-break.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

struct SortValue<'a> {
    text: &'a str,
    number: Option<f64>,
}

fn sort_value<'a>(record: &'a NormalizedRecord, key: &str) -> Option<SortValue<'a>> {
    let text = record.value(key)?;
    Some(SortValue {
        text,
        number: numeric_of(record, key),
    })
}

fn compare_present(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    compare_mixed(a.number, a.text, b.number, b.text)
}

/// Numeric values first in numeric order, then text in locale order.
/// Ranking by class before comparing keeps mixed columns totally ordered.
fn compare_mixed(a_number: Option<f64>, a_text: &str, b_number: Option<f64>, b_text: &str) -> Ordering {
    match (a_number, b_number) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| locale_cmp(a_text, b_text)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => locale_cmp(a_text, b_text),
    }
}

/// Comparator for one sort key. Records without a value sort after every
/// record with one, in both directions.
pub fn compare_records(
    a: &NormalizedRecord,
    b: &NormalizedRecord,
    key: &str,
    direction: SortDirection,
) -> Ordering {
    match (sort_value(a, key), sort_value(b, key)) {
        (Some(x), Some(y)) => {
            let ordering = compare_present(&x, &y);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filtered, ordered view of `records`. Ties keep input order.
pub fn query_records<'a>(records: &'a [NormalizedRecord], spec: &QuerySpec) -> Vec<&'a NormalizedRecord> {
    if let Some((field, range)) = spec
        .range_filters
        .iter()
        .find(|(_, range)| !range.is_satisfiable())
    {
        tracing::warn!(
            "Range filter on {} has min {} > max {}; no records match",
            field,
            range.min,
            range.max
        );
        return Vec::new();
    }

    let needle = spec.search_needle();
    let mut selected: Vec<&NormalizedRecord> = records
        .iter()
        .filter(|record| spec.matches(record, needle.as_deref()))
        .collect();

    if let Some(key) = spec.sort_key.as_deref() {
        selected.sort_by(|a, b| compare_records(a, b, key, spec.sort_direction));
    }

    tracing::debug!("Query selected {} of {} records", selected.len(), records.len());
    selected
}

/// Identifiers of the records selected by `spec`, in sort order.
pub fn query(records: &[NormalizedRecord], spec: &QuerySpec) -> Vec<RecordId> {
    query_records(records, spec)
        .into_iter()
        .map(|record| record.id.clone())
        .collect()
}

/// Distinct present values of a field, sorted, for populating selectors.
pub fn filter_options(records: &[NormalizedRecord], field: &str) -> Vec<String> {
    let mut options: Vec<String> = records
        .iter()
        .filter_map(|record| record.value(field))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    options.sort_by(|a, b| compare_mixed(parse_amount(a), a, parse_amount(b), b));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_all;
    use crate::domain::model::FundingRecord;
    use serde_json::json;

    fn sample() -> Vec<NormalizedRecord> {
        let raws: Vec<FundingRecord> = vec![
            json!({"_id": "1", "Name": "Acme Homes", "Prop Type": "Residential", "City": "Austin", "State": "TX", "Total Funding": "$1,000,000", "Founded": "2015"}),
            json!({"_id": "2", "Name": "Beta Build", "Prop Type": "Construction", "City": "Denver", "State": "CO", "Founded": 2018}),
            json!({"_id": "3", "Name": "Cobalt", "Prop Type": "Commercial", "State": "TX", "Total Funding": "$25,000,000", "A Round $": "$5,000,000"}),
            json!({"_id": "4", "Name": "delta rentals", "Prop Type": "Residential", "City": "Boston", "Total Funding": "$300,000"}),
        ]
        .into_iter()
        .map(FundingRecord::from)
        .collect();
        normalize_all(&raws).unwrap()
    }

    fn ids(result: &[RecordId]) -> Vec<&str> {
        result.iter().map(RecordId::as_str).collect()
    }

    #[test]
    fn test_empty_spec_selects_everything() {
        let records = sample();
        let result = query(&records, &QuerySpec::default());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_default_fields() {
        let records = sample();

        let by_name = query(&records, &QuerySpec::new().search("DELTA"));
        assert_eq!(ids(&by_name), vec!["4"]);

        let by_type = query(&records, &QuerySpec::new().search("resid"));
        assert_eq!(ids(&by_type), vec!["1", "4"]);

        let by_location = query(&records, &QuerySpec::new().search("tx"));
        assert_eq!(ids(&by_location), vec!["1", "3"]);

        let blank = query(&records, &QuerySpec::new().search("   "));
        assert_eq!(blank.len(), 4);
    }

    #[test]
    fn test_search_in_custom_fields() {
        let records = sample();
        let result = query(&records, &QuerySpec::new().search("tx").search_in(["Name"]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_categorical_filters_or_within_and_across() {
        let records = sample();

        let spec = QuerySpec::new().with_category("Prop Type", ["Residential", "Commercial"]);
        assert_eq!(ids(&query(&records, &spec)), vec!["1", "3", "4"]);

        let spec = spec.with_category("State", ["TX"]);
        assert_eq!(ids(&query(&records, &spec)), vec!["1", "3"]);

        let empty_set = QuerySpec::new().with_category("Prop Type", Vec::<String>::new());
        assert_eq!(query(&records, &empty_set).len(), 4);
    }

    #[test]
    fn test_location_filter_matches_city_or_state() {
        let records = sample();
        let spec = QuerySpec::new().with_category("Location", ["TX", "Boston"]);
        assert_eq!(ids(&query(&records, &spec)), vec!["1", "3", "4"]);
    }

    #[test]
    fn test_unknown_bucket_selects_records_missing_the_field() {
        let records = sample();
        let spec = QuerySpec::new().with_category("City", [UNKNOWN_BUCKET]);
        assert_eq!(ids(&query(&records, &spec)), vec!["3"]);
    }

    #[test]
    fn test_range_filter_excludes_unknown_values() {
        let records = sample();
        let spec = QuerySpec::new().with_range("Total Funding", 0.0, 2_000_000.0);
        // 2 號沒有 Total Funding，不能當成 0 落入範圍
        assert_eq!(ids(&query(&records, &spec)), vec!["1", "4"]);

        let inclusive = QuerySpec::new().with_range("Total Funding", 1_000_000.0, 1_000_000.0);
        assert_eq!(ids(&query(&records, &inclusive)), vec!["1"]);
    }

    #[test]
    fn test_inverted_range_yields_empty_result() {
        let records = sample();
        let spec = QuerySpec::new().with_range("Founded", 2020.0, 2010.0);
        assert!(query(&records, &spec).is_empty());
    }

    #[test]
    fn test_stage_filter() {
        let records = sample();
        let spec = QuerySpec::new().with_stage(FundingStage::SeriesA);
        assert_eq!(ids(&query(&records, &spec)), vec!["3"]);
    }

    #[test]
    fn test_sort_by_currency_ascending_and_descending() {
        let records = sample();

        let asc = QuerySpec::new().sorted_by("Total Funding", SortDirection::Ascending);
        assert_eq!(ids(&query(&records, &asc)), vec!["4", "1", "3", "2"]);

        let desc = QuerySpec::new().sorted_by("Total Funding", SortDirection::Descending);
        assert_eq!(ids(&query(&records, &desc)), vec!["3", "1", "4", "2"]);
    }

    #[test]
    fn test_missing_values_sort_last_in_both_directions() {
        let records = sample();

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let spec = QuerySpec::new().sorted_by("City", direction);
            let result = query(&records, &spec);
            assert_eq!(result.last().unwrap().as_str(), "3", "{:?}", direction);
        }
    }

    #[test]
    fn test_string_sort_ignores_case() {
        let records = sample();
        let spec = QuerySpec::new().sorted_by("Name", SortDirection::Descending);
        assert_eq!(ids(&query(&records, &spec)), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_numeric_strings_sort_numerically() {
        let records = sample();
        let spec = QuerySpec::new().sorted_by("Founded", SortDirection::Descending);
        assert_eq!(ids(&query(&records, &spec)), vec!["2", "1", "3", "4"]);
    }

    #[test]
    fn test_query_spec_from_json() {
        let spec: QuerySpec = serde_json::from_value(json!({
            "searchText": "acme",
            "categoricalFilters": {"Prop Type": ["Residential"]},
            "rangeFilters": {"Total Funding": {"min": 0, "max": 5000000}},
            "fundingStages": ["Unknown"],
            "sortKey": "Name",
            "sortDirection": "descending"
        }))
        .unwrap();

        assert_eq!(spec.sort_direction, SortDirection::Descending);
        assert_eq!(ids(&query(&sample(), &spec)), vec!["1"]);
    }

    #[test]
    fn test_filter_options_sorted_and_distinct() {
        let records = sample();
        assert_eq!(
            filter_options(&records, "Prop Type"),
            vec!["Commercial", "Construction", "Residential"]
        );
        assert_eq!(filter_options(&records, "Founded"), vec!["2015", "2018"]);
    }

    fn zip_records(count: usize) -> Vec<NormalizedRecord> {
        let raws: Vec<FundingRecord> = (0..count)
            .map(|i| {
                let zip = if i % 2 == 0 {
                    format!("{}", (i * 7919) % 1000)
                } else {
                    format!("{}a", (i * 104729) % 1000)
                };
                FundingRecord::from(json!({"_id": i.to_string(), "Zip": zip}))
            })
            .collect();
        normalize_all(&raws).unwrap()
    }

    #[test]
    fn test_mixed_values_rank_numbers_before_text() {
        let records = normalize_all(&[
            FundingRecord::from(json!({"_id": "a", "Zip": "10"})),
            FundingRecord::from(json!({"_id": "b", "Zip": "9"})),
            FundingRecord::from(json!({"_id": "c", "Zip": "1a"})),
        ])
        .unwrap();
        let (ten, nine, text) = (&records[0], &records[1], &records[2]);

        let asc = SortDirection::Ascending;
        assert_eq!(compare_records(ten, nine, "Zip", asc), Ordering::Greater);
        assert_eq!(compare_records(nine, text, "Zip", asc), Ordering::Less);
        assert_eq!(compare_records(ten, text, "Zip", asc), Ordering::Less);
    }

    #[test]
    fn test_large_mixed_column_sorts_in_both_directions() {
        let records = zip_records(2000);

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let spec = QuerySpec::new().sorted_by("Zip", direction);
            let sorted = query_records(&records, &spec);
            assert_eq!(sorted.len(), 2000);

            for pair in sorted.windows(2) {
                assert_ne!(
                    compare_records(pair[0], pair[1], "Zip", direction),
                    Ordering::Greater
                );
            }
        }

        // 升冪時數字全部排在文字前面
        let ascending = query_records(&records, &QuerySpec::new().sorted_by("Zip", SortDirection::Ascending));
        let numeric: Vec<bool> = ascending
            .iter()
            .map(|r| numeric_of(r, "Zip").is_some())
            .collect();
        let boundary = numeric.iter().position(|n| !n).unwrap();
        assert!(numeric[..boundary].iter().all(|n| *n));
        assert!(numeric[boundary..].iter().all(|n| !*n));
    }

    #[test]
    fn test_filter_options_with_mixed_values() {
        let records = normalize_all(&[
            FundingRecord::from(json!({"_id": "1", "Zip": "1a"})),
            FundingRecord::from(json!({"_id": "2", "Zip": "10"})),
            FundingRecord::from(json!({"_id": "3", "Zip": "9"})),
            FundingRecord::from(json!({"_id": "4", "Zip": "94107-1234"})),
        ])
        .unwrap();

        assert_eq!(filter_options(&records, "Zip"), vec!["9", "10", "1a", "94107-1234"]);
        assert!(!filter_options(&zip_records(2000), "Zip").is_empty());
    }
}
