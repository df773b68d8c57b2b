//! Field normalizer: raw [`FundingRecord`] → [`NormalizedRecord`].
//!
//! This is the only place that deals with "the field may not exist". Parse
//! failures never surface as errors; they degrade to "unknown", which means
//! the field is absent from `numeric_fields` and shown as `N/A`.

use crate::core::stage::ROUNDS;
use crate::domain::model::{FundingRecord, NormalizedRecord, RecordId, NOT_AVAILABLE};
use crate::utils::error::{FundingError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Display fields every normalized record carries, `N/A` when absent.
pub const DISPLAY_FIELDS: [&str; 17] = [
    "Name",
    "Technology",
    "Prop Type",
    "City",
    "State",
    "Zip",
    "Founded",
    "Total Funding",
    "Latest Valuation",
    "Latest Valuation Year",
    "Estimated ARR",
    "# of Funding Rounds",
    "Years Active",
    "Exit Date",
    "Exit $",
    "Acquirer",
    "Total Funding Rank",
];

const MONETARY_FIELDS: [&str; 3] = ["Total Funding", "Latest Valuation", "Estimated ARR"];

const COUNT_FIELDS: [&str; 5] = [
    "Founded",
    "Latest Valuation Year",
    "# of Funding Rounds",
    "Years Active",
    "# of Founders",
];

fn is_monetary_field(name: &str) -> bool {
    MONETARY_FIELDS.contains(&name) || name.ends_with('$')
}

fn is_numeric_field(name: &str) -> bool {
    is_monetary_field(name) || COUNT_FIELDS.contains(&name) || name.contains("Rank")
}

/// Parses `"$10,500,000"`, `"10500000"`, `"$2.5"` and the like.
///
/// Strips the currency symbol, thousands separators and whitespace. Returns
/// `None` for anything that is not a finite decimal number afterwards.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '_'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `"City, State"`, one of them alone, or `N/A`.
pub fn compose_location(city: Option<&str>, state: Option<&str>) -> String {
    match (city, state) {
        (Some(city), Some(state)) => format!("{}, {}", city, state),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => NOT_AVAILABLE.to_string(),
    }
}

fn numeric_value(name: &str, value: &Value, text: &str) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(_) if is_numeric_field(name) || text.starts_with('$') => parse_amount(text),
        _ => None,
    }
}

/// Normalizes a record that already exists in the store.
///
/// Fails with a validation error when the record carries no identifier.
pub fn normalize(record: &FundingRecord) -> Result<NormalizedRecord> {
    let id = record.id().ok_or_else(|| FundingError::Validation {
        message: format!(
            "Stored funding entry has no id (Name: {})",
            record.text("Name").unwrap_or_else(|| NOT_AVAILABLE.to_string())
        ),
    })?;

    Ok(normalize_with_id(id, record))
}

fn normalize_with_id(id: RecordId, record: &FundingRecord) -> NormalizedRecord {
    let mut present = BTreeMap::new();
    let mut numeric_fields = BTreeMap::new();

    for name in record.data.keys() {
        if name == "_id" || name == "id" || name == "__v" {
            continue;
        }
        let (Some(value), Some(text)) = (record.field(name), record.text(name)) else {
            continue;
        };

        match numeric_value(name, value, &text) {
            Some(number) => {
                numeric_fields.insert(name.clone(), number);
            }
            // 金額欄位解析失敗視同缺值，不能顯示成 0
            None if is_monetary_field(name) => {
                tracing::debug!("Unparseable amount in {} for {}: {:?}", name, id, text);
                continue;
            }
            None => {}
        }

        present.insert(name.clone(), text);
    }

    let mut display_fields: BTreeMap<String, String> = DISPLAY_FIELDS
        .iter()
        .copied()
        .chain(ROUNDS.iter().flat_map(|r| [r.date_field, r.amount_field]))
        .map(|name| (name.to_string(), NOT_AVAILABLE.to_string()))
        .collect();
    display_fields.extend(present.iter().map(|(k, v)| (k.clone(), v.clone())));

    let city = present.get("City").cloned();
    let state = present.get("State").cloned();
    let location = compose_location(city.as_deref(), state.as_deref());

    NormalizedRecord {
        id,
        display_fields,
        numeric_fields,
        location,
        present,
        city,
        state,
    }
}

/// Numeric view of any field: the normalized number, or a best-effort parse
/// of the present text for fields outside the recognized numeric set.
pub fn numeric_of(record: &NormalizedRecord, field: &str) -> Option<f64> {
    record
        .number(field)
        .or_else(|| record.value(field).and_then(parse_amount))
}

/// Normalizes a fetched collection, preserving input order.
pub fn normalize_all(records: &[FundingRecord]) -> Result<Vec<NormalizedRecord>> {
    records.iter().map(normalize).collect()
}
