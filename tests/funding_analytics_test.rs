use anyhow::Result;
use proptech_funding::core::aggregate::average;
use proptech_funding::core::normalize::normalize_all;
use proptech_funding::core::stage::FundingStage;
use proptech_funding::domain::report::SortDirection;
use proptech_funding::{
    count_by_category, filter_options, query, sum_by_year, top_n, FundingRecord, NormalizedRecord,
    QuerySpec, RecordId,
};
use serde_json::json;

fn collection() -> Result<Vec<NormalizedRecord>> {
    let raw: Vec<FundingRecord> = serde_json::from_value(json!([
        {"_id": 1, "Name": "Acme", "Prop Type": "Residential", "City": "Austin", "State": "TX",
         "Total Funding": "$1,000,000", "Founded": "2016",
         "A Round Date": "03/14/2020", "A Round $": "$500,000"},
        {"_id": 2, "Name": "Beta", "Prop Type": "Residential", "State": "CA",
         "Founded": 2012, "A Round Date": "2020-07-01", "A Round $": "$1,000,000"},
        {"_id": 3, "Name": "cobalt", "City": "Denver",
         "Total Funding": "$0", "Seed $": "$250,000"},
        {"_id": 4, "Name": "Delta", "Prop Type": "Commercial",
         "Total Funding": "tbd", "Latest Valuation": "$1,200,000,000"}
    ]))?;
    Ok(normalize_all(&raw)?)
}

fn ids(values: &[&str]) -> Vec<RecordId> {
    values.iter().copied().map(RecordId::from).collect()
}

#[test]
fn test_unknown_amounts_stay_out_of_arithmetic() -> Result<()> {
    let records = collection()?;

    // "$0" 是有效金額，"tbd" 與缺值都不算
    assert_eq!(average(&records, "Total Funding"), Some(500_000.0));
    assert_eq!(records[3].display("Total Funding"), "N/A");
    assert_eq!(records[2].number("Total Funding"), Some(0.0));
    Ok(())
}

#[test]
fn test_location_composition() -> Result<()> {
    let records = collection()?;

    let locations: Vec<&str> = records.iter().map(|r| r.location.as_str()).collect();
    assert_eq!(locations, vec!["Austin, TX", "CA", "Denver", "N/A"]);
    Ok(())
}

#[test]
fn test_search_matches_composite_location() -> Result<()> {
    let records = collection()?;

    let spec = QuerySpec::new().search("austin, tx");
    assert_eq!(query(&records, &spec), ids(&["1"]));

    let spec = QuerySpec::new().search("RESIDENTIAL");
    assert_eq!(query(&records, &spec), ids(&["1", "2"]));
    Ok(())
}

#[test]
fn test_filters_combine_with_and() -> Result<()> {
    let records = collection()?;

    let spec = QuerySpec::new()
        .with_category("Prop Type", ["Residential", "Commercial"])
        .with_range("Total Funding", 0.0, 2_000_000.0);

    // 4 號的 Total Funding 無法解析，不會落進範圍
    assert_eq!(query(&records, &spec), ids(&["1"]));
    Ok(())
}

#[test]
fn test_inverted_range_matches_nothing() -> Result<()> {
    let records = collection()?;

    let spec = QuerySpec::new().with_range("Total Funding", 10.0, 1.0);
    assert!(query(&records, &spec).is_empty());
    Ok(())
}

#[test]
fn test_unknowns_sort_last_in_both_directions() -> Result<()> {
    let records = collection()?;

    let ascending = QuerySpec::new().sorted_by("Total Funding", SortDirection::Ascending);
    assert_eq!(query(&records, &ascending), ids(&["3", "1", "2", "4"]));

    let descending = QuerySpec::new().sorted_by("Total Funding", SortDirection::Descending);
    assert_eq!(query(&records, &descending), ids(&["1", "3", "2", "4"]));
    Ok(())
}

#[test]
fn test_name_sort_ignores_case() -> Result<()> {
    let records = collection()?;

    let spec = QuerySpec::new().sorted_by("Name", SortDirection::Ascending);
    assert_eq!(query(&records, &spec), ids(&["1", "2", "3", "4"]));
    Ok(())
}

#[test]
fn test_stage_filter() -> Result<()> {
    let records = collection()?;

    let seed = QuerySpec::new().with_stage(FundingStage::PreSeedSeed);
    assert_eq!(query(&records, &seed), ids(&["3"]));

    let grown = QuerySpec::new()
        .with_stage(FundingStage::SeriesA)
        .with_stage(FundingStage::Unicorn);
    assert_eq!(query(&records, &grown), ids(&["1", "2", "4"]));
    Ok(())
}

#[test]
fn test_category_counts_keep_unknown_bucket() -> Result<()> {
    let records = collection()?;

    let counts: Vec<(String, usize)> = count_by_category(&records, "Prop Type")
        .into_iter()
        .map(|c| (c.value, c.count))
        .collect();

    assert_eq!(
        counts,
        vec![
            ("Residential".to_string(), 2),
            ("Unknown".to_string(), 1),
            ("Commercial".to_string(), 1),
        ]
    );
    Ok(())
}

#[test]
fn test_top_n_does_not_pad() -> Result<()> {
    let records = collection()?;

    let top = top_n(&records, "Latest Valuation", 3, SortDirection::Descending);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, RecordId::new("4"));
    Ok(())
}

#[test]
fn test_sum_by_year_merges_date_formats() -> Result<()> {
    let records = collection()?;

    let totals = sum_by_year(&records, "A Round Date", "A Round $");
    assert_eq!(totals.into_iter().collect::<Vec<_>>(), vec![(2020, 1_500_000.0)]);
    Ok(())
}

#[test]
fn test_filter_options_sort_numbers_numerically() -> Result<()> {
    let records = collection()?;

    assert_eq!(filter_options(&records, "Founded"), vec!["2012", "2016"]);
    assert_eq!(filter_options(&records, "Location"), vec!["Austin, TX", "CA", "Denver"]);
    Ok(())
}
