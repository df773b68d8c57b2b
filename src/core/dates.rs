//! Tolerant parsing of the free-form date strings found in funding records.
//!
//! Accepted shapes: `MM/DD/YYYY`, `M/D/YY`, `YYYY-MM-DD`, RFC 3339 timestamps,
//! `Mon YYYY` / `Month YYYY`, and a bare four-digit year.

use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

// %y 必須排在 %Y 前面: chrono 的 %Y 會把 "21" 當成西元 21 年
const DAY_FORMATS: [&str; 5] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y"];

fn bare_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})$").expect("valid year regex"))
}

fn embedded_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(1[89]\d{2}|2\d{3})\b").expect("valid embedded year regex"))
}

/// Full calendar date, when the string carries one.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }

    // "2020-07-01T00:00:00.000Z" 之類帶時間的字串，只取日期部分
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);

    DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .or_else(|| {
            // "Mar 2021" / "March 2021"
            ["%d %b %Y", "%d %B %Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&format!("1 {}", s), fmt).ok())
        })
}

/// Four-digit year of a date string. Year-only strings are accepted.
pub fn extract_year(raw: &str) -> Option<i32> {
    let s = raw.trim();

    if let Some(caps) = bare_year().captures(s) {
        return caps[1].parse().ok();
    }

    if let Some(date) = parse_date(s) {
        return Some(date.year());
    }

    embedded_year()
        .captures(s)
        .and_then(|caps| caps[1].parse().ok())
}
