use crate::core::dates::parse_date;
use crate::domain::model::NormalizedRecord;
use crate::domain::report::FundingRound;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Valuation at or above which a company counts as a unicorn.
pub const UNICORN_VALUATION: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy)]
pub struct RoundFields {
    pub round: &'static str,
    pub date_field: &'static str,
    pub amount_field: &'static str,
}

const fn round(round: &'static str, date_field: &'static str, amount_field: &'static str) -> RoundFields {
    RoundFields {
        round,
        date_field,
        amount_field,
    }
}

/// Every funding round a record may carry, in nominal order.
pub const ROUNDS: [RoundFields; 13] = [
    round("Pre-Seed", "Pre-Seed Date", "Pre-Seed $"),
    round("Seed", "Seed Date", "Seed $"),
    round("Bridge", "Bridge Date", "Bridge $"),
    round("Series A", "A Round Date", "A Round $"),
    round("Series B", "B Round Date", "B Round $"),
    round("Series C", "C Round Date", "C Round $"),
    round("Series D", "D Round Date", "D Round $"),
    round("Series E", "E Round Date", "E Round $"),
    round("Series F", "F Round Date", "F Round $"),
    round("Series G", "G Round Date", "G Round $"),
    round("Series H", "H Round Date", "H Round $"),
    round("Unknown Series", "Unknown Series Date", "Unknown Series $"),
    round("Non-Dilutive", "Non-Dilutive Round Date", "Non-Dilutive Round $"),
];

const SEED_AMOUNTS: [&str; 2] = ["Pre-Seed $", "Seed $"];
const LATE_AMOUNTS: [&str; 6] = [
    "C Round $",
    "D Round $",
    "E Round $",
    "F Round $",
    "G Round $",
    "H Round $",
];
/// Rounds considered when deciding a record has no known stage.
const STAGED_AMOUNTS: [&str; 10] = [
    "Pre-Seed $",
    "Seed $",
    "A Round $",
    "B Round $",
    "C Round $",
    "D Round $",
    "E Round $",
    "F Round $",
    "G Round $",
    "H Round $",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FundingStage {
    #[serde(rename = "Pre-Seed/Seed", alias = "seed")]
    PreSeedSeed,
    #[serde(rename = "Series A", alias = "a")]
    SeriesA,
    #[serde(rename = "Series B", alias = "b")]
    SeriesB,
    #[serde(rename = "Series C+", alias = "c+")]
    SeriesCPlus,
    #[serde(rename = "Unicorns", alias = "unicorn")]
    Unicorn,
    #[serde(rename = "Unknown", alias = "unknown")]
    Unknown,
}

impl FundingStage {
    /// Distribution order on the dashboard.
    pub const ALL: [FundingStage; 6] = [
        FundingStage::PreSeedSeed,
        FundingStage::SeriesA,
        FundingStage::SeriesB,
        FundingStage::SeriesCPlus,
        FundingStage::Unicorn,
        FundingStage::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PreSeedSeed => "Pre-Seed/Seed",
            Self::SeriesA => "Series A",
            Self::SeriesB => "Series B",
            Self::SeriesCPlus => "Series C+",
            Self::Unicorn => "Unicorns",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether a record belongs to this stage. A record can be in several stages.
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        let any = |fields: &[&str]| fields.iter().any(|f| record.number(f).is_some());
        match self {
            Self::PreSeedSeed => any(&SEED_AMOUNTS),
            Self::SeriesA => any(&["A Round $"]),
            Self::SeriesB => any(&["B Round $"]),
            Self::SeriesCPlus => any(&LATE_AMOUNTS),
            Self::Unicorn => record
                .number("Latest Valuation")
                .is_some_and(|v| v >= UNICORN_VALUATION),
            Self::Unknown => !any(&STAGED_AMOUNTS),
        }
    }
}

impl fmt::Display for FundingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for FundingStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().to_ascii_lowercase() == wanted)
            .or(match wanted.as_str() {
                "seed" | "pre-seed" => Some(Self::PreSeedSeed),
                "a" => Some(Self::SeriesA),
                "b" => Some(Self::SeriesB),
                "c+" | "late" => Some(Self::SeriesCPlus),
                "unicorn" => Some(Self::Unicorn),
                _ => None,
            })
            .ok_or_else(|| format!("unknown funding stage: {}", s))
    }
}

/// Rounds with both a date and a parseable amount, oldest first.
/// Rounds whose date cannot be parsed keep their nominal order after the dated ones.
pub fn funding_rounds(record: &NormalizedRecord) -> Vec<FundingRound> {
    let mut rounds: Vec<(Option<chrono::NaiveDate>, FundingRound)> = ROUNDS
        .iter()
        .filter_map(|r| {
            let date = record.value(r.date_field)?;
            let amount = record.number(r.amount_field)?;
            Some((
                parse_date(date),
                FundingRound {
                    round: r.round.to_string(),
                    date: date.to_string(),
                    amount,
                    formatted_amount: record.display(r.amount_field).to_string(),
                },
            ))
        })
        .collect();

    rounds.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    rounds.into_iter().map(|(_, round)| round).collect()
}
