use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caption keywords used when the caller does not supply any.
pub const DEFAULT_KEYWORDS: [&str; 3] = ["gdp", "nominal", "million"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdpRecord {
    pub rank: Option<u32>,
    pub country: String,
    pub gdp_usd_million: Option<u64>,
}

impl Display for GdpRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rank = self
            .rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        let gdp = self
            .gdp_usd_million
            .map(group_thousands)
            .unwrap_or_else(|| "n/a".to_string());
        write!(f, "{:>4}  {:<40} {:>14}", rank, self.country, gdp)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid rank policy '{0}'. Accepted values: 'ordinal', 'column'")]
pub struct RankPolicyParseError(String);

/// Where a record's rank comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// 1-based position of the row among the extracted records.
    #[default]
    Ordinal,
    /// Value of the detected "rank" column, falling back to [`RankPolicy::Ordinal`]
    /// when the table has no such column.
    Column,
}

impl FromStr for RankPolicy {
    type Err = RankPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordinal" => Ok(RankPolicy::Ordinal),
            "column" => Ok(RankPolicy::Column),
            _ => Err(RankPolicyParseError(s.to_string())),
        }
    }
}

impl Display for RankPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankPolicy::Ordinal => write!(f, "ordinal"),
            RankPolicy::Column => write!(f, "column"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid GDP header match '{0}'. Accepted values: 'strict', 'loose'")]
pub struct GdpMatchParseError(String);

/// How a header cell qualifies as the GDP column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdpMatch {
    /// Header contains "gdp" and also "million" or "$".
    #[default]
    Strict,
    /// Header contains "gdp".
    Loose,
}

impl GdpMatch {
    pub fn matches(&self, header: &str) -> bool {
        if !header.contains("gdp") {
            return false;
        }
        match self {
            GdpMatch::Strict => header.contains("million") || header.contains('$'),
            GdpMatch::Loose => true,
        }
    }
}

impl FromStr for GdpMatch {
    type Err = GdpMatchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(GdpMatch::Strict),
            "loose" => Ok(GdpMatch::Loose),
            _ => Err(GdpMatchParseError(s.to_string())),
        }
    }
}

impl Display for GdpMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GdpMatch::Strict => write!(f, "strict"),
            GdpMatch::Loose => write!(f, "loose"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Lowercase caption keywords; a table is selected when its caption contains any of them.
    pub keywords: Vec<String>,
    pub rank_policy: RankPolicy,
    pub gdp_match: GdpMatch,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            rank_policy: RankPolicy::default(),
            gdp_match: GdpMatch::default(),
        }
    }
}

pub const DEFAULT_COUNTRY_COLUMN: usize = 0;
pub const DEFAULT_GDP_COLUMN: usize = 2;

/// Column index for each header role of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMap {
    pub rank: Option<usize>,
    pub country: usize,
    pub gdp: usize,
}

impl HeaderMap {
    /// Infers column roles from lowercased, trimmed header texts.
    ///
    /// `rank` needs an exact "rank" header. `country` and `gdp` take the first
    /// matching header and fall back to columns 0 and 2.
    pub fn from_headers(headers: &[String], gdp_match: GdpMatch) -> Self {
        let rank = headers.iter().position(|h| h == "rank");
        let country = headers.iter().position(|h| h.contains("country"));
        let gdp = headers.iter().position(|h| gdp_match.matches(h));

        if country.is_none() {
            log::warn!(
                "No country header found, using column {}",
                DEFAULT_COUNTRY_COLUMN
            );
        }
        if gdp.is_none() {
            log::warn!(
                "No GDP header found ({} match), using column {}",
                gdp_match,
                DEFAULT_GDP_COLUMN
            );
        }

        Self {
            rank,
            country: country.unwrap_or(DEFAULT_COUNTRY_COLUMN),
            gdp: gdp.unwrap_or(DEFAULT_GDP_COLUMN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GdpTable {
    pub source_url: Option<String>,
    pub caption: String,
    pub headers: Vec<String>,
    pub header_map: HeaderMap,
    pub fetched_at: Option<DateTime<Utc>>,
    pub records: Vec<GdpRecord>,
}

impl Display for GdpTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {}", self.caption)?;
        if let Some(url) = &self.source_url {
            writeln!(f, "│  Source: {}", url)?;
        }
        if let Some(fetched_at) = self.fetched_at {
            writeln!(f, "│  Fetched: {}", fetched_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(f, "└─ {} row(s)", self.records.len())?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>4}  {:<40} {:>14}",
            "Rank", "Country", "GDP (US$ M)"
        )?;
        for record in &self.records {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}
