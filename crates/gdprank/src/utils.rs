use std::sync::LazyLock;

use regex::Regex;

use crate::types::GdpRecord;

static RE_CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("invalid regex: citation"));
static RE_PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("invalid regex: parenthesized"));

const MISSING_TOKENS: [&str; 4] = ["", "—", "-", "N/A"];

/// Removes citation markers like `[12]` and turns non-breaking spaces into plain spaces.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = RE_CITATION.replace_all(text.trim(), "");
    text.replace('\u{a0}', " ").trim().to_string()
}

/// Cleans a country cell, dropping annotations such as `China (Mainland)` → `China`.
pub fn clean_country(text: &str) -> String {
    let text = clean_text(text);
    RE_PARENTHESIZED.replace_all(&text, "").trim().to_string()
}

/// Parses a numeric cell with thousands separators.
///
/// Sentinels (`—`, `-`, `N/A`, empty) and anything that is not a plain
/// non-negative integer after removing commas yield `None`.
pub fn clean_number(text: &str) -> Option<u64> {
    let text = clean_text(text).replace(',', "");

    if MISSING_TOKENS.contains(&text.as_str()) {
        return None;
    }

    match text.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Unparseable number '{}': {}", text, e);
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordFilter {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn apply(self, mut records: Vec<GdpRecord>) -> Vec<GdpRecord> {
        if let Some(off) = self.offset {
            records = records.into_iter().skip(off).collect();
        }
        if let Some(lim) = self.limit {
            records.truncate(lim);
        }
        records
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.offset.is_some_and(|o| o == 0) {
            return Err("Offset must be greater than 0".to_string());
        }
        if self.limit.is_some_and(|l| l == 0) {
            return Err("Limit must be greater than 0".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableStats {
    pub with_gdp: usize,
    pub missing_gdp: usize,
    pub total: usize,
    pub gdp_sum: u64,
}

impl TableStats {
    pub fn from_records(records: &[GdpRecord]) -> TableStats {
        let known: Vec<u64> = records.iter().filter_map(|r| r.gdp_usd_million).collect();
        TableStats {
            with_gdp: known.len(),
            missing_gdp: records.len() - known.len(),
            total: records.len(),
            gdp_sum: known.iter().fold(0u64, |acc, v| acc.saturating_add(*v)),
        }
    }
}

impl std::fmt::Display for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Rows with GDP:        {}", self.with_gdp)?;
        writeln!(f, "  Rows missing GDP:     {}", self.missing_gdp)?;
        writeln!(f, "  Total rows:           {}", self.total)?;
        writeln!(f, "  Sum of GDP (US$ M):   {}", self.gdp_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: u32, country: &str, gdp: Option<u64>) -> GdpRecord {
        GdpRecord {
            rank: Some(rank),
            country: country.to_string(),
            gdp_usd_million: gdp,
        }
    }

    #[test]
    fn test_clean_text_removes_citations() {
        assert_eq!(clean_text("Foo [12] Bar"), "Foo  Bar");
        assert_eq!(clean_text("  Japan[n 1][5]  "), "Japan");
        assert_eq!(clean_text("4,231,141 [a]"), "4,231,141");
    }

    #[test]
    fn test_clean_text_replaces_non_breaking_spaces() {
        assert_eq!(clean_text("South\u{a0}Korea"), "South Korea");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_clean_country_strips_parentheses() {
        assert_eq!(clean_country("China (Mainland)"), "China");
        assert_eq!(clean_country("Congo (Kinshasa) [3]"), "Congo");
        assert_eq!(clean_country("Germany"), "Germany");
    }

    #[test]
    fn test_clean_number_missing_tokens() {
        for token in ["", "—", "-", "N/A"] {
            assert_eq!(clean_number(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn test_clean_number_thousands_separators() {
        assert_eq!(clean_number("1,234,567"), Some(1234567));
        assert_eq!(clean_number("25,462,700[n 2]"), Some(25462700));
        assert_eq!(clean_number(" 42 "), Some(42));
    }

    #[test]
    fn test_clean_number_garbage_is_absent() {
        assert_eq!(clean_number("abc"), None);
        assert_eq!(clean_number("12 345"), None);
        assert_eq!(clean_number("-5"), None);
        assert_eq!(clean_number("1.5"), None);
    }

    #[test]
    fn test_record_filter_apply() {
        let records = vec![
            record(1, "A", Some(3)),
            record(2, "B", Some(2)),
            record(3, "C", Some(1)),
        ];
        let filter = RecordFilter {
            offset: Some(1),
            limit: Some(1),
        };

        let out = filter.validate().unwrap().apply(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].country, "B");
    }

    #[test]
    fn test_record_filter_rejects_zero() {
        assert!(
            RecordFilter {
                offset: Some(0),
                limit: None
            }
            .validate()
            .is_err()
        );
        assert!(
            RecordFilter {
                offset: None,
                limit: Some(0)
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_table_stats() {
        let records = vec![
            record(1, "A", Some(100)),
            record(2, "B", None),
            record(3, "C", Some(50)),
        ];

        let stats = TableStats::from_records(&records);
        assert_eq!(
            stats,
            TableStats {
                with_gdp: 2,
                missing_gdp: 1,
                total: 3,
                gdp_sum: 150,
            }
        );
        assert!(stats.to_string().contains("Total rows:           3"));
    }
}
