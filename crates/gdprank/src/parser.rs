use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::types::{ExtractOptions, GdpRecord, GdpTable, HeaderMap, RankPolicy};
use crate::utils::{clean_country, clean_number};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No table caption matched any of {keywords:?}")]
    TableNotFound { keywords: Vec<String> },
}

/// Rows with fewer cells are structural (sub-headers, footnotes, separators).
pub const MIN_ROW_CELLS: usize = 3;

static SELECTOR_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("invalid selector: table"));
static SELECTOR_TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: tr"));
static SELECTOR_TH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("invalid selector: th"));
static SELECTOR_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("invalid selector: cell"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins the cell's text nodes with single spaces, dropping blank ones.
fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Only the table's own `<caption>` child counts; captions of nested tables are ignored.
fn caption_text(table: ElementRef) -> Option<String> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "caption")
        .map(|caption| normalize_whitespace(&elem_text(caption)))
}

/// Returns the first table, in document order, whose caption contains any keyword.
///
/// Tables without a caption are skipped. Blank keywords are ignored, so an
/// empty or all-blank keyword set never matches.
pub fn find_table_by_caption<'a, S: AsRef<str>>(
    document: &'a Html,
    keywords: &[S],
) -> Result<(ElementRef<'a>, String), ParseError> {
    log::info!("Searching for target table...");

    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    for table in document.select(&SELECTOR_TABLE) {
        let Some(caption) = caption_text(table) else {
            continue;
        };
        let lowered = caption.to_lowercase();
        if keywords.iter().any(|k| lowered.contains(k.as_str())) {
            log::info!("Matched table caption: {}", caption);
            return Ok((table, caption));
        }
    }

    Err(ParseError::TableNotFound { keywords })
}

fn header_texts(row: ElementRef) -> Vec<String> {
    let mut cells: Vec<ElementRef> = row.select(&SELECTOR_TH).collect();
    if cells.is_empty() {
        cells = row.select(&SELECTOR_CELL).collect();
    }
    cells
        .into_iter()
        .map(|c| normalize_whitespace(&elem_text(c)).to_lowercase())
        .collect()
}

/// Reads the header row of `table` and extracts one record per data row.
///
/// Returns the lowercased headers, the inferred [`HeaderMap`] and the records.
pub fn parse_gdp_table(
    table: ElementRef,
    options: &ExtractOptions,
) -> (Vec<String>, HeaderMap, Vec<GdpRecord>) {
    log::info!("Parsing GDP table...");

    let mut rows = table.select(&SELECTOR_TR);

    let headers = rows.next().map(header_texts).unwrap_or_default();
    log::debug!("Detected headers: {:?}", headers);

    let header_map = HeaderMap::from_headers(&headers, options.gdp_match);
    log::info!(
        "Detected rank column: {:?}, country column: {}, GDP column: {}",
        header_map.rank,
        header_map.country,
        header_map.gdp
    );

    // A two-column header lowers the threshold; a title row spanning the table does not.
    let min_cells = match headers.len() {
        0 | 1 => MIN_ROW_CELLS,
        n => n.min(MIN_ROW_CELLS),
    };

    let mut records = Vec::new();

    for (row_number, row) in rows.enumerate().map(|(i, r)| (i + 1, r)) {
        let cells: Vec<String> = row.select(&SELECTOR_CELL).map(cell_text).collect();

        if cells.len() < min_cells {
            log::debug!(
                "Skipping row {}: {} cell(s), need {}",
                row_number,
                cells.len(),
                min_cells
            );
            continue;
        }

        let country = cells
            .get(header_map.country)
            .map(|c| clean_country(c))
            .unwrap_or_default();
        if country.is_empty() {
            log::debug!("Skipping row {}: empty country", row_number);
            continue;
        }

        let gdp_usd_million = cells.get(header_map.gdp).and_then(|c| clean_number(c));
        if gdp_usd_million.is_none() {
            log::debug!("Row {} ({}): GDP value missing", row_number, country);
        }

        let ordinal = u32::try_from(records.len() + 1).ok();
        let rank = match (options.rank_policy, header_map.rank) {
            (RankPolicy::Column, Some(idx)) => cells
                .get(idx)
                .and_then(|c| clean_number(c))
                .and_then(|r| u32::try_from(r).ok()),
            _ => ordinal,
        };

        records.push(GdpRecord {
            rank,
            country,
            gdp_usd_million,
        });
    }

    log::info!("Parsed {} rows.", records.len());

    for record in records.iter().take(10) {
        log::debug!("{:?}", record);
    }

    (headers, header_map, records)
}

/// Parses `html`, locates the GDP table by caption and extracts its records.
pub fn parse_gdp_page(html: &str, options: &ExtractOptions) -> Result<GdpTable, ParseError> {
    let document = Html::parse_document(html);
    let (table, caption) = find_table_by_caption(&document, options.keywords.as_slice())?;
    let (headers, header_map, records) = parse_gdp_table(table, options);

    Ok(GdpTable {
        source_url: None,
        caption,
        headers,
        header_map,
        fetched_at: None,
        records,
    })
}
