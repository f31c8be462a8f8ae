mod dedup;
pub mod extract;
pub mod model;
pub mod parse;
pub mod reconcile;
pub mod report;
pub mod year;

pub type Decimal = rust_decimal::Decimal;

pub use anyhow::Result;

use std::ops::RangeInclusive;
use std::path::Path;

use model::{BudgetRecord, Document};
use parse::ParseOptions;
use year::YearResolver;

/// Knobs for turning a budget PDF into records.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub parse: ParseOptions,
    /// Years outside this range are never taken from the text.
    pub plausible_years: RangeInclusive<i32>,
    pub enacted_cover_year: Option<i32>,
    pub executive_cover_year: Option<i32>,
    /// Log progress every this many pages, `0` to disable.
    pub progress_interval: u32,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            parse: ParseOptions::default(),
            plausible_years: year::DEFAULT_YEAR_RANGE,
            enacted_cover_year: None,
            executive_cover_year: None,
            progress_interval: 100,
        }
    }
}

impl ReadOptions {
    fn cover_year(&self, document: Document) -> Option<i32> {
        match document {
            Document::Enacted => self.enacted_cover_year,
            Document::Executive => self.executive_cover_year,
        }
    }
}

/// Read all budget records from the given PDF.
pub fn read_records(
    file: impl AsRef<Path>,
    document: Document,
    options: &ReadOptions,
) -> Result<Vec<BudgetRecord>> {
    let file = file.as_ref();
    tracing::info!("Processing {document} budget: {}", file.display());

    let pages = extract::read_pages(file, options.progress_interval)?;
    let cover_year = options.cover_year(document).unwrap_or_else(|| {
        year::detect_cover_year(&pages, file, &options.plausible_years)
    });
    let years = YearResolver::new(cover_year, options.plausible_years.clone());

    let mut records = parse::parse_records(&pages, document, &years, &options.parse);
    dedup::dedup_records(&mut records);

    tracing::info!(
        "Extracted {} records from {document} budget",
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_records_from_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2025 Enacted.pdf");
        let pages: [&[&str]; 1] = [&[
            "DEPARTMENT OF HEALTH",
            "STATE OPERATIONS",
            "Personal service (10001) ... 1,000,000",
            "Personal service (10001) ... 1,000,000",
        ]];
        extract::write_test_pdf(&path, &pages);

        let records = read_records(&path, Document::Enacted, &ReadOptions::default()).unwrap();

        // the repeated line is a double draw, the year falls back to the file name's
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.agency, "DEPARTMENT OF HEALTH");
        assert_eq!(record.appropriation_id.as_str(), "10001");
        assert_eq!(record.amount, Decimal::from(1_000_000));
        assert_eq!(record.year, 2024);
        assert_eq!(record.source, Document::Enacted);
    }
}
