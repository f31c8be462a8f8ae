//! Best-effort inference of the year an appropriation originated in.

use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;

use crate::extract::PageText;

// Ordered by how specific the phrase is. A chapter citation names the originating year directly.
static YEAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)of\s+the\s+laws\s+of\s+(\d{4})\b",
        r"(?i)\bApril\s+1,\s*(\d{4})\b",
        r"(?i)\bMarch\s+31,\s*(\d{4})\b",
        r"\b(\d{4})-\d{2}\b",
        r"(?i)\byear\s+(\d{4})\b",
        r"(?i)\b(\d{4})\s+school\s+year\b",
        r"(?:^|[^\d,.$])(\d{4})(?:$|[^\d,])",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid year pattern"))
    .collect()
});

pub const DEFAULT_YEAR_RANGE: RangeInclusive<i32> = 1990..=2040;

/// Resolves record years for one document.
#[derive(Debug, Clone)]
pub struct YearResolver {
    plausible: RangeInclusive<i32>,
    cover_year: i32,
}

impl YearResolver {
    pub fn new(cover_year: i32, plausible: RangeInclusive<i32>) -> Self {
        YearResolver {
            plausible,
            cover_year,
        }
    }

    pub fn cover_year(&self) -> i32 {
        self.cover_year
    }

    /// The year used when neither the line nor its context names one.
    pub fn fallback_year(&self) -> i32 {
        self.cover_year - 1
    }

    /// Find the most specific plausible year mentioned in `text`.
    pub fn year_in(&self, text: &str) -> Option<i32> {
        year_in(text, &self.plausible)
    }

    /// Resolve a record's year from its own line, then the carried context year, then the
    /// document's cover year minus one.
    pub fn resolve(&self, line: &str, context_year: Option<i32>) -> i32 {
        self.year_in(line)
            .or(context_year)
            .unwrap_or_else(|| self.fallback_year())
    }
}

fn year_in(text: &str, plausible: &RangeInclusive<i32>) -> Option<i32> {
    YEAR_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(text)
            .filter_map(|captures| captures.get(1)?.as_str().parse::<i32>().ok())
            .find(|year| plausible.contains(year))
    })
}

/// Determine the fiscal year printed on a document's cover.
///
/// Looks at the first page that has text, then at the file name. Falls back to the current
/// calendar year.
pub fn detect_cover_year(
    pages: &[PageText],
    path: &Path,
    plausible: &RangeInclusive<i32>,
) -> i32 {
    let from_cover = pages
        .iter()
        .find(|page| !page.text.trim().is_empty())
        .and_then(|page| year_in(&page.text, plausible));
    if let Some(year) = from_cover {
        return year;
    }

    let from_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| year_in(name, plausible));
    if let Some(year) = from_name {
        return year;
    }

    let year = chrono::Local::now().year();
    tracing::warn!(
        "No cover year found for {}, assuming {year}",
        path.display()
    );
    year
}
