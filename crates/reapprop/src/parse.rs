//! Pattern-based extraction of budget records from page text.
//!
//! Budget documents are laid out as agency headings, budget-type headings and line items such
//! as `(15503) ........ 1,000,000` or, for carried-forward items,
//! `(15503) ... 1,000,000 ........ (re. $796,000)`. The parser walks the lines in order,
//! carrying the current agency, budget type and section forward, and turns every line with
//! an appropriation id and an amount into a [`BudgetRecord`]. Lines that don't fit are skipped.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::Decimal;
use crate::extract::{PageLine, PageText, page_lines};
use crate::model::{AppropriationId, BudgetRecord, BudgetType, Document, EntryKind};
use crate::year::YearResolver;

const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?";

// upper case only, running text mentions these phrases in lower case
static BUDGET_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(STATE\s+OPERATIONS|AID\s+TO\s+LOCALITIES|CAPITAL\s+PROJECTS)\b").unwrap()
});
static AGENCY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z &,.'\-]{8,}[A-Z.]$").unwrap());
static INLINE_AGENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(department|office|division|authority|commission|council|board|agency|university|court|corporation)\b",
    )
    .unwrap()
});
static REAPPROPRIATIONS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bREAPPROPRIATIONS\b").unwrap());
static APPROPRIATIONS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bAPPROPRIATIONS\b").unwrap());

static PAREN_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d{5})\)").unwrap());
static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\d$,])(\d{5})(?:$|[^\d,.]|\.(?:\D|$))").unwrap());

static REAPPROPRIATION_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\bre\.\s*\$\s*|\breapprop\.\s*\$?\s*|\breappropriations?(?::\s*\$?|\s+\$)\s*)({AMOUNT})"
    ))
    .unwrap()
});
static REAPPROPRIATION_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bre-?appropriat|\breapprop\b|\bre\.").unwrap());
// amount directly behind the id, separated only by leader dots
static LEADER_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^[\s.…]*\$?\s*({AMOUNT})\b")).unwrap());
static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\$\s*({AMOUNT})|\b(\d{{1,3}}(?:,\d{{3}})+(?:\.\d{{2}})?)\b"
    ))
    .unwrap()
});

const AGENCY_EXCLUSIONS: &[&str] = &[
    "APPROPRIATIONS",
    "BUDGET",
    "SCHEDULE",
    "GENERAL FUND",
    "SPECIAL REVENUE",
    "PROGRAM",
    "TOTAL",
    "SUMMARY",
    "CONTINUED",
];

const UNKNOWN_AGENCY: &str = "N/A";

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// How many preceding lines on the same page may supply a missing appropriation id.
    pub context_window: usize,
    /// Upper-case words that disqualify a line from being an agency heading, on top of the
    /// built-in list.
    pub agency_exclusions: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            context_window: 2,
            agency_exclusions: Vec::new(),
        }
    }
}

/// Extract every appropriation and reappropriation record from a document's pages.
pub fn parse_records(
    pages: &[PageText],
    source: Document,
    years: &YearResolver,
    options: &ParseOptions,
) -> Vec<BudgetRecord> {
    let mut parser = RecordParser::new(source, years, options);
    for line in page_lines(pages) {
        parser.line(line);
    }
    parser.records
}

struct RecordParser<'a> {
    source: Document,
    years: &'a YearResolver,
    options: &'a ParseOptions,

    agency: Option<String>,
    page: u32,
    // no budget-type heading or record seen on the current page yet
    in_page_header: bool,
    budget_type: Option<BudgetType>,
    section: EntryKind,
    context_year: Option<i32>,
    window: VecDeque<PageLine<'a>>,

    records: Vec<BudgetRecord>,
}

impl<'a> RecordParser<'a> {
    fn new(source: Document, years: &'a YearResolver, options: &'a ParseOptions) -> Self {
        RecordParser {
            source,
            years,
            options,
            agency: None,
            page: 0,
            in_page_header: true,
            budget_type: None,
            section: EntryKind::Appropriation,
            context_year: None,
            window: VecDeque::with_capacity(options.context_window),
            records: Vec::new(),
        }
    }

    fn line(&mut self, line: PageLine<'a>) {
        if line.page != self.page {
            self.page = line.page;
            self.in_page_header = true;
            self.window.clear();
        }

        self.update_headings(line.text);

        match self.record(&line) {
            Some(record) => {
                self.in_page_header = false;
                self.records.push(record);
            }
            None => {
                if let Some(year) = self.years.year_in(line.text) {
                    self.context_year = Some(year);
                }
            }
        }

        if self.options.context_window > 0 {
            if self.window.len() == self.options.context_window {
                self.window.pop_front();
            }
            self.window.push_back(line);
        }
    }

    fn update_headings(&mut self, text: &str) {
        if self.is_agency_heading(text) {
            self.agency = Some(collapse_whitespace(text));
        }

        if let Some((budget_type, agency)) = budget_type_heading(text) {
            self.budget_type = Some(budget_type);
            if let Some(agency) = agency {
                self.agency = Some(agency);
            }
            self.in_page_header = false;

            self.section = if REAPPROPRIATIONS_HEADING.is_match(text) {
                EntryKind::Reappropriation
            } else {
                EntryKind::Appropriation
            };
        } else if REAPPROPRIATIONS_HEADING.is_match(text) {
            self.section = EntryKind::Reappropriation;
        } else if APPROPRIATIONS_HEADING.is_match(text) {
            self.section = EntryKind::Appropriation;
        }
    }

    fn is_agency_heading(&self, text: &str) -> bool {
        if !AGENCY_HEADER.is_match(text) || BUDGET_TYPE.is_match(text) {
            return false;
        }
        // below the running header only a line naming an agency switches it
        if !self.in_page_header && !INLINE_AGENCY.is_match(text) {
            return false;
        }
        let excluded = AGENCY_EXCLUSIONS.iter().any(|word| text.contains(word))
            || self
                .options
                .agency_exclusions
                .iter()
                .any(|word| text.contains(word.as_str()));
        !excluded
    }

    fn record(&self, line: &PageLine<'a>) -> Option<BudgetRecord> {
        let budget_type = self.budget_type?;
        let text = line.text;

        let (appropriation_id, amount, entry_kind) =
            if let Some(captures) = REAPPROPRIATION_AMOUNT.captures(text) {
                let amount = parse_amount(captures.get(1)?.as_str())?;
                let id = id_outside_marker(text).or_else(|| self.id_from_window())?;
                (id, amount, EntryKind::Reappropriation)
            } else {
                let (id, id_end) = find_id(text)?;
                let amount = amount_after(&text[id_end..])?;
                let kind = if REAPPROPRIATION_KEYWORD.is_match(text) {
                    EntryKind::Reappropriation
                } else {
                    self.section
                };
                (id, amount, kind)
            };

        Some(BudgetRecord {
            agency: self
                .agency
                .clone()
                .unwrap_or_else(|| UNKNOWN_AGENCY.to_owned()),
            budget_type,
            appropriation_id,
            amount,
            entry_kind,
            year: self.years.resolve(text, self.context_year),
            source_text: text.to_owned(),
            page: line.page,
            source: self.source,
        })
    }

    fn id_from_window(&self) -> Option<AppropriationId> {
        self.window
            .iter()
            .rev()
            .find_map(|line| id_outside_marker(line.text))
    }
}

/// A budget-type heading: the keyword opens the line, which carries no id, or it follows an
/// agency name as in `Education Department ... STATE OPERATIONS ...`.
fn budget_type_heading(text: &str) -> Option<(BudgetType, Option<String>)> {
    let found = BUDGET_TYPE.find(text)?;
    let budget_type = budget_type_from_keyword(found.as_str())?;

    let prefix = text[..found.start()].trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | ':' | '-' | '–' | '—')
    });
    if prefix.is_empty() {
        return find_id(text).is_none().then_some((budget_type, None));
    }
    is_agency_name(prefix).then(|| (budget_type, Some(collapse_whitespace(prefix))))
}

/// `Education Department`, `Office of Mental Health`, but not a sentence that mentions an office.
fn is_agency_name(text: &str) -> bool {
    INLINE_AGENCY.is_match(text)
        && text.split_whitespace().all(|word| {
            word.starts_with(|c: char| c.is_ascii_uppercase())
                || word.chars().all(|c| !c.is_alphanumeric())
                || matches!(word, "of" | "and" | "for" | "the")
        })
}

// The marker amount itself can look like a bare id (`re. $ 10000`).
fn id_outside_marker(text: &str) -> Option<AppropriationId> {
    let (before, after) = match REAPPROPRIATION_AMOUNT.find(text) {
        Some(marker) => (&text[..marker.start()], &text[marker.end()..]),
        None => (text, ""),
    };
    find_id(before).or_else(|| find_id(after)).map(|(id, _)| id)
}

/// Locate the appropriation id on a line, preferring the parenthesised form.
///
/// Returns the id and the byte offset just past it.
fn find_id(text: &str) -> Option<(AppropriationId, usize)> {
    let (id, end) = match PAREN_ID.captures(text) {
        Some(captures) => (captures.get(1)?.as_str(), captures.get(0)?.end()),
        None => {
            let id = BARE_ID.captures(text)?.get(1)?;
            (id.as_str(), id.end())
        }
    };
    Some((AppropriationId::from_str(id).ok()?, end))
}

fn amount_after(rest: &str) -> Option<Decimal> {
    if let Some(captures) = LEADER_AMOUNT.captures(rest) {
        return parse_amount(captures.get(1)?.as_str());
    }
    let captures = MONEY.captures(rest)?;
    let amount = captures.get(1).or_else(|| captures.get(2))?;
    parse_amount(amount.as_str())
}

/// Parse a printed dollar amount such as `1,000,000` or `2,500.50`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '$') && !c.is_whitespace())
        .collect();
    Decimal::from_str(&digits).ok()
}

fn budget_type_from_keyword(keyword: &str) -> Option<BudgetType> {
    let normalized = collapse_whitespace(keyword).to_uppercase();
    BudgetType::ALL
        .into_iter()
        .find(|budget_type| budget_type.keyword() == normalized)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::year::DEFAULT_YEAR_RANGE;

    fn parse(document: Document, text: &str) -> Vec<BudgetRecord> {
        let years = YearResolver::new(2025, DEFAULT_YEAR_RANGE);
        let pages: Vec<_> = text
            .split('\u{c}')
            .enumerate()
            .map(|(i, page)| PageText::new(i as u32 + 1, page))
            .collect();
        parse_records(&pages, document, &years, &ParseOptions::default())
    }

    fn format_records(records: &[BudgetRecord]) -> String {
        records
            .iter()
            .map(|r| {
                format!(
                    "p{} {} | {} | {} | {} | {} | {}\n",
                    r.page,
                    r.agency,
                    r.budget_type,
                    r.appropriation_id,
                    r.entry_kind,
                    r.amount,
                    r.year
                )
            })
            .collect()
    }

    #[test]
    fn appropriations_under_agency_heading() {
        let records = parse(
            Document::Enacted,
            "
DEPARTMENT OF EDUCATION
STATE OPERATIONS 2025-26
For services and expenses of the office of higher education.
Personal service--regular (50100) ........ 1,000,000
Supplies and materials (57000) ............... 250,500
Travel (54000) ...................................... 75
",
        );
        insta::assert_snapshot!(format_records(&records), @r"
        p1 DEPARTMENT OF EDUCATION | STATE OPERATIONS | 50100 | appropriation | 1000000 | 2025
        p1 DEPARTMENT OF EDUCATION | STATE OPERATIONS | 57000 | appropriation | 250500 | 2025
        p1 DEPARTMENT OF EDUCATION | STATE OPERATIONS | 54000 | appropriation | 75 | 2025
        ");
    }

    #[test]
    fn reappropriation_marker_takes_the_carried_amount() {
        let records = parse(
            Document::Executive,
            "
HIGHER EDUCATION SERVICES CORPORATION
AID TO LOCALITIES - REAPPROPRIATIONS 2026-27
By chapter 53, section 1, of the laws of 2023
26 (302198C1) (15503) ... 1,000,000 .................... (re. $796,000)
",
        );
        insta::assert_snapshot!(format_records(&records), @r"
        p1 HIGHER EDUCATION SERVICES CORPORATION | AID TO LOCALITIES | 15503 | reappropriation | 796000 | 2023
        ");
    }

    #[test]
    fn reappropriation_id_from_preceding_line() {
        let records = parse(
            Document::Executive,
            "
OFFICE OF MENTAL HEALTH
CAPITAL PROJECTS - REAPPROPRIATIONS
Design and construction (25401) ... 4,000,000
for the purposes thereof ......... (re. $3,250,000.50)
",
        );
        // the id line itself is an item inside a reappropriation section
        insta::assert_snapshot!(format_records(&records), @r"
        p1 OFFICE OF MENTAL HEALTH | CAPITAL PROJECTS | 25401 | reappropriation | 4000000 | 2024
        p1 OFFICE OF MENTAL HEALTH | CAPITAL PROJECTS | 25401 | reappropriation | 3250000.50 | 2024
        ");
    }

    #[test]
    fn reappropriations_heading_with_year_is_not_a_marker() {
        let records = parse(
            Document::Executive,
            "
DEPARTMENT OF HEALTH
STATE OPERATIONS
(10001) ... 100
STATE OPERATIONS - REAPPROPRIATIONS 2026-27
",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_kind, EntryKind::Appropriation);
    }

    #[test]
    fn lowercase_budget_type_in_prose_is_not_a_heading() {
        let records = parse(
            Document::Executive,
            "
DEPARTMENT OF HEALTH
STATE OPERATIONS - REAPPROPRIATIONS 2026-27
Notwithstanding any law, the office may transfer funds to aid to localities
(10001) ... 1,000,000 ... (re. $900,000)
(10002) ... 500,000
The office may transfer to AID TO LOCALITIES as needed
(10003) ... 200,000
",
        );
        insta::assert_snapshot!(format_records(&records), @r"
        p1 DEPARTMENT OF HEALTH | STATE OPERATIONS | 10001 | reappropriation | 900000 | 2026
        p1 DEPARTMENT OF HEALTH | STATE OPERATIONS | 10002 | reappropriation | 500000 | 2026
        p1 DEPARTMENT OF HEALTH | STATE OPERATIONS | 10003 | reappropriation | 200000 | 2026
        ");
    }

    #[test]
    fn budget_type_line_with_id_is_an_item() {
        let records = parse(
            Document::Enacted,
            "
DEPARTMENT OF HEALTH
AID TO LOCALITIES
STATE OPERATIONS offset (10001) ... 1,000
",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].budget_type, BudgetType::AidToLocalities);
    }

    #[test]
    fn marker_amount_is_not_an_id() {
        let records = parse(
            Document::Executive,
            "
DEPARTMENT OF HEALTH
STATE OPERATIONS - REAPPROPRIATIONS
Personal service (25401) ... 40,000
for the purposes thereof ......... (re. $ 10000)
",
        );
        let last = records.last().unwrap();
        assert_eq!(last.appropriation_id.as_str(), "25401");
        assert_eq!(last.amount, Decimal::from(10_000));
        assert_eq!(last.entry_kind, EntryKind::Reappropriation);
    }

    #[test]
    fn object_subheadings_do_not_replace_agency() {
        let records = parse(
            Document::Executive,
            "
DEPARTMENT OF HEALTH
STATE OPERATIONS - REAPPROPRIATIONS
PERSONAL SERVICE
(25401) ... 40,000 ... (re. $10,000)
NONPERSONAL SERVICE
(25402) ... 900 ... (re. $500)
MAINTENANCE UNDISTRIBUTED
(25403) ... 700 ... (re. $600)
OFFICE OF MENTAL HEALTH
(25404) ... 800 ... (re. $700)
\u{c}HIGHER EDUCATION SERVICES
CAPITAL PROJECTS
(25405) ... 100
",
        );
        insta::assert_snapshot!(format_records(&records), @r"
        p1 DEPARTMENT OF HEALTH | STATE OPERATIONS | 25401 | reappropriation | 10000 | 2024
        p1 DEPARTMENT OF HEALTH | STATE OPERATIONS | 25402 | reappropriation | 500 | 2024
        p1 DEPARTMENT OF HEALTH | STATE OPERATIONS | 25403 | reappropriation | 600 | 2024
        p1 OFFICE OF MENTAL HEALTH | STATE OPERATIONS | 25404 | reappropriation | 700 | 2024
        p2 HIGHER EDUCATION SERVICES | CAPITAL PROJECTS | 25405 | appropriation | 100 | 2024
        ");
    }

    #[test]
    fn window_does_not_cross_pages() {
        let records = parse(
            Document::Executive,
            "OFFICE OF MENTAL HEALTH\nCAPITAL PROJECTS\n(25401) ... 4,000,000\u{c}continued ... (re. $10,000)",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_kind, EntryKind::Appropriation);
    }

    #[test]
    fn inline_agency_and_keyword() {
        let records = parse(
            Document::Enacted,
            "Education Department ... STATE OPERATIONS ... 12345 ... $1,000,000 appropriation",
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.agency, "Education Department");
        assert_eq!(record.budget_type, BudgetType::StateOperations);
        assert_eq!(record.appropriation_id.as_str(), "12345");
        assert_eq!(record.amount, Decimal::from(1_000_000));
        assert_eq!(record.entry_kind, EntryKind::Appropriation);
        assert_eq!(record.year, 2024);
        assert_eq!(record.page, 1);
        assert_eq!(record.source, Document::Enacted);
    }

    #[test]
    fn reappropriation_keywords_and_abbreviations() {
        let records = parse(
            Document::Executive,
            "
DIVISION OF STATE POLICE
STATE OPERATIONS
Contractual services (51000) ... 500,000 reappropriation
Equipment (52000) reappropriation: $20,000
Vehicles (53000) reapprop. 30,000
",
        );
        insta::assert_snapshot!(format_records(&records), @r"
        p1 DIVISION OF STATE POLICE | STATE OPERATIONS | 51000 | reappropriation | 500000 | 2024
        p1 DIVISION OF STATE POLICE | STATE OPERATIONS | 52000 | reappropriation | 20000 | 2024
        p1 DIVISION OF STATE POLICE | STATE OPERATIONS | 53000 | reappropriation | 30000 | 2024
        ");
    }

    #[test]
    fn section_headings_switch_entry_kind() {
        let records = parse(
            Document::Executive,
            "
DEPARTMENT OF HEALTH
AID TO LOCALITIES
(10001) ... 100
REAPPROPRIATIONS
(10002) ... 200
APPROPRIATIONS
(10003) ... 300
",
        );
        let kinds: Vec<_> = records.iter().map(|r| r.entry_kind).collect();
        assert_eq!(
            kinds,
            [
                EntryKind::Appropriation,
                EntryKind::Reappropriation,
                EntryKind::Appropriation
            ]
        );
    }

    #[test]
    fn skips_lines_without_budget_type_id_or_amount() {
        let records = parse(
            Document::Enacted,
            "
DEPARTMENT OF LABOR
(11111) ... 1,000
STATE OPERATIONS
Personal service (22222)
Room 12345, Albany
Nonpersonal service ... 4,000
(33333) ... 5,000
",
        );
        let ids: Vec<_> = records.iter().map(|r| r.appropriation_id.as_str()).collect();
        assert_eq!(ids, ["33333"]);
    }

    #[test]
    fn excluded_headings_do_not_replace_agency() {
        let records = parse(
            Document::Enacted,
            "
DEPARTMENT OF TRANSPORTATION
STATE OPERATIONS
SPECIAL REVENUE FUNDS - FEDERAL
ADMINISTRATION PROGRAM
(44444) ... 1,000
",
        );
        assert_eq!(records[0].agency, "DEPARTMENT OF TRANSPORTATION");
    }

    #[test]
    fn records_before_any_agency_use_placeholder() {
        let records = parse(Document::Enacted, "CAPITAL PROJECTS\n(55555) ... 9,000");
        assert_eq!(records[0].agency, "N/A");
        assert_eq!(records[0].budget_type, BudgetType::CapitalProjects);
    }

    #[test]
    fn parsed_records_hold_invariants() {
        let records = parse(
            Document::Enacted,
            "
DEPARTMENT OF EDUCATION
STATE OPERATIONS
(12345) ... 1,000 (123456) 99999 $5
AID TO LOCALITIES
(54321) ... $2,000.25 (re. $1,500)
",
        );
        assert!(!records.is_empty());
        for record in &records {
            assert_eq!(record.appropriation_id.as_str().len(), 5);
            assert!(
                record
                    .appropriation_id
                    .as_str()
                    .bytes()
                    .all(|b| b.is_ascii_digit())
            );
            assert!(BudgetType::ALL.contains(&record.budget_type));
        }
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount("1,000,000"), Some(Decimal::from(1_000_000)));
        assert_eq!(parse_amount("$ 2,500.50"), Decimal::from_str("2500.50").ok());
        assert_eq!(parse_amount("abc"), None);
    }
}
