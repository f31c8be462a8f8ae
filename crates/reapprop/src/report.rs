//! Summary statistics and file output for a reconcile run.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::model::{AppropriationId, BudgetRecord, BudgetType, Discrepancy, Document, EntryKind};
use crate::{Decimal, Result};

pub const DISCREPANCIES_FILE: &str = "budget_discrepancies.csv";
pub const SUMMARY_FILE: &str = "analysis_summary.json";

pub fn records_file(document: Document) -> &'static str {
    match document {
        Document::Enacted => "enacted_budget_data.csv",
        Document::Executive => "executive_budget_data.csv",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl Tally {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.amount += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgencyTotal {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub from_appropriations: usize,
    pub from_reappropriations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_discrepancies: usize,
    pub from_enacted_appropriations: usize,
    pub from_enacted_reappropriations: usize,
    pub agencies_affected: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount_missing: Decimal,
    pub by_enacted_type: BTreeMap<EntryKind, Tally>,
    pub by_year: BTreeMap<i32, Tally>,
    pub agency_totals: BTreeMap<String, AgencyTotal>,
}

impl Summary {
    pub fn new(discrepancies: &[Discrepancy]) -> Self {
        let mut summary = Summary {
            total_discrepancies: discrepancies.len(),
            ..Summary::default()
        };

        for Discrepancy { record, .. } in discrepancies {
            summary.total_amount_missing += record.amount;
            summary
                .by_enacted_type
                .entry(record.entry_kind)
                .or_default()
                .add(record.amount);
            summary
                .by_year
                .entry(record.year)
                .or_default()
                .add(record.amount);

            let agency = summary
                .agency_totals
                .entry(record.agency.clone())
                .or_default();
            agency.count += 1;
            agency.amount += record.amount;
            match record.entry_kind {
                EntryKind::Appropriation => {
                    agency.from_appropriations += 1;
                    summary.from_enacted_appropriations += 1;
                }
                EntryKind::Reappropriation => {
                    agency.from_reappropriations += 1;
                    summary.from_enacted_reappropriations += 1;
                }
            }
        }
        summary.agencies_affected = summary.agency_totals.len();

        summary
    }
}

/// The `n` largest discrepancies by amount. Ties keep enacted order.
pub fn largest(discrepancies: &[Discrepancy], n: usize) -> Vec<&Discrepancy> {
    let mut sorted: Vec<_> = discrepancies.iter().collect();
    sorted.sort_by(|a, b| b.record.amount.cmp(&a.record.amount));
    sorted.truncate(n);
    sorted
}

#[derive(Serialize)]
struct DiscrepancyRow<'a> {
    agency: &'a str,
    budget_type: BudgetType,
    appropriation_id: AppropriationId,
    enacted_amount: Decimal,
    enacted_type: EntryKind,
    text: &'a str,
    page: u32,
    description: &'a str,
    year: i32,
}

const DISCREPANCY_HEADERS: [&str; 9] = [
    "agency",
    "budget_type",
    "appropriation_id",
    "enacted_amount",
    "enacted_type",
    "text",
    "page",
    "description",
    "year",
];

#[derive(Serialize)]
struct RecordRow<'a> {
    #[serde(rename = "type")]
    entry_kind: EntryKind,
    agency: &'a str,
    budget_type: BudgetType,
    appropriation_id: AppropriationId,
    amount: Decimal,
    text: &'a str,
    page: u32,
    source: Document,
    year: i32,
}

const RECORD_HEADERS: [&str; 9] = [
    "type",
    "agency",
    "budget_type",
    "appropriation_id",
    "amount",
    "text",
    "page",
    "source",
    "year",
];

pub fn write_discrepancies_csv(writer: impl Write, discrepancies: &[Discrepancy]) -> Result<()> {
    let rows = discrepancies.iter().map(|discrepancy| {
        let record = &discrepancy.record;
        DiscrepancyRow {
            agency: &record.agency,
            budget_type: record.budget_type,
            appropriation_id: record.appropriation_id,
            enacted_amount: record.amount,
            enacted_type: record.entry_kind,
            text: &record.source_text,
            page: record.page,
            description: &discrepancy.description,
            year: record.year,
        }
    });
    write_csv(writer, &DISCREPANCY_HEADERS, rows)
}

pub fn write_records_csv(writer: impl Write, records: &[BudgetRecord]) -> Result<()> {
    let rows = records.iter().map(|record| RecordRow {
        entry_kind: record.entry_kind,
        agency: &record.agency,
        budget_type: record.budget_type,
        appropriation_id: record.appropriation_id,
        amount: record.amount,
        text: &record.source_text,
        page: record.page,
        source: record.source,
        year: record.year,
    });
    write_csv(writer, &RECORD_HEADERS, rows)
}

// header row is written even when there are no rows
fn write_csv<T: Serialize>(
    writer: impl Write,
    headers: &[&str],
    rows: impl Iterator<Item = T>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_json(mut writer: impl Write, summary: &Summary) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Paths of the files written by [`write_outputs`].
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub discrepancies: PathBuf,
    pub enacted: PathBuf,
    pub executive: PathBuf,
    pub summary: PathBuf,
}

/// Write the discrepancy table, both raw extractions and the JSON summary into `dir`.
pub fn write_outputs(
    dir: &Path,
    enacted: &[BudgetRecord],
    executive: &[BudgetRecord],
    discrepancies: &[Discrepancy],
    summary: &Summary,
) -> Result<OutputFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let files = OutputFiles {
        discrepancies: dir.join(DISCREPANCIES_FILE),
        enacted: dir.join(records_file(Document::Enacted)),
        executive: dir.join(records_file(Document::Executive)),
        summary: dir.join(SUMMARY_FILE),
    };

    write_file(&files.enacted, |w| write_records_csv(w, enacted))?;
    write_file(&files.executive, |w| write_records_csv(w, executive))?;
    write_file(&files.discrepancies, |w| {
        write_discrepancies_csv(w, discrepancies)
    })?;
    write_file(&files.summary, |w| write_summary_json(w, summary))?;

    Ok(files)
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
