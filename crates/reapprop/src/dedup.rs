use std::collections::HashSet;

use crate::Decimal;
use crate::model::{AppropriationId, BudgetRecord, BudgetType, EntryKind};

type Identity = (u32, String, AppropriationId, EntryKind, Decimal, String, BudgetType);

/// Drop records that are exact repeats of an earlier one, keeping document order.
///
/// PDFs that fake bold text by drawing it twice extract the same line twice on a page.
pub fn dedup_records(records: &mut Vec<BudgetRecord>) {
    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(identity(record)));
}

// Two records are the same line item read twice
fn identity(record: &BudgetRecord) -> Identity {
    (
        record.page,
        record.source_text.clone(),
        record.appropriation_id,
        record.entry_kind,
        record.amount,
        record.agency.clone(),
        record.budget_type,
    )
}
