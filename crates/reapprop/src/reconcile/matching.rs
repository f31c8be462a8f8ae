use std::collections::BTreeSet;

use crate::model::{BudgetRecord, EntryKind, MatchKey};

/// Keys of every executive reappropriation. Executive appropriations never carry an enacted
/// item forward.
pub fn carry_forward_keys(executive: &[BudgetRecord]) -> BTreeSet<MatchKey<'_>> {
    executive
        .iter()
        .filter(|record| record.entry_kind == EntryKind::Reappropriation)
        .map(BudgetRecord::match_key)
        .collect()
}

/// Whether the executive budget reappropriates `enacted`.
///
/// Exact on the composite key, no normalization beyond what the parser did. Amount and year
/// may differ.
pub fn is_carried_forward(enacted: &BudgetRecord, keys: &BTreeSet<MatchKey<'_>>) -> bool {
    keys.contains(&enacted.match_key())
}
