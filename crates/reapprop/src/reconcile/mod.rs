//! Finding enacted budget items that the executive budget fails to reappropriate.

mod matching;

use std::path::PathBuf;

use crate::Result;
use crate::model::{BudgetRecord, Discrepancy, Document};
use crate::{ReadOptions, read_records};

pub struct ReconcileConfig {
    enacted_path: PathBuf,
    executive_path: PathBuf,
    options: ReadOptions,
}

/// Records extracted from both documents.
#[derive(Debug, Default)]
pub struct ReconcileState {
    pub enacted: Vec<BudgetRecord>,
    pub executive: Vec<BudgetRecord>,
}

impl ReconcileConfig {
    pub fn new(enacted_path: PathBuf, executive_path: PathBuf, options: ReadOptions) -> Self {
        ReconcileConfig {
            enacted_path,
            executive_path,
            options,
        }
    }

    /// Extract records from both documents. Fails if either PDF is missing or unreadable.
    pub fn read(&self) -> Result<ReconcileState> {
        let enacted = read_records(&self.enacted_path, Document::Enacted, &self.options)?;
        let executive = read_records(&self.executive_path, Document::Executive, &self.options)?;
        Ok(ReconcileState { enacted, executive })
    }
}

impl ReconcileState {
    /// Every enacted record without a matching executive reappropriation, in enacted order.
    pub fn reconcile(&self) -> Vec<Discrepancy> {
        reconcile(&self.enacted, &self.executive)
    }
}

fn reconcile(enacted: &[BudgetRecord], executive: &[BudgetRecord]) -> Vec<Discrepancy> {
    let keys = matching::carry_forward_keys(executive);
    tracing::info!(
        "Executive budget has {} distinct reappropriation keys",
        keys.len()
    );

    // every entry kind is expected to reappear as a reappropriation
    let discrepancies: Vec<_> = enacted
        .iter()
        .filter(|record| !matching::is_carried_forward(record, &keys))
        .cloned()
        .map(Discrepancy::new)
        .collect();
    tracing::info!("Found {} missing reappropriations", discrepancies.len());

    discrepancies
}
