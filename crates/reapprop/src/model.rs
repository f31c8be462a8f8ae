use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::Decimal;

/// Which of the two budget documents a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Document {
    Enacted,
    Executive,
}

impl Document {
    pub fn name(self) -> &'static str {
        match self {
            Document::Enacted => "enacted",
            Document::Executive => "executive",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BudgetType {
    #[serde(rename = "STATE OPERATIONS")]
    StateOperations,
    #[serde(rename = "AID TO LOCALITIES")]
    AidToLocalities,
    #[serde(rename = "CAPITAL PROJECTS")]
    CapitalProjects,
}

impl BudgetType {
    pub const ALL: [BudgetType; 3] = [
        BudgetType::StateOperations,
        BudgetType::AidToLocalities,
        BudgetType::CapitalProjects,
    ];

    /// The heading as printed in budget documents.
    pub fn keyword(self) -> &'static str {
        match self {
            BudgetType::StateOperations => "STATE OPERATIONS",
            BudgetType::AidToLocalities => "AID TO LOCALITIES",
            BudgetType::CapitalProjects => "CAPITAL PROJECTS",
        }
    }
}

impl fmt::Display for BudgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Appropriation,
    Reappropriation,
}

impl EntryKind {
    pub fn name(self) -> &'static str {
        match self {
            EntryKind::Appropriation => "appropriation",
            EntryKind::Reappropriation => "reappropriation",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Five-digit appropriation identifier.
///
/// Not unique across agencies, so matching always pairs it with the agency and budget type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppropriationId([u8; 5]);

impl AppropriationId {
    pub fn as_str(&self) -> &str {
        // only ever constructed from ASCII digits
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for AppropriationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 5] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("appropriation id must be 5 digits: {s:?}"))?;
        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(format!("appropriation id must be 5 digits: {s:?}"));
        }
        Ok(AppropriationId(bytes))
    }
}

impl fmt::Display for AppropriationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppropriationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single appropriation or reappropriation line item read from a budget document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRecord {
    pub agency: String,
    pub budget_type: BudgetType,
    pub appropriation_id: AppropriationId,
    pub amount: Decimal,
    pub entry_kind: EntryKind,
    pub year: i32,
    pub source_text: String,
    pub page: u32,
    pub source: Document,
}

impl BudgetRecord {
    pub fn match_key(&self) -> MatchKey<'_> {
        MatchKey {
            appropriation_id: self.appropriation_id,
            agency: &self.agency,
            budget_type: self.budget_type,
        }
    }
}

/// Composite key that enacted and executive records must share to count as carried forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchKey<'a> {
    pub appropriation_id: AppropriationId,
    pub agency: &'a str,
    pub budget_type: BudgetType,
}

/// An enacted record with no matching reappropriation in the executive budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub record: BudgetRecord,
    pub description: String,
}

impl Discrepancy {
    pub fn new(record: BudgetRecord) -> Self {
        let description = format!(
            "Enacted {} should appear as reappropriation in executive budget",
            record.entry_kind
        );
        Discrepancy {
            record,
            description,
        }
    }
}
