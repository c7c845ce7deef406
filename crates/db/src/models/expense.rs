use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A project ledger row: an expense or an income entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub entry: LedgerEntry,
    pub amount: f64,
    pub category: String,
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntry {
    Expense,
    Income,
}

impl Expense {
    pub const COLLECTION: &'static str = "expenses";
}
