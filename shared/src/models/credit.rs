//! Client Credit Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a credit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    /// Adds to the client's credit
    Credit,
    /// Takes from the client's credit
    Debit,
}

/// What produced a credit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditSource {
    /// Excess of a bulk payment (recorded automatically)
    Payment,
    Refund,
    ManualAdjustment,
    /// Credit spent by the client
    CreditUse,
}

impl CreditSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::ManualAdjustment => "manual_adjustment",
            Self::CreditUse => "credit_use",
        }
    }
}

/// One entry of a client's credit ledger
///
/// Entries are hard-deleted; there is no archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: String,
    pub client_id: String,
    /// Always positive; `kind` gives the direction
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: CreditKind,
    pub source: CreditSource,
    /// Bulk payment id, sale id or other reference
    pub source_id: Option<String>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// Manual credit adjustment or refund payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAdjustment {
    pub client_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: CreditKind,
    /// `Refund` or `ManualAdjustment`
    pub source: CreditSource,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// Spend-credit payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditUse {
    pub client_id: String,
    pub amount: f64,
    pub source_id: Option<String>,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// Update credit entry payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditTransactionUpdate {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Credit position of one client (derived)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCreditStatus {
    /// Overpayment plus credit entries minus debit entries, never negative
    pub available_credit: f64,
    /// Credits recorded from payment excess
    pub pending_credits: f64,
    /// Debits recorded as credit use
    pub used_credits: f64,
    /// Newest first
    pub transactions: Vec<CreditTransaction>,
}
