//! Payment Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payment method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    Check,
    CreditCard,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Check => "check",
            Self::CreditCard => "credit_card",
        }
    }
}

/// Payment against a single sale
///
/// Several partial payments may target the same sale. Payments are
/// soft-deleted: an archived payment keeps its row but never counts
/// toward paid or outstanding totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub client_id: String,
    /// Shared by every slice of one bulk payment
    pub bulk_payment_id: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub check_number: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    /// Unix millis
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Payment {
    /// Not soft-deleted
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Record payment payload (client is derived from the sale)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub sale_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub check_number: Option<String>,
}

/// Bulk payment payload, spread over a client's open sales
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPaymentDraft {
    pub client_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub check_number: Option<String>,
}

/// Update payment payload
///
/// A new `sale_id` moves the payment to that sale (and its client).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub sale_id: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub check_number: Option<String>,
}
