//! Invoice Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::payment::PaymentMethod;

/// Invoice grouping one or more sales of a single client
///
/// An invoice carries no payments of its own; its paid state is inherited
/// from the payments recorded against its sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// Human-facing number, e.g. `INV-123456-042`
    pub invoice_number: String,
    pub client_id: String,
    /// Member sales (kept in sync with `Sale::invoice_id`)
    #[serde(default)]
    pub sales_ids: Vec<String>,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    /// sum(sale.total_ht) over member sales
    pub total_ht: f64,
    pub total_ttc: f64,
    pub tax_rate: f64,
    #[serde(default)]
    pub is_paid: bool,
    /// Unix millis of the last unpaid -> paid transition
    pub paid_at: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

impl Invoice {
    /// Not soft-deleted
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Due date strictly before `today`
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.due_date < today
    }
}

/// Create invoice payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub client_id: String,
    pub sales_ids: Vec<String>,
    pub date: NaiveDate,
    /// Defaults to `date` + configured due days
    pub due_date: Option<NaiveDate>,
    /// Defaults to the configured rate
    pub tax_rate: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
}

/// Invoice list filter (all bounds inclusive)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub client_id: Option<String>,
    pub is_paid: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        if let Some(client_id) = &self.client_id
            && &invoice.client_id != client_id
        {
            return false;
        }
        if let Some(is_paid) = self.is_paid
            && invoice.is_paid != is_paid
        {
            return false;
        }
        if let Some(start) = self.start_date
            && invoice.date < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && invoice.date > end
        {
            return false;
        }
        true
    }
}
