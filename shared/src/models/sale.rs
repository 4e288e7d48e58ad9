//! Sale Model
//!
//! A sale owns its line items exclusively. It points at no more than one
//! invoice through `invoice_id`; the invoice enumerates its sales in
//! `sales_ids` and both sides are kept in sync by the ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::payment::PaymentMethod;

/// One row of a sale (a coil or batch, priced per ton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub coil_ref: Option<String>,
    /// Thickness in mm
    pub coil_thickness: Option<f64>,
    /// Width in mm
    pub coil_width: Option<f64>,
    pub top_coat_ral: Option<String>,
    pub back_coat_ral: Option<String>,
    /// Weight in tons
    pub coil_weight: Option<f64>,
    /// Quantity (tons)
    pub quantity: f64,
    /// Price per ton, before tax
    pub unit_price: f64,
    /// quantity * unit_price, rounded to 2dp
    pub total_ht: f64,
    /// total_ht with the sale tax applied
    pub total_ttc: f64,
}

/// Line item payload (totals are computed, never supplied)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemDraft {
    pub description: String,
    pub coil_ref: Option<String>,
    pub coil_thickness: Option<f64>,
    pub coil_width: Option<f64>,
    pub top_coat_ral: Option<String>,
    pub back_coat_ral: Option<String>,
    pub coil_weight: Option<f64>,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Sale record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub client_id: String,
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    /// Delivery fee, before tax, added to the items total
    #[serde(default)]
    pub transportation_fee: f64,
    /// Tax rate as a fraction (0.19 = 19%)
    pub tax_rate: f64,
    /// sum(items.total_ht) + transportation_fee
    pub total_ht: f64,
    /// total_ht * (1 + tax_rate)
    pub total_ttc: f64,
    #[serde(default)]
    pub is_invoiced: bool,
    pub invoice_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
    /// Unix millis; payments archived together with the sale share it
    #[serde(default)]
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

impl Sale {
    /// Not soft-deleted
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Link to an invoice
    pub fn mark_invoiced(&mut self, invoice_id: &str) {
        self.is_invoiced = true;
        self.invoice_id = Some(invoice_id.to_string());
    }

    /// Drop the invoice link
    pub fn unmark_invoiced(&mut self) {
        self.is_invoiced = false;
        self.invoice_id = None;
    }
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDraft {
    pub client_id: String,
    pub date: NaiveDate,
    pub items: Vec<LineItemDraft>,
    #[serde(default)]
    pub transportation_fee: f64,
    /// Falls back to the configured default rate
    pub tax_rate: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Update sale payload
///
/// `items`, when present, replaces the whole item list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub date: Option<NaiveDate>,
    pub items: Option<Vec<LineItemDraft>>,
    pub transportation_fee: Option<f64>,
    pub tax_rate: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Sales list filter (all bounds inclusive)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesFilter {
    pub client_id: Option<String>,
    pub is_invoiced: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SalesFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        if let Some(client_id) = &self.client_id
            && &sale.client_id != client_id
        {
            return false;
        }
        if let Some(is_invoiced) = self.is_invoiced
            && sale.is_invoiced != is_invoiced
        {
            return false;
        }
        if let Some(start) = self.start_date
            && sale.date < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && sale.date > end
        {
            return false;
        }
        true
    }
}
