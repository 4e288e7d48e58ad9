//! Financial calculator
//!
//! Turns line items, fees and a tax rate into HT (pre-tax), tax and TTC
//! (tax-inclusive) totals at line and document granularity.
//!
//! Nothing here fails or logs. Negative, NaN and infinite quantities,
//! prices, fees and rates count as 0. Each visible total is rounded once
//! (half away from zero, 2dp); sums accumulate unrounded `Decimal`s.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::models::{LineItem, LineItemDraft, Sale};
use shared::util::new_id;

use crate::money::{non_negative, round_money, sanitize, to_f64};

/// Totals of a sale or invoice, ready for display or rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub items_total_ht: f64,
    pub fees_ht: f64,
    pub total_ht: f64,
    pub tax_amount: f64,
    pub total_ttc: f64,
}

// ============================================================================
// Line level
// ============================================================================

#[inline]
fn line_total(quantity: f64, unit_price: f64) -> Decimal {
    sanitize(quantity) * sanitize(unit_price)
}

/// `quantity * unit_price`, rounded to 2dp
pub fn compute_line_total(quantity: f64, unit_price: f64) -> f64 {
    to_f64(line_total(quantity, unit_price))
}

/// `amount_ht * (1 + tax_rate)`; `tax_rate` is a fraction (0.19 = 19%)
pub fn apply_tax(amount_ht: f64, tax_rate: f64) -> f64 {
    let ht = round_money(sanitize(amount_ht));
    to_f64(ht + taxed_part(ht, sanitize(tax_rate)))
}

/// `amount_ht * tax_rate`, the tax line shown apart from HT/TTC
pub fn tax_amount(amount_ht: f64, tax_rate: f64) -> f64 {
    let ht = round_money(sanitize(amount_ht));
    to_f64(taxed_part(ht, sanitize(tax_rate)))
}

/// Tax on an already rounded HT amount, rounded to cents.
///
/// TTC is built as `ht + tax` so that `apply_tax - amount_ht == tax_amount`
/// holds exactly at 2dp.
#[inline]
fn taxed_part(ht: Decimal, rate: Decimal) -> Decimal {
    round_money(ht * rate)
}

// ============================================================================
// Document level
// ============================================================================

fn items_total_ht(items: &[LineItem]) -> Decimal {
    items.iter().map(|item| sanitize(item.total_ht)).sum()
}

/// Sum of the stored `total_ht` of each item.
///
/// Stored line totals are trusted; quantity * price is not recomputed here.
pub fn sum_line_items_ht(items: &[LineItem]) -> f64 {
    to_f64(items_total_ht(items))
}

fn totals_from(items_ht: Decimal, fees_ht: Decimal, tax_rate: f64) -> DocumentTotals {
    let total_ht = round_money(items_ht + fees_ht);
    let tax = taxed_part(total_ht, sanitize(tax_rate));

    DocumentTotals {
        items_total_ht: to_f64(items_ht),
        fees_ht: to_f64(fees_ht),
        total_ht: to_f64(total_ht),
        tax_amount: to_f64(tax),
        total_ttc: to_f64(total_ht + tax),
    }
}

/// HT, tax and TTC of a document
///
/// `total_ht = items_total_ht + fees_ht`, `tax_amount = total_ht * tax_rate`,
/// `total_ttc = total_ht + tax_amount`.
pub fn compute_document_totals(items: &[LineItem], fees_ht: f64, tax_rate: f64) -> DocumentTotals {
    totals_from(items_total_ht(items), sanitize(fees_ht), tax_rate)
}

/// Build a priced line from a draft
pub fn build_line_item(draft: LineItemDraft, tax_rate: f64) -> LineItem {
    let mut item = LineItem {
        id: new_id(),
        description: draft.description,
        coil_ref: draft.coil_ref,
        coil_thickness: draft.coil_thickness.filter(|v| v.is_finite()),
        coil_width: draft.coil_width.filter(|v| v.is_finite()),
        top_coat_ral: draft.top_coat_ral,
        back_coat_ral: draft.back_coat_ral,
        coil_weight: draft.coil_weight.filter(|v| v.is_finite()),
        quantity: draft.quantity,
        unit_price: draft.unit_price,
        total_ht: 0.0,
        total_ttc: 0.0,
    };
    refresh_line_item(&mut item, tax_rate);
    item
}

/// Recompute a line's HT/TTC from its quantity and unit price
///
/// Malformed quantity or price is stored as 0.
pub fn refresh_line_item(item: &mut LineItem, tax_rate: f64) {
    item.quantity = non_negative(item.quantity);
    item.unit_price = non_negative(item.unit_price);
    item.total_ht = compute_line_total(item.quantity, item.unit_price);
    item.total_ttc = apply_tax(item.total_ht, tax_rate);
}

/// Recompute every line, then the sale totals (fee included)
///
/// The fee and rate are coerced in place, so the stored sale always
/// satisfies `total_ht == sum(item.total_ht) + transportation_fee`.
pub fn refresh_sale_totals(sale: &mut Sale) -> DocumentTotals {
    sale.transportation_fee = non_negative(sale.transportation_fee);
    sale.tax_rate = non_negative(sale.tax_rate);
    for item in sale.items.iter_mut() {
        refresh_line_item(item, sale.tax_rate);
    }
    let totals = compute_document_totals(&sale.items, sale.transportation_fee, sale.tax_rate);
    sale.total_ht = totals.total_ht;
    sale.total_ttc = totals.total_ttc;
    totals
}

/// Invoice totals from its member sales
///
/// HT is the sum of each live member sale's `total_ht` (fees already
/// included there), taxed at the invoice rate. Ids with no live sale
/// contribute nothing.
pub fn invoice_totals(sales_ids: &[String], sales: &[Sale], tax_rate: f64) -> DocumentTotals {
    let members_ht: Decimal = sales
        .iter()
        .filter(|sale| sale.is_active() && sales_ids.contains(&sale.id))
        .map(|sale| sanitize(sale.total_ht))
        .sum();

    totals_from(members_ht, Decimal::ZERO, tax_rate)
}
