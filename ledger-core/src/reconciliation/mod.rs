//! Payment reconciliation
//!
//! Derives paid/outstanding state from document totals and the payments
//! recorded against sales. Invoices carry no payments of their own; they
//! inherit the payments of their member sales.
//!
//! Every function here is a pure read over in-memory slices. Soft-deleted
//! payments, sales and invoices never count.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use shared::models::{
    Client, ClientDebt, DebtSummary, Invoice, PaidFlag, Payment, PaymentStatus, Sale,
};

use crate::money::{sanitize, to_f64};

mod credit;

pub use credit::{client_credit_status, credit_transactions_for_client};
pub(crate) use credit::{credit_balance, entry_effect};

/// Live payments recorded against a sale
pub fn payments_for_sale<'a, 's>(
    sale_id: &'s str,
    payments: &'a [Payment],
) -> impl Iterator<Item = &'a Payment> + 's
where
    'a: 's,
{
    payments
        .iter()
        .filter(move |p| p.is_active() && p.sale_id == sale_id)
}

/// Total of the live payments recorded against a sale
pub(crate) fn paid_for_sale(sale_id: &str, payments: &[Payment]) -> Decimal {
    payments_for_sale(sale_id, payments)
        .map(|p| sanitize(p.amount))
        .sum()
}

/// Outstanding amount of a sale, never negative
pub(crate) fn sale_remaining(sale: &Sale, payments: &[Payment]) -> Decimal {
    (sanitize(sale.total_ttc) - paid_for_sale(&sale.id, payments)).max(Decimal::ZERO)
}

fn build_status(total: Decimal, paid: Decimal, payments: Vec<Payment>) -> PaymentStatus {
    let remaining_amount = to_f64((total - paid).max(Decimal::ZERO));
    PaymentStatus {
        total_amount: to_f64(total),
        total_paid: to_f64(paid),
        remaining_amount,
        is_fully_paid: remaining_amount == 0.0,
        payments,
    }
}

/// Paid/outstanding state of one sale
///
/// An overpaid sale reports `remaining_amount == 0`; the excess only shows
/// up in [`client_credit_balance`].
pub fn sale_payment_status(sale: &Sale, payments: &[Payment]) -> PaymentStatus {
    let matching: Vec<Payment> = payments_for_sale(&sale.id, payments).cloned().collect();
    let paid = matching.iter().map(|p| sanitize(p.amount)).sum();
    build_status(sanitize(sale.total_ttc), paid, matching)
}

/// Paid/outstanding state of an invoice, aggregated from its sales' payments
pub fn invoice_payment_status(invoice: &Invoice, payments: &[Payment]) -> PaymentStatus {
    let matching: Vec<Payment> = payments
        .iter()
        .filter(|p| p.is_active() && invoice.sales_ids.contains(&p.sale_id))
        .cloned()
        .collect();
    let paid = matching.iter().map(|p| sanitize(p.amount)).sum();
    build_status(sanitize(invoice.total_ttc), paid, matching)
}

/// Whether a sale has nothing left to pay (after rounding to cents)
fn is_sale_settled(sale: &Sale, payments: &[Payment]) -> bool {
    to_f64(sale_remaining(sale, payments)) == 0.0
}

/// Re-derive an invoice's paid flag from its member sales
///
/// Paid means every member sale is fully paid. An invoice without members
/// is not paid, and a member id with no live sale counts as unpaid.
/// `paid_at` is stamped with `now_millis` on the unpaid -> paid flip, kept
/// while the invoice stays paid and cleared when it flips back.
pub fn reconcile_invoice_paid_flag(
    invoice: &Invoice,
    sales: &[Sale],
    payments: &[Payment],
    now_millis: i64,
) -> PaidFlag {
    let is_paid = !invoice.sales_ids.is_empty()
        && invoice.sales_ids.iter().all(|sale_id| {
            sales
                .iter()
                .find(|s| s.is_active() && &s.id == sale_id)
                .is_some_and(|sale| is_sale_settled(sale, payments))
        });

    let paid_at = match (invoice.is_paid, is_paid) {
        (_, false) => None,
        (true, true) => invoice.paid_at.or(Some(now_millis)),
        (false, true) => Some(now_millis),
    };

    PaidFlag { is_paid, paid_at }
}

/// Sales and payments totals of one client (live records only)
#[derive(Debug, Clone, Copy, Default)]
struct ClientBalance {
    sales: Decimal,
    paid: Decimal,
}

impl ClientBalance {
    fn debt(&self) -> Decimal {
        (self.sales - self.paid).max(Decimal::ZERO)
    }

    fn credit(&self) -> Decimal {
        (self.paid - self.sales).max(Decimal::ZERO)
    }
}

fn client_balance(client_id: &str, sales: &[Sale], payments: &[Payment]) -> ClientBalance {
    ClientBalance {
        sales: sales
            .iter()
            .filter(|s| s.is_active() && s.client_id == client_id)
            .map(|s| sanitize(s.total_ttc))
            .sum(),
        paid: payments
            .iter()
            .filter(|p| p.is_active() && p.client_id == client_id)
            .map(|p| sanitize(p.amount))
            .sum(),
    }
}

fn balances_by_client<'a>(
    sales: &'a [Sale],
    payments: &'a [Payment],
) -> HashMap<&'a str, ClientBalance> {
    let mut balances: HashMap<&str, ClientBalance> = HashMap::new();
    for sale in sales.iter().filter(|s| s.is_active()) {
        balances.entry(sale.client_id.as_str()).or_default().sales += sanitize(sale.total_ttc);
    }
    for payment in payments.iter().filter(|p| p.is_active()) {
        balances.entry(payment.client_id.as_str()).or_default().paid += sanitize(payment.amount);
    }
    balances
}

/// Net debt of a client: `max(0, sales TTC - payments)`
///
/// Computed client-wide, so an overpaid sale offsets another sale's
/// balance.
pub fn client_debt(client_id: &str, sales: &[Sale], payments: &[Payment]) -> f64 {
    to_f64(client_balance(client_id, sales, payments).debt())
}

/// Net credit of a client: `max(0, payments - sales TTC)`
///
/// At most one of debt and credit is non-zero.
pub fn client_credit_balance(client_id: &str, sales: &[Sale], payments: &[Payment]) -> f64 {
    to_f64(client_balance(client_id, sales, payments).credit())
}

/// Debt overview across all clients
///
/// `overdue_debt` sums the per-sale remaining amount of sales whose live
/// invoice is past due on `today`. A sale without an invoice is never
/// overdue. `upcoming_debt` is what is left of the net total.
pub fn debt_summary(
    clients: &[Client],
    sales: &[Sale],
    payments: &[Payment],
    invoices: &[Invoice],
    today: NaiveDate,
) -> DebtSummary {
    let balances = balances_by_client(sales, payments);

    let mut debt_by_client: Vec<(Decimal, ClientDebt)> = clients
        .iter()
        .filter_map(|client| {
            let debt = balances.get(client.id.as_str()).copied().unwrap_or_default().debt();
            (debt > Decimal::ZERO).then(|| {
                (
                    debt,
                    ClientDebt {
                        client_id: client.id.clone(),
                        client_name: client.name.clone(),
                        amount: to_f64(debt),
                    },
                )
            })
        })
        .collect();
    debt_by_client.sort_by(|(a, ca), (b, cb)| {
        b.cmp(a).then_with(|| ca.client_name.cmp(&cb.client_name))
    });

    let totals = balances
        .values()
        .fold(ClientBalance::default(), |acc, balance| ClientBalance {
            sales: acc.sales + balance.sales,
            paid: acc.paid + balance.paid,
        });
    let total_debt = totals.debt();

    let past_due: HashSet<&str> = invoices
        .iter()
        .filter(|inv| inv.is_active() && inv.is_past_due(today))
        .map(|inv| inv.id.as_str())
        .collect();

    let overdue_debt: Decimal = sales
        .iter()
        .filter(|sale| sale.is_active())
        .filter(|sale| {
            sale.invoice_id
                .as_deref()
                .is_some_and(|invoice_id| past_due.contains(invoice_id))
        })
        .map(|sale| sale_remaining(sale, payments))
        .filter(|remaining| *remaining > Decimal::ZERO)
        .sum();

    DebtSummary {
        total_debt: to_f64(total_debt),
        overdue_debt: to_f64(overdue_debt),
        upcoming_debt: to_f64((total_debt - overdue_debt).max(Decimal::ZERO)),
        debt_by_client: debt_by_client.into_iter().map(|(_, debt)| debt).collect(),
    }
}
