//! Sales and dashboard reports
//!
//! Revenue figures are pre-tax (sum of sale `total_ht`); amounts still owed
//! are tax-inclusive, like client debt.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use shared::models::{
    DashboardStats, DebtSummary, Invoice, MonthlySales, Payment, PaymentMethod,
    PaymentMethodTotals, Sale, SalesSummary,
};

use crate::money::{sanitize, to_f64};

/// Everything `ledger-report` prints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReport {
    pub as_of: NaiveDate,
    pub debt_summary: DebtSummary,
    pub sales_summary: SalesSummary,
    pub dashboard: DashboardStats,
}

/// Invoiced vs uninvoiced sales, plus a month by month breakdown
pub fn sales_summary(sales: &[Sale]) -> SalesSummary {
    let mut total = Decimal::ZERO;
    let mut invoiced = Decimal::ZERO;
    let mut monthly: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();

    for sale in sales.iter().filter(|s| s.is_active()) {
        let amount = sanitize(sale.total_ht);
        total += amount;
        if sale.is_invoiced {
            invoiced += amount;
        }
        *monthly
            .entry((sale.date.year(), sale.date.month()))
            .or_default() += amount;
    }

    SalesSummary {
        total_sales: to_f64(total),
        invoiced_sales: to_f64(invoiced),
        uninvoiced_sales: to_f64(total - invoiced),
        monthly_sales: monthly
            .into_iter()
            .map(|((year, month), amount)| MonthlySales {
                year,
                month,
                amount: to_f64(amount),
            })
            .collect(),
    }
}

/// Dashboard counters on `today`
pub fn dashboard_stats(
    sales: &[Sale],
    invoices: &[Invoice],
    payments: &[Payment],
    today: NaiveDate,
) -> DashboardStats {
    let live_sales = sales.iter().filter(|s| s.is_active());
    let live_invoices: Vec<&Invoice> = invoices.iter().filter(|i| i.is_active()).collect();

    let mut total_sales = 0;
    let mut revenue_ht = Decimal::ZERO;
    let mut billed_ttc = Decimal::ZERO;
    for sale in live_sales {
        total_sales += 1;
        revenue_ht += sanitize(sale.total_ht);
        billed_ttc += sanitize(sale.total_ttc);
    }

    let mut collected = Decimal::ZERO;
    let mut by_method: HashMap<PaymentMethod, Decimal> = HashMap::new();
    for payment in payments.iter().filter(|p| p.is_active()) {
        let amount = sanitize(payment.amount);
        collected += amount;
        *by_method.entry(payment.method).or_default() += amount;
    }
    let mut payment_method_totals = PaymentMethodTotals::default();
    for (method, amount) in by_method {
        *payment_method_totals.slot_mut(method) = to_f64(amount);
    }

    let paid_invoices = live_invoices.iter().filter(|i| i.is_paid).count();
    let overdue_invoices = live_invoices
        .iter()
        .filter(|i| !i.is_paid && i.is_past_due(today))
        .count();

    DashboardStats {
        total_sales,
        total_invoices: live_invoices.len(),
        paid_invoices,
        unpaid_invoices: live_invoices.len() - paid_invoices,
        overdue_invoices,
        total_revenue: to_f64(revenue_ht),
        revenue_collected: to_f64(collected),
        outstanding_amount: to_f64((billed_ttc - collected).max(Decimal::ZERO)),
        payment_method_totals,
    }
}
