//! Derived views (never persisted)
//!
//! Produced by the ledger core from sales, invoices and payments and
//! consumed by tables, dashboards and document rendering.

use serde::{Deserialize, Serialize};

use super::payment::{Payment, PaymentMethod};

/// Paid/outstanding state of a sale or invoice
///
/// `remaining_amount == max(0, total_amount - total_paid)` and
/// `is_fully_paid == (remaining_amount == 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub total_amount: f64,
    pub total_paid: f64,
    pub remaining_amount: f64,
    pub is_fully_paid: bool,
    /// Live payments that contributed to `total_paid`
    pub payments: Vec<Payment>,
}

/// Result of re-deriving an invoice's paid flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaidFlag {
    pub is_paid: bool,
    /// Unix millis
    pub paid_at: Option<i64>,
}

/// Net debt of one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDebt {
    pub client_id: String,
    pub client_name: String,
    pub amount: f64,
}

/// Debt overview across all clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub total_debt: f64,
    /// Outstanding on sales whose invoice is past due
    pub overdue_debt: f64,
    pub upcoming_debt: f64,
    /// Clients with debt > 0, highest first
    pub debt_by_client: Vec<ClientDebt>,
}

/// Sales total for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub amount: f64,
}

/// Sales overview (pre-tax amounts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: f64,
    pub invoiced_sales: f64,
    pub uninvoiced_sales: f64,
    /// Chronological
    pub monthly_sales: Vec<MonthlySales>,
}

/// Collected amount per payment method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodTotals {
    pub cash: f64,
    pub bank_transfer: f64,
    pub check: f64,
    pub credit_card: f64,
}

impl PaymentMethodTotals {
    pub fn get(&self, method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::BankTransfer => self.bank_transfer,
            PaymentMethod::Check => self.check,
            PaymentMethod::CreditCard => self.credit_card,
        }
    }

    pub fn slot_mut(&mut self, method: PaymentMethod) -> &mut f64 {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::BankTransfer => &mut self.bank_transfer,
            PaymentMethod::Check => &mut self.check,
            PaymentMethod::CreditCard => &mut self.credit_card,
        }
    }
}

/// Dashboard counters and amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_sales: usize,
    pub total_invoices: usize,
    pub paid_invoices: usize,
    pub unpaid_invoices: usize,
    pub overdue_invoices: usize,
    /// Sum of sale totals before tax
    pub total_revenue: f64,
    /// Sum of live payments
    pub revenue_collected: f64,
    /// max(0, sum of sale totals after tax - revenue_collected)
    pub outstanding_amount: f64,
    pub payment_method_totals: PaymentMethodTotals,
}
