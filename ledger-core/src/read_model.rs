//! Read model
//!
//! [`LedgerSnapshot`] is the full state handed to the core: every client,
//! sale, invoice and payment, soft-deleted rows included. [`ReadModel`]
//! borrows a snapshot and answers queries against it. Nothing is cached;
//! build a new view after every mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::models::{
    Client, ClientCreditStatus, CreditTransaction, DashboardStats, DebtSummary, Invoice,
    InvoiceFilter, PaidFlag, Payment, PaymentStatus, Sale, SalesFilter, SalesSummary,
};
use shared::{AppError, AppResult};

use crate::reconciliation;
use crate::reports::{self, LedgerReport};

/// Persisted ledger state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub credit_transactions: Vec<CreditTransaction>,
}

impl LedgerSnapshot {
    pub fn view(&self) -> ReadModel<'_> {
        ReadModel::new(
            &self.clients,
            &self.sales,
            &self.invoices,
            &self.payments,
            &self.credit_transactions,
        )
    }
}

/// Borrowed view over ledger collections
#[derive(Debug, Clone, Copy)]
pub struct ReadModel<'a> {
    clients: &'a [Client],
    sales: &'a [Sale],
    invoices: &'a [Invoice],
    payments: &'a [Payment],
    credits: &'a [CreditTransaction],
}

impl<'a> ReadModel<'a> {
    pub fn new(
        clients: &'a [Client],
        sales: &'a [Sale],
        invoices: &'a [Invoice],
        payments: &'a [Payment],
        credits: &'a [CreditTransaction],
    ) -> Self {
        Self {
            clients,
            sales,
            invoices,
            payments,
            credits,
        }
    }

    // ========== Lookups ==========

    pub fn client(&self, id: &str) -> AppResult<&'a Client> {
        self.clients
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::client_not_found(id))
    }

    /// Live sale by id
    pub fn sale(&self, id: &str) -> AppResult<&'a Sale> {
        self.sales
            .iter()
            .find(|s| s.id == id && s.is_active())
            .ok_or_else(|| AppError::sale_not_found(id))
    }

    /// Live invoice by id
    pub fn invoice(&self, id: &str) -> AppResult<&'a Invoice> {
        self.invoices
            .iter()
            .find(|i| i.id == id && i.is_active())
            .ok_or_else(|| AppError::invoice_not_found(id))
    }

    /// Payment by id, archived ones included
    pub fn payment(&self, id: &str) -> AppResult<&'a Payment> {
        self.payments
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::payment_not_found(id))
    }

    pub fn clients(&self) -> &'a [Client] {
        self.clients
    }

    // ========== Lists ==========

    /// Live sales matching `filter`, newest first
    pub fn sales_by_filter(&self, filter: &SalesFilter) -> Vec<&'a Sale> {
        let mut sales: Vec<&Sale> = self
            .sales
            .iter()
            .filter(|s| s.is_active() && filter.matches(s))
            .collect();
        sales.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        sales
    }

    pub fn sales_by_client(&self, client_id: &str) -> Vec<&'a Sale> {
        self.sales_by_filter(&SalesFilter {
            client_id: Some(client_id.to_string()),
            ..Default::default()
        })
    }

    /// Live invoices matching `filter`, newest first
    pub fn invoices_by_filter(&self, filter: &InvoiceFilter) -> Vec<&'a Invoice> {
        let mut invoices: Vec<&Invoice> = self
            .invoices
            .iter()
            .filter(|i| i.is_active() && filter.matches(i))
            .collect();
        invoices.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        invoices
    }

    pub fn invoices_by_client(&self, client_id: &str) -> Vec<&'a Invoice> {
        self.invoices_by_filter(&InvoiceFilter {
            client_id: Some(client_id.to_string()),
            ..Default::default()
        })
    }

    /// Live payments of a sale
    pub fn payments_for_sale(&self, sale_id: &str) -> Vec<&'a Payment> {
        reconciliation::payments_for_sale(sale_id, self.payments).collect()
    }

    /// Soft-deleted payments, most recently archived first
    pub fn archived_payments(&self) -> Vec<&'a Payment> {
        let mut archived: Vec<&Payment> = self.payments.iter().filter(|p| p.is_deleted).collect();
        archived.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        archived
    }

    pub fn deleted_sales(&self) -> Vec<&'a Sale> {
        self.sales.iter().filter(|s| s.is_deleted).collect()
    }

    pub fn deleted_invoices(&self) -> Vec<&'a Invoice> {
        self.invoices.iter().filter(|i| i.is_deleted).collect()
    }

    // ========== Reconciliation ==========

    pub fn sale_payment_status(&self, sale_id: &str) -> AppResult<PaymentStatus> {
        let sale = self.sale(sale_id)?;
        Ok(reconciliation::sale_payment_status(sale, self.payments))
    }

    pub fn invoice_payment_status(&self, invoice_id: &str) -> AppResult<PaymentStatus> {
        let invoice = self.invoice(invoice_id)?;
        Ok(reconciliation::invoice_payment_status(invoice, self.payments))
    }

    pub fn invoice_paid_flag(&self, invoice_id: &str, now_millis: i64) -> AppResult<PaidFlag> {
        let invoice = self.invoice(invoice_id)?;
        Ok(reconciliation::reconcile_invoice_paid_flag(
            invoice,
            self.sales,
            self.payments,
            now_millis,
        ))
    }

    pub fn client_debt(&self, client_id: &str) -> f64 {
        reconciliation::client_debt(client_id, self.sales, self.payments)
    }

    pub fn client_credit_balance(&self, client_id: &str) -> f64 {
        reconciliation::client_credit_balance(client_id, self.sales, self.payments)
    }

    /// Credit entries of a client, newest first
    pub fn credit_transactions(&self, client_id: &str) -> Vec<&'a CreditTransaction> {
        reconciliation::credit_transactions_for_client(client_id, self.credits)
    }

    pub fn client_credit_status(&self, client_id: &str) -> AppResult<ClientCreditStatus> {
        let client = self.client(client_id)?;
        Ok(reconciliation::client_credit_status(
            &client.id,
            self.sales,
            self.payments,
            self.credits,
        ))
    }

    pub fn debt_summary(&self, today: NaiveDate) -> DebtSummary {
        reconciliation::debt_summary(self.clients, self.sales, self.payments, self.invoices, today)
    }

    // ========== Reports ==========

    pub fn sales_summary(&self) -> SalesSummary {
        reports::sales_summary(self.sales)
    }

    pub fn dashboard_stats(&self, today: NaiveDate) -> DashboardStats {
        reports::dashboard_stats(self.sales, self.invoices, self.payments, today)
    }

    pub fn report(&self, today: NaiveDate) -> LedgerReport {
        LedgerReport {
            as_of: today,
            debt_summary: self.debt_summary(today),
            sales_summary: self.sales_summary(),
            dashboard: self.dashboard_stats(today),
        }
    }
}
