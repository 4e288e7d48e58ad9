//! Ledger orchestration
//!
//! [`Ledger`] owns the current [`LedgerSnapshot`] and is the only place that
//! mutates it. After each mutation the derived fields it touches (sale
//! totals, invoice totals, invoice paid flag) are recomputed synchronously,
//! so a snapshot handed out by the ledger is always consistent.
//!
//! Sale/invoice membership is enforced in one place,
//! [`Ledger::reconcile_invoice_membership`]. Every path that links or
//! unlinks a sale goes through it.

mod clients;
mod credits;
mod invoices;
mod payments;
mod sales;

use shared::models::{Client, CreditTransaction, Invoice, Payment, Sale};
use shared::{AppError, AppResult};

use crate::calculator;
use crate::config::LedgerConfig;
use crate::read_model::{LedgerSnapshot, ReadModel};
use crate::reconciliation;
use crate::store::LedgerStore;

pub struct Ledger {
    snapshot: LedgerSnapshot,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_snapshot(LedgerSnapshot::default(), config)
    }

    pub fn with_snapshot(snapshot: LedgerSnapshot, config: LedgerConfig) -> Self {
        Self { snapshot, config }
    }

    /// Load the ledger from a store
    pub fn open(store: &impl LedgerStore, config: LedgerConfig) -> AppResult<Self> {
        let snapshot = store.load()?;
        tracing::info!(
            clients = snapshot.clients.len(),
            sales = snapshot.sales.len(),
            invoices = snapshot.invoices.len(),
            payments = snapshot.payments.len(),
            credit_transactions = snapshot.credit_transactions.len(),
            "Ledger opened"
        );
        Ok(Self::with_snapshot(snapshot, config))
    }

    /// Save the current state to a store
    pub fn persist(&self, store: &impl LedgerStore) -> AppResult<()> {
        store.save(&self.snapshot)
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> LedgerSnapshot {
        self.snapshot
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Read model over the current state
    pub fn view(&self) -> ReadModel<'_> {
        self.snapshot.view()
    }

    // ========== Index lookups ==========

    fn client_index(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::client_not_found(id))
    }

    /// Any sale, deleted or not
    fn sale_index_any(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .sales
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::sale_not_found(id))
    }

    fn live_sale_index(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .sales
            .iter()
            .position(|s| s.id == id && s.is_active())
            .ok_or_else(|| AppError::sale_not_found(id))
    }

    fn invoice_index_any(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .invoices
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| AppError::invoice_not_found(id))
    }

    fn live_invoice_index(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .invoices
            .iter()
            .position(|i| i.id == id && i.is_active())
            .ok_or_else(|| AppError::invoice_not_found(id))
    }

    fn payment_index(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .payments
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::payment_not_found(id))
    }

    fn credit_index(&self, id: &str) -> AppResult<usize> {
        self.snapshot
            .credit_transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AppError::credit_transaction_not_found(id))
    }

    fn ensure_client(&self, id: &str) -> AppResult<&Client> {
        self.client_index(id).map(|idx| &self.snapshot.clients[idx])
    }

    fn sale_at(&self, idx: usize) -> &Sale {
        &self.snapshot.sales[idx]
    }

    fn invoice_at(&self, idx: usize) -> &Invoice {
        &self.snapshot.invoices[idx]
    }

    fn payment_at(&self, idx: usize) -> &Payment {
        &self.snapshot.payments[idx]
    }

    fn credit_at(&self, idx: usize) -> &CreditTransaction {
        &self.snapshot.credit_transactions[idx]
    }

    // ========== Derived invoice fields ==========

    /// Re-derive the paid flag of a live invoice, logging flips
    fn refresh_paid_flag(&mut self, idx: usize, now: i64) {
        let snapshot = &self.snapshot;
        let invoice = &snapshot.invoices[idx];
        if !invoice.is_active() {
            return;
        }
        let flag = reconciliation::reconcile_invoice_paid_flag(
            invoice,
            &snapshot.sales,
            &snapshot.payments,
            now,
        );

        let invoice = &mut self.snapshot.invoices[idx];
        if invoice.is_paid != flag.is_paid {
            if flag.is_paid {
                tracing::info!(invoice_id = %invoice.id, number = %invoice.invoice_number, "Invoice fully paid");
            } else {
                tracing::info!(invoice_id = %invoice.id, number = %invoice.invoice_number, "Invoice no longer fully paid");
            }
            invoice.updated_at = Some(now);
        }
        invoice.is_paid = flag.is_paid;
        invoice.paid_at = flag.paid_at;
    }

    /// Recompute totals from member sales, then the paid flag
    fn refresh_invoice(&mut self, idx: usize, now: i64) {
        let snapshot = &self.snapshot;
        let invoice = &snapshot.invoices[idx];
        let totals = calculator::invoice_totals(&invoice.sales_ids, &snapshot.sales, invoice.tax_rate);

        let invoice = &mut self.snapshot.invoices[idx];
        invoice.total_ht = totals.total_ht;
        invoice.total_ttc = totals.total_ttc;
        tracing::debug!(
            invoice_id = %invoice.id,
            total_ht = totals.total_ht,
            total_ttc = totals.total_ttc,
            "Invoice totals recomputed"
        );

        self.refresh_paid_flag(idx, now);
    }

    /// Paid flag refresh for the invoice a sale belongs to, if any
    fn refresh_invoice_of_sale(&mut self, sale_id: &str, now: i64) {
        let invoice_id = self
            .snapshot
            .sales
            .iter()
            .find(|s| s.id == sale_id)
            .and_then(|s| s.invoice_id.clone());
        if let Some(invoice_id) = invoice_id
            && let Ok(idx) = self.live_invoice_index(&invoice_id)
        {
            self.refresh_paid_flag(idx, now);
        }
    }
}

#[cfg(test)]
mod tests;
