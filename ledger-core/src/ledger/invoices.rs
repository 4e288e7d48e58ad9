//! Invoice operations and sale/invoice membership

use chrono::Days;
use shared::models::{Invoice, InvoiceDraft};
use shared::util::{generate_invoice_number, new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

use super::Ledger;
use crate::audit_log;

/// Attempts at drawing an unused invoice number before widening it
const INVOICE_NUMBER_ATTEMPTS: usize = 10;

/// Drop repeated ids, keeping first occurrences in order
fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

impl Ledger {
    fn next_invoice_number(&self) -> String {
        let prefix = &self.config.invoice_prefix;
        let taken = |number: &str| {
            self.snapshot
                .invoices
                .iter()
                .any(|i| i.invoice_number == number)
        };

        for _ in 0..INVOICE_NUMBER_ATTEMPTS {
            let number = generate_invoice_number(prefix);
            if !taken(&number) {
                return number;
            }
        }
        let mut suffix = new_id();
        suffix.truncate(8);
        format!("{}-{}", generate_invoice_number(prefix), suffix)
    }

    /// Every id must be a live sale of `client_id`
    fn validate_members(&self, client_id: &str, sales_ids: &[String]) -> AppResult<()> {
        for sale_id in sales_ids {
            let sale = self.sale_at(self.live_sale_index(sale_id)?);
            if sale.client_id != client_id {
                tracing::warn!(
                    sale_id = %sale_id,
                    sale_client = %sale.client_id,
                    invoice_client = %client_id,
                    "Rejected sale of another client"
                );
                return Err(AppError::new(ErrorCode::InvoiceSaleMismatch)
                    .with_detail("sale_id", sale_id.as_str())
                    .with_detail("client_id", client_id));
            }
        }
        Ok(())
    }

    /// Issue an invoice for some of a client's sales
    ///
    /// The due date defaults to `date` plus the configured due days.
    pub fn create_invoice(&mut self, draft: InvoiceDraft) -> AppResult<Invoice> {
        self.ensure_client(&draft.client_id)?;

        let due_date = match draft.due_date {
            Some(due) if due < draft.date => {
                return Err(AppError::new(ErrorCode::InvoiceInvalidDueDate)
                    .with_detail("date", draft.date.to_string())
                    .with_detail("due_date", due.to_string()));
            }
            Some(due) => due,
            None => draft
                .date
                .checked_add_days(Days::new(u64::from(self.config.invoice_due_days)))
                .ok_or_else(|| AppError::new(ErrorCode::InvoiceInvalidDueDate))?,
        };

        let sales_ids = dedup_ids(draft.sales_ids);
        self.validate_members(&draft.client_id, &sales_ids)?;

        let invoice = Invoice {
            id: new_id(),
            invoice_number: self.next_invoice_number(),
            client_id: draft.client_id,
            sales_ids: Vec::new(),
            date: draft.date,
            due_date,
            total_ht: 0.0,
            total_ttc: 0.0,
            tax_rate: self.tax_rate_or_default(draft.tax_rate),
            is_paid: false,
            paid_at: None,
            payment_method: draft.payment_method,
            is_deleted: false,
            deleted_at: None,
            created_at: now_millis(),
            updated_at: None,
        };
        let id = invoice.id.clone();
        self.snapshot.invoices.push(invoice);

        let invoice = match self.reconcile_invoice_membership(&id, sales_ids) {
            Ok(invoice) => invoice,
            Err(err) => {
                self.snapshot.invoices.pop();
                return Err(err);
            }
        };

        audit_log!(
            "create",
            format!("invoice:{}", invoice.id),
            format!("{} with {} sales", invoice.invoice_number, invoice.sales_ids.len())
        );
        Ok(invoice)
    }

    /// Make `sales_ids` the exact membership of an invoice
    ///
    /// This is the single place where `Sale::invoice_id` and
    /// `Invoice::sales_ids` are changed together:
    /// - sales dropped from the list are unmarked
    /// - sales added are marked, leaving whatever invoice held them before
    /// - totals and the paid flag are recomputed for this invoice and for
    ///   every live invoice that lost a sale
    ///
    /// Unknown or deleted sales fail with `SaleNotFound`, sales of another
    /// client with `InvoiceSaleMismatch`; nothing changes in either case.
    pub fn reconcile_invoice_membership(
        &mut self,
        invoice_id: &str,
        sales_ids: Vec<String>,
    ) -> AppResult<Invoice> {
        let idx = self.live_invoice_index(invoice_id)?;
        let sales_ids = dedup_ids(sales_ids);
        let client_id = self.invoice_at(idx).client_id.clone();
        self.validate_members(&client_id, &sales_ids)?;

        let previous = std::mem::take(&mut self.snapshot.invoices[idx].sales_ids);

        let mut removed = 0;
        for sale in self.snapshot.sales.iter_mut().filter(|s| {
            previous.contains(&s.id)
                && !sales_ids.contains(&s.id)
                && s.invoice_id.as_deref() == Some(invoice_id)
        }) {
            sale.unmark_invoiced();
            removed += 1;
        }

        let mut added = 0;
        for sale in self
            .snapshot
            .sales
            .iter_mut()
            .filter(|s| sales_ids.contains(&s.id))
        {
            if sale.invoice_id.as_deref() != Some(invoice_id) {
                added += 1;
            }
            sale.mark_invoiced(invoice_id);
        }

        // A sale lists under one invoice only
        let mut losing: Vec<usize> = Vec::new();
        for (other_idx, other) in self.snapshot.invoices.iter_mut().enumerate() {
            if other_idx == idx {
                continue;
            }
            let before = other.sales_ids.len();
            other.sales_ids.retain(|id| !sales_ids.contains(id));
            // Dormant lists just drop the ids
            if other.sales_ids.len() != before && other.is_active() {
                losing.push(other_idx);
            }
        }

        let now = now_millis();
        let invoice = &mut self.snapshot.invoices[idx];
        invoice.sales_ids = sales_ids;
        invoice.updated_at = Some(now);
        self.refresh_invoice(idx, now);

        for other_idx in losing {
            tracing::info!(
                from = %self.invoice_at(other_idx).id,
                to = %invoice_id,
                "Sales moved between invoices"
            );
            self.snapshot.invoices[other_idx].updated_at = Some(now);
            self.refresh_invoice(other_idx, now);
        }

        tracing::debug!(invoice_id = %invoice_id, added, removed, "Invoice membership reconciled");
        Ok(self.invoice_at(idx).clone())
    }

    /// Replace the sales of an invoice
    pub fn set_invoice_sales(&mut self, invoice_id: &str, sales_ids: Vec<String>) -> AppResult<Invoice> {
        let invoice = self.reconcile_invoice_membership(invoice_id, sales_ids)?;
        audit_log!(
            "update",
            format!("invoice:{}", invoice_id),
            format!("{} sales", invoice.sales_ids.len())
        );
        Ok(invoice)
    }

    pub fn add_sale_to_invoice(&mut self, invoice_id: &str, sale_id: &str) -> AppResult<Invoice> {
        let idx = self.live_invoice_index(invoice_id)?;
        let mut sales_ids = self.invoice_at(idx).sales_ids.clone();
        sales_ids.push(sale_id.to_string());
        self.reconcile_invoice_membership(invoice_id, sales_ids)
    }

    pub fn remove_sale_from_invoice(&mut self, invoice_id: &str, sale_id: &str) -> AppResult<Invoice> {
        let idx = self.live_invoice_index(invoice_id)?;
        let sales_ids: Vec<String> = self
            .invoice_at(idx)
            .sales_ids
            .iter()
            .filter(|id| id.as_str() != sale_id)
            .cloned()
            .collect();
        self.reconcile_invoice_membership(invoice_id, sales_ids)
    }

    /// Unlink a sale that is about to be deleted
    ///
    /// A soft-deleted invoice only drops the id from its (dormant) list.
    pub(super) fn detach_sale_from_invoice(&mut self, sale_id: &str, invoice_id: &str) -> AppResult<()> {
        match self.live_invoice_index(invoice_id) {
            Ok(_) => {
                self.remove_sale_from_invoice(invoice_id, sale_id)?;
            }
            Err(_) => {
                if let Ok(idx) = self.invoice_index_any(invoice_id) {
                    self.snapshot.invoices[idx].sales_ids.retain(|id| id != sale_id);
                }
                let sale_idx = self.sale_index_any(sale_id)?;
                self.snapshot.sales[sale_idx].unmark_invoiced();
            }
        }
        Ok(())
    }

    /// Soft-delete an invoice; its sales become uninvoiced
    ///
    /// The invoice keeps its `sales_ids` so that a restore can relink them.
    pub fn delete_invoice(&mut self, id: &str) -> AppResult<()> {
        let idx = self.invoice_index_any(id)?;
        if self.invoice_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::InvoiceAlreadyDeleted).with_detail("invoice_id", id));
        }

        let now = now_millis();
        let invoice = &mut self.snapshot.invoices[idx];
        invoice.is_deleted = true;
        invoice.deleted_at = Some(now);
        invoice.updated_at = Some(now);
        let number = invoice.invoice_number.clone();

        for sale in self
            .snapshot
            .sales
            .iter_mut()
            .filter(|s| s.invoice_id.as_deref() == Some(id))
        {
            sale.unmark_invoiced();
        }

        audit_log!("delete", format!("invoice:{}", id), number);
        Ok(())
    }

    /// Undo [`Ledger::delete_invoice`]
    ///
    /// Only former member sales that are still live and not invoiced
    /// elsewhere are relinked.
    pub fn restore_invoice(&mut self, id: &str) -> AppResult<Invoice> {
        let idx = self.invoice_index_any(id)?;
        if !self.invoice_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::InvoiceNotDeleted).with_detail("invoice_id", id));
        }

        let client_id = self.invoice_at(idx).client_id.clone();
        self.ensure_client(&client_id)?;
        let former = std::mem::take(&mut self.snapshot.invoices[idx].sales_ids);
        let relink: Vec<String> = former
            .into_iter()
            .filter(|sale_id| {
                self.snapshot.sales.iter().any(|s| {
                    &s.id == sale_id
                        && s.is_active()
                        && s.client_id == client_id
                        && s.invoice_id.is_none()
                })
            })
            .collect();

        let invoice = &mut self.snapshot.invoices[idx];
        invoice.is_deleted = false;
        invoice.deleted_at = None;

        let invoice = self.reconcile_invoice_membership(id, relink)?;
        audit_log!(
            "restore",
            format!("invoice:{}", id),
            format!("{} sales relinked", invoice.sales_ids.len())
        );
        Ok(invoice)
    }

    /// Recompute an invoice's totals and paid flag from its current sales
    ///
    /// Call after editing a sale that already belongs to an invoice.
    pub fn recompute_invoice(&mut self, id: &str) -> AppResult<Invoice> {
        let idx = self.live_invoice_index(id)?;
        self.refresh_invoice(idx, now_millis());
        Ok(self.invoice_at(idx).clone())
    }

    /// Soft-deleted invoices
    pub fn deleted_invoices(&self) -> Vec<&Invoice> {
        self.view().deleted_invoices()
    }
}
