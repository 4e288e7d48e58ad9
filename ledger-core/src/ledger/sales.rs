//! Sale operations

use shared::models::{Sale, SaleDraft, SaleUpdate};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

use super::Ledger;
use crate::audit_log;
use crate::calculator;

impl Ledger {
    pub(super) fn tax_rate_or_default(&self, rate: Option<f64>) -> f64 {
        rate.filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(self.config.default_tax_rate)
    }

    /// Record a new sale; line and sale totals are computed here
    pub fn add_sale(&mut self, draft: SaleDraft) -> AppResult<Sale> {
        self.ensure_client(&draft.client_id)?;
        if draft.items.is_empty() {
            tracing::warn!(client_id = %draft.client_id, "Rejected sale without items");
            return Err(AppError::new(ErrorCode::SaleEmpty));
        }

        let tax_rate = self.tax_rate_or_default(draft.tax_rate);
        let mut sale = Sale {
            id: new_id(),
            client_id: draft.client_id,
            date: draft.date,
            items: draft
                .items
                .into_iter()
                .map(|item| calculator::build_line_item(item, tax_rate))
                .collect(),
            transportation_fee: draft.transportation_fee,
            tax_rate,
            total_ht: 0.0,
            total_ttc: 0.0,
            is_invoiced: false,
            invoice_id: None,
            payment_method: draft.payment_method,
            notes: draft.notes,
            is_deleted: false,
            deleted_at: None,
            created_at: now_millis(),
            updated_at: None,
        };
        calculator::refresh_sale_totals(&mut sale);

        tracing::info!(
            sale_id = %sale.id,
            client_id = %sale.client_id,
            total_ttc = sale.total_ttc,
            "Sale added"
        );
        self.snapshot.sales.push(sale.clone());
        Ok(sale)
    }

    /// Edit a live sale and recompute its own totals
    ///
    /// The invoice it belongs to is left untouched: its totals and paid flag
    /// catch up on the next membership or payment change, or through
    /// [`Ledger::recompute_invoice`].
    pub fn update_sale(&mut self, id: &str, update: SaleUpdate) -> AppResult<Sale> {
        let idx = self.live_sale_index(id)?;
        if update.items.as_ref().is_some_and(|items| items.is_empty()) {
            return Err(AppError::new(ErrorCode::SaleEmpty));
        }
        let default_rate = self.config.default_tax_rate;

        let sale = &mut self.snapshot.sales[idx];
        if let Some(date) = update.date {
            sale.date = date;
        }
        if let Some(rate) = update.tax_rate {
            sale.tax_rate = if rate.is_finite() && rate >= 0.0 { rate } else { default_rate };
        }
        if let Some(fee) = update.transportation_fee {
            sale.transportation_fee = fee;
        }
        if let Some(items) = update.items {
            let rate = sale.tax_rate;
            sale.items = items
                .into_iter()
                .map(|item| calculator::build_line_item(item, rate))
                .collect();
        }
        if let Some(method) = update.payment_method {
            sale.payment_method = Some(method);
        }
        if let Some(notes) = update.notes {
            sale.notes = Some(notes);
        }

        calculator::refresh_sale_totals(sale);
        sale.updated_at = Some(now_millis());

        if let Some(invoice_id) = &sale.invoice_id {
            tracing::debug!(
                sale_id = %sale.id,
                invoice_id = %invoice_id,
                "Invoiced sale edited, invoice not recomputed"
            );
        }
        Ok(sale.clone())
    }

    /// Soft-delete a sale
    ///
    /// The sale leaves its invoice and its live payments are archived with
    /// it; [`Ledger::restore_sale`] brings both back.
    pub fn delete_sale(&mut self, id: &str) -> AppResult<()> {
        let idx = self.sale_index_any(id)?;
        if self.sale_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::SaleAlreadyDeleted).with_detail("sale_id", id));
        }

        if let Some(invoice_id) = self.sale_at(idx).invoice_id.clone() {
            self.detach_sale_from_invoice(id, &invoice_id)?;
        }

        let now = now_millis();
        let sale = &mut self.snapshot.sales[idx];
        sale.is_deleted = true;
        sale.deleted_at = Some(now);
        sale.updated_at = Some(now);

        let mut archived = 0;
        for payment in self
            .snapshot
            .payments
            .iter_mut()
            .filter(|p| p.is_active() && p.sale_id == id)
        {
            payment.is_deleted = true;
            payment.deleted_at = Some(now);
            archived += 1;
        }

        audit_log!("delete", format!("sale:{}", id), format!("{} payments archived", archived));
        Ok(())
    }

    /// Undo [`Ledger::delete_sale`]; the sale comes back uninvoiced
    ///
    /// Fails with `ClientNotFound` once its client has been removed.
    pub fn restore_sale(&mut self, id: &str) -> AppResult<Sale> {
        let idx = self.sale_index_any(id)?;
        if !self.sale_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::SaleNotDeleted).with_detail("sale_id", id));
        }
        self.ensure_client(&self.sale_at(idx).client_id)?;
        let deleted_at = self.sale_at(idx).deleted_at;

        let now = now_millis();
        let sale = &mut self.snapshot.sales[idx];
        sale.is_deleted = false;
        sale.deleted_at = None;
        sale.updated_at = Some(now);
        sale.unmark_invoiced();
        let restored = sale.clone();

        for payment in self
            .snapshot
            .payments
            .iter_mut()
            .filter(|p| {
                p.is_deleted && p.sale_id == id && deleted_at.is_some() && p.deleted_at == deleted_at
            })
        {
            payment.is_deleted = false;
            payment.deleted_at = None;
        }

        audit_log!("restore", format!("sale:{}", id));
        Ok(restored)
    }

    /// Soft-deleted sales
    pub fn deleted_sales(&self) -> Vec<&Sale> {
        self.view().deleted_sales()
    }
}
