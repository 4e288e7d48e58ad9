//! Payment operations
//!
//! Every mutation here re-derives the paid flag of the invoice(s) holding
//! the affected sale(s).

use rust_decimal::prelude::*;
use shared::models::{
    BulkPaymentDraft, CreditKind, CreditSource, CreditTransaction, Payment, PaymentDraft,
    PaymentUpdate,
};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

use super::Ledger;
use crate::audit_log;
use crate::money::{to_decimal, to_f64};
use crate::reconciliation;

fn validate_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        tracing::warn!(amount, "Rejected payment amount");
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidAmount,
            format!("Payment amount must be a positive number, got {}", amount),
        ));
    }
    Ok(())
}

impl Ledger {
    /// Record a payment against a live sale
    ///
    /// The client is taken from the sale.
    pub fn record_payment(&mut self, draft: PaymentDraft) -> AppResult<Payment> {
        validate_amount(draft.amount)?;
        let sale = self.sale_at(self.live_sale_index(&draft.sale_id)?);

        let payment = Payment {
            id: new_id(),
            sale_id: sale.id.clone(),
            client_id: sale.client_id.clone(),
            bulk_payment_id: None,
            amount: to_f64(to_decimal(draft.amount)),
            date: draft.date,
            method: draft.method,
            notes: draft.notes,
            check_number: draft.check_number,
            is_deleted: false,
            deleted_at: None,
            created_at: now_millis(),
            updated_at: None,
        };

        self.snapshot.payments.push(payment.clone());
        self.refresh_invoice_of_sale(&payment.sale_id, payment.created_at);

        audit_log!(
            "record",
            format!("payment:{}", payment.id),
            format!("{:.2} {} on sale:{}", payment.amount, payment.method.as_str(), payment.sale_id)
        );
        Ok(payment)
    }

    /// Spread one amount over a client's open sales
    ///
    /// Open sales are settled oldest first (by date, then creation time).
    /// Whatever is left once every sale is settled lands on the most recent
    /// sale and shows up as client credit, with a pending credit entry
    /// recorded against the bulk id. All slices share one
    /// `bulk_payment_id`.
    pub fn record_bulk_payment(&mut self, draft: BulkPaymentDraft) -> AppResult<Vec<Payment>> {
        validate_amount(draft.amount)?;
        self.ensure_client(&draft.client_id)?;

        let mut client_sales: Vec<usize> = self
            .snapshot
            .sales
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active() && s.client_id == draft.client_id)
            .map(|(idx, _)| idx)
            .collect();
        if client_sales.is_empty() {
            return Err(AppError::new(ErrorCode::PaymentNoTarget)
                .with_detail("client_id", draft.client_id.as_str()));
        }
        client_sales.sort_by_key(|&idx| {
            let sale = self.sale_at(idx);
            (sale.date, sale.created_at)
        });

        let mut left = to_decimal(draft.amount);
        let mut excess = Decimal::ZERO;
        let mut slices: Vec<(usize, Decimal)> = Vec::new();
        for &idx in &client_sales {
            if left <= Decimal::ZERO {
                break;
            }
            let remaining = reconciliation::sale_remaining(self.sale_at(idx), &self.snapshot.payments);
            if remaining <= Decimal::ZERO {
                continue;
            }
            let slice = remaining.min(left);
            slices.push((idx, slice));
            left -= slice;
        }

        if left > Decimal::ZERO {
            excess = left;
            let latest = client_sales[client_sales.len() - 1];
            let merge = matches!(slices.last(), Some((idx, _)) if *idx == latest);
            if merge && let Some(last) = slices.last_mut() {
                last.1 += left;
            } else {
                slices.push((latest, left));
            }
        }

        let bulk_id = new_id();
        let now = now_millis();
        let payments: Vec<Payment> = slices
            .into_iter()
            .map(|(idx, amount)| {
                let sale = self.sale_at(idx);
                Payment {
                    id: new_id(),
                    sale_id: sale.id.clone(),
                    client_id: sale.client_id.clone(),
                    bulk_payment_id: Some(bulk_id.clone()),
                    amount: to_f64(amount),
                    date: draft.date,
                    method: draft.method,
                    notes: draft.notes.clone(),
                    check_number: draft.check_number.clone(),
                    is_deleted: false,
                    deleted_at: None,
                    created_at: now,
                    updated_at: None,
                }
            })
            .collect();

        self.snapshot.payments.extend(payments.iter().cloned());
        for payment in &payments {
            self.refresh_invoice_of_sale(&payment.sale_id, now);
        }

        if excess > Decimal::ZERO {
            let entry = CreditTransaction {
                id: new_id(),
                client_id: draft.client_id.clone(),
                amount: to_f64(excess),
                kind: CreditKind::Credit,
                source: CreditSource::Payment,
                source_id: Some(bulk_id.clone()),
                date: draft.date,
                notes: Some("Overpayment credit".to_string()),
                created_at: now,
                updated_at: None,
            };
            tracing::info!(client_id = %entry.client_id, amount = entry.amount, "Bulk payment excess kept as credit");
            self.snapshot.credit_transactions.push(entry);
        }

        audit_log!(
            "record",
            format!("bulk_payment:{}", bulk_id),
            format!("{:.2} over {} sales", draft.amount, payments.len())
        );
        Ok(payments)
    }

    /// Edit a live payment
    ///
    /// A new `sale_id` moves the payment, and its client, to that sale. The
    /// paid flag is re-derived on the invoices of both the old and the new
    /// sale.
    pub fn update_payment(&mut self, id: &str, update: PaymentUpdate) -> AppResult<Payment> {
        let idx = self.payment_index(id)?;
        if self.payment_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::PaymentAlreadyDeleted).with_detail("payment_id", id));
        }
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }
        let target = match update.sale_id.as_deref() {
            Some(sale_id) => {
                let sale = self.sale_at(self.live_sale_index(sale_id)?);
                Some((sale.id.clone(), sale.client_id.clone()))
            }
            None => None,
        };

        let now = now_millis();
        let payment = &mut self.snapshot.payments[idx];
        let previous_sale = payment.sale_id.clone();
        if let Some((sale_id, client_id)) = target {
            payment.sale_id = sale_id;
            payment.client_id = client_id;
        }
        if let Some(amount) = update.amount {
            payment.amount = to_f64(to_decimal(amount));
        }
        if let Some(date) = update.date {
            payment.date = date;
        }
        if let Some(method) = update.method {
            payment.method = method;
        }
        if update.notes.is_some() {
            payment.notes = update.notes;
        }
        if update.check_number.is_some() {
            payment.check_number = update.check_number;
        }
        payment.updated_at = Some(now);
        let payment = payment.clone();

        self.refresh_invoice_of_sale(&previous_sale, now);
        if payment.sale_id != previous_sale {
            self.refresh_invoice_of_sale(&payment.sale_id, now);
        }

        audit_log!(
            "update",
            format!("payment:{}", id),
            format!("{:.2} on sale:{}", payment.amount, payment.sale_id)
        );
        Ok(payment)
    }

    /// Archive a payment (soft delete)
    pub fn delete_payment(&mut self, id: &str) -> AppResult<Payment> {
        let idx = self.payment_index(id)?;
        if self.payment_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::PaymentAlreadyDeleted).with_detail("payment_id", id));
        }

        let now = now_millis();
        let payment = &mut self.snapshot.payments[idx];
        payment.is_deleted = true;
        payment.deleted_at = Some(now);
        let payment = payment.clone();

        self.refresh_invoice_of_sale(&payment.sale_id, now);
        audit_log!("delete", format!("payment:{}", id), format!("{:.2}", payment.amount));
        Ok(payment)
    }

    /// Bring an archived payment back; its sale must still be live
    pub fn restore_payment(&mut self, id: &str) -> AppResult<Payment> {
        let idx = self.payment_index(id)?;
        if !self.payment_at(idx).is_deleted {
            return Err(AppError::new(ErrorCode::PaymentNotDeleted).with_detail("payment_id", id));
        }
        let sale_id = self.payment_at(idx).sale_id.clone();
        self.live_sale_index(&sale_id)?;

        let now = now_millis();
        let payment = &mut self.snapshot.payments[idx];
        payment.is_deleted = false;
        payment.deleted_at = None;
        let payment = payment.clone();

        self.refresh_invoice_of_sale(&sale_id, now);
        audit_log!("restore", format!("payment:{}", id));
        Ok(payment)
    }

    /// Soft-deleted payments, most recently archived first
    pub fn archived_payments(&self) -> Vec<&Payment> {
        self.view().archived_payments()
    }
}
